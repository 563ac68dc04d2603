pub mod error;
pub mod logging;
pub mod render;
pub mod requests;
pub mod runner;

pub use error::CliError;
pub use render::StreamSummary;

#[cfg(test)]
mod tests;
