use localchat_cli::{logging::LoggingConfig, runner, CliError};
use localchat_llm::LlmClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    LoggingConfig::from_env().init_or_warn();

    let client = LlmClient::local();
    runner::run_basic(&client, &mut std::io::stdout().lock()).await
}
