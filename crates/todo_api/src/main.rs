use anyhow::Context;
use todo_api::Configuration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Configuration::from_env().context("invalid server configuration")?;
    todo_core::init_logging(&config.log_level, config.log_dir.as_deref())
        .map_err(anyhow::Error::msg)?;

    todo_api::run_server(config).await
}
