use clap::arg;
use clap::command;
use clap::Parser;
use login_broker::server;
use login_broker::utils::config_loader;
use login_broker::utils::logging;
use anyhow::Result;
use login_broker::utils::logging::LogLevel;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "login-broker.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read args
    // -------------------------------

    let args = Args::parse();

    // -------------------------------
    // 2. Load YAML config
    // -------------------------------

    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned()).await?;

    // -------------------------------
    // 3. Wire token cache, broker and forwarder
    // -------------------------------

    let state = server::server::build_state(&service_config).await?;
    info!(
        "upstream: {}, downstream login: {}, cache duration: {}s",
        service_config.upstream.url,
        state.login_url,
        service_config.broker.cache_duration_seconds
    );

    // -------------------------------
    // 4. Start http server
    // -------------------------------

    info!("Service starting...");
    server::server::start(&service_config.settings, state).await?;

    Ok(())
}
