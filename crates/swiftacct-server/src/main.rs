use clap::Parser;
use std::process::ExitCode;
use swiftacct_server::Store;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "swiftacct-server",
    about = "Reference in-memory object-storage account server"
)]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8322)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Token clients must send as X-Auth-Token. Unauthenticated if unset.
    #[arg(long, env = "SWIFTACCT_SERVER_TOKEN")]
    token: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let addr = format!("{}:{}", cli.bind, cli.port);
    info!("starting swiftacct-server on {addr}");
    if cli.token.is_none() {
        info!("no token configured; accepting unauthenticated requests");
    }

    let store = Store::new(cli.token);
    match swiftacct_server::run_server(&store, &addr) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server failed: {e}");
            ExitCode::FAILURE
        }
    }
}
