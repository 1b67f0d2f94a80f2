mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{Connection, EXIT_CONFIG_ERROR, EXIT_FAILURE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "swiftacct",
    version,
    about = "Inspect and update object-storage account metadata"
)]
struct Cli {
    /// Account storage URL, e.g. https://swift.example.com/v1/AUTH_demo (overrides config file).
    #[arg(long, env = "SWIFTACCT_URL", global = true)]
    url: Option<String>,

    /// Auth token sent as X-Auth-Token (overrides config file).
    #[arg(
        long,
        env = "SWIFTACCT_AUTH_TOKEN",
        hide_env_values = true,
        global = true
    )]
    token: Option<String>,

    /// Path to the account config file [default: ~/.config/swiftacct/account.json].
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show account usage counters and metadata.
    Show,
    /// Set or overwrite account metadata.
    SetMeta {
        /// Metadata entries as KEY=VALUE.
        #[arg(required = true, value_parser = commands::parse_key_value)]
        entries: Vec<(String, String)>,
    },
    /// Remove account metadata keys.
    DeleteMeta {
        /// Metadata keys to remove.
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Replace the secret used to sign temporary URLs.
    TempUrlKey {
        /// New secret key.
        key: String,
    },
    /// Write the account config file.
    Configure {
        /// Account storage URL.
        url: String,
        /// Request timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SWIFTACCT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let conn = Connection {
        url: cli.url.as_deref(),
        token: cli.token.as_deref(),
        config: cli.config.as_deref(),
    };

    match run_command(&conn, cli.command, cli.json) {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn run_command(conn: &Connection<'_>, command: Commands, json: bool) -> Result<u8, String> {
    match command {
        Commands::Show => commands::show::run(&commands::connect(conn)?, json),
        Commands::SetMeta { entries } => {
            commands::set_meta::run(&commands::connect(conn)?, &entries, json)
        }
        Commands::DeleteMeta { keys } => {
            commands::delete_meta::run(&commands::connect(conn)?, &keys, json)
        }
        Commands::TempUrlKey { key } => {
            commands::temp_url_key::run(&commands::connect(conn)?, &key, json)
        }
        Commands::Configure { url, timeout } => commands::configure::run(conn, &url, timeout, json),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    }
}
