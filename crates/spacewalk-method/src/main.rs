//! # spacewalk
//!
//! APT acquire method for `spacewalk://` URIs.
//!
//! APT starts this binary and talks to it over stdin/stdout. The method
//! loads the up2date configuration, then serves each acquire request with
//! an authenticated GET against the Spacewalk server. Logs go to stderr;
//! stdout carries nothing but protocol frames.

use camino::Utf8PathBuf;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use spacewalk_client::{Session, XmlRpcAuth};
use spacewalk_config::ConfigLoader;
use spacewalk_core::error::{MethodError, MethodResult};

mod driver;
mod protocol;

use driver::{exit_code, AcquireMethod};

/// APT transport for Spacewalk servers
#[derive(Parser)]
#[command(name = "spacewalk", version, about = "APT acquire method for Spacewalk")]
pub struct Cli {
    /// up2date configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Log filter directives, e.g. `spacewalk_client=trace`
    #[arg(long, env = "SPACEWALK_LOG", value_name = "FILTER")]
    pub log: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log.as_deref());
    setup_panic_handler();

    info!("Starting spacewalk method v{}", env!("CARGO_PKG_VERSION"));

    std::process::exit(exit_code(run(cli)));
}

fn run(cli: Cli) -> MethodResult<i32> {
    // One request at a time, so a single-threaded runtime is enough
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| MethodError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let loader = ConfigLoader::resolve(cli.config);
        let config = loader.load().await?;
        info!("Using server {} from {}", config.netloc(), loader.path());

        let session = Session::with_config(config, XmlRpcAuth::new());
        let mut method = AcquireMethod::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), session);
        method.run().await
    })
}

fn setup_logging(verbose: bool, filter: Option<&str>) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(format!(
            "spacewalk={},spacewalk_client={},spacewalk_config={}",
            level, level, level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("spacewalk method crashed: {}", panic_info);
        eprintln!("spacewalk method crashed: {}", panic_info);
    }));
}
