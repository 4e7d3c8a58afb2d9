/// Entry point for the egress rotation probe.
///
/// Wires the configuration, the interactive provider menu, the run
/// controller, and the export collaborators together. Error conditions are
/// reported and end the run gracefully; the process exits 0 on normal
/// completion or explicit quit.
mod config;
mod console;
mod endpoint;
mod endpoint_provider;
mod error;
mod executor;
mod exporters;
mod inspect;
mod ledger;
mod logger;
mod rotation;
mod runner;

use clap::Parser;
use config::Config;
use console::{MenuChoice, Status};
use endpoint_provider::{EndpointProvider, GatewayProvider, InstanceProvider};
use runner::Runner;
use std::path::PathBuf;

/// Define command line arguments using clap
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", env = "rotor_config")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let _logger = logger::init();

    let cli = Cli::parse();
    tracing::debug!("Config path: {:?}", cli.config);
    let conf = match Config::new(cli.config.as_ref()) {
        Ok(conf) => conf,
        Err(e) => {
            console::status(Status::Error, &format!("Failed to load configuration: {:#}", e));
            return;
        }
    };

    console::banner();
    match console::menu() {
        MenuChoice::Gateway => {
            let provider = GatewayProvider::new(conf.gateway.state_dir.clone());
            run_rotation(&conf, &provider).await;
        }
        MenuChoice::Instance => {
            let provider = InstanceProvider::new(conf.instance.project.clone());
            run_rotation(&conf, &provider).await;
        }
        MenuChoice::Inspect => {
            if let Err(e) = inspect::run(&conf).await {
                console::status(Status::Error, &format!("Inspection failed: {:#}", e));
            }
        }
        MenuChoice::Quit => console::status(Status::Info, "Exiting..."),
    }
}

async fn run_rotation(conf: &Config, provider: &dyn EndpointProvider) {
    console::status(Status::Info, &format!("Provider: {}", provider.name()));
    console::status(Status::Info, &format!("Target URL: {}", conf.run.target_url));
    console::status(
        Status::Info,
        &format!("Number of requests: {}", conf.run.num_requests),
    );
    console::separator();

    let mut runner = Runner::new(conf.run.clone());
    let ledger = match runner.run(provider).await {
        Ok(ledger) => ledger,
        Err(e) => {
            console::status(Status::Error, &format!("Run aborted: {}", e));
            return;
        }
    };

    if ledger.is_empty() {
        console::status(Status::Error, "No proxy data collected");
        return;
    }

    console::status(
        Status::Info,
        &format!("Total IPs collected: {}", ledger.successes()),
    );
    if !console::prompt_yes_no("Export results?") {
        console::status(Status::Info, "Export skipped");
        return;
    }

    let exporters = exporters::create_exporters(&conf.export);
    exporters::export_all(&exporters, &ledger).await;
}
