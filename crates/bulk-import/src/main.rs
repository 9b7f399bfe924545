use anyhow::Context;
use bulk_import::console::Console;
use bulk_import::harness::{self, RunConfig, Services};
use bulk_import::{load_samples, report};
use bulk_import_api::{
    ApiConfig, InvenTreeClient, Mapping, Supplier, build_clients, default_config_path,
};
use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use inquire::Confirm;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bulk-import")]
#[command(about = "Verify supplier-to-InvenTree bulk part imports", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Sample file mapping part numbers to expected statuses (YAML or JSON)
    #[arg(long, value_name = "FILE", default_value = "bulk_import.yaml")]
    samples: PathBuf,

    /// API configuration file [default: <config dir>/bulk-import/config.yaml]
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Supplier the sample part numbers belong to
    #[arg(long, default_value = "digi-key")]
    supplier: Supplier,

    /// Only run the supplier API checks
    #[arg(long)]
    skip_inventree: bool,

    /// Delete the parts created by this run afterwards
    #[arg(long)]
    delete: bool,

    /// Delete without asking for confirmation
    #[arg(long, requires = "delete")]
    auto_delete: bool,

    /// Write the per-part results as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {e}", "Error:".red());
            for cause in e.chain().skip(1) {
                eprintln!("  {cause}");
            }
            std::process::exit(1);
        }
    }
}

fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    let config_path = cli
        .config
        .or_else(default_config_path)
        .context("Could not determine the config directory, pass --config")?;
    let api_config = ApiConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let samples = load_samples(&cli.samples)?;
    log::debug!("Loaded {} sample parts", samples.len());

    let suppliers = build_clients(&api_config)?;
    let mut server = InvenTreeClient::new(api_config.inventree.clone(), api_config.timeout_secs())?;
    let mapping = Mapping::from_config(&api_config);

    let run_config = RunConfig {
        supplier: cli.supplier,
        enable_inventree: !cli.skip_inventree,
        enable_delete: cli.delete,
        auto_delete: cli.auto_delete,
    };

    let mut console = Console::stdout();
    let mut confirm = || {
        println!();
        Confirm::new("Delete the InvenTree parts created by this run?")
            .with_default(true)
            .prompt()
            .unwrap_or(false)
    };

    let outcome = harness::run(
        &run_config,
        &samples,
        Services {
            suppliers: &suppliers,
            server: &mut server,
            mapping: &mapping,
        },
        &mut console,
        &mut confirm,
    )?;

    if let Some(path) = cli.report {
        report::write_report(&path, &outcome)?;
    }

    Ok(outcome.exit_code)
}
