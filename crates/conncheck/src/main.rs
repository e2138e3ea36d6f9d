//! Conncheck - bench device connectivity preflight
//!
//! Run by the bench harness before a suite starts. Exit code 0 means the
//! device is ready (or the check was skipped); 1 means the bench needs
//! attention, with the reason on stderr.

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conncheck::capability::SysfsCapabilityProber;
use conncheck::check::{DeviceServices, DeviceSetupCheck, StepOutcome};
use conncheck::config::CheckConfig;
use conncheck::netwatch::{NetworkManagerMonitor, NetworkMonitor};
use conncheck::telephony::{ModemManagerTelephony, TelephonyService};
use conncheck::wifi::NetworkManagerWifi;

#[derive(Parser)]
#[command(name = "conncheck")]
#[command(about = "Verify a bench device's connectivity setup", long_about = None)]
#[command(version)]
struct Cli {
    /// Override the mobile-data wait timeout (seconds)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Read configuration from this file instead of /etc/conncheck/config.toml
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Print the check report as JSON on success
    #[arg(long)]
    json: bool,

    /// Skip the device check entirely (local iteration escape hatch)
    #[arg(long)]
    skip_device_check: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    if cli.skip_device_check || CheckConfig::skip_requested() {
        println!("{} device setup check skipped", "SKIP".yellow().bold());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => CheckConfig::load_from(path),
        None => CheckConfig::load(),
    };
    if let Some(secs) = cli.timeout_secs {
        config.mobile_data_timeout_secs = secs;
    }

    info!("conncheck v{} starting", env!("CARGO_PKG_VERSION"));

    let capabilities = SysfsCapabilityProber::new();
    let wifi = NetworkManagerWifi::new(config.wifi_connect_wait());
    let telephony = ModemManagerTelephony::detect();
    let monitor = NetworkManagerMonitor::detect(config.poll_interval());

    let services = DeviceServices {
        capabilities: &capabilities,
        wifi: &wifi,
        telephony: telephony.as_ref().map(|t| t as &dyn TelephonyService),
        monitor: monitor.as_ref().map(|m| m as &dyn NetworkMonitor),
    };

    match DeviceSetupCheck::new(services, &config).run() {
        Ok(report) => {
            print_step("wifi", report.wifi);
            print_step("telephony", report.telephony);
            println!(
                "{} device setup check passed in {}ms",
                "PASS".green().bold(),
                report.duration_ms
            );
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{} {}", "FAIL".red().bold(), err);
            std::process::exit(1);
        }
    }
}

fn print_step(name: &str, outcome: StepOutcome) {
    let label = match outcome {
        StepOutcome::Passed => format!("{}", "ok".green()),
        StepOutcome::Skipped => format!("{}", "skipped".yellow()),
    };
    println!("  {:<10} {}", name, label);
}
