use clap::{Args, Parser};
use std::{path::PathBuf, time::Duration};
use tokio::{signal, sync::mpsc, time::sleep};
use tracing::{error, info, warn};

use ping_pacer::{
    setup_logging, Config, FakeTransport, ProbeTransport, RateController, Report, SystemPing,
    SUPPORTED_RATES,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Address to probe
    #[arg(required_unless_present = "dump_default")]
    target: Option<String>,

    #[command(flatten)]
    probe: ProbeArgs,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct ProbeArgs {
    /// Probes per second, defaults to schedule.rate_hz from the config
    #[arg(short, long, value_parser = parse_rate)]
    rate: Option<u32>,

    /// Stop after this long (e.g. "30s", "5m"), runs until Ctrl-C otherwise
    #[arg(short, long, value_parser = humantime_serde::re::humantime::parse_duration)]
    duration: Option<Duration>,

    /// Print reports as JSON lines
    #[arg(long)]
    json: bool,

    /// Answer every probe locally instead of running ping
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to the config file, layered config/ files are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dump default config and exit
    #[arg(long = "dump-default-config")]
    dump_default: bool,
}

fn parse_rate(value: &str) -> Result<u32, String> {
    let rate: u32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a whole number of probes per second", value))?;

    if SUPPORTED_RATES.contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("supported rates are {:?}", SUPPORTED_RATES))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line args
    let cli = Cli::parse();

    if cli.common.dump_default {
        let config = Config::default();
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    // Load config
    let config = match &cli.common.config {
        Some(path) => Config::from_file(path.clone())?,
        None => Config::new()?,
    };

    // Initialize logging
    let _log_guard = setup_logging(&config.logging)?;

    if let Some(path) = &cli.common.config {
        info!("Loaded config from {}", path.display());
    }

    let target = cli.target.unwrap_or_default();
    let rate = cli
        .probe
        .rate
        .map(f64::from)
        .unwrap_or(config.schedule.rate_hz);

    if cli.probe.dry_run {
        info!("Dry run, probes are answered locally");
        let transport = FakeTransport::replying(Duration::from_millis(1));
        run(&config, transport, &target, rate, &cli.probe).await
    } else {
        let transport = SystemPing::new(&config.probe);
        info!("Using {} as probe transport", transport.program());
        run(&config, transport, &target, rate, &cli.probe).await
    }
}

async fn run<T: ProbeTransport>(
    config: &Config,
    transport: T,
    target: &str,
    rate: f64,
    args: &ProbeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let (controller, mut reports) = RateController::new(config, transport);
    controller.start(target, rate).await?;

    let deadline = async {
        match args.duration {
            Some(duration) => sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            Some(report) = reports.recv() => {
                print_report(&report, args.json);
            }
            _ = &mut deadline => {
                info!("Run duration elapsed");
                break;
            }
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Interrupted");
                break;
            }
        }
    }

    let summary = controller.snapshot().await;
    controller.stop().await;
    drain(&mut reports, args.json);

    if let Some(report) = summary {
        info!(
            "{} replies, {} failures, {} skipped in {:?} ({:.2} of {} Hz requested)",
            report.probes_sent,
            report.failures,
            report.skipped,
            report.elapsed,
            report.actual_frequency_hz,
            report.requested_rate_hz
        );
    }

    Ok(())
}

fn drain(reports: &mut mpsc::Receiver<Report>, json: bool) {
    while let Ok(report) = reports.try_recv() {
        print_report(&report, json);
    }
}

fn print_report(report: &Report, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to encode report: {}", e),
        }
    } else {
        println!("{}\n", report);
    }
}
