//! upslited
//!
//! Polls 18650 UPS hats and publishes battery voltage, charge level and
//! external power status.
//!
//! Runtime control:
//! - SIGUSR1 puts every fuel gauge into sleep mode
//! - SIGUSR2 wakes them again
//! - Ctrl-C / SIGINT or SIGTERM exits

mod hardware;
mod sinks;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use upslite_config::{DEFAULT_CONFIG_FILE, OutputFormat, UpsConfig};
use upslite_hal::{Command, TickOutcome};

/// Base tick; each device's own interval decides when it actually polls
const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Use simulated hardware instead of /dev/i2c-* and GPIO
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Poll all devices until interrupted (default)
    Run,
    /// Take a single reading from one device
    Read { id: String },
    /// Put one device into sleep mode
    Sleep { id: String },
    /// Wake one device from sleep mode
    Wake { id: String },
    /// Validate the configuration and print it
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    setup_logging(&config.log_level);
    debug!("Loaded configuration: {:#?}", config);

    config.validate().context("Configuration is invalid")?;

    match cli.command.unwrap_or(Action::Run) {
        Action::Run => run(&config, cli.mock).await,
        Action::Read { id } => read_once(&config, &id, cli.mock),
        Action::Sleep { id } => one_shot(&config, &id, cli.mock, Command::Sleep),
        Action::Wake { id } => one_shot(&config, &id, cli.mock, Command::Wake),
        Action::Check => check(&config),
    }
}

/// Missing default file means built-in defaults; a missing explicit file is an error
fn load_config(path: &Path) -> Result<UpsConfig> {
    if path == Path::new(DEFAULT_CONFIG_FILE) {
        return UpsConfig::load_default().context("Failed to load default configuration");
    }
    UpsConfig::load_layered(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Setup logging to stderr, keeping stdout for JSON output
fn setup_logging(default_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(config: &UpsConfig, mock: bool) -> Result<()> {
    info!("upslited starting with {} device(s)", config.devices.len());

    let mut registry = hardware::build_registry(&config.devices, mock, config.output)?;
    for (id, result) in registry.setup_all() {
        if let Err(e) = result {
            warn!("Setup of '{}' failed: {}", id, e);
        }
    }

    let mut signals = ControlSignals::install()?;

    let mut ticker = tokio::time::interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            control = signals.next() => match control {
                Control::Exit => {
                    info!("Exiting");
                    break;
                }
                Control::Sleep => {
                    info!("SIGUSR1: putting all devices to sleep");
                    registry.request_all(Command::Sleep);
                }
                Control::Wake => {
                    info!("SIGUSR2: waking all devices");
                    registry.request_all(Command::Wake);
                }
            },
            _ = ticker.tick() => {
                for (id, outcome) in registry.tick_all(Instant::now()) {
                    log_outcome(&id, &outcome);
                }
            }
        }
    }

    Ok(())
}

/// What a received signal asks the daemon to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Exit,
    Sleep,
    Wake,
}

/// Signal streams registered once for the lifetime of the run loop
struct ControlSignals {
    interrupt: Signal,
    terminate: Signal,
    sleep: Signal,
    wake: Signal,
}

impl ControlSignals {
    fn install() -> Result<Self> {
        let install = |kind: SignalKind, name: &str| {
            signal(kind).with_context(|| format!("Failed to install {name} handler"))
        };
        Ok(Self {
            interrupt: install(SignalKind::interrupt(), "SIGINT")?,
            terminate: install(SignalKind::terminate(), "SIGTERM")?,
            sleep: install(SignalKind::user_defined1(), "SIGUSR1")?,
            wake: install(SignalKind::user_defined2(), "SIGUSR2")?,
        })
    }

    async fn next(&mut self) -> Control {
        tokio::select! {
            _ = self.interrupt.recv() => Control::Exit,
            _ = self.terminate.recv() => Control::Exit,
            _ = self.sleep.recv() => Control::Sleep,
            _ = self.wake.recv() => Control::Wake,
        }
    }
}

fn log_outcome(id: &str, outcome: &TickOutcome) {
    match outcome {
        TickOutcome::NotDue | TickOutcome::Halted => {}
        TickOutcome::Published(reading) => debug!("'{}' published {:?}", id, reading),
        TickOutcome::Failed(event) => debug!("'{}' skipped a cycle: {}", id, event.error),
        TickOutcome::Commands(n) => debug!("'{}' ran {} command(s)", id, n),
    }
}

fn read_once(config: &UpsConfig, id: &str, mock: bool) -> Result<()> {
    let settings = config
        .device(id)
        .with_context(|| format!("No device named '{id}' in configuration"))?;
    let mut device = hardware::build_device(settings, mock, config.output)?;
    device.setup()?;

    match device.poll_now(Instant::now()) {
        TickOutcome::Published(reading) => {
            println!("{}", serde_json::to_string_pretty(&reading)?);
            Ok(())
        }
        TickOutcome::Failed(event) => bail!("Reading '{}' failed: {}", id, event.error),
        other => bail!("Reading '{}' did not complete: {:?}", id, other),
    }
}

fn one_shot(config: &UpsConfig, id: &str, mock: bool, command: Command) -> Result<()> {
    let settings = config
        .device(id)
        .with_context(|| format!("No device named '{id}' in configuration"))?;
    let mut device = hardware::build_device(settings, mock, config.output)?;

    if let Err(e) = device.setup() {
        error!("Setup of '{}' failed: {}", id, e);
        return Err(e.into());
    }
    device
        .execute(command)
        .with_context(|| format!("Failed to {command} '{id}'"))?;

    info!("'{}': {} done", id, command);
    Ok(())
}

fn check(config: &UpsConfig) -> Result<()> {
    println!("Configuration OK ({:?} output)", config.output);
    for device in &config.devices {
        println!(
            "  {}: {} @ {:#04x}, every {}s, power GPIO {}{}, level from {:?}",
            device.id,
            device.i2c_bus.display(),
            device.address,
            device.update_interval_secs,
            device.power_pin,
            if device.power_active_low { " (active low)" } else { "" },
            device.level_source,
        );
        for (label, declared) in [
            ("battery_voltage", device.battery_voltage.is_some()),
            ("battery_level", device.battery_level.is_some()),
            ("ups_status", device.ups_status.is_some()),
        ] {
            if declared {
                println!("    sensor: {label}");
            }
        }
    }
    if config.output == OutputFormat::Json {
        println!("Readings will be written to stdout as JSON lines");
    }
    Ok(())
}
