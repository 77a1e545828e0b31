//! `mmwave` command line tool.
//!
//! Replays raw captures, watches live sensors behind a serial-to-TCP bridge
//! and configures fall detection modules. Decoded readings go to stdout as
//! JSON lines, logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use mmwave_protocol::{AlarmArea, DeviceProfile};
use mmwave_sensor::{FallModel, FallSensor, LinkConfig, MockLink, Sensor, SensorConfig, SensorError, TcpLink};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod output;

/// Idle pause between polls of a live link.
const IDLE_SLEEP: Duration = Duration::from_millis(5);

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Sensor(#[from] SensorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("{0}")]
    Usage(String),
}

#[derive(Parser, Debug)]
#[command(name = "mmwave", version, about = "mmWave radar sensor tool")]
struct Cli {
    /// YAML sensor configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Device profile, overriding the configuration
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Sensor name used in output and metric labels
    #[arg(long, global = true)]
    name: Option<String>,

    /// Log filter when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Serve Prometheus metrics on this address
    #[cfg(feature = "prometheus")]
    #[arg(long, global = true)]
    metrics_addr: Option<std::net::SocketAddr>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a raw byte capture and print every reading
    Replay {
        /// Capture file, raw bytes as read from the UART
        file: Option<PathBuf>,
    },

    /// Print readings from a live sensor until interrupted
    Watch {
        /// Bridge address as host:port
        #[arg(long)]
        connect: Option<String>,

        /// Stop after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,
    },

    /// Query the stored parameters of a fall detection module
    Params {
        #[arg(long)]
        connect: Option<String>,
    },

    /// Write settings to a fall detection module
    Configure {
        #[arg(long)]
        connect: Option<String>,

        /// Installation height in metres
        #[arg(long)]
        height: Option<f32>,

        /// Fall threshold
        #[arg(long)]
        threshold: Option<f32>,

        /// Fall sensitivity
        #[arg(long)]
        sensitivity: Option<u32>,

        /// Alarm area as X_LEFT,X_RIGHT,Z_FRONT,Z_BACK in metres
        #[arg(long, value_parser = parse_alarm_area, allow_hyphen_values = true)]
        alarm_area: Option<AlarmArea>,

        /// Enable or disable the module's user log output
        #[arg(long)]
        user_log: Option<bool>,

        /// Restore the factory settings first
        #[arg(long)]
        reset: bool,
    },

    /// List the built-in device profiles
    Profiles,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    #[cfg(feature = "prometheus")]
    if let Some(addr) = cli.metrics_addr {
        mmwave_metrics::install_prometheus(addr)
            .map_err(|e| CliError::Usage(format!("cannot start metrics exporter: {e}")))?;
        info!("Serving metrics on {}", addr);
    }

    let config = load_config(cli.config.as_deref(), cli.profile, cli.name)?;

    match cli.command {
        Commands::Replay { file } => replay(&config, file),
        Commands::Watch {
            connect,
            duration_secs,
        } => watch(&config, connect, duration_secs.map(Duration::from_secs)),
        Commands::Params { connect } => params(&config, connect),
        Commands::Configure {
            connect,
            height,
            threshold,
            sensitivity,
            alarm_area,
            user_log,
            reset,
        } => configure(
            &config,
            connect,
            Settings {
                reset,
                height,
                threshold,
                sensitivity,
                alarm_area,
                user_log,
            },
        ),
        Commands::Profiles => profiles(),
    }
}

/// Read the configuration file, then apply command line overrides.
fn load_config(
    path: Option<&Path>,
    profile: Option<String>,
    name: Option<String>,
) -> Result<SensorConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&text)?
        }
        None => SensorConfig::default(),
    };
    if let Some(profile) = profile {
        config.profile = profile;
    }
    if let Some(name) = name {
        config.name = name;
    }
    config.validate()?;
    debug!(?config, "Loaded configuration");
    Ok(config)
}

fn replay(config: &SensorConfig, file: Option<PathBuf>) -> Result<(), CliError> {
    let path = match (file, &config.link) {
        (Some(path), _) => path,
        (None, Some(LinkConfig::Capture(path))) => PathBuf::from(path),
        _ => return Err(CliError::Usage("no capture file given".to_string())),
    };
    let bytes = std::fs::read(&path)?;
    info!("Replaying {} bytes from {}", bytes.len(), path.display());

    let mut sensor = Sensor::from_config(MockLink::from_capture(bytes), config)?;
    let mut stdout = std::io::stdout().lock();
    let lines = output::drain(&mut sensor, &mut stdout)?;

    let stats = sensor.stats();
    info!(
        "Replay done: {} readings, {} frames accepted, {} rejected, {} decode failures",
        lines, stats.frames_accepted, stats.frames_rejected, stats.decode_failures
    );
    Ok(())
}

fn watch(
    config: &SensorConfig,
    connect: Option<String>,
    duration: Option<Duration>,
) -> Result<(), CliError> {
    let addr = bridge_addr(config, connect)?;
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let link = TcpLink::connect(&addr)?;
    info!("Connected to {}", link.peer_addr());
    let mut sensor = Sensor::from_config(link, config)?;
    let mut stdout = std::io::stdout().lock();
    let started = Instant::now();

    while running.load(Ordering::SeqCst) {
        if duration.is_some_and(|d| started.elapsed() >= d) {
            break;
        }
        match output::drain(&mut sensor, &mut stdout) {
            Ok(0) => thread::sleep(IDLE_SLEEP),
            Ok(_) => {}
            Err(CliError::Sensor(SensorError::Io(e)))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                warn!("Bridge closed the connection");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    let stats = sensor.stats();
    info!(
        "Stopped after {:.1}s: {} bytes, {} frames accepted, {} rejected",
        started.elapsed().as_secs_f64(),
        stats.bytes_received,
        stats.frames_accepted,
        stats.frames_rejected
    );
    Ok(())
}

fn params(config: &SensorConfig, connect: Option<String>) -> Result<(), CliError> {
    let mut sensor = fall_sensor(config, connect)?;
    let params = sensor.radar_parameters()?;
    output::write_line(&mut std::io::stdout().lock(), &params)?;
    Ok(())
}

/// Settings requested by `configure`, applied in field order.
struct Settings {
    reset: bool,
    height: Option<f32>,
    threshold: Option<f32>,
    sensitivity: Option<u32>,
    alarm_area: Option<AlarmArea>,
    user_log: Option<bool>,
}

/// Parse `X_LEFT,X_RIGHT,Z_FRONT,Z_BACK`.
fn parse_alarm_area(value: &str) -> Result<AlarmArea, String> {
    let parts = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid alarm area bound '{}': {e}", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let [x_left, x_right, z_front, z_back] = parts[..] else {
        return Err(format!(
            "alarm area needs 4 comma-separated values, got {}",
            parts.len()
        ));
    };
    Ok(AlarmArea {
        x_left,
        x_right,
        z_front,
        z_back,
    })
}

/// What the module answered for each setting written.
#[derive(Debug, Default, Serialize)]
struct ConfigureReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    reset: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitivity: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alarm_area: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_log: Option<bool>,
}

fn configure(
    config: &SensorConfig,
    connect: Option<String>,
    settings: Settings,
) -> Result<(), CliError> {
    let mut sensor = fall_sensor(config, connect)?;
    let mut report = ConfigureReport::default();

    if settings.reset {
        report.reset = Some(sensor.reset_setting()?);
    }
    if let Some(height) = settings.height {
        report.height = Some(sensor.set_installation_height(height)?);
    }
    if let Some(threshold) = settings.threshold {
        report.threshold = Some(sensor.set_threshold(threshold)?);
    }
    if let Some(sensitivity) = settings.sensitivity {
        report.sensitivity = Some(sensor.set_sensitivity(sensitivity)?);
    }
    if let Some(area) = settings.alarm_area {
        report.alarm_area = Some(sensor.set_alarm_area(area)?);
    }
    if let Some(enabled) = settings.user_log {
        sensor.set_user_log(enabled)?;
        report.user_log = Some(true);
    }

    output::write_line(&mut std::io::stdout().lock(), &report)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ProfileLine<'a> {
    name: &'a str,
    type_codes: Vec<String>,
}

fn profiles() -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    for name in DeviceProfile::BUILT_IN {
        let Some(profile) = DeviceProfile::by_name(name) else {
            continue;
        };
        let line = ProfileLine {
            name: profile.name(),
            type_codes: profile
                .entries()
                .iter()
                .map(|entry| mmwave_metrics::type_code_label(entry.type_code))
                .collect(),
        };
        output::write_line(&mut stdout, &line)?;
    }
    Ok(())
}

fn fall_sensor(
    config: &SensorConfig,
    connect: Option<String>,
) -> Result<FallSensor<TcpLink>, CliError> {
    let model = FallModel::from_profile_name(&config.profile).ok_or_else(|| {
        CliError::Usage(format!(
            "profile '{}' is not a fall detection module",
            config.profile
        ))
    })?;
    let addr = bridge_addr(config, connect)?;
    let link = TcpLink::connect(&addr)?;
    info!("Connected to {} as {:?}", link.peer_addr(), model);
    Ok(FallSensor::from_sensor(Sensor::from_config(link, config)?, model))
}

fn bridge_addr(config: &SensorConfig, connect: Option<String>) -> Result<String, CliError> {
    match (connect, &config.link) {
        (Some(addr), _) => Ok(addr),
        (None, Some(LinkConfig::Tcp(addr))) => Ok(addr.clone()),
        _ => Err(CliError::Usage(
            "no bridge address, pass --connect or set link.tcp in the config".to_string(),
        )),
    }
}
