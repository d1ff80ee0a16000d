//! lamco-input-replay - replay recorded native input through the pipeline
//!
//! Reads a JSON-lines script, feeds every line into an [`InputContext`]
//! backed by the headless backend and prints the canonical events it
//! produces, one JSON object per line.
//!
//! # Script format
//!
//! Each line is either a native event (tagged by `"type"`) or a command
//! (tagged by `"command"`). An optional `"at_ms"` moves the replay clock
//! forward before the line runs.
//!
//! ```text
//! {"at_ms": 10, "type": "pointer_motion", "window": 1, "x": 5, "y": 5}
//! {"command": "open_joystick", "path": "/dev/input/js0", "name": "Pad"}
//! {"command": "joystick_report", "path": "/dev/input/js0", "buttons": 1}
//! {"at_ms": 20, "command": "tick"}
//! ```

use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use bytes::Bytes;
use clap::Parser;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lamco_input_core::config::LogFormat;
use lamco_input_core::events::{JoystickId, WindowId};
use lamco_input_core::joystick::{DeviceInfo, LowLevelReport, LowLevelSource};
use lamco_input_core::platform::HeadlessBackend;
use lamco_input_core::sync::{Clock, ManualClock};
use lamco_input_core::{logging, Config, InputContext, InputError, NativeEvent};

/// Command-line arguments for lamco-input-replay
#[derive(Parser, Debug)]
#[command(name = "lamco-input-replay")]
#[command(version, about = "Replay native input through the canonical event pipeline", long_about = None)]
pub struct Args {
    /// Script to replay ("-" for stdin)
    pub script: PathBuf,

    /// Configuration file path
    #[arg(short, long, env = "LAMCO_INPUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact), overrides the config file
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Headless window as ID:WIDTHxHEIGHT (can be specified multiple times)
    #[arg(long = "window", value_parser = parse_window, default_value = "1:1920x1080")]
    pub windows: Vec<(WindowId, i32, i32)>,
}

fn parse_window(value: &str) -> std::result::Result<(WindowId, i32, i32), String> {
    let (id, size) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ID:WIDTHxHEIGHT, got '{}'", value))?;
    let (width, height) = size
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", size))?;

    let id = id.parse().map_err(|e| format!("window id '{}': {}", id, e))?;
    let width = width.parse().map_err(|e| format!("width '{}': {}", width, e))?;
    let height = height.parse().map_err(|e| format!("height '{}': {}", height, e))?;
    Ok((id, width, height))
}

/// Replay control lines
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Command {
    RelativeMode {
        enabled: bool,
    },
    Capture {
        enabled: bool,
    },
    /// Runs joystick polling, correlation and haptic deadlines
    Tick,
    TextInput {
        enabled: bool,
    },
    ShowCursor {
        shown: bool,
    },
    OpenJoystick {
        path: String,
        #[serde(default)]
        name: String,
    },
    CloseJoystick {
        path: String,
    },
    /// Queues a report; it is parsed on the next `tick`
    JoystickReport {
        path: String,
        #[serde(default = "centered_sticks")]
        sticks: [u16; 4],
        #[serde(default = "centered")]
        trigger: u16,
        #[serde(default)]
        buttons: u16,
        #[serde(default)]
        hat: u8,
    },
    Rumble {
        path: String,
        low: u16,
        high: u16,
        duration_ms: u64,
    },
}

fn centered() -> u16 {
    32768
}

fn centered_sticks() -> [u16; 4] {
    [32768; 4]
}

enum Step {
    Command(Command),
    Event(NativeEvent),
}

/// Parse one script line into its clock position and step
fn parse_line(line: &str) -> Result<(Option<u64>, Step)> {
    let mut value: serde_json::Value = serde_json::from_str(line).context("Invalid JSON")?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("Script line is not a JSON object"))?;

    let at_ms = match object.remove("at_ms") {
        Some(at) => Some(at.as_u64().ok_or_else(|| anyhow!("at_ms must be an unsigned integer"))?),
        None => None,
    };

    let step = if object.contains_key("command") {
        Step::Command(serde_json::from_value(value).context("Invalid command")?)
    } else {
        Step::Event(serde_json::from_value(value).context("Invalid native event")?)
    };
    Ok((at_ms, step))
}

/// Report source fed from the script
struct ScriptedSource {
    reports: Arc<Mutex<VecDeque<Bytes>>>,
}

impl LowLevelSource for ScriptedSource {
    fn poll_report(&mut self) -> lamco_input_core::Result<Option<Bytes>> {
        Ok(self.reports.lock().pop_front())
    }
}

struct ScriptedJoystick {
    id: JoystickId,
    reports: Arc<Mutex<VecDeque<Bytes>>>,
}

struct Replay {
    ctx: InputContext,
    clock: Arc<ManualClock>,
    joysticks: HashMap<String, ScriptedJoystick>,
    emitted: usize,
    failures: usize,
}

impl Replay {
    fn new(config: Config, windows: &[(WindowId, i32, i32)]) -> Self {
        let mut backend = HeadlessBackend::new();
        for &(id, width, height) in windows {
            backend.add_window(id, width, height);
        }

        let clock = Arc::new(ManualClock::new(0));
        let ctx = InputContext::with_clock(config, Box::new(backend), clock.clone());

        Self {
            ctx,
            clock,
            joysticks: HashMap::new(),
            emitted: 0,
            failures: 0,
        }
    }

    fn advance_to(&self, at_ms: u64) {
        let now = self.clock.now_ms();
        if at_ms < now {
            warn!("at_ms {} is before the current time {}, ignoring", at_ms, now);
            return;
        }
        self.clock.set(at_ms);
    }

    fn joystick(&self, path: &str) -> Result<&ScriptedJoystick> {
        self.joysticks
            .get(path)
            .ok_or_else(|| anyhow!("No joystick opened at '{}'", path))
    }

    fn run_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::RelativeMode { enabled } => self.ctx.set_relative_mouse_mode(enabled)?,
            Command::Capture { enabled } => self.ctx.capture_mouse(enabled)?,
            Command::Tick => self.ctx.tick(),
            Command::TextInput { enabled: true } => self.ctx.start_text_input(),
            Command::TextInput { enabled: false } => self.ctx.stop_text_input(),
            Command::ShowCursor { shown } => {
                self.ctx.show_cursor(Some(shown));
            }
            Command::OpenJoystick { path, name } => {
                if self.joysticks.contains_key(&path) {
                    bail!("Joystick '{}' is already open", path);
                }
                let reports = Arc::new(Mutex::new(VecDeque::new()));
                let info = DeviceInfo {
                    path: path.clone(),
                    name,
                    vendor: 0,
                    product: 0,
                };
                let source = ScriptedSource {
                    reports: reports.clone(),
                };
                let id = self.ctx.open_joystick(&info, Box::new(source));
                debug!("Opened scripted joystick {} at {}", id, path);
                self.joysticks.insert(path, ScriptedJoystick { id, reports });
            }
            Command::CloseJoystick { path } => {
                let id = self.joystick(&path)?.id;
                self.ctx.close_joystick(id)?;
                self.joysticks.remove(&path);
            }
            Command::JoystickReport {
                path,
                sticks,
                trigger,
                buttons,
                hat,
            } => {
                let report = LowLevelReport {
                    sticks,
                    trigger,
                    buttons,
                    hat,
                };
                self.joystick(&path)?.reports.lock().push_back(report.encode());
            }
            Command::Rumble {
                path,
                low,
                high,
                duration_ms,
            } => {
                let id = self.joystick(&path)?.id;
                self.ctx.rumble_joystick(id, low, high, duration_ms)?;
            }
        }
        Ok(())
    }

    fn run_step(&mut self, step: Step) -> Result<()> {
        match step {
            Step::Command(command) => self.run_command(command),
            Step::Event(event) => self.ctx.handle_native(event).map_err(anyhow::Error::from),
        }
    }

    /// Print everything queued so far
    fn flush(&mut self) -> Result<()> {
        for event in self.ctx.drain_events() {
            println!("{}", serde_json::to_string(&event)?);
            self.emitted += 1;
        }
        Ok(())
    }

    fn replay(&mut self, reader: impl BufRead) -> Result<usize> {
        let mut lines = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read script")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            lines += 1;

            let (at_ms, step) =
                parse_line(line).with_context(|| format!("Script line {}", index + 1))?;
            if let Some(at_ms) = at_ms {
                self.advance_to(at_ms);
            }

            if let Err(e) = self.run_step(step) {
                self.failures += 1;
                match e.downcast_ref::<InputError>() {
                    Some(input) => warn!("Line {}: {} ({:?})", index + 1, input, input.class()),
                    None => warn!("Line {}: {:#}", index + 1, e),
                }
            }
            self.flush()?;
        }

        self.ctx.tick();
        self.ctx.shutdown();
        self.flush()?;
        Ok(lines)
    }
}

fn open_script(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open script: {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path).or_else(|e| {
            eprintln!("Failed to load config: {:#}, using defaults", e);
            Ok::<_, anyhow::Error>(Config::default_config())
        })?,
        None => Config::default_config(),
    };

    // Initialize logging
    let _guard = init_logging(&args, &config)?;

    info!("════════════════════════════════════════════════════════");
    info!("  lamco-input-replay v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    config.apply_log_priorities(logging::global());
    debug!("Config: {:?}", config);

    let reader = open_script(&args.script)?;
    let mut replay = Replay::new(config, &args.windows);
    let lines = replay.replay(reader)?;

    info!(
        "Replayed {} lines: {} events emitted, {} failed steps",
        lines, replay.emitted, replay.failures
    );
    Ok(())
}

fn parse_log_format(args: &Args, config: &Config) -> Result<LogFormat> {
    match args.log_format.as_deref() {
        None => Ok(config.logging.format),
        Some("json") => Ok(LogFormat::Json),
        Some("compact") => Ok(LogFormat::Compact),
        Some("pretty") => Ok(LogFormat::Pretty),
        Some(other) => bail!("Unknown log format '{}'", other),
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    let log_level = match args.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "lamco_input_core={level},lamco_input_replay={level},warn",
            level = log_level
        ))
    });

    let format = parse_log_format(args, config)?;
    let log_file = args.log_file.as_ref().or(config.logging.file.as_ref());

    // Events go to stdout, so logs stay on stderr
    if let Some(log_file_path) = log_file {
        let directory = log_file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = log_file_path
            .file_name()
            .ok_or_else(|| anyhow!("Log file has no name: {}", log_file_path.display()))?;
        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            LogFormat::Compact => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path.display());
        return Ok(Some(guard));
    }

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(None)
}
