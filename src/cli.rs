use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::app::{
    self, CreateSessionFromPresetRequest, CreateSessionRequest, SessionRepository,
    SessionResponse,
};
use crate::audio::{AudioOutput, NullOutput, RodioOutput};
use crate::db::{Database, InMemorySessionRepository};
use crate::domain::{compute_left_right, find_preset, BeatSpec, CenterBeat, LeftRight};
use crate::engine::{EngineState, PlaybackEngine};
use crate::settings::{PlaybackSettings, SettingsStore};
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

const SETTINGS_FILE: &str = "settings.json";
const DATABASE_FILE: &str = "simbeat.db";

#[derive(Parser, Debug)]
#[command(name = "simbeat", version, about = "Binaural beat generator with live retuning")]
pub struct Cli {
    /// Directory holding settings and saved sessions
    #[arg(long, env = "SIMBEAT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Keep sessions in memory for this run only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a carrier pair, a preset, or a saved session
    Play(PlayArgs),
    /// Print the carriers for a centre frequency and beat
    Retune {
        #[arg(long)]
        center: f64,
        #[arg(long, allow_negative_numbers = true)]
        beat: f64,
    },
    /// List the built-in presets
    Presets,
    /// Manage saved sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsCommand,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["left", "preset", "session"])))]
struct PlayArgs {
    /// Left carrier in Hz
    #[arg(long, requires = "right")]
    left: Option<f64>,
    /// Right carrier in Hz
    #[arg(long, requires = "left")]
    right: Option<f64>,
    /// Preset name, e.g. "Focus (10 Hz)"
    #[arg(long)]
    preset: Option<String>,
    /// Id of a saved session
    #[arg(long)]
    session: Option<String>,
    /// Stop automatically after this many seconds
    #[arg(long)]
    seconds: Option<f64>,
    /// Starting volume, 0 to 1
    #[arg(long)]
    volume: Option<f64>,
    /// Starting pan, -1 (left) to 1 (right)
    #[arg(long, allow_negative_numbers = true)]
    pan: Option<f64>,
    /// Render without an audio device
    #[arg(long)]
    headless: bool,
}

#[derive(Subcommand, Debug)]
enum SessionsCommand {
    List,
    Create {
        /// Defaults to a fresh UUID
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        left: f64,
        #[arg(long)]
        right: f64,
        #[arg(long)]
        label: Option<String>,
    },
    FromPreset {
        /// Defaults to a fresh UUID
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        preset: String,
        #[arg(long)]
        label: Option<String>,
    },
    Delete {
        id: String,
    },
    Clear,
}

/// A line typed while playback is running.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ControlCommand {
    Volume(f64),
    Pan(f64),
    Retune(CenterBeat),
    State,
    Stop,
}

impl ControlCommand {
    fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or_else(|| anyhow!("empty command"))?;
        let mut number = |name: &str| -> Result<f64> {
            let raw = parts
                .next()
                .ok_or_else(|| anyhow!("{verb} expects a {name}"))?;
            raw.parse::<f64>()
                .with_context(|| format!("invalid {name}: {raw}"))
        };

        let command = match verb {
            "vol" | "volume" => Self::Volume(number("volume")?),
            "pan" => Self::Pan(number("pan")?),
            "retune" => Self::Retune(CenterBeat {
                center_hz: number("centre frequency")?,
                beat_hz: number("beat frequency")?,
            }),
            "state" => Self::State,
            "stop" | "quit" | "q" => Self::Stop,
            other => bail!("unknown command: {other}"),
        };
        Ok(command)
    }
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir)?;

    if cli.ephemeral {
        execute(cli.command, data_dir, &InMemorySessionRepository::new()).await
    } else {
        let db = Database::new(data_dir.join(DATABASE_FILE))?;
        execute(cli.command, data_dir, &db).await
    }
}

fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => dirs::data_local_dir()
            .map(|dir| dir.join("simbeat"))
            .ok_or_else(|| anyhow!("could not determine a data directory; pass --data-dir")),
    }
}

async fn execute<R: SessionRepository>(command: Command, data_dir: PathBuf, repo: &R) -> Result<()> {
    match command {
        Command::Play(args) => {
            let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;
            play(args, &settings, repo).await
        }
        Command::Retune { center, beat } => {
            let pair = compute_left_right(CenterBeat {
                center_hz: center,
                beat_hz: beat,
            })?;
            println!("left {} Hz, right {} Hz", pair.left_hz, pair.right_hz);
            Ok(())
        }
        Command::Presets => {
            for preset in app::list_presets()? {
                println!(
                    "{:<24} {:>8} Hz {:>8} Hz",
                    preset.name, preset.left_hz, preset.right_hz
                );
            }
            Ok(())
        }
        Command::Sessions { action } => manage_sessions(action, repo).await,
    }
}

async fn manage_sessions<R: SessionRepository>(action: SessionsCommand, repo: &R) -> Result<()> {
    match action {
        SessionsCommand::List => {
            let sessions = app::list_sessions(repo).await?;
            if sessions.is_empty() {
                println!("no saved sessions");
            }
            for session in &sessions {
                print_session(session);
            }
        }
        SessionsCommand::Create {
            id,
            left,
            right,
            label,
        } => {
            let session = app::create_session(
                repo,
                CreateSessionRequest {
                    id: id.unwrap_or_else(new_session_id),
                    label,
                    left_hz: left,
                    right_hz: right,
                },
            )
            .await?;
            print_session(&session);
        }
        SessionsCommand::FromPreset { id, preset, label } => {
            let session = app::create_session_from_preset(
                repo,
                CreateSessionFromPresetRequest {
                    id: id.unwrap_or_else(new_session_id),
                    label,
                    preset_name: preset,
                },
            )
            .await?;
            print_session(&session);
        }
        SessionsCommand::Delete { id } => {
            if !app::delete_session(repo, &id).await? {
                println!("no session with id {id}");
            }
        }
        SessionsCommand::Clear => app::clear_sessions(repo).await?,
    }
    Ok(())
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn print_session(session: &SessionResponse) {
    println!(
        "{}  {}  {} Hz / {} Hz  beat {} Hz  created {}",
        session.id,
        session.label.as_deref().unwrap_or("-"),
        session.left_hz,
        session.right_hz,
        session.beat_hz,
        session.created_at.to_rfc3339()
    );
}

async fn resolve_pair<R: SessionRepository>(args: &PlayArgs, repo: &R) -> Result<LeftRight> {
    let beat = if let (Some(left), Some(right)) = (args.left, args.right) {
        BeatSpec::from_hz(left, right)?
    } else if let Some(name) = &args.preset {
        find_preset(name)?.beat()?
    } else if let Some(id) = &args.session {
        repo.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("no session with id {id}"))?
            .beat
    } else {
        bail!("nothing to play; pass --left/--right, --preset or --session");
    };

    Ok(LeftRight {
        left_hz: beat.left().hz(),
        right_hz: beat.right().hz(),
    })
}

async fn play<R: SessionRepository>(args: PlayArgs, settings: &SettingsStore, repo: &R) -> Result<()> {
    let pair = resolve_pair(&args, repo).await?;
    let deadline = args
        .seconds
        .map(|seconds| {
            Duration::try_from_secs_f64(seconds)
                .with_context(|| format!("invalid --seconds value: {seconds}"))
        })
        .transpose()?;

    let remembered = settings.playback();
    let output: Arc<dyn AudioOutput> = if args.headless {
        Arc::new(NullOutput::new())
    } else {
        Arc::new(RodioOutput::new())
    };
    let engine = PlaybackEngine::with_playback(output, settings.engine(), remembered);
    if let Some(volume) = args.volume {
        engine.set_volume(volume);
    }
    if let Some(pan) = args.pan {
        engine.set_pan(pan);
    }

    engine.subscribe(Arc::new(|state: EngineState| {
        log::debug!(
            "Engine state: running={} volume={} pan={}",
            state.running,
            state.volume,
            state.pan
        );
    }));

    app::start_playback(&engine, pair).await?;
    println!(
        "Playing {} Hz / {} Hz (beat {} Hz). Commands: vol V, pan P, retune CENTER BEAT, state, stop",
        pair.left_hz,
        pair.right_hz,
        (pair.left_hz - pair.right_hz).abs()
    );

    let outcome = control_loop(&engine, deadline).await;
    app::stop_playback(&engine).await?;

    let current = PlaybackSettings {
        volume: engine.volume(),
        pan: engine.pan(),
    };
    if current != remembered {
        if let Err(err) = settings.update_playback(current) {
            log_warn!("Failed to save playback settings: {err:#}");
        }
    }

    outcome
}

async fn control_loop(engine: &PlaybackEngine, deadline: Option<Duration>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let timeout = async {
        match deadline {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(timeout);

    loop {
        tokio::select! {
            _ = &mut timeout => {
                log_info!("Playback time elapsed");
                return Ok(());
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                return Ok(());
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    if deadline.is_none() {
                        return Ok(());
                    }
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match ControlCommand::parse(&line) {
                    Ok(ControlCommand::Stop) => return Ok(()),
                    Ok(command) => apply(engine, command),
                    Err(err) => println!("{err:#}"),
                }
            }
        }
    }
}

fn apply(engine: &PlaybackEngine, command: ControlCommand) {
    match command {
        ControlCommand::Volume(volume) => engine.set_volume(volume),
        ControlCommand::Pan(pan) => engine.set_pan(pan),
        ControlCommand::Retune(req) => match app::retune_keeping_beat(engine, req) {
            Ok(pair) => println!("now {} Hz / {} Hz", pair.left_hz, pair.right_hz),
            Err(err) => println!("{err}"),
        },
        ControlCommand::State => {
            let state = engine.state();
            let (left, right) = engine.live_frequencies().unwrap_or((0.0, 0.0));
            println!(
                "running {}  volume {:.2}  pan {:.2}  left {left:.2} Hz  right {right:.2} Hz",
                state.running, state.volume, state.pan
            );
        }
        ControlCommand::Stop => {}
    }
}
