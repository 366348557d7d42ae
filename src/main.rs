use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use stepviz::config::save_speed;
use stepviz::player::PlayerConfig;
use stepviz::{
    chunk_commands, util, BackendRegistry, Command, Config, PlayerState, PlayerTask,
    PlayerUpdate, ReplayEngine, SourceFile,
};

#[derive(Parser)]
#[command(name = "stepviz")]
#[command(about = "Step through algorithm visualization traces")]
#[command(version)]
struct Cli {
    /// Data directory for config and logs (default: ~/.stepviz)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a trace splits into steps
    Chunks {
        file: PathBuf,
        /// Print the chunks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the root view at a step as JSON
    Render {
        file: PathBuf,
        /// Step to render (default: last)
        #[arg(long)]
        cursor: Option<usize>,
    },
    /// Play a trace to the end, printing each step
    Play {
        file: PathBuf,
        /// Playback speed, 0 to 4
        #[arg(long)]
        speed: Option<f64>,
        /// Remember the speed in the config file
        #[arg(long, requires = "speed")]
        save_speed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir.clone());

    // Initialize logging to file (~/.stepviz/logs/stepviz.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();

    let config = Config::load();
    let backends = BackendRegistry::with_defaults(&config.backends)?;

    match cli.command {
        Commands::Chunks { file, json } => chunks(&backends, &file, json).await,
        Commands::Render { file, cursor } => render(&backends, &config, &file, cursor).await,
        Commands::Play {
            file,
            speed,
            save_speed,
        } => play(backends, &config, &file, speed, save_speed).await,
    }
}

async fn trace(backends: &BackendRegistry, file: &Path) -> Result<Vec<Command>> {
    let source = SourceFile::read(file).await?;
    Ok(backends.trace(&source).await?)
}

async fn chunks(backends: &BackendRegistry, file: &Path, json: bool) -> Result<()> {
    let chunks = chunk_commands(trace(backends, file).await?);
    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }
    for (index, chunk) in chunks.iter().enumerate() {
        println!(
            "{:>4}  line {:>4}  {} commands",
            index + 1,
            line_text(chunk.line_number),
            chunk.commands.len()
        );
    }
    println!("{} steps", chunks.len());
    Ok(())
}

async fn render(
    backends: &BackendRegistry,
    config: &Config,
    file: &Path,
    cursor: Option<usize>,
) -> Result<()> {
    let mut engine = ReplayEngine::new(config.playback.checkpoint_interval);
    engine.load(chunk_commands(trace(backends, file).await?));
    let target = cursor.unwrap_or(engine.chunk_count());
    let report = engine.seek(target)?;
    for failure in &report.failures {
        eprintln!(
            "step {}: {} failed: {}",
            failure.chunk + 1,
            failure.method,
            failure.error
        );
    }
    println!("{}", serde_json::to_string_pretty(&engine.render_root())?);
    Ok(())
}

async fn play(
    backends: BackendRegistry,
    config: &Config,
    file: &Path,
    speed: Option<f64>,
    remember: bool,
) -> Result<()> {
    let source = SourceFile::read(file).await?;
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let handle = PlayerTask::spawn(PlayerConfig::from(&config.playback), backends, update_tx);

    if let Some(speed) = speed {
        handle.set_speed(speed);
        if remember {
            save_speed(speed)?;
        }
    }
    handle.open(file.display().to_string());
    handle.build(source);

    let mut started = false;
    let mut shown = 0;
    while let Some(update) = update_rx.recv().await {
        match update {
            PlayerUpdate::Cursor {
                cursor,
                chunk_count,
                line,
            } if cursor > 0 && cursor != shown => {
                shown = cursor;
                println!("step {cursor}/{chunk_count}  line {}", line_text(line));
            }
            PlayerUpdate::Cursor { .. } => {}
            PlayerUpdate::Error(message) => eprintln!("error: {message}"),
            PlayerUpdate::State(PlayerState::Paused) if !started => {
                started = true;
                handle.play();
            }
            PlayerUpdate::State(PlayerState::Paused) => break,
            PlayerUpdate::State(PlayerState::Idle) => {
                handle.shutdown();
                bail!("build failed for {}", file.display());
            }
            PlayerUpdate::State(_) => {}
        }
    }

    handle.shutdown();
    Ok(())
}

fn line_text(line: Option<u32>) -> String {
    line.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string())
}
