//! `atyper` — type a message into the focused window, repeatedly.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use auto_typer::job::parse_duration;
use auto_typer::{
    CancellationToken, Injector, Job, LiveInjector, RunState, Scheduler, SimulatedInjector,
    Status, StatusSink, StopHotkey,
};

#[derive(Parser, Debug)]
#[command(
    name = "atyper",
    version,
    about = "Types a message into whatever window holds focus, repeatedly"
)]
struct Cli {
    /// Message to type. Required unless --config provides one.
    message: Option<String>,

    /// Load the job from a JSON file (other flags override its fields).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Delay between characters, e.g. "30ms".
    #[arg(long, value_name = "DURATION")]
    char_delay: Option<String>,

    /// Delay between messages, e.g. "1.5s".
    #[arg(short = 'd', long, value_name = "DURATION")]
    delay: Option<String>,

    /// Randomize the message delay by up to +/- this much, e.g. "250ms".
    #[arg(short, long, value_name = "DURATION")]
    jitter: Option<String>,

    /// Do not press Enter after each message.
    #[arg(long)]
    no_enter: bool,

    /// How many messages to type (0 = until stopped).
    #[arg(short, long, value_name = "COUNT")]
    repeat: Option<u32>,

    /// Countdown before the first message, e.g. "5s".
    #[arg(long, value_name = "DURATION")]
    countdown: Option<String>,

    /// Echo keystrokes to the terminal instead of sending them.
    #[arg(short, long)]
    simulate: bool,

    /// Global hotkey that stops the run, e.g. "ctrl+alt+s".
    #[arg(long, value_name = "KEYS")]
    stop_hotkey: Option<String>,

    /// Write the effective job to a JSON file and exit.
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Renders status reports on the terminal.
struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn report(&self, status: Status) {
        let line = status.to_string();
        match status {
            Status::Completed => println!("{}", line.green()),
            Status::Stopped => println!("{}", line.yellow()),
            Status::Failed(_) => eprintln!("{}", line.red()),
            Status::CountdownTick(_) => println!("{}", line.cyan()),
            _ => println!("{line}"),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_job(cli: &Cli) -> Result<Job> {
    let mut job = match &cli.config {
        Some(path) => Job::from_file(&path.display().to_string())?,
        None => Job::default(),
    };

    if let Some(message) = &cli.message {
        job.message = message.clone();
    }
    if let Some(value) = &cli.char_delay {
        job.char_delay = parse_duration(value)?;
    }
    if let Some(value) = &cli.delay {
        job.message_delay = parse_duration(value)?;
    }
    if let Some(value) = &cli.jitter {
        job.jitter = Some(parse_duration(value)?);
    }
    if cli.no_enter {
        job.press_enter = false;
    }
    if let Some(repeat) = cli.repeat {
        job.repeat_count = repeat;
    }
    if let Some(value) = &cli.countdown {
        job.countdown = parse_duration(value)?;
    }
    if cli.simulate {
        job.simulate = true;
    }

    if job.message.trim().is_empty() {
        bail!("no message to type; pass one as an argument or via --config");
    }
    Ok(job)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let job = build_job(&cli)?;

    if let Some(path) = &cli.save_config {
        let path = path.display().to_string();
        job.save_to_file(&path)?;
        println!("Job saved to {path}");
        return Ok(());
    }

    let injector: Arc<dyn Injector> = if job.simulate {
        Arc::new(SimulatedInjector::new().with_echo())
    } else {
        Arc::new(LiveInjector::with_platform_backend())
    };
    let scheduler = Arc::new(Scheduler::new(injector, Arc::new(ConsoleSink)));

    let listener_shutdown = CancellationToken::new();
    if let Some(spec) = &cli.stop_hotkey {
        match StopHotkey::register(spec) {
            Ok(hotkey) => {
                let remote = Arc::clone(&scheduler);
                hotkey.spawn_listener(listener_shutdown.clone(), move || remote.cancel());
                println!("Press {spec} to stop.");
            }
            Err(e) => tracing::warn!(error = %e, "stop hotkey unavailable, continuing without it"),
        }
    }

    scheduler.start(job)?;

    // ctrl-c works while the terminal has focus; the stop hotkey covers
    // the rest.
    let interrupt = tokio::spawn({
        let remote = Arc::clone(&scheduler);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping");
                remote.cancel();
            }
        }
    });

    let state = scheduler.wait().await;
    interrupt.abort();
    listener_shutdown.cancel();

    if state == Some(RunState::Failed) {
        bail!("run did not complete");
    }
    Ok(())
}
