//! netsample: watch host network byte counters from the terminal.
//!
//! Shows:
//!   - aggregate rx+tx throughput over a one-second window
//!   - cumulative sent/received bytes of one uid
//!
//! `--once` prints a single sample and exits. Keybindings: F1 or '?' for help.

mod app;
mod input;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use netsample::system::network::{format_bytes, format_rate};
use netsample::system::uid_stat::UidStatReader;
use netsample::{
    init_tracing, HostCounters, LogTarget, NetsampleConfig, NetworkByteSampler,
    NetworkSpeedMonitor,
};

use app::App;

/// UI redraw interval in milliseconds
const TICK_RATE_MS: u64 = 250;

const LOG_FILE: &str = "netsample.log";

#[derive(Parser, Debug)]
#[command(name = "netsample", version, about = "Sample host network byte counters")]
struct Cli {
    /// uid whose sent/received bytes are tracked
    #[arg(short, long)]
    uid: Option<u32>,

    /// Throughput window in milliseconds
    #[arg(short, long)]
    window_ms: Option<u64>,

    /// Pause between throughput samples in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Print one sample and exit
    #[arg(long)]
    once: bool,

    /// Config file (default: netsample/netsamplerc in the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level or filter directive, e.g. "debug" or "netsample=trace"
    #[arg(long)]
    log_level: Option<String>,

    /// Directory for daily rolling log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Count loopback interfaces in the totals
    #[arg(long)]
    include_loopback: bool,
}

impl Cli {
    /// Config file values overridden by command line flags
    fn resolve_config(&self) -> Result<NetsampleConfig> {
        let mut cfg = match &self.config {
            Some(path) => NetsampleConfig::load_from(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => NetsampleConfig::load().context("failed to load config")?,
        };

        if let Some(uid) = self.uid {
            cfg.uid = Some(uid);
        }
        if let Some(window_ms) = self.window_ms {
            cfg.set_window_ms(window_ms);
        }
        if let Some(interval_ms) = self.interval_ms {
            cfg.set_speed_interval_ms(interval_ms);
        }
        if let Some(level) = &self.log_level {
            cfg.log_level = level.clone();
        }
        if let Some(dir) = &self.log_dir {
            cfg.log_dir = Some(dir.clone());
        }
        if self.include_loopback {
            cfg.include_loopback = true;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.resolve_config()?;

    let fallback = if cli.once { LogTarget::Stderr } else { LogTarget::Discard };
    let _guard = init_tracing(cfg.log_dir.as_deref(), LOG_FILE, &cfg.log_level, fallback);

    if cli.once {
        return run_once(&cfg);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = run_app(&mut terminal, &cfg);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn host_counters(cfg: &NetsampleConfig) -> HostCounters {
    HostCounters::with_options(cfg.include_loopback, UidStatReader::new())
}

/// Take one throughput sample (blocks for the window) and print it
fn run_once(cfg: &NetsampleConfig) -> Result<()> {
    let sampler = NetworkByteSampler::with_window(host_counters(cfg), cfg.window());

    let sample = sampler.measure_instantaneous_throughput();
    info!(bytes = sample.bytes, elapsed_ms = sample.elapsed.as_millis() as u64, "sampled");
    println!(
        "throughput: {} ({} bytes in {}ms)",
        format_rate(sample.bytes),
        sample.bytes,
        sample.elapsed.as_millis()
    );

    if let Some(uid) = cfg.uid {
        match sampler.query_per_app_byte_usage(uid) {
            Some(usage) => println!(
                "uid {}: sent {} ({}), received {} ({})",
                uid,
                format_bytes(usage.bytes_sent),
                usage.bytes_sent,
                format_bytes(usage.bytes_received),
                usage.bytes_received
            ),
            None => println!("uid {}: per-uid counters unavailable on this host", uid),
        }
    }

    Ok(())
}

/// Main application loop
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, cfg: &NetsampleConfig) -> Result<()> {
    let uid_stats = UidStatReader::new();
    let per_uid_supported = uid_stats.is_supported();

    let monitor = NetworkSpeedMonitor::with_intervals(
        HostCounters::with_options(cfg.include_loopback, uid_stats),
        cfg.window(),
        cfg.speed_interval(),
        cfg.usage_interval(),
    );
    monitor.start();
    if let Some(uid) = cfg.uid {
        monitor.set_app_uid(uid);
    }

    let mut app = App::new(cfg, per_uid_supported);
    let tick_rate = Duration::from_millis(TICK_RATE_MS);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if app.should_quit {
            break;
        }

        // Handle events with short timeout for responsiveness
        let timeout = Duration::from_millis(50);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // On Windows, crossterm fires Press and Release; only handle Press
                if key.kind == KeyEventKind::Press {
                    input::handle_input(&mut app, key);
                    if app.should_quit {
                        break;
                    }
                }
            }
        }

        let now = Instant::now();
        if now.duration_since(last_tick) >= tick_rate {
            app.refresh(&monitor);
            last_tick = now;
        }
    }

    monitor.stop();
    Ok(())
}
