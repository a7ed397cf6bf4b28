use std::time::Duration;

use netsample::{ByteCounterSource, NetsampleConfig, NetworkSpeed, NetworkSpeedMonitor, PerAppByteUsage};

/// Which view/mode the app is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Help,
}

/// Main application state
pub struct App {
    pub mode: AppMode,
    pub should_quit: bool,
    pub paused: bool, // z key: freeze display

    // Latest published values
    pub speed: NetworkSpeed,
    pub usage: Option<PerAppByteUsage>,

    // Sampling setup (read-only in the UI)
    pub uid: Option<u32>,
    pub per_uid_supported: bool,
    pub include_loopback: bool,
    pub window: Duration,
    pub speed_interval: Duration,
    pub usage_interval: Duration,

    // Tick counter for refresh
    pub tick: u64,
}

impl App {
    pub fn new(config: &NetsampleConfig, per_uid_supported: bool) -> Self {
        Self {
            mode: AppMode::Normal,
            should_quit: false,
            paused: false,
            speed: NetworkSpeed::empty(),
            usage: None,
            uid: config.uid,
            per_uid_supported,
            include_loopback: config.include_loopback,
            window: config.window(),
            speed_interval: config.speed_interval(),
            usage_interval: config.usage_interval(),
            tick: 0,
        }
    }

    /// Pull the latest values from the monitor
    pub fn refresh<S: ByteCounterSource + 'static>(&mut self, monitor: &NetworkSpeedMonitor<S>) {
        self.apply(monitor.speed(), monitor.usage());
    }

    pub fn apply(&mut self, speed: NetworkSpeed, usage: Option<PerAppByteUsage>) {
        if self.paused {
            return;
        }
        self.speed = speed;
        self.usage = usage;
        self.tick += 1;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Whether a sample has been published yet
    pub fn has_sample(&self) -> bool {
        !self.speed.is_empty()
    }
}
