//! netsample: sample host network byte counters.
//!
//! Two blocking queries sit at the core:
//!   - aggregate throughput over a one-second window ([`NetworkByteSampler::measure_instantaneous_throughput`])
//!   - cumulative per-uid sent/received bytes ([`NetworkByteSampler::query_per_app_byte_usage`])
//!
//! [`NetworkSpeedMonitor`] runs them periodically on worker threads.

pub mod config;
pub mod error;
pub mod logging;
pub mod system;

pub use config::NetsampleConfig;
pub use error::{Result, SampleError};
pub use logging::{init_tracing, LogTarget};
pub use system::counters::{ByteCount, ByteCounterSource};
pub use system::host::HostCounters;
pub use system::interrupt::{Interrupt, WaitOutcome};
pub use system::monitor::{current_speed, NetworkSpeedMonitor};
pub use system::network::NetworkSpeed;
pub use system::sampler::{
    NetworkByteSampler, PerAppByteUsage, ThroughputSample, DEFAULT_SAMPLE_WINDOW,
};
