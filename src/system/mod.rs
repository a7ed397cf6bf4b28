pub mod counters;
pub mod host;
pub mod interrupt;
pub mod monitor;
pub mod network;
pub mod sampler;
pub mod uid_stat;
