pub mod hardware;
pub mod process;
pub mod stats;

pub use hardware::{FanMetrics, HardwareKind, HardwareMetrics, NpuMetrics, PsuMetrics};
pub use process::{ProcessConfig, ProcessRecord, ProcessSample, ProcessState};
pub use stats::MemoryStats;
