pub mod command;
pub mod cpu;
pub mod error;
pub mod platform;
pub mod sampler;
pub mod snapshot;
pub mod volume;

pub use error::{MetricError, MetricResult};
pub use sampler::Sampler;
pub use snapshot::{SampleReport, SystemUsageSnapshot};
