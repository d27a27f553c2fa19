pub mod exposition;
pub mod store;

pub use store::{MetricsSnapshot, MetricsStore};

/// Rejected histogram configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error("histogram needs at least one bucket boundary")]
    EmptyBuckets,

    #[error("bucket boundary #{index} ({value}) must be a finite positive number of seconds")]
    InvalidBoundary { index: usize, value: f64 },

    #[error("bucket boundary #{index} ({value}) must be greater than the previous one ({previous})")]
    NotAscending {
        index: usize,
        previous: f64,
        value: f64,
    },
}
