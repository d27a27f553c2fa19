pub mod instrument;
pub mod status;
pub mod trace_context;

pub use instrument::{instrument, InstrumentedRoute, Instrumentation, ServiceInfo};
pub use status::StatusWriter;
pub use trace_context::TraceContext;
