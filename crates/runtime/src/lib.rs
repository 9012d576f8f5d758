pub mod debounce;
pub mod event_bus;
pub mod metrics;
pub mod task;

pub use debounce::*;
pub use event_bus::*;
pub use metrics::*;
pub use task::*;
