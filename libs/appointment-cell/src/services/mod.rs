// libs/appointment-cell/src/services/mod.rs
pub mod lifecycle;
pub mod workflow;

pub use lifecycle::AppointmentLifecycleService;
pub use workflow::AppointmentWorkflowService;
