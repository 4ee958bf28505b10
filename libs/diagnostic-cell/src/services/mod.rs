// libs/diagnostic-cell/src/services/mod.rs
pub mod pipeline;
pub mod review;

pub use pipeline::DiagnosticPipeline;
pub use review::PhysicianReviewService;
