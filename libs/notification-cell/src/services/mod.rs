// libs/notification-cell/src/services/mod.rs
pub mod notifier;
pub mod report_view;

pub use notifier::VisibilityNotifier;
