pub mod client;
pub mod interpretation;

pub use client::{Classifier, ClassifierClient};
pub use interpretation::interpret;
