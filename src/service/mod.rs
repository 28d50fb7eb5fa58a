//! Templated sending and mailer construction

pub mod factory;
pub mod mailer;

pub use factory::{create_mailer, create_provider};
pub use mailer::Mailer;
