//! Domain models for the mailer

pub mod email;
pub mod mailer;

pub use email::*;
pub use mailer::*;
