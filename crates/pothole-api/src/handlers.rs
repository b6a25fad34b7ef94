//! Request handlers.

pub mod detect;
pub mod health;
pub mod samples;

pub use detect::*;
pub use health::*;
pub use samples::*;
