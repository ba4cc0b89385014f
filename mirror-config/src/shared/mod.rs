mod base;
mod connection;
mod orchestrator;
mod sentry;
mod source;

pub use base::*;
pub use connection::*;
pub use orchestrator::*;
pub use sentry::*;
pub use source::*;
