//! Types and error helpers shared by every lingua crate.

pub mod error;
pub mod types;

pub use error::FromMessage;
