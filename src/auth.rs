//! OAuth session state and secret wrappers.

pub mod secret;
pub mod session;

pub use secret::*;
pub use session::*;
