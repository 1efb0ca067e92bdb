//! Platform abstraction and system utilities

pub mod logging;
pub mod shutdown;
