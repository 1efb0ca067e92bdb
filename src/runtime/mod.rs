//! Application lifecycle
//!
//! The entry point owns resource construction and the server loop. It
//! decides whether this process is the primary replica and, only then,
//! registers the ranking refresher on the scheduler.

pub mod server;
pub mod startup;

pub use server::run_server;
