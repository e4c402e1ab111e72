//! # ember-server
//!
//! The EmberDB page server: accepts connections on a Unix domain socket
//! and serves fixed-frame GET/SET page requests against a
//! [`ember_storage::PageStore`].
//!
//! One OS thread is spawned per accepted connection; workers block on
//! socket reads, the pool mutex, frame latches, and disk I/O. A SIGINT or
//! SIGTERM sets a process-wide shutdown flag, unblocks the acceptor, lets
//! in-flight operations finish, flushes the store, and removes the socket
//! file.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod protocol;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use protocol::{MsgType, RequestHeader};
pub use server::{Server, ServerError};
pub use shutdown::Shutdown;
