//! The page server.
//!
//! A blocking acceptor on a Unix domain socket, one worker thread per
//! connection. Workers loop reading the fixed request header, dispatch
//! GET/SET against the shared [`PageStore`], and echo the page size back.
//! Framing is preserved on page-operation failure; the client at worst
//! sees a stale or zeroed payload.

use std::fs;
use std::io::{self, Read, Write};
use std::net::Shutdown as SocketShutdown;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ember_common::constants::STAGING_BUFFER_SIZE;
use ember_storage::PageStore;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::protocol::{encode_size_echo, MsgType, RequestHeader};
use crate::shutdown::{self, Shutdown};

/// Errors fatal to the server as a whole.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The socket could not be bound. Fatal at startup.
    #[error("cannot bind socket {path}: {source}")]
    Bind {
        /// The socket path.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
}

/// A connection worker: its thread plus a duplicate of the stream so the
/// acceptor can unblock it at shutdown.
struct Worker {
    handle: JoinHandle<()>,
    stream: UnixStream,
}

/// The page server.
pub struct Server {
    store: Arc<dyn PageStore>,
    socket_path: PathBuf,
    shutdown: &'static Shutdown,
}

impl Server {
    /// Creates a server wired to the process-wide shutdown flag.
    pub fn new(store: Arc<dyn PageStore>, socket_path: impl AsRef<Path>) -> Self {
        Self::with_shutdown(store, socket_path, shutdown::global())
    }

    /// Creates a server with an explicit shutdown flag (used by tests).
    pub fn with_shutdown(
        store: Arc<dyn PageStore>,
        socket_path: impl AsRef<Path>,
        shutdown: &'static Shutdown,
    ) -> Self {
        Self {
            store,
            socket_path: socket_path.as_ref().to_path_buf(),
            shutdown,
        }
    }

    /// Binds the socket and serves until shutdown is requested.
    ///
    /// The socket path is unlinked before bind and again on exit. On
    /// shutdown the acceptor stops, worker streams are shut down so
    /// blocked reads return, in-flight operations complete, workers are
    /// joined, and the store is flushed.
    pub fn run(&self) -> Result<(), ServerError> {
        // A stale socket file from a previous run would fail the bind.
        let _ = fs::remove_file(&self.socket_path);
        let listener = UnixListener::bind(&self.socket_path).map_err(|e| ServerError::Bind {
            path: self.socket_path.clone(),
            source: e,
        })?;
        self.shutdown.register_listener(listener.as_raw_fd());
        info!(path = %self.socket_path.display(), "listening");

        let mut workers: Vec<Worker> = Vec::new();
        let mut next_index = 0usize;

        while !self.shutdown.requested() {
            let stream = match listener.accept() {
                Ok((stream, _addr)) => stream,
                Err(e) => {
                    if self.shutdown.requested() {
                        info!("accept aborted by shutdown");
                    } else {
                        error!(error = %e, "accept failed");
                    }
                    break;
                }
            };

            let peer = match stream.try_clone() {
                Ok(peer) => peer,
                Err(e) => {
                    error!(error = %e, "cannot clone client stream");
                    continue;
                }
            };

            let index = next_index;
            next_index += 1;
            let store = Arc::clone(&self.store);
            let flag = self.shutdown;
            let spawned = thread::Builder::new()
                .name(format!("ember-worker-{index}"))
                .spawn(move || handle_connection(store, stream, index, flag));

            match spawned {
                Ok(handle) => {
                    debug!(worker = index, "connection accepted");
                    workers.push(Worker {
                        handle,
                        stream: peer,
                    });
                }
                Err(e) => {
                    error!(error = %e, "cannot spawn worker thread");
                    let _ = peer.shutdown(SocketShutdown::Both);
                }
            }
        }

        info!(workers = workers.len(), "shutting down");
        for worker in &workers {
            let _ = worker.stream.shutdown(SocketShutdown::Both);
        }
        for worker in workers {
            if worker.handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
        self.shutdown.clear_listener();

        if let Err(e) = self.store.flush() {
            error!(error = %e, "flush at shutdown failed");
        }
        if let Some(rate) = self.store.hit_rate() {
            info!(
                hits = rate.hits,
                misses = rate.misses,
                percent = rate.percent(),
                "cache hit rate"
            );
        }

        let _ = fs::remove_file(&self.socket_path);
        info!("server closed");
        Ok(())
    }
}

/// Serves one connection until it closes, errs, or shutdown is requested.
fn handle_connection(
    store: Arc<dyn PageStore>,
    mut stream: UnixStream,
    worker: usize,
    shutdown: &'static Shutdown,
) {
    // Staging for the largest supported page; requests above it would
    // desynchronise the stream, so they terminate the connection.
    let mut staging = vec![0u8; STAGING_BUFFER_SIZE];
    let mut header_buf = [0u8; RequestHeader::SIZE];

    while !shutdown.requested() {
        match stream.read_exact(&mut header_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                debug!(worker, "connection closed");
                break;
            }
            Err(e) => {
                error!(worker, error = %e, "header read failed");
                break;
            }
        }

        let header = RequestHeader::decode(&header_buf);
        let size = header.page_size as usize;
        // Unknown types carry no payload, so the size only matters once
        // the type is known.
        if header.kind().is_some() && size > staging.len() {
            error!(worker, size, "page size exceeds staging buffer");
            break;
        }

        match header.kind() {
            Some(MsgType::Set) => {
                if let Err(e) = stream.read_exact(&mut staging[..size]) {
                    error!(worker, error = %e, "short payload read");
                    break;
                }
                if let Err(e) =
                    store.write_page(header.page_no, size, &staging[..size], worker)
                {
                    warn!(worker, page = %header.page_no, error = %e, "write_page failed");
                }
                if stream.write_all(&encode_size_echo(header.page_size)).is_err() {
                    break;
                }
            }
            Some(MsgType::Get) => {
                if let Err(e) =
                    store.read_page(header.page_no, size, &mut staging[..size], worker)
                {
                    warn!(worker, page = %header.page_no, error = %e, "read_page failed");
                }
                if stream.write_all(&encode_size_echo(header.page_size)).is_err() {
                    break;
                }
                if stream.write_all(&staging[..size]).is_err() {
                    break;
                }
            }
            None => {
                // Unknown type: no payload is defined for it, so the next
                // bytes are the next header. Log and keep reading.
                error!(worker, msg_type = header.msg_type, "invalid message type");
            }
        }
    }

    debug!(worker, "worker exit");
    if let Some(rate) = store.hit_rate() {
        debug!(
            worker,
            hits = rate.hits,
            misses = rate.misses,
            "hit rate at worker exit"
        );
    }
    let _ = stream.shutdown(SocketShutdown::Both);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_common::config::PageLayout;
    use ember_storage::LruPool;
    use tempfile::tempdir;

    #[test]
    fn test_bind_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let layout = PageLayout::from_ranges([(8, 2)]);
        let pool = LruPool::open(dir.path().join("x.db"), &layout).unwrap();

        let server = Server::new(Arc::new(pool), "/no/such/dir/ember.sock");
        let err = server.run().unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }

    #[test]
    fn test_bind_replaces_stale_socket_file() {
        let dir = tempdir().unwrap();
        let sock = dir.path().join("stale.sock");
        fs::write(&sock, b"stale").unwrap();

        let layout = PageLayout::from_ranges([(8, 2)]);
        let pool = LruPool::open(dir.path().join("x.db"), &layout).unwrap();

        let flag: &'static Shutdown = Box::leak(Box::new(Shutdown::new()));
        let server = Server::with_shutdown(Arc::new(pool), &sock, flag);

        // Stop the server as soon as the listener is up.
        let sock_probe = sock.clone();
        let stopper = thread::spawn(move || {
            while !sock_probe.exists() {
                thread::yield_now();
            }
            flag.request();
            // In case the flag was raised before the listener registered,
            // a connect also unblocks the acceptor.
            let _ = UnixStream::connect(&sock_probe);
        });

        server.run().unwrap();
        stopper.join().unwrap();
        assert!(!sock.exists());
    }
}
