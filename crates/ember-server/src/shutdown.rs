//! Graceful shutdown signalling.
//!
//! A [`Shutdown`] is an atomic flag plus the listener descriptor to poke
//! when the flag is raised. The signal handler does nothing beyond
//! setting the flag and calling `shutdown(2)` on the listener (both
//! async-signal-safe), which unblocks the acceptor's `accept`.
//!
//! The process-wide instance wired to SIGINT/SIGTERM lives in
//! [`global()`]; tests run servers against their own instances.

use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Shutdown flag shared by the acceptor and the workers.
#[derive(Debug)]
pub struct Shutdown {
    requested: AtomicBool,
    listener_fd: AtomicI32,
}

impl Shutdown {
    /// Creates a flag in the not-requested state.
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            listener_fd: AtomicI32::new(-1),
        }
    }

    /// Returns true once shutdown has been requested.
    #[inline]
    pub fn requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Requests shutdown: raises the flag and unblocks the acceptor.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        let fd = self.listener_fd.load(Ordering::Acquire);
        if fd >= 0 {
            // Safety: shutdown(2) on an fd we registered; a stale or
            // already-closed fd yields a harmless error return.
            unsafe {
                libc::shutdown(fd, libc::SHUT_RDWR);
            }
        }
    }

    /// Registers the listening socket to poke on shutdown.
    pub fn register_listener(&self, fd: RawFd) {
        self.listener_fd.store(fd, Ordering::Release);
    }

    /// Clears the registered listener.
    pub fn clear_listener(&self) {
        self.listener_fd.store(-1, Ordering::Release);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Shutdown = Shutdown::new();

/// Returns the process-wide shutdown flag targeted by the signal handler.
pub fn global() -> &'static Shutdown {
    &GLOBAL
}

extern "C" fn handle_signal(_signum: libc::c_int) {
    // Only flag-set and shutdown(2) happen here; both are signal-safe.
    GLOBAL.request();
}

/// Installs SIGINT and SIGTERM handlers that request global shutdown.
pub fn install_signal_handlers() -> io::Result<()> {
    // Safety: sa_mask/sa_flags zeroed, handler is a plain extern "C" fn.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);

        for signum in [libc::SIGINT, libc::SIGTERM] {
            if libc::sigaction(signum, &action, std::ptr::null_mut()) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
    }
    Ok(())
}
