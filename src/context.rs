use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Outbound queue capacity. Lines enqueued while it is full are dropped.
pub const SEND_BUFFER_SIZE: usize = 512;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConnectionStatus {
    Disconnected,
    /// Dialing; a second connect is refused but nothing can be sent yet.
    Connecting,
    Connected,
}

/// Session-wide stop signal, closed at most once.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the signal. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.token.cancel();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub async fn closed(&self) {
        self.token.cancelled().await
    }

    /// Whether `other` is a clone of this signal rather than another session's.
    pub fn same_as(&self, other: &Shutdown) -> bool {
        Arc::ptr_eq(&self.closed, &other.closed)
    }
}

/// Everything guarded by the connection lock.
#[derive(Debug)]
pub struct State {
    pub status: ConnectionStatus,
    pub outbound: Option<mpsc::Sender<String>>,
    pub shutdown: Shutdown,
    /// A disconnect arrived while dialing; the dial is discarded once it
    /// completes.
    pub cancel_dial: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            outbound: None,
            shutdown: Shutdown::new(),
            cancel_dial: false,
        }
    }
}
