//! Cooperative cancellation.
//!
//! A [`CancelHandle`] is held by whoever owns the request (an HTTP handler, a
//! CLI command); the matching [`Cancellation`] is passed down into retry
//! loops, which check it before each attempt and race it against backoff
//! sleeps. An attempt that is already running is never interrupted.

use tokio::sync::watch;

/// The owning side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals cancellation to every linked [`Cancellation`].
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns a new receiver linked to this handle.
    pub fn cancellation(&self) -> Cancellation {
        Cancellation {
            rx: self.tx.subscribe(),
        }
    }
}

/// The observing side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    /// Creates a linked handle and receiver.
    pub fn new() -> (CancelHandle, Cancellation) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Cancellation { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_handle, cancellation) = Self::new();
        cancellation
    }

    /// Returns `true` once the handle has cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the handle cancels.
    ///
    /// If the handle is dropped without cancelling this never resolves.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
