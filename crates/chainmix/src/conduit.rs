//! Cancellable send/receive helpers shared by every task in the benchmark.
//!
//! Each blocking conduit operation is raced against the run's
//! [`CancellationToken`]. Cancellation wins ties (`biased`), so a cancelled
//! run never makes further progress even when a message is ready.

use crate::{Error, Result};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// A pipeline token. `0` is the end-of-stream sentinel.
pub type Token = u64;

/// The reserved end-of-stream token.
pub const SENTINEL: Token = 0;

/// Sends `value`, or fails with [`Error::Cancelled`] if `cancel` fires first.
///
/// `context` names the conduit in the error raised when the receiver is gone.
pub async fn send<T>(
    tx: &mpsc::Sender<T>,
    value: T,
    cancel: &CancellationToken,
    context: &str,
) -> Result<()> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        sent = tx.send(value) => sent.map_err(|_| Error::channel(format!("{context}: receiver dropped"))),
    }
}

/// Receives the next value, or fails with [`Error::Cancelled`] if `cancel`
/// fires first.
///
/// Returns `Ok(None)` once every sender has been dropped.
pub async fn recv<T>(rx: &mut mpsc::Receiver<T>, cancel: &CancellationToken) -> Result<Option<T>> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        value = rx.recv() => Ok(value),
    }
}

/// Like [`recv`], but a closed conduit is an error.
pub async fn recv_expected<T>(
    rx: &mut mpsc::Receiver<T>,
    cancel: &CancellationToken,
    context: &str,
) -> Result<T> {
    recv(rx, cancel)
        .await?
        .ok_or_else(|| Error::channel(format!("{context}: all senders dropped")))
}

/// Waits on a one-shot completion signal.
pub async fn wait<T>(
    rx: oneshot::Receiver<T>,
    cancel: &CancellationToken,
    context: &str,
) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        value = rx => value.map_err(|_| Error::channel(format!("{context}: signal dropped"))),
    }
}
