//! Result Validator: checks every factorization delivered by the masters.
//!
//! The fixture's factorization is deterministic, so a single wrong result
//! means the message passing corrupted or misrouted data. Validation stops at
//! the first mismatch.

use crate::{
    Error, Result,
    conduit,
    config::{FACTOR_1, FACTOR_2},
    factor::Factors,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Accepts exactly the two fixture primes, in either order.
///
/// # Errors
///
/// Returns [`Error::InvalidResult`] carrying `factors` on any mismatch.
pub fn check_result(factors: &[u64]) -> Result<()> {
    match factors {
        [FACTOR_1, FACTOR_2] | [FACTOR_2, FACTOR_1] => Ok(()),
        _ => Err(Error::InvalidResult {
            factors: factors.to_vec(),
        }),
    }
}

/// Receives and checks `expected` results from the shared conduit.
///
/// Results may arrive in any interleaving across masters.
///
/// # Errors
///
/// - [`Error::InvalidResult`] on the first malformed result.
/// - [`Error::ResultCount`] if the conduit closes before `expected` results.
/// - [`Error::Cancelled`] if `cancel` fires first.
pub async fn collect_results(
    results: &mut mpsc::Receiver<Factors>,
    expected: u64,
    cancel: &CancellationToken,
) -> Result<u64> {
    let mut received = 0;

    while received < expected {
        let Some(factors) = conduit::recv(results, cancel).await? else {
            return Err(Error::ResultCount { expected, received });
        };
        check_result(&factors)?;
        received += 1;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Validated {received} results");

    Ok(received)
}

/// Confirms that nothing beyond the expected results was delivered.
///
/// Call once every producer has finished, so the conduit is closed.
///
/// # Errors
///
/// Returns [`Error::ResultCount`] if a surplus result is still queued.
pub fn ensure_drained(results: &mut mpsc::Receiver<Factors>, expected: u64) -> Result<()> {
    let mut surplus = 0;
    while results.try_recv().is_ok() {
        surplus += 1;
    }

    if surplus == 0 {
        Ok(())
    } else {
        Err(Error::ResultCount {
            expected,
            received: expected + surplus,
        })
    }
}
