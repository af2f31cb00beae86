//! Forwarding Stage: one link of a pipeline.

use crate::{
    Result,
    conduit::{self, SENTINEL, Token},
};
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// Spawns a stage that relays tokens from `input` into a new conduit of
/// `capacity` slots, and returns the receiving end of that conduit.
///
/// The stage forwards every token in order, including the sentinel, and
/// stops right after forwarding the sentinel. The task is spawned into
/// `stages` so the owner can join it.
///
/// # Panics
///
/// Panics if `capacity` is zero or if called outside of a tokio runtime.
pub fn spawn_stage(
    stage_id: usize,
    input: mpsc::Receiver<Token>,
    capacity: usize,
    cancel: &CancellationToken,
    stages: &mut JoinSet<Result<u64>>,
) -> mpsc::Receiver<Token> {
    let (output, next) = mpsc::channel(capacity);
    stages.spawn(forward_tokens(stage_id, input, output, cancel.clone()));
    next
}

/// Stage task body. Returns the number of tokens forwarded, sentinel
/// included.
///
/// An input conduit that closes before the sentinel arrived is reported as a
/// channel error rather than waited on forever.
async fn forward_tokens(
    _stage_id: usize,
    mut input: mpsc::Receiver<Token>,
    output: mpsc::Sender<Token>,
    cancel: CancellationToken,
) -> Result<u64> {
    let mut forwarded = 0;

    loop {
        let token = conduit::recv_expected(&mut input, &cancel, "stage input").await?;
        conduit::send(&output, token, &cancel, "stage output").await?;
        forwarded += 1;

        if token == SENTINEL {
            #[cfg(feature = "tracing")]
            tracing::trace!("Stage {_stage_id} forwarded sentinel after {forwarded} tokens");
            return Ok(forwarded);
        }
    }
}
