//! Advisory file locks with bounded retry

use std::fs::{File, TryLockError};
use std::path::Path;

use crate::config::RetryPolicy;
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockKind {
    Shared,
    Exclusive,
}

/// Lock `file`, sleeping between attempts while another holder has it.
///
/// One initial attempt plus `policy.attempts` retries, each retry preceded
/// by one sleep. Fails with `LockTimeout` once the budget is spent.
pub(crate) fn lock_file(
    file: &File,
    path: &Path,
    kind: LockKind,
    policy: &RetryPolicy,
) -> Result<()> {
    let mut retries = 0u32;

    loop {
        let outcome = match kind {
            LockKind::Shared => file.try_lock_shared(),
            LockKind::Exclusive => file.try_lock(),
        };

        match outcome {
            Ok(()) => {
                if retries > 0 {
                    tracing::debug!("Acquired lock on {} after {} retries", path.display(), retries);
                }
                return Ok(());
            }
            Err(TryLockError::WouldBlock) => {
                if retries >= policy.attempts {
                    tracing::warn!(
                        "Giving up on {} after {} attempts",
                        path.display(),
                        retries + 1
                    );
                    return Err(StoreError::LockTimeout {
                        path: path.to_path_buf(),
                        attempts: retries + 1,
                    });
                }
                if retries == 0 {
                    tracing::debug!("{} is locked by another holder, retrying", path.display());
                }
                policy.sleep();
                retries += 1;
            }
            Err(TryLockError::Error(e)) => return Err(StoreError::Io(e)),
        }
    }
}
