//! Optimistic concurrency gate shared by every mutating command.
//!
//! # Invariants
//! - A stale expected version fails before any remote call.
//! - Remote answers map one-to-one onto `CoreError` variants; nothing here
//!   touches the stores.

use crate::error::{CoreError, CoreResult, EntityKind};
use crate::sync::remote::{Mutation, RemoteError, RemoteResult};
use crate::ValidationError;
use log::{error, warn};
use uuid::Uuid;

/// Compares the caller's expected version with the locally stored one.
pub(crate) fn ensure_version(
    kind: EntityKind,
    id: Uuid,
    expected: u64,
    stored: u64,
) -> CoreResult<()> {
    if expected == stored {
        return Ok(());
    }
    warn!(
        "event=version_check module=service status=conflict kind={kind} expected={expected} actual={stored} source=local"
    );
    Err(CoreError::VersionConflict {
        kind,
        id,
        expected,
        actual: stored,
    })
}

/// Maps a remote mutation answer onto the core's error taxonomy.
pub(crate) fn settle<T>(
    kind: EntityKind,
    id: Uuid,
    expected: u64,
    command: &'static str,
    outcome: RemoteResult<Mutation<T>>,
) -> CoreResult<T> {
    match outcome {
        Ok(Mutation::Applied(record)) => Ok(record),
        Ok(Mutation::Conflict { actual }) => {
            warn!(
                "event={command} module=service status=conflict kind={kind} expected={expected} actual={actual} source=remote"
            );
            Err(CoreError::VersionConflict {
                kind,
                id,
                expected,
                actual,
            })
        }
        Ok(Mutation::Missing) => {
            warn!("event={command} module=service status=error kind={kind} error_code=not_found");
            Err(CoreError::not_found(kind, id))
        }
        Err(err) => Err(transport(command, kind, err)),
    }
}

/// Logs and wraps a transport failure.
pub(crate) fn transport(
    command: &'static str,
    kind: EntityKind,
    err: RemoteError,
) -> CoreError {
    warn!(
        "event={command} module=service status=error kind={kind} error_code=transport error_kind={} retryable={}",
        err.kind, err.retryable
    );
    CoreError::Transport(err)
}

/// Flags a server that confirmed something other than `expected + 1`.
pub(crate) fn check_confirmed_version(kind: EntityKind, expected: u64, confirmed: u64) {
    if confirmed != expected.saturating_add(1) {
        warn!(
            "event=version_check module=service status=unexpected kind={kind} expected_next={} confirmed={confirmed}",
            expected.saturating_add(1)
        );
    }
}

/// Logs a caller bug loudly and wraps it.
pub(crate) fn reject(command: &'static str, err: ValidationError) -> CoreError {
    error!(
        "event={command} module=service status=error error_code=validation field={}",
        err.field
    );
    CoreError::Validation(err)
}
