//! Quota Accountant: total stored bytes versus the configured ceiling.

use sea_orm::*;

use crate::entity::work;
use crate::error::AppError;

/// Current total stored bytes: every work's active size plus every retained
/// backup's size. Computed from the records, not the filesystem.
pub async fn usage_bytes<C: ConnectionTrait>(db: &C) -> Result<u64, AppError> {
    let works = work::Entity::find().all(db).await?;
    Ok(works.iter().map(work::Model::total_size).sum())
}

/// True iff admitting `incoming_bytes` keeps total usage at or under the
/// ceiling. The upload's own size counts: with one byte of headroom left, a
/// two-byte upload is refused.
///
/// Check-then-act: callers must hold the global quota mutex through the
/// subsequent write, or two concurrent uploads can both pass this check.
pub async fn admits<C: ConnectionTrait>(
    db: &C,
    limit_bytes: u64,
    incoming_bytes: u64,
) -> Result<bool, AppError> {
    Ok(fits(usage_bytes(db).await?, incoming_bytes, limit_bytes))
}

fn fits(usage: u64, incoming: u64, limit: u64) -> bool {
    usage.saturating_add(incoming) <= limit
}
