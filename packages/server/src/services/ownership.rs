//! Ownership Registry: which user has claimed which creator ids.
//!
//! A creator id should belong to at most one user at a time. There is no
//! schema-level constraint backing this; it is enforced by scanning all
//! users at write time. The scan is linear over the user table — acceptable
//! for the small org-sized datasets this serves, and a known scalability
//! boundary beyond that.

use std::collections::HashSet;

use sea_orm::*;

use crate::entity::{user, work};
use crate::error::AppError;

/// True iff some user other than `requester_id` has `creator_id` in their
/// claimed set.
pub async fn is_claimed_by_other<C: ConnectionTrait>(
    db: &C,
    creator_id: &str,
    requester_id: i32,
) -> Result<bool, AppError> {
    let users = user::Entity::find().all(db).await?;
    Ok(users.iter().any(|u| {
        u.id != requester_id && u.claimed_creator_ids().iter().any(|c| c == creator_id)
    }))
}

/// Idempotently add `creator_id` to the user's claimed set.
pub async fn record_claim<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    creator_id: &str,
) -> Result<(), AppError> {
    let u = find_user(db, user_id).await?;

    let mut claimed = u.claimed_creator_ids();
    if claimed.iter().any(|c| c == creator_id) {
        return Ok(());
    }
    claimed.push(creator_id.to_string());

    let mut active: user::ActiveModel = u.into();
    active.creator_ids = Set(user::creator_ids_to_json(&claimed));
    active.update(db).await?;
    Ok(())
}

/// Shrink the user's claimed set to the ids that still back at least one
/// work they own, returning the resulting set. Idempotent.
pub async fn prune_unclaimed<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<String>, AppError> {
    let u = find_user(db, user_id).await?;

    let backing: HashSet<String> = work::Entity::find()
        .filter(work::Column::OwnerId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|w| w.creator_id)
        .collect();

    let retained = retained_ids(&u.claimed_creator_ids(), &backing);
    if retained == u.claimed_creator_ids() {
        return Ok(retained);
    }

    let mut active: user::ActiveModel = u.into();
    active.creator_ids = Set(user::creator_ids_to_json(&retained));
    active.update(db).await?;
    Ok(retained)
}

async fn find_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {user_id} missing")))
}

/// The claimed ids that still back a work, in original claim order.
fn retained_ids(claimed: &[String], backing: &HashSet<String>) -> Vec<String> {
    claimed
        .iter()
        .filter(|c| backing.contains(*c))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| ToString::to_string(s)).collect()
    }

    #[test]
    fn retained_keeps_backed_ids_in_order() {
        let backing: HashSet<String> = ids(&["acme", "zed"]).into_iter().collect();
        assert_eq!(
            retained_ids(&ids(&["zed", "stale", "acme"]), &backing),
            ids(&["zed", "acme"])
        );
    }

    #[test]
    fn retained_is_idempotent() {
        let backing: HashSet<String> = ids(&["acme"]).into_iter().collect();
        let once = retained_ids(&ids(&["acme", "stale"]), &backing);
        let twice = retained_ids(&once, &backing);
        assert_eq!(once, twice);
    }

    #[test]
    fn retained_never_drops_a_backed_id() {
        let backing: HashSet<String> = ids(&["keep"]).into_iter().collect();
        assert_eq!(retained_ids(&ids(&["keep"]), &backing), ids(&["keep"]));
    }

    #[test]
    fn retained_empties_when_nothing_backs() {
        let backing = HashSet::new();
        assert!(retained_ids(&ids(&["a", "b"]), &backing).is_empty());
    }
}
