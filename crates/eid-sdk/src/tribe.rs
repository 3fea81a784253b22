//! Current-tribe reconciliation after an identity fetch.

use eid_models::{Identity, TribeName};

/// Pick the tribe context for a freshly fetched identity.
///
/// 1. Exactly one admin tribe: that tribe.
/// 2. Otherwise exactly one membership: that tribe.
/// 3. Otherwise several memberships: `persisted`, if it is one of them.
/// 4. Otherwise nothing.
///
/// The result is always `None` or a tribe the identity carries.
pub fn select_current_tribe(identity: &Identity, persisted: Option<&TribeName>) -> Option<TribeName> {
    if let [only] = identity.admin_tribes.as_slice() {
        return Some(only.clone());
    }

    match identity.tribes.as_slice() {
        [] => None,
        [only] => Some(only.clone()),
        many => persisted.filter(|t| many.contains(t)).cloned(),
    }
}
