//! Transition detection
//!
//! Decides when an observation warrants a notification. The rule is a
//! strict edge trigger: notify only when an item becomes `Available`
//! after previously not being `Available`. Repeated `Available`
//! observations stay quiet; a drop to `Unavailable` re-arms the edge.
//!
//! `Error` observations are excluded from the comparison on both sides.
//! The previous status fed into [`decide`] must be the last *meaningful*
//! status (the store tracks it per item), so a probe failure between two
//! `Available` observations neither re-notifies nor swallows a real
//! transition.

use crate::models::{ItemStatus, NotifyDecision};

/// Decide whether a fresh observation is a notifiable transition
///
/// `previous` must be the last meaningful (non-error) status recorded
/// for the item. The function is pure; callers persist state themselves.
pub fn decide(previous: ItemStatus, observed: ItemStatus) -> NotifyDecision {
    if observed == ItemStatus::Available && previous != ItemStatus::Available {
        NotifyDecision::Notify
    } else {
        NotifyDecision::Hold
    }
}
