//! Combat event port - Where services publish encounter notifications

use crate::domain::events::CombatEvent;

/// Publishing never fails the caller; an event with no listeners is dropped.
pub trait CombatEventPort: Send + Sync {
    fn publish(&self, event: CombatEvent);
}
