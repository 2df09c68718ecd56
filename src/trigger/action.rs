use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::order::EnemyOrder;
use crate::stage::EntityId;

/// Payload of an action node: the order it issues and who already received it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionData {
    pub order: Option<EnemyOrder>,
    /// Keys of live units. They name nothing once the unit arena is gone, so
    /// they are not saved with the node.
    #[serde(skip)]
    triggered_by: HashSet<EntityId>,
}

impl ActionData {
    #[must_use]
    pub fn new(order: Option<EnemyOrder>) -> Self {
        Self {
            order,
            triggered_by: HashSet::new(),
        }
    }

    /// Entities that have already consumed this node.
    #[must_use]
    pub fn triggered_by(&self) -> &HashSet<EntityId> {
        &self.triggered_by
    }

    #[must_use]
    pub fn has_triggered(&self, entity: EntityId) -> bool {
        self.triggered_by.contains(&entity)
    }

    /// Records `entity` as a consumer. Returns `false` if it already was one.
    pub fn try_trigger(&mut self, entity: EntityId) -> bool {
        self.triggered_by.insert(entity)
    }

    pub fn reset(&mut self) {
        self.triggered_by.clear();
    }
}
