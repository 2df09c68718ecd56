mod action;
mod creation;

pub use action::ActionData;
pub use creation::{CreationData, EntityKind, SpawnRequest};

use serde::{Deserialize, Serialize};

use crate::manager::PathId;
use crate::math::{Point2, Vector2};
use crate::order::EnemyOrder;
use crate::stage::EntityId;

/// Opaque handle to whatever the rendering layer attached to a node or segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u64);

/// State shared by every trigger node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCore {
    /// Where the designer placed the node.
    pub position: Point2,
    /// Whether the node is armed for triggering/spawning.
    #[serde(default)]
    pub is_active: bool,
    /// Seconds since the owning path last activated the node.
    #[serde(default)]
    pub time_since_activation: f64,
    #[serde(skip)]
    pub visual: Option<VisualHandle>,
}

impl NodeCore {
    #[must_use]
    pub fn new(position: Point2) -> Self {
        Self {
            position,
            is_active: false,
            time_since_activation: 0.0,
            visual: None,
        }
    }
}

/// Type-specific part of a trigger node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Action(ActionData),
    Creation(CreationData),
}

/// A point on a path segment that spawns entities or issues orders.
///
/// Nodes are owned by the [`PathSegment`](crate::path::PathSegment) they are
/// attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerNode {
    #[serde(flatten)]
    pub core: NodeCore,
    pub kind: NodeKind,
}

impl TriggerNode {
    /// Creates an action node issuing `order` to each unit that reaches it.
    #[must_use]
    pub fn action(position: Point2, order: Option<EnemyOrder>) -> Self {
        Self {
            core: NodeCore::new(position),
            kind: NodeKind::Action(ActionData::new(order)),
        }
    }

    /// Creates a creation node with the given spawn settings.
    #[must_use]
    pub fn creation(position: Point2, data: CreationData) -> Self {
        Self {
            core: NodeCore::new(position),
            kind: NodeKind::Creation(data),
        }
    }

    #[must_use]
    pub fn position(&self) -> Point2 {
        self.core.position
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.core.is_active
    }

    #[must_use]
    pub fn as_action(&self) -> Option<&ActionData> {
        match &self.kind {
            NodeKind::Action(a) => Some(a),
            NodeKind::Creation(_) => None,
        }
    }

    #[must_use]
    pub fn as_creation(&self) -> Option<&CreationData> {
        match &self.kind {
            NodeKind::Creation(c) => Some(c),
            NodeKind::Action(_) => None,
        }
    }

    pub fn translate(&mut self, offset: &Vector2) {
        self.core.position += *offset;
    }

    /// Arms the node when its path enters the activation window.
    ///
    /// Action nodes keep their consumer set. Exhausted creation nodes stay dormant.
    pub fn activate(&mut self) {
        self.core.time_since_activation = 0.0;
        match &mut self.kind {
            NodeKind::Action(_) => self.core.is_active = true,
            NodeKind::Creation(c) => self.core.is_active = c.arm(),
        }
    }

    /// Explicit stage reset: forgets consumers, restores repeat counts, disarms.
    pub fn reset(&mut self) {
        self.core.is_active = false;
        self.core.time_since_activation = 0.0;
        match &mut self.kind {
            NodeKind::Action(a) => a.reset(),
            NodeKind::Creation(c) => c.reset(),
        }
    }

    /// Advances a creation node by `dt` seconds. Action nodes never spawn.
    pub fn tick(&mut self, dt: f64, path: PathId) -> Option<SpawnRequest> {
        match &mut self.kind {
            NodeKind::Creation(c) => c.tick(&mut self.core, dt, path),
            NodeKind::Action(_) => None,
        }
    }

    /// Offers the node to `entity`. Returns `true` only the first time the
    /// entity reaches an active action node; the caller then executes the order.
    pub fn try_trigger(&mut self, entity: EntityId) -> bool {
        if !self.core.is_active {
            return false;
        }
        match &mut self.kind {
            NodeKind::Action(a) => a.try_trigger(entity),
            NodeKind::Creation(_) => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::order::OrderKind;
    use slotmap::SlotMap;

    fn repeating(count: u32) -> CreationData {
        CreationData {
            repeat_enabled: true,
            repeat_count: count,
            remaining_repeats: count,
            initial_delay: 0.0,
            repeat_interval: 1.0,
            ..CreationData::new(EntityKind::Enemy, 0)
        }
    }

    #[test]
    fn inactive_action_node_does_not_trigger() {
        let mut units: SlotMap<EntityId, ()> = SlotMap::with_key();
        let e = units.insert(());
        let mut node =
            TriggerNode::action(Point2::origin(), Some(EnemyOrder::instant(OrderKind::Fire)));

        assert!(!node.try_trigger(e));
        node.activate();
        assert!(node.try_trigger(e));
    }

    #[test]
    fn action_fires_once_per_entity() {
        let mut units: SlotMap<EntityId, ()> = SlotMap::with_key();
        let a = units.insert(());
        let b = units.insert(());
        let mut node =
            TriggerNode::action(Point2::origin(), Some(EnemyOrder::instant(OrderKind::Stop)));
        node.activate();

        assert!(node.try_trigger(a));
        assert!(!node.try_trigger(a));
        assert!(node.try_trigger(b));
        assert_eq!(node.as_action().unwrap().triggered_by().len(), 2);
    }

    #[test]
    fn reactivation_keeps_consumers() {
        let mut units: SlotMap<EntityId, ()> = SlotMap::with_key();
        let e = units.insert(());
        let mut node = TriggerNode::action(Point2::origin(), None);
        node.activate();
        assert!(node.try_trigger(e));

        node.activate();
        assert!(!node.try_trigger(e));

        node.reset();
        node.activate();
        assert!(node.try_trigger(e));
    }

    #[test]
    fn creation_node_never_triggers_orders() {
        let mut units: SlotMap<EntityId, ()> = SlotMap::with_key();
        let e = units.insert(());
        let mut node = TriggerNode::creation(Point2::origin(), repeating(1));
        node.activate();
        assert!(!node.try_trigger(e));
    }

    #[test]
    fn exhausted_creation_node_stays_dormant_until_reset() {
        let mut paths: SlotMap<PathId, ()> = SlotMap::with_key();
        let path = paths.insert(());
        let mut node = TriggerNode::creation(Point2::origin(), repeating(1));
        node.activate();
        assert!(node.tick(1.0, path).is_some());
        assert!(!node.is_active());

        node.activate();
        assert!(!node.is_active());

        node.reset();
        node.activate();
        assert!(node.is_active());
        assert_eq!(node.as_creation().unwrap().remaining_repeats, 1);
    }

    #[test]
    fn translate_moves_node() {
        let mut node = TriggerNode::action(Point2::new(1.0, 2.0), None);
        node.translate(&Vector2::new(3.0, -1.0));
        assert_eq!(node.position(), Point2::new(4.0, 1.0));
    }
}
