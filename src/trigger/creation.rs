use serde::{Deserialize, Serialize};
use tracing::trace;

use super::NodeCore;
use crate::manager::PathId;
use crate::math::Point2;

/// Category of entity a creation node spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Enemy,
    Powerup,
    Object,
}

/// Instruction for the driver to instantiate an entity.
///
/// Creation nodes only describe the spawn; building the entity is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub entity_kind: EntityKind,
    pub template_index: usize,
    pub position: Point2,
    pub initial_speed: f64,
    /// The path the spawned entity follows.
    pub path: PathId,
}

/// Spawn settings and timers of a creation node.
///
/// State machine: Dormant (`is_active == false`) and Armed. While armed, time
/// accumulates and a spawn is emitted once `initial_delay` has elapsed, then
/// every `repeat_interval`. A non-endless node goes dormant after its last spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationData {
    pub entity_kind: EntityKind,
    pub template_index: usize,
    pub repeat_enabled: bool,
    /// Authored number of spawns; restored into `remaining_repeats` on reset.
    pub repeat_count: u32,
    /// Spawns left before the node goes dormant. Ignored when endless.
    pub remaining_repeats: u32,
    /// Seconds between spawns after the first.
    pub repeat_interval: f64,
    pub is_endless: bool,
    /// Seconds between activation and the first spawn.
    pub initial_delay: f64,
    pub initial_speed: f64,
    #[serde(default)]
    pub time_since_last_spawn: f64,
    #[serde(default)]
    pub has_spawned_once: bool,
}

impl CreationData {
    /// A single, immediate spawn of template `template_index`.
    #[must_use]
    pub fn new(entity_kind: EntityKind, template_index: usize) -> Self {
        Self {
            entity_kind,
            template_index,
            repeat_enabled: false,
            repeat_count: 1,
            remaining_repeats: 1,
            repeat_interval: 1.0,
            is_endless: false,
            initial_delay: 0.0,
            initial_speed: 0.0,
            time_since_last_spawn: 0.0,
            has_spawned_once: false,
        }
    }

    /// Whether the node has used up its spawns and can no longer arm.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.repeat_enabled && !self.is_endless && self.remaining_repeats == 0
    }

    /// Resets timers for a new activation. Returns whether the node may arm.
    pub(super) fn arm(&mut self) -> bool {
        self.time_since_last_spawn = 0.0;
        self.has_spawned_once = false;
        !self.is_exhausted()
    }

    pub(super) fn reset(&mut self) {
        self.remaining_repeats = self.repeat_count;
        self.time_since_last_spawn = 0.0;
        self.has_spawned_once = false;
    }

    pub(super) fn tick(
        &mut self,
        core: &mut NodeCore,
        dt: f64,
        path: PathId,
    ) -> Option<SpawnRequest> {
        if !core.is_active {
            return None;
        }

        core.time_since_activation += dt;
        self.time_since_last_spawn += dt;

        let threshold = if self.has_spawned_once {
            self.repeat_interval
        } else {
            self.initial_delay
        };
        if self.time_since_last_spawn < threshold {
            return None;
        }

        self.time_since_last_spawn = 0.0;
        self.has_spawned_once = true;

        if !self.repeat_enabled {
            core.is_active = false;
        } else if !self.is_endless {
            self.remaining_repeats = self.remaining_repeats.saturating_sub(1);
            if self.remaining_repeats == 0 {
                core.is_active = false;
            }
        }

        trace!(
            kind = ?self.entity_kind,
            template = self.template_index,
            remaining = self.remaining_repeats,
            "creation node spawned"
        );

        Some(SpawnRequest {
            entity_kind: self.entity_kind,
            template_index: self.template_index,
            position: core.position,
            initial_speed: self.initial_speed,
            path,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::trigger::TriggerNode;
    use slotmap::SlotMap;

    fn path_id() -> PathId {
        let mut paths: SlotMap<PathId, ()> = SlotMap::with_key();
        paths.insert(())
    }

    #[test]
    fn finite_repeat_spawns_exactly_count_times() {
        let path = path_id();
        let data = CreationData {
            repeat_enabled: true,
            is_endless: false,
            repeat_count: 3,
            remaining_repeats: 3,
            initial_delay: 0.0,
            repeat_interval: 1.0,
            ..CreationData::new(EntityKind::Enemy, 2)
        };
        let mut node = TriggerNode::creation(Point2::new(4.0, 5.0), data);
        node.activate();

        let mut spawns = 0;
        for i in 0..5 {
            if node.tick(1.0, path).is_some() {
                spawns += 1;
            }
            if i == 2 {
                assert!(!node.is_active(), "node must go dormant after the third spawn");
            }
        }

        assert_eq!(spawns, 3);
        assert!(!node.is_active());
    }

    #[test]
    fn dormant_node_does_not_accumulate_or_spawn() {
        let path = path_id();
        let mut node =
            TriggerNode::creation(Point2::origin(), CreationData::new(EntityKind::Powerup, 0));

        assert!(node.tick(10.0, path).is_none());
        assert!(node.as_creation().unwrap().time_since_last_spawn.abs() < f64::EPSILON);
    }

    #[test]
    fn initial_delay_then_interval() {
        let path = path_id();
        let data = CreationData {
            repeat_enabled: true,
            is_endless: true,
            initial_delay: 1.5,
            repeat_interval: 0.5,
            ..CreationData::new(EntityKind::Enemy, 0)
        };
        let mut node = TriggerNode::creation(Point2::origin(), data);
        node.activate();

        let fired: Vec<bool> = (0..6).map(|_| node.tick(0.5, path).is_some()).collect();

        assert_eq!(fired, vec![false, false, true, true, true, true]);
        assert!(node.is_active());
    }

    #[test]
    fn spawn_request_carries_node_settings() {
        let path = path_id();
        let data = CreationData {
            initial_speed: 120.0,
            ..CreationData::new(EntityKind::Object, 7)
        };
        let mut node = TriggerNode::creation(Point2::new(1.0, 1.0), data);
        node.activate();

        let req = node.tick(0.0, path).unwrap();

        assert_eq!(req.entity_kind, EntityKind::Object);
        assert_eq!(req.template_index, 7);
        assert_eq!(req.position, Point2::new(1.0, 1.0));
        assert!((req.initial_speed - 120.0).abs() < f64::EPSILON);
        assert_eq!(req.path, path);
    }

    #[test]
    fn single_shot_node_spawns_once_per_activation() {
        let path = path_id();
        let mut node =
            TriggerNode::creation(Point2::origin(), CreationData::new(EntityKind::Enemy, 0));
        node.activate();

        assert!(node.tick(0.1, path).is_some());
        assert!(node.tick(5.0, path).is_none());

        node.activate();
        assert!(node.tick(0.1, path).is_some());
    }

    #[test]
    fn activation_resets_timers() {
        let path = path_id();
        let data = CreationData {
            repeat_enabled: true,
            is_endless: true,
            initial_delay: 2.0,
            ..CreationData::new(EntityKind::Enemy, 0)
        };
        let mut node = TriggerNode::creation(Point2::origin(), data);
        node.activate();
        assert!(node.tick(1.5, path).is_none());

        node.activate();
        assert!(node.tick(1.5, path).is_none());
        assert!(node.tick(0.5, path).is_some());
    }
}
