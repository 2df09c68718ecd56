mod config;
mod document;
mod template;
mod unit;

pub use config::StageConfig;
pub use document::{BackgroundLayer, StageDocument, StageMetadata, DOCUMENT_VERSION};
pub use template::{EntityTemplate, TemplateRegistry};
pub use unit::{EntityId, Unit};

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::error::Result;
use crate::manager::{PathId, PathManager};
use crate::math::distance;
use crate::order::EnemyOrder;
use crate::path::{ActivationChange, PathFollower, PathSegment};
use crate::trigger::{EntityKind, SpawnRequest, TriggerNode};

/// Opaque handle to an entity instantiated by the [`EntityLayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u64);

/// Cosmetic callbacks into the rendering layer. All default to no-ops.
pub trait RenderView {
    fn spawn_visual_for_segment(&mut self, _segment: &PathSegment) {}

    fn fade_segment(&mut self, _segment: &PathSegment, _show: bool) {}

    fn blink_node(&mut self, _node: &TriggerNode) {}
}

/// A [`RenderView`] that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullView;

impl RenderView for NullView {}

/// The engine-side entity layer the driver spawns into and commands.
pub trait EntityLayer {
    /// Creates the engine entity for a spawn and returns its handle.
    fn instantiate_entity(
        &mut self,
        request: &SpawnRequest,
        template: &EntityTemplate,
    ) -> EntityHandle;

    /// Notifies the engine that `order` was issued to `entity`.
    fn execute_order(&mut self, entity: EntityHandle, order: &EnemyOrder);
}

/// What happened during one [`StageDriver::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub progress: f64,
    pub activation_changes: Vec<(PathId, ActivationChange)>,
    pub spawned: Vec<EntityId>,
    /// Orders fired by action nodes, with their recipient.
    pub triggered: Vec<(EntityId, EnemyOrder)>,
    /// Units that reached the end of a stopping path during this tick.
    pub finished: Vec<EntityId>,
}

/// Advances a stage's timeline once per frame.
///
/// Owns the path manager and the live units. Each tick moves progress,
/// updates path activation, runs creation nodes, offers action nodes to
/// nearby enemies, then moves every unit.
///
/// The driver never removes units by itself. The host decides when an entity
/// is gone (destroyed, off screen, or listed in [`TickReport::finished`]) and
/// calls [`despawn`](Self::despawn).
#[derive(Debug)]
pub struct StageDriver {
    config: StageConfig,
    registry: TemplateRegistry,
    manager: PathManager,
    units: SlotMap<EntityId, Unit>,
    progress: f64,
}

impl StageDriver {
    /// Creates a driver at progress zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a creation node
    /// names a template missing from `registry`.
    pub fn new(
        config: StageConfig,
        registry: TemplateRegistry,
        manager: PathManager,
    ) -> Result<Self> {
        config.validate()?;
        registry.validate(manager.iter().map(|(_, p)| p))?;
        Ok(Self {
            config,
            registry,
            manager,
            units: SlotMap::with_key(),
            progress: 0.0,
        })
    }

    /// Creates a driver that continues a saved stage at `progress`.
    ///
    /// Path activation caches are rebuilt for `progress` while node state is
    /// kept as saved, so nodes that already fired stay spent.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn resume(
        config: StageConfig,
        registry: TemplateRegistry,
        manager: PathManager,
        progress: f64,
    ) -> Result<Self> {
        let mut driver = Self::new(config, registry, manager)?;
        driver.progress = progress.clamp(0.0, driver.config.stage_length);
        driver.manager.restore_activation(driver.progress);
        debug!(progress = driver.progress, "stage resumed");
        Ok(driver)
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    #[must_use]
    pub fn manager(&self) -> &PathManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PathManager {
        &mut self.manager
    }

    pub fn units(&self) -> impl Iterator<Item = (EntityId, &Unit)> {
        self.units.iter()
    }

    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    /// Removes a unit, e.g. when the engine destroys it.
    pub fn despawn(&mut self, id: EntityId) -> Option<Unit> {
        self.units.remove(id)
    }

    /// Explicit stage reset: rewinds progress, clears units and resets every path.
    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.units.clear();
        self.manager.reset();
        debug!("stage reset");
    }

    /// Runs one frame of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if a creation node names a template that is not
    /// registered, which can only happen for nodes added after construction.
    /// Templates are checked before anything moves, so a failed tick leaves
    /// the driver as it was.
    pub fn tick(
        &mut self,
        dt: f64,
        layer: &mut impl EntityLayer,
        view: &mut impl RenderView,
    ) -> Result<TickReport> {
        self.registry.validate(self.manager.iter().map(|(_, p)| p))?;

        self.progress = (self.progress + dt * self.config.time_scale)
            .clamp(0.0, self.config.stage_length);
        trace!(progress = self.progress, dt, "stage tick");

        let activation_changes = self.manager.update_activation(self.progress, view);
        for &(id, change) in &activation_changes {
            if change == ActivationChange::Activated {
                for segment in self.manager.path(id)?.segments() {
                    view.spawn_visual_for_segment(segment);
                }
            }
        }
        let active = self.manager.activated_ids();

        let spawned = self.run_creation_nodes(&active, dt, layer)?;
        let triggered = self.run_action_nodes(&active, layer, view)?;

        let mut finished = Vec::new();
        for (id, unit) in &mut self.units {
            let was_finished = unit.has_finished_path();
            unit.advance(dt, &self.config);
            if !was_finished && unit.has_finished_path() {
                finished.push(id);
            }
        }

        Ok(TickReport {
            progress: self.progress,
            activation_changes,
            spawned,
            triggered,
            finished,
        })
    }

    fn run_creation_nodes(
        &mut self,
        active: &[PathId],
        dt: f64,
        layer: &mut impl EntityLayer,
    ) -> Result<Vec<EntityId>> {
        let mut spawned = Vec::new();
        for &path_id in active {
            let mut requests = Vec::new();
            let path = self.manager.path_mut(path_id)?;
            for segment in path.segments_mut() {
                for node in segment.nodes_mut().iter_mut().filter(|n| n.is_active()) {
                    requests.extend(node.tick(dt, path_id));
                }
            }

            let path = self.manager.path(path_id)?;
            for request in requests {
                let template = self
                    .registry
                    .require(request.entity_kind, request.template_index)?;
                let handle = layer.instantiate_entity(&request, template);
                let follower =
                    PathFollower::new(path_id, path, self.config.bezier_samples, &request.position);
                let mut unit = Unit::spawn(handle, &request, Some(follower));
                unit.command_all(template.orders.iter().copied());
                let id = self.units.insert(unit);
                debug!(
                    path = %path.name,
                    kind = ?request.entity_kind,
                    template = %template.name,
                    progress = self.progress,
                    "entity spawned"
                );
                spawned.push(id);
            }
        }
        Ok(spawned)
    }

    fn run_action_nodes(
        &mut self,
        active: &[PathId],
        layer: &mut impl EntityLayer,
        view: &mut impl RenderView,
    ) -> Result<Vec<(EntityId, EnemyOrder)>> {
        let radius = self.config.trigger_radius;
        let mut triggered = Vec::new();
        for &path_id in active {
            let path = self.manager.path_mut(path_id)?;
            for segment in path.segments_mut() {
                for node in segment.nodes_mut() {
                    if !node.is_active() || node.as_action().is_none() {
                        continue;
                    }
                    let position = node.position();
                    for (id, unit) in &self.units {
                        if unit.kind != EntityKind::Enemy
                            || distance(&unit.position, &position) > radius
                            || !node.try_trigger(id)
                        {
                            continue;
                        }
                        view.blink_node(node);
                        if let Some(order) = node.as_action().and_then(|a| a.order) {
                            triggered.push((id, order));
                        }
                    }
                }
            }
        }

        for &(id, order) in &triggered {
            if let Some(unit) = self.units.get_mut(id) {
                unit.interrupt(order, &self.config);
                layer.execute_order(unit.handle, &order);
                debug!(?order, "action node triggered");
            }
        }
        Ok(triggered)
    }
}
