use crate::math::{heading_of, unit_from_heading, wrap_angle, Point2};
use crate::order::{EnemyOrder, OrderKind, OrderQueue, OrderStep};
use crate::path::PathFollower;
use crate::trigger::{EntityKind, SpawnRequest};

use super::config::StageConfig;
use super::EntityHandle;

slotmap::new_key_type! {
    /// Generational handle to a live unit owned by a [`StageDriver`](super::StageDriver).
    pub struct EntityId;
}

/// Continuous effect of the order currently running on a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Effect {
    None,
    /// Total counter-clockwise rotation in radians, spread over the order.
    Turn(f64),
    /// Linear speed change from `from` to `to`.
    Ramp { from: f64, to: f64 },
    /// Speed to restore once the rest is over.
    Rest(f64),
}

/// A live entity spawned by a creation node.
#[derive(Debug, Clone)]
pub struct Unit {
    pub handle: EntityHandle,
    pub kind: EntityKind,
    pub template_index: usize,
    pub position: Point2,
    /// Travel heading in radians, counter-clockwise from +X.
    pub heading: f64,
    pub speed: f64,
    pub firing: bool,
    follower: Option<PathFollower>,
    orders: OrderQueue,
    effect: Effect,
}

impl Unit {
    /// Builds a unit for a fulfilled spawn request.
    #[must_use]
    pub fn spawn(
        handle: EntityHandle,
        request: &SpawnRequest,
        follower: Option<PathFollower>,
    ) -> Self {
        let (position, heading) = follower
            .as_ref()
            .map_or((request.position, 0.0), |f| (f.position(), f.heading()));
        Self {
            handle,
            kind: request.entity_kind,
            template_index: request.template_index,
            position,
            heading,
            speed: request.initial_speed,
            firing: false,
            follower,
            orders: OrderQueue::new(),
            effect: Effect::None,
        }
    }

    /// The follower, while the unit is still on its path.
    #[must_use]
    pub fn follower(&self) -> Option<&PathFollower> {
        self.follower.as_ref()
    }

    #[must_use]
    pub fn is_on_path(&self) -> bool {
        self.follower.is_some()
    }

    /// Whether the unit has run its path to the end and stopped there.
    #[must_use]
    pub fn has_finished_path(&self) -> bool {
        self.follower.as_ref().is_some_and(PathFollower::is_finished)
    }

    #[must_use]
    pub fn orders(&self) -> &OrderQueue {
        &self.orders
    }

    /// Queues an order behind any the unit is already carrying out.
    pub fn command(&mut self, order: EnemyOrder) {
        self.orders.push(order);
    }

    /// Carries out `order` now, abandoning the order in progress.
    ///
    /// Orders still pending resume once it completes.
    pub fn interrupt(&mut self, order: EnemyOrder, config: &StageConfig) {
        if let Some(abandoned) = self.orders.interrupt(order) {
            self.apply(OrderStep::Finished(abandoned.order), config);
        }
        for step in self.orders.advance(0.0) {
            self.apply(step, config);
        }
    }

    pub fn command_all(&mut self, orders: impl IntoIterator<Item = EnemyOrder>) {
        self.orders.extend(orders);
    }

    /// Advances orders and movement by `dt` seconds.
    pub fn advance(&mut self, dt: f64, config: &StageConfig) {
        for step in self.orders.advance(dt) {
            self.apply(step, config);
        }

        let step = self.speed * dt;
        if step <= 0.0 {
            return;
        }
        if let Some(follower) = &mut self.follower {
            follower.advance(step);
            self.position = follower.position();
            self.heading = follower.heading();
        } else {
            self.position += unit_from_heading(self.heading) * step;
        }
    }

    fn apply(&mut self, step: OrderStep, config: &StageConfig) {
        match step {
            OrderStep::Started(order) => self.start(order, config),
            OrderStep::Progressed { from, to, .. } => match self.effect {
                Effect::Turn(total) => self.heading += total * (to - from),
                Effect::Ramp { from: s0, to: s1 } => self.speed = s0 + (s1 - s0) * to,
                Effect::None | Effect::Rest(_) => {}
            },
            OrderStep::Finished(_) => {
                if let Effect::Rest(resume) = self.effect {
                    self.speed = resume;
                }
                self.effect = Effect::None;
            }
        }
    }

    fn start(&mut self, order: EnemyOrder, config: &StageConfig) {
        let instant = order.duration <= 0.0;
        self.effect = Effect::None;
        match order.kind {
            OrderKind::Move { direction } => {
                self.follower = None;
                self.heading = heading_of(&direction.vector());
            }
            OrderKind::TurnLeft { angle_degrees } => self.turn(angle_degrees.to_radians(), instant),
            OrderKind::TurnRight { angle_degrees } => {
                self.turn(-angle_degrees.to_radians(), instant);
            }
            OrderKind::TurnToBase => {
                let target = heading_of(&(config.base_position - self.position));
                self.turn(wrap_angle(target - self.heading), instant);
            }
            OrderKind::Rest => {
                if !instant {
                    self.effect = Effect::Rest(self.speed);
                }
                self.speed = 0.0;
            }
            OrderKind::Stop => self.speed = 0.0,
            OrderKind::Fire => self.firing = true,
            OrderKind::FireStop => self.firing = false,
            OrderKind::SpeedUp => self.ramp(self.speed * config.speed_step, instant),
            OrderKind::SpeedDown => self.ramp(self.speed / config.speed_step, instant),
        }
    }

    fn turn(&mut self, radians: f64, instant: bool) {
        self.follower = None;
        if instant {
            self.heading += radians;
        } else {
            self.effect = Effect::Turn(radians);
        }
    }

    fn ramp(&mut self, target: f64, instant: bool) {
        if instant {
            self.speed = target;
        } else {
            self.effect = Effect::Ramp {
                from: self.speed,
                to: target,
            };
        }
    }
}
