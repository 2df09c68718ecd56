use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::math::Vector2;

/// Cardinal direction for a [`OrderKind::Move`] order, in stage coordinates (+Y is up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDirection {
    /// Unit vector for this direction.
    #[must_use]
    pub fn vector(self) -> Vector2 {
        match self {
            Self::Up => Vector2::new(0.0, 1.0),
            Self::Down => Vector2::new(0.0, -1.0),
            Self::Left => Vector2::new(-1.0, 0.0),
            Self::Right => Vector2::new(1.0, 0.0),
        }
    }
}

/// The instruction carried by an [`EnemyOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderKind {
    Move { direction: MoveDirection },
    TurnRight { angle_degrees: f64 },
    TurnLeft { angle_degrees: f64 },
    TurnToBase,
    Rest,
    Stop,
    Fire,
    FireStop,
    SpeedUp,
    SpeedDown,
}

/// A unit instruction together with how long it occupies the unit.
///
/// Orders are plain values: copying one never affects another unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyOrder {
    pub kind: OrderKind,
    /// Seconds the order keeps the unit busy. Zero means instantaneous.
    #[serde(default)]
    pub duration: f64,
}

impl EnemyOrder {
    #[must_use]
    pub fn new(kind: OrderKind, duration: f64) -> Self {
        Self {
            kind,
            duration: duration.max(0.0),
        }
    }

    #[must_use]
    pub fn instant(kind: OrderKind) -> Self {
        Self::new(kind, 0.0)
    }
}

/// An order in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningOrder {
    pub order: EnemyOrder,
    pub elapsed: f64,
}

impl RunningOrder {
    /// Seconds left before the order completes.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        (self.order.duration - self.elapsed).max(0.0)
    }

    /// Fraction of the duration completed, `1.0` for instantaneous orders.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.order.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.order.duration).clamp(0.0, 1.0)
        }
    }
}

/// What happened to one order during an [`OrderQueue::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderStep {
    /// The order became current.
    Started(EnemyOrder),
    /// The current order consumed `dt` seconds; `from`/`to` are completion fractions.
    Progressed { order: EnemyOrder, from: f64, to: f64 },
    /// The order finished.
    Finished(EnemyOrder),
}

/// Sequential per-unit order queue driven by tick time.
///
/// Each call to [`advance`](Self::advance) spends `dt` on the current order,
/// carrying leftover time into the next queued order, so a chain of orders
/// never drifts relative to the stage clock.
#[derive(Debug, Clone, Default)]
pub struct OrderQueue {
    pending: VecDeque<EnemyOrder>,
    current: Option<RunningOrder>,
}

impl OrderQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an order after everything already queued.
    pub fn push(&mut self, order: EnemyOrder) {
        self.pending.push_back(order);
    }

    pub fn extend(&mut self, orders: impl IntoIterator<Item = EnemyOrder>) {
        self.pending.extend(orders);
    }

    /// Puts `order` ahead of everything pending and abandons the current one.
    ///
    /// Returns the abandoned order, if any. The new order starts on the next
    /// [`advance`](Self::advance).
    pub fn interrupt(&mut self, order: EnemyOrder) -> Option<RunningOrder> {
        self.pending.push_front(order);
        self.current.take()
    }

    /// Drops the current order and everything pending.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.current = None;
    }

    #[must_use]
    pub fn current(&self) -> Option<&RunningOrder> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    /// Advances the queue by `dt` seconds and returns the steps taken, in order.
    pub fn advance(&mut self, dt: f64) -> Vec<OrderStep> {
        let mut steps = Vec::new();
        let mut budget = dt.max(0.0);

        loop {
            if self.current.is_none() {
                let Some(order) = self.pending.pop_front() else {
                    break;
                };
                steps.push(OrderStep::Started(order));
                self.current = Some(RunningOrder {
                    order,
                    elapsed: 0.0,
                });
            }

            let Some(running) = self.current.as_mut() else {
                break;
            };

            let spend = budget.min(running.remaining());
            let from = running.progress();
            running.elapsed += spend;
            budget -= spend;
            let to = running.progress();
            if to > from {
                steps.push(OrderStep::Progressed {
                    order: running.order,
                    from,
                    to,
                });
            }

            if running.remaining() > 0.0 {
                break;
            }

            let order = running.order;
            self.current = None;
            steps.push(OrderStep::Finished(order));
        }

        steps
    }
}
