//! Engine state: everything a revert frame captures.
//!
//! ## EngineState
//!
//! The mutable part of an engine:
//! - Clock
//! - Entities (by name)
//! - Map occupancy
//! - Delay queue
//! - RNG
//! - Action log
//!
//! Uses `im` persistent data structures so copying a state (for revert
//! frames, what-if queries and tree search) is O(1), with path copying on
//! write.
//!
//! ## Delays
//!
//! A [`Delay`] is a deferred callback together with the environment captured
//! when it was scheduled.

use std::collections::BTreeMap;
use std::sync::Arc;

use im::{OrdMap, Vector};

use super::action::ActionRecord;
use super::entity::Entity;
use super::rng::GameRng;
use super::value::Value;
use crate::map::Occupancy;
use crate::script::Script;

/// Environment-bound entity names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bindings {
    pub caster: Option<String>,
    pub target: Option<String>,
    pub mover: Option<String>,
}

impl Bindings {
    /// No bindings at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind all three roles.
    #[must_use]
    pub fn of(caster: impl Into<String>, target: impl Into<String>, mover: impl Into<String>) -> Self {
        Self {
            caster: Some(caster.into()),
            target: Some(target.into()),
            mover: Some(mover.into()),
        }
    }

    #[must_use]
    pub fn with_caster(mut self, caster: impl Into<String>) -> Self {
        self.caster = Some(caster.into());
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_mover(mut self, mover: impl Into<String>) -> Self {
        self.mover = Some(mover.into());
        self
    }
}

/// Variables captured when a delay is scheduled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Captured {
    pub bindings: Bindings,
    pub storage: BTreeMap<String, Value>,
}

impl Captured {
    #[must_use]
    pub fn new(bindings: Bindings) -> Self {
        Self {
            bindings,
            storage: BTreeMap::new(),
        }
    }
}

/// What a delay runs when it fires.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Callback {
    /// Evaluate a script in the captured environment.
    Script(Arc<Script>),
    /// Run an entity as a move: requires, then effects.
    Entity(String),
}

/// A scheduled callback.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Delay {
    /// Fires on the first drain where this is `<= 0`.
    pub ticks_remaining: i64,
    pub callback: Callback,
    pub environment: Captured,
}

impl Delay {
    #[must_use]
    pub fn new(ticks: i64, callback: Callback, environment: Captured) -> Self {
        Self {
            ticks_remaining: ticks,
            callback,
            environment,
        }
    }

    #[must_use]
    pub fn is_due(&self) -> bool {
        self.ticks_remaining <= 0
    }
}

/// Full mutable state of an engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EngineState {
    pub time: i64,
    pub entities: OrdMap<String, Entity>,
    pub occupancy: Occupancy,
    pub delays: Vector<Delay>,
    pub rng: GameRng,
    pub log: Vector<ActionRecord>,
}

impl EngineState {
    /// Create an empty state at time 0.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            time: 0,
            entities: OrdMap::new(),
            occupancy: Occupancy::new(),
            delays: Vector::new(),
            rng: GameRng::new(seed),
            log: Vector::new(),
        }
    }

    /// Split the delay queue into due entries (returned) and the rest (kept).
    pub fn take_due(&mut self) -> Vec<Delay> {
        let (due, pending): (Vec<Delay>, Vector<Delay>) =
            std::mem::take(&mut self.delays)
                .into_iter()
                .fold((Vec::new(), Vector::new()), |(mut due, mut pending), delay| {
                    if delay.is_due() {
                        due.push(delay);
                    } else {
                        pending.push_back(delay);
                    }
                    (due, pending)
                });
        self.delays = pending;
        due
    }

    /// Put delays back at the front of the queue, keeping their order.
    pub(crate) fn requeue(&mut self, delays: impl IntoIterator<Item = Delay>) {
        let mut front: Vector<Delay> = delays.into_iter().collect();
        front.append(std::mem::take(&mut self.delays));
        self.delays = front;
    }
}
