//! The clock, the tick rule and the delay scheduler.
//!
//! ## Stepping
//!
//! [`Engine::control_time`] first drains delays that are already due, then
//! for each step:
//! 1. records a revert frame of the state as it stands (when enabled)
//! 2. advances the clock
//! 3. runs the tick rule entity as a move (caster = target = move = tick)
//! 4. decrements every pending delay
//! 5. drains again
//!
//! ## Draining
//!
//! A drain takes every due delay out of the queue, fires them in queue
//! order, and rescans until a scan fires nothing. A callback that schedules
//! a zero-tick delay therefore sees it fire within the same drain.
//!
//! A failing callback is dropped and its error returned. Due delays behind
//! it go back to the front of the queue and fire on the next drain.

use tracing::{debug, trace};

use super::{Engine, Scope};
use crate::core::{Bindings, Callback, Captured, Delay};
use crate::error::Result;

impl Engine {
    /// Advance the clock by `steps` ticks.
    pub fn control_time(&mut self, steps: i64) -> Result<()> {
        self.drain()?;
        for _ in 0..steps.max(0) {
            self.record_frame();
            self.state.time += 1;
            trace!(target: "time", "Tick {}", self.state.time);

            self.run_tick_rule()?;
            for delay in self.state.delays.iter_mut() {
                delay.ticks_remaining = delay.ticks_remaining.saturating_sub(1);
            }
            self.drain()?;
        }
        Ok(())
    }

    /// Schedule `callback` to fire after `ticks` clock steps.
    ///
    /// `ticks <= 0` fires on the next drain, before any clock increment.
    pub fn control_delay(&mut self, callback: Callback, ticks: i64, captured: Captured) {
        let ticks = ticks.max(0);
        debug!(target: "time", "Scheduled {callback:?} in {ticks} ticks");
        self.state
            .delays
            .push_back(Delay::new(ticks, callback, captured));
    }

    /// Fire due delays until none remain.
    pub fn drain(&mut self) -> Result<()> {
        loop {
            let due = self.state.take_due();
            if due.is_empty() {
                return Ok(());
            }
            let mut due = due.into_iter();
            while let Some(delay) = due.next() {
                if let Err(err) = self.fire(delay) {
                    self.state.requeue(due);
                    return Err(err);
                }
            }
        }
    }

    fn fire(&mut self, delay: Delay) -> Result<()> {
        trace!(target: "time", "Firing {:?}", delay.callback);
        match delay.callback {
            Callback::Script(script) => {
                Scope::restore(self, delay.environment).run(&script)?;
            }
            Callback::Entity(name) => {
                self.get_entity(&name)?;
                let Captured { bindings, storage } = delay.environment;
                let bindings = Bindings {
                    caster: bindings.caster.or_else(|| Some(name.clone())),
                    target: bindings.target.or_else(|| Some(name.clone())),
                    mover: Some(name),
                };
                Scope::restore(self, Captured { bindings, storage }).perform()?;
            }
        }
        Ok(())
    }

    fn run_tick_rule(&mut self) -> Result<()> {
        let rule = self.config.tick_rule.clone();
        if !self.contains(&rule) {
            return Ok(());
        }
        let check = Scope::new(self, Bindings::of(&rule, &rule, &rule)).perform()?;
        if let Some(cause) = check.cause() {
            trace!(target: "time", "Tick rule held back by `{}`", cause.raw());
        }
        Ok(())
    }
}
