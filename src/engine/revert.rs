//! Bounded rollback history.
//!
//! With `revert_depth > 0`, every clock step records the state it started
//! from, so frame `k = 1` is the state one tick before the current one. The
//! buffer keeps at most `revert_depth` frames and evicts the oldest.
//!
//! Retrieving frame `k` truncates the buffer so it ends at that frame: a
//! rollback discards the future it branched away from.

use tracing::debug;

use super::Engine;
use crate::core::EngineState;

impl Engine {
    /// Number of recorded frames.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// An engine holding the state from `k` steps ago, or `None` when fewer
    /// than `k` frames exist (or `k == 0`).
    ///
    /// Frames are taken at the start of each clock step, so frame `k = 1`
    /// includes every move made since the previous step, just before the
    /// clock last advanced.
    ///
    /// The live engine keeps its current state; only its history is
    /// truncated.
    pub fn get_revert(&mut self, k: usize) -> Option<Engine> {
        let frame = self.truncate_to(k)?;
        let mut engine = self.clone();
        engine.state = frame;
        Some(engine)
    }

    /// Roll the live engine back `k` steps. Returns false when the frame
    /// does not exist.
    pub fn revert(&mut self, k: usize) -> bool {
        match self.truncate_to(k) {
            Some(frame) => {
                self.state = frame;
                true
            }
            None => false,
        }
    }

    pub(crate) fn record_frame(&mut self) {
        let depth = self.config.revert_depth;
        if depth == 0 {
            return;
        }
        self.history.push_back(self.state.clone());
        while self.history.len() > depth {
            self.history.pop_front();
        }
    }

    fn truncate_to(&mut self, k: usize) -> Option<EngineState> {
        let len = self.history.len();
        if k == 0 || k > len {
            debug!(target: "revert", "No frame {k} ({len} recorded)");
            return None;
        }
        self.history.truncate(len - k + 1);
        let frame = self.history.back().cloned();
        debug!(target: "revert", "Retrieved frame {k}, {} left", self.history.len());
        frame
    }
}
