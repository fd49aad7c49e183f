//! Action log records.
//!
//! Every move combination that passes its requires and runs its effects is
//! appended to the engine's log as an [`ActionRecord`]. The log is part of
//! engine state, so it is copied into revert frames and rolled back with
//! them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A record of an executed move.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Engine time when the move ran.
    pub time: i64,
    pub caster: String,
    pub target: String,
    /// The move entity whose effects ran.
    pub mover: String,
}

impl ActionRecord {
    #[must_use]
    pub fn new(
        time: i64,
        caster: impl Into<String>,
        target: impl Into<String>,
        mover: impl Into<String>,
    ) -> Self {
        Self {
            time,
            caster: caster.into(),
            target: target.into(),
            mover: mover.into(),
        }
    }
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[t={}] {} -> {} ({})",
            self.time, self.caster, self.target, self.mover
        )
    }
}
