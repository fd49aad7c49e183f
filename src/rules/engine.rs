//! Rules trait for search callers.
//!
//! A search algorithm needs two answers the engine cannot give on its own:
//! which (caster, target, move) triples are worth trying, and whether the
//! simulation is over. Games implement [`Rules`] to provide them; stepping,
//! copying and require checks stay in the engine.

use crate::core::Selector;
use crate::engine::{Engine, MoveCheck};
use crate::error::Result;

/// Result of a finished simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Single winning entity (usually a player entity).
    Winner(String),
    /// Draw (no winner).
    Draw,
    /// Multiple winners (team games, shared victory).
    Winners(Vec<String>),
}

impl Outcome {
    #[must_use]
    pub fn is_winner(&self, entity: &str) -> bool {
        match self {
            Outcome::Winner(name) => name == entity,
            Outcome::Winners(names) => names.iter().any(|name| name == entity),
            Outcome::Draw => false,
        }
    }
}

/// One candidate move invocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MoveChoice {
    pub caster: String,
    pub target: String,
    pub mover: String,
}

impl MoveChoice {
    #[must_use]
    pub fn new(caster: impl Into<String>, target: impl Into<String>, mover: impl Into<String>) -> Self {
        Self {
            caster: caster.into(),
            target: target.into(),
            mover: mover.into(),
        }
    }
}

/// Game-specific rules over an [`Engine`].
///
/// ## Implementation Notes
///
/// - `legal_moves`: may over-approximate; [`Rules::successors`] drops
///   choices whose requires fail
/// - `end_state`: return `None` while the simulation continues
pub trait Rules {
    /// Candidate moves in the current state.
    fn legal_moves(&self, engine: &Engine) -> Vec<MoveChoice>;

    /// Check if the simulation is over.
    fn end_state(&self, engine: &Engine) -> Option<Outcome>;

    // === Convenience Methods ===

    /// Run one choice on `engine`. Returns whether its requires passed.
    fn apply(&self, engine: &mut Engine, choice: &MoveChoice) -> Result<bool> {
        engine.control_move(
            &Selector::from(&choice.caster),
            &Selector::from(&choice.target),
            &Selector::from(&choice.mover),
        )
    }

    /// Choices whose requires pass, checked on a copy.
    fn passing_moves(&self, engine: &Engine) -> Result<Vec<MoveChoice>> {
        engine.what_if(|copy| {
            let mut passing = Vec::new();
            for choice in self.legal_moves(copy) {
                let check = copy.test_move(&choice.caster, &choice.target, &choice.mover)?;
                if check == MoveCheck::Passed {
                    passing.push(choice);
                }
            }
            Ok(passing)
        })
    }

    /// Each passing choice paired with the engine it leads to.
    ///
    /// The live engine is never touched.
    fn successors(&self, engine: &Engine) -> Result<Vec<(MoveChoice, Engine)>> {
        let mut out = Vec::new();
        for choice in self.legal_moves(engine) {
            let mut next = engine.copy();
            if self.apply(&mut next, &choice)? {
                out.push((choice, next));
            }
        }
        Ok(out)
    }
}
