//! Ultimately-periodic models
//!
//! A satisfiable verdict comes with a lasso: a finite sequence of states
//! followed by a cycle back to `loop_state`. Each state records the atoms
//! the tableau committed to, positively or negatively; atoms a state does
//! not mention are unconstrained.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An atom or its negation inside a model state
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub name: String,
    pub positive: bool,
}

impl Literal {
    pub fn positive(name: impl Into<String>) -> Self {
        Literal {
            name: name.into(),
            positive: true,
        }
    }

    pub fn negative(name: impl Into<String>) -> Self {
        Literal {
            name: name.into(),
            positive: false,
        }
    }

    /// The ⊤ literal used for the degenerate one-state model
    pub fn truth() -> Self {
        Literal::positive("\u{22a4}")
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}", self.name)
        } else {
            write!(f, "¬{}", self.name)
        }
    }
}

/// One time step of a model: the set of committed literals
pub type State = BTreeSet<Literal>;

/// A lasso: `states[loop_state..]` repeats forever
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub states: Vec<State>,
    /// Index of the first state of the periodic part
    pub loop_state: u64,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            write!(f, "{}: ", i)?;
            if state.is_empty() {
                write!(f, "⊤")?;
            } else {
                for (n, literal) in state.iter().enumerate() {
                    if n > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", literal)?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "loop -> {}", self.loop_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_display_with_polarity() {
        assert_eq!(Literal::positive("p").to_string(), "p");
        assert_eq!(Literal::negative("p").to_string(), "¬p");
    }

    #[test]
    fn model_display_marks_the_loop() {
        let model = Model {
            states: vec![
                [Literal::positive("p"), Literal::negative("q")]
                    .into_iter()
                    .collect(),
                State::new(),
            ],
            loop_state: 1,
        };
        assert_eq!(model.to_string(), "0: p ¬q\n1: ⊤\nloop -> 1");
    }
}
