//! LTL formula trees
//!
//! Formulas are immutable trees shared through `Arc`, so the closure builder
//! can hold many overlapping subformulas without deep copies. `Implies` and
//! `Iff` exist only at the surface: the simplifier eliminates them before any
//! formula reaches the tableau.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a formula node
pub type FormulaRef = Arc<Formula>;

/// An LTL formula over discrete infinite time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    True,
    False,
    Atom(String),
    Not(FormulaRef),
    /// X φ: φ holds in the next state
    Next(FormulaRef),
    /// G φ: φ holds in every state from now on
    Always(FormulaRef),
    /// F φ: φ holds in some future state
    Eventually(FormulaRef),
    And(FormulaRef, FormulaRef),
    Or(FormulaRef, FormulaRef),
    /// φ U ψ: ψ eventually holds, and φ holds until then
    Until(FormulaRef, FormulaRef),
    /// Surface syntax only; removed by the simplifier
    Implies(FormulaRef, FormulaRef),
    /// Surface syntax only; removed by the simplifier
    Iff(FormulaRef, FormulaRef),
}

impl Formula {
    pub fn top() -> FormulaRef {
        Arc::new(Formula::True)
    }

    pub fn bottom() -> FormulaRef {
        Arc::new(Formula::False)
    }

    pub fn atom(name: impl Into<String>) -> FormulaRef {
        Arc::new(Formula::Atom(name.into()))
    }

    pub fn not(f: FormulaRef) -> FormulaRef {
        Arc::new(Formula::Not(f))
    }

    pub fn next(f: FormulaRef) -> FormulaRef {
        Arc::new(Formula::Next(f))
    }

    pub fn always(f: FormulaRef) -> FormulaRef {
        Arc::new(Formula::Always(f))
    }

    pub fn eventually(f: FormulaRef) -> FormulaRef {
        Arc::new(Formula::Eventually(f))
    }

    pub fn and(lhs: FormulaRef, rhs: FormulaRef) -> FormulaRef {
        Arc::new(Formula::And(lhs, rhs))
    }

    pub fn or(lhs: FormulaRef, rhs: FormulaRef) -> FormulaRef {
        Arc::new(Formula::Or(lhs, rhs))
    }

    pub fn until(lhs: FormulaRef, rhs: FormulaRef) -> FormulaRef {
        Arc::new(Formula::Until(lhs, rhs))
    }

    pub fn implies(lhs: FormulaRef, rhs: FormulaRef) -> FormulaRef {
        Arc::new(Formula::Implies(lhs, rhs))
    }

    pub fn iff(lhs: FormulaRef, rhs: FormulaRef) -> FormulaRef {
        Arc::new(Formula::Iff(lhs, rhs))
    }

    /// Rank used as the final tie-breaker of the tableau ordering
    fn kind_rank(&self) -> u8 {
        match self {
            Formula::True => 0,
            Formula::False => 1,
            Formula::Atom(_) => 2,
            Formula::Not(_) => 3,
            Formula::Next(_) => 4,
            Formula::Always(_) => 5,
            Formula::Eventually(_) => 6,
            Formula::And(..) => 7,
            Formula::Or(..) => 8,
            Formula::Until(..) => 9,
            Formula::Implies(..) => 10,
            Formula::Iff(..) => 11,
        }
    }
}

/// Structural ordering used to sort the closure.
///
/// The ordering descends through `Not` and `Next` skins, placing the bare
/// operand immediately before its wrapped form: `φ < ¬φ` and `φ < Xφ`
/// whenever the other side is exactly the operand. Every other pairing
/// compares same-kind nodes child-by-child and falls back to the kind rank.
/// This adjacency is what the engine's shift-by-one bit tricks rely on.
pub fn tableau_cmp(a: &Formula, b: &Formula) -> Ordering {
    use Formula::*;

    match (a, b) {
        (Atom(x), Atom(y)) => x.cmp(y),
        (Not(x), Not(y)) => tableau_cmp(x, y),
        (Not(x), _) => {
            if x.as_ref() == b {
                Ordering::Greater
            } else {
                tableau_cmp(x, b)
            }
        }
        (_, Not(y)) => {
            if a == y.as_ref() {
                Ordering::Less
            } else {
                tableau_cmp(a, y)
            }
        }
        (Next(x), Next(y)) => tableau_cmp(x, y),
        (Next(x), _) => {
            if x.as_ref() == b {
                Ordering::Greater
            } else {
                tableau_cmp(x, b)
            }
        }
        (_, Next(y)) => {
            if a == y.as_ref() {
                Ordering::Less
            } else {
                tableau_cmp(a, y)
            }
        }
        (Always(x), Always(y)) => tableau_cmp(x, y),
        (Eventually(x), Eventually(y)) => tableau_cmp(x, y),
        (And(xl, xr), And(yl, yr))
        | (Or(xl, xr), Or(yl, yr))
        | (Until(xl, xr), Until(yl, yr)) => {
            tableau_cmp(xl, yl).then_with(|| tableau_cmp(xr, yr))
        }
        _ => a.kind_rank().cmp(&b.kind_rank()),
    }
}

// Precedence levels for printing; higher binds tighter.
fn precedence(f: &Formula) -> u8 {
    match f {
        Formula::Iff(..) => 1,
        Formula::Implies(..) => 2,
        Formula::Or(..) => 3,
        Formula::And(..) => 4,
        Formula::Until(..) => 5,
        Formula::Not(_) | Formula::Next(_) | Formula::Always(_) | Formula::Eventually(_) => 6,
        Formula::True | Formula::False | Formula::Atom(_) => 7,
    }
}

fn fmt_child(f: &Formula, parent: u8, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    if precedence(f) < parent {
        write!(out, "({})", f)
    } else {
        write!(out, "{}", f)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(out, "⊤"),
            Formula::False => write!(out, "⊥"),
            Formula::Atom(name) => write!(out, "{}", name),
            Formula::Not(f) => {
                write!(out, "¬")?;
                fmt_child(f, 7, out)
            }
            Formula::Next(f) => {
                write!(out, "X ")?;
                fmt_child(f, 6, out)
            }
            Formula::Always(f) => {
                write!(out, "G ")?;
                fmt_child(f, 6, out)
            }
            Formula::Eventually(f) => {
                write!(out, "F ")?;
                fmt_child(f, 6, out)
            }
            Formula::And(l, r) => {
                fmt_child(l, 4, out)?;
                write!(out, " ∧ ")?;
                fmt_child(r, 4, out)
            }
            Formula::Or(l, r) => {
                fmt_child(l, 3, out)?;
                write!(out, " ∨ ")?;
                fmt_child(r, 3, out)
            }
            Formula::Until(l, r) => {
                fmt_child(l, 6, out)?;
                write!(out, " U ")?;
                fmt_child(r, 6, out)
            }
            Formula::Implies(l, r) => {
                fmt_child(l, 3, out)?;
                write!(out, " → ")?;
                fmt_child(r, 2, out)
            }
            Formula::Iff(l, r) => {
                fmt_child(l, 2, out)?;
                write!(out, " ↔ ")?;
                fmt_child(r, 1, out)
            }
        }
    }
}
