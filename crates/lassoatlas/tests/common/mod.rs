//! Shared test helpers: a reference LTL evaluator over lasso models.
//!
//! The evaluator treats a model as the ultimately periodic word it denotes
//! (after the last state the word continues at `loop_state`) and decides
//! satisfaction directly from the semantics. Atoms a state does not mention
//! are read as false, which is the completion the solver's committed
//! literals license.

use lassoatlas::{Formula, FormulaRef, Literal, Model};
use std::collections::HashSet;

/// Does the model satisfy the formula at time 0?
pub fn model_satisfies(model: &Model, formula: &FormulaRef) -> bool {
    assert!(!model.states.is_empty(), "a lasso has at least one state");
    assert!((model.loop_state as usize) < model.states.len());
    eval(model, formula, 0)
}

fn successor(model: &Model, position: usize) -> usize {
    if position + 1 < model.states.len() {
        position + 1
    } else {
        model.loop_state as usize
    }
}

fn atom_holds(model: &Model, name: &str, position: usize) -> bool {
    model.states[position].contains(&Literal::positive(name))
}

fn eval(model: &Model, formula: &FormulaRef, position: usize) -> bool {
    match formula.as_ref() {
        Formula::True => true,
        Formula::False => false,
        Formula::Atom(name) => atom_holds(model, name, position),
        Formula::Not(x) => !eval(model, x, position),
        Formula::Next(x) => eval(model, x, successor(model, position)),
        Formula::And(a, b) => eval(model, a, position) && eval(model, b, position),
        Formula::Or(a, b) => eval(model, a, position) || eval(model, b, position),
        Formula::Implies(a, b) => !eval(model, a, position) || eval(model, b, position),
        Formula::Iff(a, b) => eval(model, a, position) == eval(model, b, position),
        Formula::Always(x) => {
            let mut visited = HashSet::new();
            let mut at = position;
            loop {
                if !eval(model, x, at) {
                    return false;
                }
                if !visited.insert(at) {
                    return true;
                }
                at = successor(model, at);
            }
        }
        Formula::Eventually(x) => {
            let mut visited = HashSet::new();
            let mut at = position;
            loop {
                if eval(model, x, at) {
                    return true;
                }
                if !visited.insert(at) {
                    return false;
                }
                at = successor(model, at);
            }
        }
        Formula::Until(a, b) => {
            let mut visited = HashSet::new();
            let mut at = position;
            loop {
                if eval(model, b, at) {
                    return true;
                }
                if !eval(model, a, at) {
                    return false;
                }
                if !visited.insert(at) {
                    return false;
                }
                at = successor(model, at);
            }
        }
    }
}
