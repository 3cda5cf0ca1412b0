//! LTL formula representation and rewriting
//!
//! This module provides the formula trees the rest of the crate works on:
//! the AST with its structural tableau ordering, and the simplifier that
//! rewrites surface formulas into the base the tableau expands.

pub mod formula;
pub mod simplifier;

pub use formula::{tableau_cmp, Formula, FormulaRef};
pub use simplifier::{negated, simplify};
