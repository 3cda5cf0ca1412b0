//! LassoAtlas: a one-pass tree-tableau satisfiability solver for linear
//! temporal logic
//!
//! Given an LTL formula over discrete infinite time, the solver decides
//! satisfiability and, for satisfiable formulas, produces an ultimately
//! periodic model: a finite prefix of states followed by a cycle. The search
//! expands the formula's closure frame by frame, tracks pending
//! eventualities, recognises lassos through the chain of time steps, and can
//! delegate local disjunctive choices to an embedded CDCL backend.
//!
//! ```
//! use lassoatlas::{parse_formula, Solver, SolverConfig, Verdict};
//!
//! let formula = parse_formula("G F p").unwrap();
//! let mut solver = Solver::new(&formula, SolverConfig::default());
//! assert_eq!(solver.solve(), Verdict::Satisfiable);
//! let model = solver.model().unwrap();
//! assert!(model.loop_state < model.states.len() as u64);
//! ```

pub mod config;
pub mod json;
pub mod ltl;
pub mod model;
pub mod parser;
pub mod sat;
pub mod solver;
pub mod tableau;

// Re-export the types that make up the public surface
pub use config::SolverConfig;
pub use json::{ModelJson, ResultJson};
pub use ltl::{negated, simplify, Formula, FormulaRef};
pub use model::{Literal, Model, State};
pub use parser::{parse_formula, ParseError};
pub use solver::{Solver, Verdict};
