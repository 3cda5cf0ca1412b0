//! Data structures of the tableau engine
//!
//! The closure and its side tables are built once per solve and stay
//! immutable; frames own mutable copies of the per-step bitsets and promise
//! slots. The solver module drives these through the rule engine.

pub mod bitset;
pub mod closure;
pub mod eventuality;
pub mod frame;

pub use bitset::Bitset;
pub use closure::{ClauseLit, Closure};
pub use eventuality::Eventuality;
pub use frame::{Frame, FrameKind};
