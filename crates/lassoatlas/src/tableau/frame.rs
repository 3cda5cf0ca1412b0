//! Search-stack frames
//!
//! A frame is one node of the tableau proof search: either a time step of
//! the candidate model or a branching/delegation point within one. Frames
//! copy their parent's bitsets on push; the `chain` field is a stack index
//! rather than a reference, so stack growth never invalidates it: ancestors
//! always sit below their descendants and outlive them.

use super::bitset::Bitset;
use super::eventuality::Eventuality;
use crate::sat::SatBackend;

/// How a frame participates in the search, and how to resume it on rollback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Plain expansion frame; nothing to resume
    Normal,
    /// Fired a β-rule; the second alternative is still available
    Choice,
    /// Completed a time step; anchor of the chain below it
    Step,
    /// Delegated its disjunctions to the SAT backend; may yield more models
    Sat,
    /// Transient mark for a SAT frame whose instance came back unsatisfiable
    Unknown,
}

/// One element of the proof-search stack
pub struct Frame {
    /// Time index of this frame in the candidate model
    pub id: u64,
    /// Closure members asserted at this time step
    pub formulas: Bitset,
    /// β-rule candidates not yet picked at this step
    pub to_process: Bitset,
    /// Promise slots, one per eventuality
    pub eventualities: Vec<Eventuality>,
    /// Stack index of the nearest STEP ancestor
    pub chain: Option<usize>,
    pub kind: FrameKind,
    /// Closure index of the β-formula whose first alternative is being
    /// explored (`kind == Choice`); taken on rollback
    pub chosen: Option<usize>,
    /// Owned propositional solver (`kind == Sat`)
    pub solver: Option<SatBackend>,
    /// Closure indices exposed as propositional variables to the SAT bridge
    pub literals: Vec<usize>,
}

impl Frame {
    /// Root frame: asserts only the start formula at time 0.
    pub fn root(start_index: usize, width: usize, slots: usize) -> Self {
        let mut formulas = Bitset::new(width);
        formulas.set(start_index);
        Frame {
            id: 0,
            formulas,
            to_process: Bitset::filled(width),
            eventualities: vec![Eventuality::Unrequested; slots],
            chain: None,
            kind: FrameKind::Normal,
            chosen: None,
            solver: None,
            literals: Vec::new(),
        }
    }

    /// Same-time-step child: inherits the parent's asserted set, pending
    /// work, promises, and chain anchor. The caller overlays the updates
    /// mandated by whichever rule fired.
    pub fn child_of(parent: &Frame) -> Self {
        Frame {
            id: parent.id,
            formulas: parent.formulas.clone(),
            to_process: parent.to_process.clone(),
            eventualities: parent.eventualities.clone(),
            chain: parent.chain,
            kind: FrameKind::Normal,
            chosen: None,
            solver: None,
            literals: Vec::new(),
        }
    }

    /// Next-time-step child: empty asserted set (the STEP rule fills it from
    /// the parent's X-obligations), fresh pending work, inherited promises,
    /// chained to the parent.
    pub fn step_from(parent: &Frame, parent_index: usize, width: usize) -> Self {
        Frame {
            id: parent.id + 1,
            formulas: Bitset::new(width),
            to_process: Bitset::filled(width),
            eventualities: parent.eventualities.clone(),
            chain: Some(parent_index),
            kind: FrameKind::Normal,
            chosen: None,
            solver: None,
            literals: Vec::new(),
        }
    }
}
