//! Closure construction
//!
//! The closure is the ground set of the whole search: the subformulas of the
//! input, the simplified negation of each, and an X-skin for every fixpoint
//! formula, sorted under the structural tableau ordering and deduplicated.
//! The ordering places each formula immediately below its negation and each
//! fixpoint formula immediately below its X-skin, which is what lets the
//! engine run its rules as shift-and-mask bit operations.
//!
//! Everything here is computed once and immutable for the lifetime of a
//! solve.

use crate::ltl::{negated, tableau_cmp, Formula, FormulaRef};
use indexmap::IndexSet;

use super::bitset::Bitset;

const NONE: usize = usize::MAX;

/// One literal of a per-entry CNF clause fragment for the SAT bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClauseLit {
    /// Closure index acting as the propositional variable
    pub index: usize,
    pub negated: bool,
}

impl ClauseLit {
    fn positive(index: usize) -> Self {
        ClauseLit { index, negated: false }
    }

    fn negative(index: usize) -> Self {
        ClauseLit { index, negated: true }
    }
}

/// The closure and all of its side tables
pub struct Closure {
    formulas: Vec<FormulaRef>,
    start_index: usize,

    /// Kind masks: each closure entry is flagged in exactly one
    pub atom: Bitset,
    pub negation: Bitset,
    pub next: Bitset,
    pub always: Bitset,
    pub eventually: Bitset,
    pub conjunction: Bitset,
    pub disjunction: Bitset,
    pub until: Bitset,
    pub not_until: Bitset,

    lhs: Vec<usize>,
    rhs: Vec<usize>,
    atom_names: Vec<Option<String>>,
    clauses: Vec<Vec<ClauseLit>>,

    /// Closure index of an awaited subformula → promise slot
    fw_ev: Vec<usize>,
    /// Promise slot → closure index of the awaited subformula
    bw_ev: Vec<usize>,
}

impl Closure {
    /// Build the closure of a simplified, non-constant formula.
    pub fn build(formula: &FormulaRef) -> Closure {
        // Subformulas of the input, then the simplified negation of each.
        // The negation of a subformula's child is itself the negation of a
        // subformula, so the union is closed under the tableau's child
        // relation (the children of ¬(α U β) are ¬α and ¬β, both present
        // because α and β are).
        let mut gathered: IndexSet<FormulaRef> = IndexSet::new();
        collect_subformulas(formula, &mut gathered);
        let originals: Vec<FormulaRef> = gathered.iter().cloned().collect();
        for f in &originals {
            collect_subformulas(&negated(f), &mut gathered);
        }

        // X-skins: every fixpoint formula needs its one-step-deferred form
        // adjacent in the closure so the unfolding rules can reach it.
        let skins: Vec<FormulaRef> = gathered
            .iter()
            .filter(|f| is_fixpoint(f))
            .map(|f| Formula::next(f.clone()))
            .collect();
        for skin in skins {
            gathered.insert(skin);
        }

        let mut formulas: Vec<FormulaRef> = gathered.into_iter().collect();
        formulas.sort_by(|a, b| tableau_cmp(a, b));
        formulas.dedup();

        let n = formulas.len();
        let start_index = position_of(&formulas, formula);

        let mut closure = Closure {
            formulas,
            start_index,
            atom: Bitset::new(n),
            negation: Bitset::new(n),
            next: Bitset::new(n),
            always: Bitset::new(n),
            eventually: Bitset::new(n),
            conjunction: Bitset::new(n),
            disjunction: Bitset::new(n),
            until: Bitset::new(n),
            not_until: Bitset::new(n),
            lhs: vec![NONE; n],
            rhs: vec![NONE; n],
            atom_names: vec![None; n],
            clauses: vec![Vec::new(); n],
            fw_ev: vec![NONE; n],
            bw_ev: Vec::new(),
        };

        for i in 0..n {
            closure.index_entry(i);
        }
        closure.build_eventuality_tables();
        closure.build_clause_tables();
        closure.check_adjacency();
        closure
    }

    /// Number of closure entries
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Position of the input formula
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn formula(&self, index: usize) -> &FormulaRef {
        &self.formulas[index]
    }

    /// Closure index of the first immediate subformula
    pub fn lhs(&self, index: usize) -> usize {
        debug_assert_ne!(self.lhs[index], NONE);
        self.lhs[index]
    }

    /// Closure index of the second immediate subformula
    pub fn rhs(&self, index: usize) -> usize {
        debug_assert_ne!(self.rhs[index], NONE);
        self.rhs[index]
    }

    pub fn atom_name(&self, index: usize) -> Option<&str> {
        self.atom_names[index].as_deref()
    }

    pub fn clause(&self, index: usize) -> &[ClauseLit] {
        &self.clauses[index]
    }

    /// Promise slot awaiting the subformula at this closure index
    pub fn slot_of(&self, index: usize) -> usize {
        debug_assert_ne!(self.fw_ev[index], NONE);
        self.fw_ev[index]
    }

    /// Closure index awaited by this promise slot
    pub fn awaited_by_slot(&self, slot: usize) -> usize {
        self.bw_ev[slot]
    }

    pub fn slot_count(&self) -> usize {
        self.bw_ev.len()
    }

    /// Closure index of X(φ) for the fixpoint formula φ at `index`.
    ///
    /// The skin sits at index+1 unless the negation of φ intervenes, in
    /// which case it sits at index+2. The `lhs` check matters for a
    /// ¬(α U β): the entry right above it is the X(α U β) skin of the until
    /// one slot below, which must not be picked up.
    pub fn next_state_skin(&self, index: usize) -> usize {
        if self.next.get(index + 1) && self.lhs[index + 1] == index {
            index + 1
        } else {
            debug_assert!(self.next.get(index + 2) && self.lhs[index + 2] == index);
            index + 2
        }
    }

    fn index_entry(&mut self, i: usize) {
        let entry = self.formulas[i].clone();
        match entry.as_ref() {
            Formula::Atom(name) => {
                self.atom.set(i);
                self.atom_names[i] = Some(name.clone());
            }
            Formula::Not(inner) => {
                if let Formula::Until(a, b) = inner.as_ref() {
                    self.not_until.set(i);
                    self.lhs[i] = self.position(&negated(a));
                    self.rhs[i] = self.position(&negated(b));
                } else {
                    self.negation.set(i);
                    self.lhs[i] = self.position(inner);
                }
            }
            Formula::Next(x) => {
                self.next.set(i);
                self.lhs[i] = self.position(x);
            }
            Formula::Always(x) => {
                self.always.set(i);
                self.lhs[i] = self.position(x);
            }
            Formula::Eventually(x) => {
                self.eventually.set(i);
                self.lhs[i] = self.position(x);
            }
            Formula::And(a, b) => {
                self.conjunction.set(i);
                self.lhs[i] = self.position(a);
                self.rhs[i] = self.position(b);
            }
            Formula::Or(a, b) => {
                self.disjunction.set(i);
                self.lhs[i] = self.position(a);
                self.rhs[i] = self.position(b);
            }
            Formula::Until(a, b) => {
                self.until.set(i);
                self.lhs[i] = self.position(a);
                self.rhs[i] = self.position(b);
            }
            Formula::True | Formula::False | Formula::Implies(..) | Formula::Iff(..) => {
                panic!("closure entry {} not in the tableau base", entry)
            }
        }
    }

    fn build_eventuality_tables(&mut self) {
        let mut awaited: Vec<FormulaRef> = Vec::new();
        for i in 0..self.len() {
            if self.eventually.get(i) {
                awaited.push(self.formulas[self.lhs[i]].clone());
            } else if self.until.get(i) {
                awaited.push(self.formulas[self.rhs[i]].clone());
            } else if self.not_until.get(i) {
                awaited.push(self.formulas[self.lhs[i]].clone());
                awaited.push(self.formulas[self.rhs[i]].clone());
            }
        }
        awaited.sort_by(|a, b| tableau_cmp(a, b));
        awaited.dedup();

        self.bw_ev = Vec::with_capacity(awaited.len());
        for (slot, f) in awaited.iter().enumerate() {
            let pos = self.position(f);
            self.fw_ev[pos] = slot;
            self.bw_ev.push(pos);
        }
    }

    fn build_clause_tables(&mut self) {
        for i in 0..self.len() {
            let entry = self.formulas[i].clone();
            match entry.as_ref() {
                Formula::Atom(_)
                | Formula::Always(_)
                | Formula::Eventually(_)
                | Formula::Until(..) => {
                    self.clauses[i].push(ClauseLit::positive(i));
                }
                // Covers ¬(α U β) as well: its variable is the until below.
                Formula::Not(_) => {
                    self.clauses[i].push(ClauseLit::negative(i - 1));
                }
                Formula::Next(x) => {
                    if matches!(x.as_ref(), Formula::Not(_)) {
                        self.clauses[i].push(ClauseLit::negative(i - 1));
                    } else {
                        self.clauses[i].push(ClauseLit::positive(i));
                    }
                }
                Formula::Or(..) => {
                    let mut lits = Vec::new();
                    self.flatten_disjunction(&entry, &mut lits);
                    self.clauses[i] = lits;
                }
                // The frame set is a conjunction already; nothing to add.
                Formula::And(..) => {}
                Formula::True | Formula::False | Formula::Implies(..) | Formula::Iff(..) => {
                    unreachable!()
                }
            }
        }
    }

    // A disjunction flattens into one clause over its non-disjunction
    // leaves; negations (and X-of-negation skins) flip to the negative
    // literal of the paired entry below.
    fn flatten_disjunction(&self, f: &FormulaRef, out: &mut Vec<ClauseLit>) {
        if let Formula::Or(a, b) = f.as_ref() {
            for child in [a, b] {
                if matches!(child.as_ref(), Formula::Or(..)) {
                    self.flatten_disjunction(child, out);
                } else {
                    let index = self.position(child);
                    let negative = match child.as_ref() {
                        Formula::Not(_) => true,
                        Formula::Next(x) => matches!(x.as_ref(), Formula::Not(_)),
                        _ => false,
                    };
                    if negative {
                        out.push(ClauseLit::negative(index - 1));
                    } else {
                        out.push(ClauseLit::positive(index));
                    }
                }
            }
        }
    }

    fn position(&self, f: &FormulaRef) -> usize {
        position_of(&self.formulas, f)
    }

    // The pairing and X-adjacency invariants everything downstream relies on.
    fn check_adjacency(&self) {
        for i in 0..self.len() {
            if self.negation.get(i) {
                debug_assert_eq!(self.lhs[i], i - 1, "negation not paired at {}", i);
            }
            if self.always.get(i) || self.eventually.get(i) {
                debug_assert!(
                    self.next.get(i + 1) && self.lhs[i + 1] == i,
                    "missing X-skin above entry {}",
                    i
                );
            }
            if self.until.get(i) || self.not_until.get(i) {
                let skin = self.next_state_skin(i);
                debug_assert!(self.next.get(skin) && self.lhs[skin] == i);
            }
        }
    }
}

fn collect_subformulas(f: &FormulaRef, out: &mut IndexSet<FormulaRef>) {
    if !out.insert(f.clone()) {
        return;
    }
    match f.as_ref() {
        Formula::True | Formula::False | Formula::Atom(_) => {}
        Formula::Not(x) | Formula::Next(x) | Formula::Always(x) | Formula::Eventually(x) => {
            collect_subformulas(x, out);
        }
        Formula::And(a, b)
        | Formula::Or(a, b)
        | Formula::Until(a, b)
        | Formula::Implies(a, b)
        | Formula::Iff(a, b) => {
            collect_subformulas(a, out);
            collect_subformulas(b, out);
        }
    }
}

fn is_fixpoint(f: &FormulaRef) -> bool {
    match f.as_ref() {
        Formula::Always(_) | Formula::Eventually(_) | Formula::Until(..) => true,
        Formula::Not(x) => matches!(x.as_ref(), Formula::Until(..)),
        _ => false,
    }
}

fn position_of(formulas: &[FormulaRef], f: &FormulaRef) -> usize {
    formulas
        .binary_search_by(|entry| tableau_cmp(entry, f))
        .unwrap_or_else(|_| panic!("closure is missing required subformula {}", f))
}
