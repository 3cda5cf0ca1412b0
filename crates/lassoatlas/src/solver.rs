//! The one-pass tableau engine
//!
//! `Solver` drives a backtracking search over consistent sets of closure
//! members. Each stack frame holds one candidate set; deterministic α-rules
//! expand conjunctions and always-formulas in place, branching β-rules push
//! CHOICE frames whose second alternative is taken on rollback, and the STEP
//! rule advances time by collecting X-obligations. The LOOP rule closes a
//! lasso when a completed frame is covered by a STEP ancestor with every
//! requested eventuality satisfied inside the candidate period; the REP rule
//! prunes a branch once the same asserted set shows up three times on a
//! chain. Local disjunctions can optionally be delegated to the SAT backend.
//!
//! The engine pauses when it finds a model; calling `solve` again rolls back
//! to the latest open choice and searches for the next one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use tracing::debug;

use crate::config::SolverConfig;
use crate::ltl::{simplify, Formula, FormulaRef};
use crate::model::{Literal, Model, State};
use crate::sat::SatBackend;
use crate::tableau::{Bitset, Closure, Frame, FrameKind};

/// Outcome of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Satisfiable,
    Unsatisfiable,
    /// The engine has not run yet
    Undefined,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Satisfiable => write!(f, "SATISFIABLE"),
            Verdict::Unsatisfiable => write!(f, "UNSATISFIABLE"),
            Verdict::Undefined => write!(f, "UNDEFINED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Initialized,
    /// Stopped on a model; the stack is intact and resumable
    Paused,
    Done,
}

/// LTL satisfiability solver
///
/// Construction simplifies the formula and builds the closure; `solve` runs
/// the search until a verdict, and `model` recovers the lasso after a
/// satisfiable pause.
pub struct Solver {
    formula: FormulaRef,
    state: EngineState,
    result: Verdict,
    engine: Option<Engine>,
}

impl Solver {
    /// Create a solver for the given formula.
    pub fn new(formula: &FormulaRef, config: SolverConfig) -> Self {
        let config = config.clamped();
        let simplified = simplify(formula);
        debug!(formula = %simplified, "simplified input");

        match simplified.as_ref() {
            Formula::True => Solver {
                formula: simplified,
                state: EngineState::Done,
                result: Verdict::Satisfiable,
                engine: None,
            },
            Formula::False => Solver {
                formula: simplified,
                state: EngineState::Done,
                result: Verdict::Unsatisfiable,
                engine: None,
            },
            _ => {
                let closure = Closure::build(&simplified);
                debug!(
                    entries = closure.len(),
                    eventualities = closure.slot_count(),
                    "closure built"
                );
                let engine = Engine::new(closure, config);
                Solver {
                    formula: simplified,
                    state: EngineState::Initialized,
                    result: Verdict::Undefined,
                    engine: Some(engine),
                }
            }
        }
    }

    /// The simplified form of the input
    pub fn formula(&self) -> &FormulaRef {
        &self.formula
    }

    /// Verdict of the last `solve`, or `Undefined` before the first
    pub fn result(&self) -> Verdict {
        self.result
    }

    /// Run or resume the search.
    ///
    /// After a satisfiable pause, the next call rolls back to the latest
    /// open choice and looks for a different model; once every branch is
    /// exhausted the engine is done and keeps returning its final verdict.
    pub fn solve(&mut self) -> Verdict {
        match self.state {
            EngineState::Done => return self.result,
            EngineState::Paused => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.rollback_to_latest_choice();
                }
            }
            EngineState::Initialized => {}
        }

        let engine = match self.engine.as_mut() {
            Some(engine) => engine,
            None => {
                self.state = EngineState::Done;
                return self.result;
            }
        };

        match engine.run() {
            Some(loop_state) => {
                debug!(loop_state, "paused on a model");
                self.result = Verdict::Satisfiable;
                self.state = EngineState::Paused;
            }
            None => {
                debug!("search exhausted");
                self.state = EngineState::Done;
                if self.result == Verdict::Undefined {
                    self.result = Verdict::Unsatisfiable;
                }
            }
        }
        self.result
    }

    /// The lasso behind the current satisfiable pause.
    ///
    /// Walks the stack bottom to top, skipping CHOICE and SAT frames (proof
    /// artifacts, not time steps), and emits the committed atoms of each
    /// remaining frame. The last state duplicates the loop closure and is
    /// dropped. A formula that simplified to ⊤ gets the one-state model
    /// `{⊤}` looping on itself.
    pub fn model(&self) -> Option<Model> {
        if self.result != Verdict::Satisfiable {
            return None;
        }
        let engine = match &self.engine {
            None => {
                let mut state = State::new();
                state.insert(Literal::truth());
                return Some(Model {
                    states: vec![state],
                    loop_state: 0,
                });
            }
            Some(engine) => engine,
        };
        if self.state != EngineState::Paused {
            return None;
        }

        let closure = &engine.closure;
        let mut states = Vec::new();
        for frame in &engine.stack {
            if frame.kind == FrameKind::Choice || frame.kind == FrameKind::Sat {
                continue;
            }
            let mut state = State::new();
            for j in frame.formulas.ones() {
                if let Some(name) = closure.atom_name(j) {
                    state.insert(Literal::positive(name));
                } else if closure.negation.get(j) {
                    if let Some(name) = closure.atom_name(closure.lhs(j)) {
                        state.insert(Literal::negative(name));
                    }
                }
            }
            states.push(state);
        }
        // The top frame restates the loop target.
        states.pop();
        Some(Model {
            states,
            loop_state: engine.loop_state,
        })
    }
}

/// Which β-rule to pick a candidate for
#[derive(Debug, Clone, Copy)]
enum BetaKind {
    Disjunction,
    Eventually,
    Until,
    NotUntil,
}

/// What the chain walk concluded
enum Lookback {
    /// Lasso found; payload is the id of the loop-entry ancestor
    Loop(u64),
    /// Three identical asserted sets on the chain; prune
    Repetition,
    Nothing,
}

struct Engine {
    closure: Closure,
    config: SolverConfig,
    stack: Vec<Frame>,
    /// Scratch bitset shared by all rules
    tmp: Bitset,
    rng: StdRng,
    loop_state: u64,
    has_eventually: bool,
    has_until: bool,
    has_not_until: bool,
}

impl Engine {
    fn new(closure: Closure, config: SolverConfig) -> Self {
        let width = closure.len();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let root = Frame::root(closure.start_index(), width, closure.slot_count());
        Engine {
            has_eventually: closure.eventually.any(),
            has_until: closure.until.any(),
            has_not_until: closure.not_until.any(),
            tmp: Bitset::new(width),
            stack: vec![root],
            closure,
            config,
            rng,
            loop_state: 0,
        }
    }

    /// Run until a model pauses the search (`Some(loop_state)`) or every
    /// branch is exhausted (`None`).
    fn run(&mut self) -> Option<u64> {
        'outer: while !self.stack.is_empty() {
            loop {
                {
                    let frame = self.stack.last().unwrap();
                    if frame.formulas.none() {
                        // Nothing left to satisfy: consistent end of the
                        // chain, looping on the last time step.
                        let loop_state = frame.chain.map(|i| self.stack[i].id).unwrap_or(0);
                        self.loop_state = loop_state;
                        return Some(loop_state);
                    }
                }

                if self.check_contradiction() {
                    self.rollback_to_latest_choice();
                    continue 'outer;
                }

                let mut fired = self.apply_conjunction_rule();
                fired |= self.apply_always_rule();

                if !self.should_use_sat() {
                    if let Some(chosen) = self.pick_beta(BetaKind::Disjunction) {
                        let frame = self.stack.last().unwrap();
                        let mut child = Frame::child_of(frame);
                        child.formulas.set(self.closure.lhs(chosen));
                        self.stack.push(child);
                        continue 'outer;
                    }
                }

                if self.has_eventually {
                    if let Some(chosen) = self.pick_beta(BetaKind::Eventually) {
                        let awaited = self.closure.lhs(chosen);
                        let slot = self.closure.slot_of(awaited);
                        let frame = self.stack.last_mut().unwrap();
                        frame.eventualities[slot].set_not_satisfied();
                        let mut child = Frame::child_of(frame);
                        child.formulas.set(awaited);
                        self.stack.push(child);
                        continue 'outer;
                    }
                }

                if self.has_until {
                    if let Some(chosen) = self.pick_beta(BetaKind::Until) {
                        let awaited = self.closure.rhs(chosen);
                        let slot = self.closure.slot_of(awaited);
                        let frame = self.stack.last_mut().unwrap();
                        frame.eventualities[slot].set_not_satisfied();
                        let mut child = Frame::child_of(frame);
                        child.formulas.set(awaited);
                        self.stack.push(child);
                        continue 'outer;
                    }
                }

                if self.has_not_until {
                    if let Some(chosen) = self.pick_beta(BetaKind::NotUntil) {
                        let first = self.closure.lhs(chosen);
                        let second = self.closure.rhs(chosen);
                        let first_slot = self.closure.slot_of(first);
                        let second_slot = self.closure.slot_of(second);
                        let frame = self.stack.last_mut().unwrap();
                        frame.eventualities[first_slot].set_not_satisfied();
                        frame.eventualities[second_slot].set_not_satisfied();
                        let mut child = Frame::child_of(frame);
                        child.formulas.set(first);
                        child.formulas.set(second);
                        self.stack.push(child);
                        continue 'outer;
                    }
                }

                if fired {
                    continue;
                }

                if self.should_use_sat() {
                    self.delegate_to_sat();
                    continue 'outer;
                }

                break;
            }

            self.update_eventualities();

            if self.lookback_coin() {
                match self.look_back() {
                    Lookback::Loop(loop_state) => {
                        self.loop_state = loop_state;
                        return Some(loop_state);
                    }
                    Lookback::Repetition => {
                        self.rollback_to_latest_choice();
                        continue 'outer;
                    }
                    Lookback::Nothing => {}
                }
            }

            if self.stack.last().unwrap().id >= self.config.maximum_depth {
                self.rollback_to_latest_choice();
                continue 'outer;
            }

            self.apply_step_rule();
        }
        None
    }

    /// A frame is contradictory when it asserts both φ and ¬φ. The closure
    /// keeps each negation directly above its operand, so masking the
    /// asserted negations, shifting down one, and masking the asserted set
    /// again leaves a bit exactly where both sides are present.
    fn check_contradiction(&mut self) -> bool {
        let frame = self.stack.last().unwrap();
        self.tmp.copy_from(&frame.formulas);
        self.tmp &= &self.closure.negation;
        self.tmp.shift_down_one();
        self.tmp &= &frame.formulas;
        self.tmp.any()
    }

    /// α-rule: assert both conjuncts of every pending conjunction.
    fn apply_conjunction_rule(&mut self) -> bool {
        let frame = self.stack.last_mut().unwrap();
        self.tmp.copy_from(&frame.formulas);
        self.tmp &= &self.closure.conjunction;
        self.tmp &= &frame.to_process;
        if self.tmp.none() {
            return false;
        }
        let mut one = self.tmp.find_first();
        while let Some(i) = one {
            frame.formulas.set(self.closure.lhs(i));
            frame.formulas.set(self.closure.rhs(i));
            frame.to_process.clear(i);
            one = self.tmp.find_next(i);
        }
        true
    }

    /// α-rule: unfold every pending G φ into φ now plus X(G φ).
    fn apply_always_rule(&mut self) -> bool {
        let frame = self.stack.last_mut().unwrap();
        self.tmp.copy_from(&frame.formulas);
        self.tmp &= &self.closure.always;
        self.tmp &= &frame.to_process;
        if self.tmp.none() {
            return false;
        }
        let mut one = self.tmp.find_first();
        while let Some(i) = one {
            frame.formulas.set(self.closure.lhs(i));
            debug_assert!(self.closure.next.get(i + 1) && self.closure.lhs(i + 1) == i);
            frame.formulas.set(i + 1);
            frame.to_process.clear(i);
            one = self.tmp.find_next(i);
        }
        true
    }

    /// Pick the lowest pending candidate of a β-kind, mark the frame as a
    /// CHOICE on it, and consume it from the pending mask.
    fn pick_beta(&mut self, kind: BetaKind) -> Option<usize> {
        let mask = match kind {
            BetaKind::Disjunction => &self.closure.disjunction,
            BetaKind::Eventually => &self.closure.eventually,
            BetaKind::Until => &self.closure.until,
            BetaKind::NotUntil => &self.closure.not_until,
        };
        let frame = self.stack.last_mut().unwrap();
        self.tmp.copy_from(&frame.formulas);
        self.tmp &= mask;
        self.tmp &= &frame.to_process;
        let chosen = self.tmp.find_first()?;
        frame.to_process.clear(chosen);
        frame.chosen = Some(chosen);
        frame.kind = FrameKind::Choice;
        Some(chosen)
    }

    /// STEP rule: advance time by one, carrying over the operand of every
    /// asserted X-formula.
    fn apply_step_rule(&mut self) {
        let parent_index = self.stack.len() - 1;
        {
            let frame = &self.stack[parent_index];
            self.tmp.copy_from(&frame.formulas);
        }
        self.tmp &= &self.closure.next;

        let frame = self.stack.last_mut().unwrap();
        frame.kind = FrameKind::Step;
        let mut child = Frame::step_from(frame, parent_index, self.closure.len());
        for i in 0..self.closure.len() {
            if self.tmp.get(i) {
                child.formulas.set(self.closure.lhs(i));
            }
        }
        self.stack.push(child);
    }

    /// Stamp every requested promise whose awaited subformula holds in the
    /// completed frame.
    fn update_eventualities(&mut self) {
        let frame = self.stack.last_mut().unwrap();
        for (slot, ev) in frame.eventualities.iter_mut().enumerate() {
            if frame.formulas.get(self.closure.awaited_by_slot(slot)) {
                ev.set_satisfied(frame.id);
            }
        }
    }

    fn lookback_coin(&mut self) -> bool {
        self.rng.gen_range(0..100u32) < self.config.backtrack_probability
    }

    /// Walk the STEP chain for the LOOP and REP rules.
    fn look_back(&self) -> Lookback {
        let frame = self.stack.last().unwrap();
        let mut repetitions = 0usize;
        let mut cursor = frame.chain;
        while let Some(index) = cursor {
            let ancestor = &self.stack[index];
            if frame.formulas.is_subset_of(&ancestor.formulas) {
                let all_satisfied = frame.eventualities.iter().all(|ev| {
                    ev.is_not_requested() || ev.id().map_or(false, |at| at >= ancestor.id)
                });
                if all_satisfied {
                    return Lookback::Loop(ancestor.id);
                }
                if frame.formulas == ancestor.formulas {
                    repetitions += 1;
                }
            }
            cursor = ancestor.chain;
        }
        if repetitions >= 2 {
            Lookback::Repetition
        } else {
            Lookback::Nothing
        }
    }

    /// Walk up the stack to the most recent frame that can still produce a
    /// different continuation: a CHOICE with its second alternative unused,
    /// or a SAT frame whose instance admits another assignment. Everything
    /// above it is popped.
    fn rollback_to_latest_choice(&mut self) {
        while let Some(top_index) = self.stack.len().checked_sub(1) {
            let kind = self.stack[top_index].kind;
            if kind == FrameKind::Choice && self.stack[top_index].chosen.is_some() {
                let chosen = self.stack[top_index].chosen.take().unwrap();
                let frame = &self.stack[top_index];
                let closure = &self.closure;
                let mut child = Frame::child_of(frame);
                if closure.disjunction.get(chosen) {
                    child.formulas.set(closure.rhs(chosen));
                } else if closure.eventually.get(chosen) {
                    // Defer: X(F φ)
                    child.formulas.set(closure.next_state_skin(chosen));
                } else if closure.until.get(chosen) {
                    // α now and X(α U β)
                    child.formulas.set(closure.lhs(chosen));
                    child.formulas.set(closure.next_state_skin(chosen));
                } else if closure.not_until.get(chosen) {
                    // ¬β now and X ¬(α U β)
                    child.formulas.set(closure.rhs(chosen));
                    child.formulas.set(closure.next_state_skin(chosen));
                } else {
                    unreachable!("choice on a non-branching closure entry");
                }
                self.stack.push(child);
                return;
            } else if kind == FrameKind::Sat {
                if let Some(child) = self.next_sat_assignment(top_index) {
                    self.stack.push(child);
                    return;
                }
            }
            self.stack.pop();
        }
    }

    /// True when the bridge is enabled and the top frame still has pending
    /// disjunctions for it.
    fn should_use_sat(&mut self) -> bool {
        if !self.config.use_sat {
            return false;
        }
        let frame = self.stack.last().unwrap();
        self.tmp.copy_from(&frame.formulas);
        self.tmp &= &frame.to_process;
        self.tmp &= &self.closure.disjunction;
        self.tmp.any()
    }

    /// Hand the top frame's exposed obligations to the SAT backend and push
    /// the first satisfying assignment as a child, or roll back if there is
    /// none.
    fn delegate_to_sat(&mut self) {
        let closure = &self.closure;

        // Exposed entries: atoms, X-formulas, atom negations (reached by
        // shifting the atom mask up onto the negation mask), and the
        // disjunctions themselves.
        let mut exposed = closure.atom.clone();
        exposed.shift_up_one();
        exposed &= &closure.negation;
        exposed |= &closure.atom;
        exposed |= &closure.next;
        exposed |= &closure.disjunction;

        let frame = self.stack.last_mut().unwrap();
        exposed &= &frame.formulas;

        frame.kind = FrameKind::Sat;
        let mut backend = SatBackend::new();
        for _ in 0..closure.len() {
            backend.new_var();
        }

        debug_assert!(frame.literals.is_empty());
        let mut one = exposed.find_first();
        while let Some(i) = one {
            backend.add_clause(closure.clause(i).iter().map(|lit| (lit.index, lit.negated)));
            for lit in closure.clause(i) {
                frame.literals.push(lit.index);
            }
            if closure.disjunction.get(i) {
                // Consumed here; the native β-rule must not re-pick it.
                frame.to_process.clear(i);
            }
            one = exposed.find_next(i);
        }
        frame.literals.sort_unstable();
        frame.literals.dedup();
        frame.solver = Some(backend);

        let index = self.stack.len() - 1;
        match self.next_sat_assignment(index) {
            Some(child) => self.stack.push(child),
            None => {
                self.stack[index].kind = FrameKind::Unknown;
                self.rollback_to_latest_choice();
            }
        }
    }

    /// Ask the frame's solver for a (further) assignment. On success the
    /// model is blocked in the solver, so the next rollback into this frame
    /// yields a different one, and a child committing the assignment is
    /// returned.
    fn next_sat_assignment(&mut self, index: usize) -> Option<Frame> {
        let closure = &self.closure;
        let frame = &mut self.stack[index];
        let solver = frame.solver.as_mut()?;
        if !solver.solve() {
            return None;
        }

        let mut blocking: Vec<(usize, bool)> = Vec::new();
        let mut asserted: Vec<usize> = Vec::new();
        for &var in &frame.literals {
            if solver.value(var) == Some(true) {
                blocking.push((var, true));
                asserted.push(var);
            } else if var + 1 < closure.len() {
                // A false variable asserts its paired negation, when the
                // closure has one (G and F entries have none).
                let paired = closure.negation.get(var + 1)
                    || matches!(
                        closure.formula(var + 1).as_ref(),
                        Formula::Next(x) if matches!(x.as_ref(), Formula::Not(_))
                    );
                if paired {
                    debug_assert_eq!(closure.lhs(var + 1), var);
                    blocking.push((var, false));
                    asserted.push(var + 1);
                }
            }
        }
        solver.add_clause(blocking);

        let frame = &self.stack[index];
        let mut child = Frame::child_of(frame);
        for i in asserted {
            child.formulas.set(i);
        }
        Some(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;

    fn solver_for(text: &str) -> Solver {
        let formula = parse_formula(text).unwrap();
        let config = SolverConfig {
            seed: Some(0),
            ..SolverConfig::default()
        };
        Solver::new(&formula, config)
    }

    #[test]
    fn tautology_is_satisfiable_without_running() {
        let mut solver = solver_for("p | !p");
        assert_eq!(solver.result(), Verdict::Satisfiable);
        assert_eq!(solver.solve(), Verdict::Satisfiable);
        let model = solver.model().unwrap();
        assert_eq!(model.loop_state, 0);
        assert_eq!(model.states.len(), 1);
        assert!(model.states[0].contains(&Literal::truth()));
    }

    #[test]
    fn contradiction_is_unsatisfiable_without_running() {
        let mut solver = solver_for("p & !p");
        assert_eq!(solver.solve(), Verdict::Unsatisfiable);
        assert!(solver.model().is_none());
    }

    #[test]
    fn always_p_loops_on_a_single_state() {
        let mut solver = solver_for("G p");
        assert_eq!(solver.solve(), Verdict::Satisfiable);
        let model = solver.model().unwrap();
        assert_eq!(model.loop_state, 0);
        assert_eq!(model.states.len(), 1);
        assert!(model.states[0].contains(&Literal::positive("p")));
    }

    #[test]
    fn until_discharges_immediately_in_the_first_model() {
        let mut solver = solver_for("p U q");
        assert_eq!(solver.solve(), Verdict::Satisfiable);
        let model = solver.model().unwrap();
        assert_eq!(model.loop_state, 0);
        assert_eq!(model.states.len(), 1);
        assert!(model.states[0].contains(&Literal::positive("q")));
    }

    #[test]
    fn resume_enumerates_further_models() {
        let mut solver = solver_for("p | q");
        assert_eq!(solver.solve(), Verdict::Satisfiable);
        let first = solver.model().unwrap();
        assert!(first.states[0].contains(&Literal::positive("p")));

        assert_eq!(solver.solve(), Verdict::Satisfiable);
        let second = solver.model().unwrap();
        assert!(second.states[0].contains(&Literal::positive("q")));
    }

    #[test]
    fn exhausted_resume_stops_yielding_models() {
        let mut solver = solver_for("p");
        assert_eq!(solver.solve(), Verdict::Satisfiable);
        assert!(solver.model().is_some());
        loop {
            solver.solve();
            if solver.model().is_none() {
                break;
            }
        }
    }

    #[test]
    fn depth_bound_gates_the_step_rule() {
        // Even an immediately-discharged F p needs one STEP to close its
        // lasso, so depth 1 suffices and depth 0 cannot.
        let formula = parse_formula("F p").unwrap();
        let config = SolverConfig {
            maximum_depth: 1,
            seed: Some(0),
            ..SolverConfig::default()
        };
        let mut solver = Solver::new(&formula, config);
        assert_eq!(solver.solve(), Verdict::Satisfiable);

        let formula = parse_formula("X p").unwrap();
        let config = SolverConfig {
            maximum_depth: 0,
            seed: Some(0),
            ..SolverConfig::default()
        };
        let mut solver = Solver::new(&formula, config);
        assert_eq!(solver.solve(), Verdict::Unsatisfiable);
    }

    #[test]
    fn never_looking_back_misses_loops() {
        // G p needs the LOOP rule; with the lookback disabled the search
        // can only exhaust the depth bound.
        let formula = parse_formula("G p").unwrap();
        let config = SolverConfig {
            maximum_depth: 10,
            backtrack_probability: 0,
            seed: Some(0),
            ..SolverConfig::default()
        };
        let mut solver = Solver::new(&formula, config);
        assert_eq!(solver.solve(), Verdict::Unsatisfiable);
    }
}
