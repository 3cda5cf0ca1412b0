//! End-to-end scenarios for the tableau solver

mod common;

use common::model_satisfies;
use lassoatlas::{parse_formula, Literal, Model, Solver, SolverConfig, Verdict};

fn run(text: &str, use_sat: bool) -> (Verdict, Option<Model>) {
    let formula = parse_formula(text).unwrap();
    let config = SolverConfig {
        use_sat,
        seed: Some(7),
        ..SolverConfig::default()
    };
    let mut solver = Solver::new(&formula, config);
    let verdict = solver.solve();
    (verdict, solver.model())
}

fn assert_satisfiable(text: &str, use_sat: bool) -> Model {
    let (verdict, model) = run(text, use_sat);
    assert_eq!(verdict, Verdict::Satisfiable, "{} (sat={})", text, use_sat);
    let model = model.expect("satisfiable verdict carries a model");
    let formula = parse_formula(text).unwrap();
    assert!(
        model_satisfies(&model, &formula),
        "model does not satisfy {} (sat={}):\n{}",
        text,
        use_sat,
        model
    );
    model
}

fn assert_unsatisfiable(text: &str, use_sat: bool) {
    let (verdict, model) = run(text, use_sat);
    assert_eq!(verdict, Verdict::Unsatisfiable, "{} (sat={})", text, use_sat);
    assert!(model.is_none());
}

#[test]
fn contradiction_is_unsatisfiable() {
    for use_sat in [false, true] {
        assert_unsatisfiable("p & !p", use_sat);
    }
}

#[test]
fn deferred_contradiction_is_unsatisfiable() {
    for use_sat in [false, true] {
        assert_unsatisfiable("X p & X !p", use_sat);
    }
}

#[test]
fn always_p_has_the_singleton_loop() {
    for use_sat in [false, true] {
        let model = assert_satisfiable("G p", use_sat);
        assert_eq!(model.loop_state, 0);
        assert_eq!(model.states.len(), 1);
        assert!(model.states[0].contains(&Literal::positive("p")));
    }
}

#[test]
fn eventually_p_reaches_p() {
    for use_sat in [false, true] {
        let model = assert_satisfiable("F p", use_sat);
        assert!(model
            .states
            .iter()
            .any(|state| state.contains(&Literal::positive("p"))));
    }
}

#[test]
fn infinitely_often_p_has_p_in_the_period() {
    for use_sat in [false, true] {
        let model = assert_satisfiable("G F p", use_sat);
        let period = &model.states[model.loop_state as usize..];
        assert!(period
            .iter()
            .any(|state| state.contains(&Literal::positive("p"))));
    }
}

#[test]
fn until_discharges_immediately_first() {
    let model = assert_satisfiable("p U q", false);
    assert_eq!(model.loop_state, 0);
    assert_eq!(model.states.len(), 1);
    assert!(model.states[0].contains(&Literal::positive("q")));
}

#[test]
fn induction_against_an_escape_is_unsatisfiable() {
    for use_sat in [false, true] {
        assert_unsatisfiable("G(p -> X p) & p & F !p", use_sat);
    }
}

#[test]
fn negated_until_with_forced_q_and_no_p() {
    // ¬(p U q) is consistent with q eventually holding as long as p fails
    // first; with G ¬p the until can never fire.
    for use_sat in [false, true] {
        let model = assert_satisfiable("!(p U q) & F q & G !p", use_sat);
        assert!(model
            .states
            .iter()
            .all(|state| !state.contains(&Literal::positive("p"))));
        assert!(model
            .states
            .iter()
            .any(|state| state.contains(&Literal::positive("q"))));
    }
}

#[test]
fn request_response_pattern_is_satisfiable() {
    for use_sat in [false, true] {
        assert_satisfiable("G(req -> F ack) & F req", use_sat);
    }
}

#[test]
fn conflicting_fixpoints_are_unsatisfiable() {
    for use_sat in [false, true] {
        assert_unsatisfiable("G p & F !p", use_sat);
        assert_unsatisfiable("F(G p & F !p)", use_sat);
    }
}

#[test]
fn trivial_constants() {
    let (verdict, model) = run("true", false);
    assert_eq!(verdict, Verdict::Satisfiable);
    let model = model.unwrap();
    assert_eq!(model.loop_state, 0);
    assert_eq!(model.states.len(), 1);
    assert!(model.states[0].contains(&Literal::truth()));

    assert_unsatisfiable("false", false);
}

#[test]
fn enumerated_models_all_satisfy_the_formula() {
    let text = "(p | q) & F r";
    let formula = parse_formula(text).unwrap();
    let mut solver = Solver::new(&formula, SolverConfig {
        seed: Some(1),
        ..SolverConfig::default()
    });
    let mut found = 0;
    while solver.solve() == Verdict::Satisfiable {
        let Some(model) = solver.model() else { break };
        assert!(model_satisfies(&model, &formula), "model {}:\n{}", found, model);
        found += 1;
        if found >= 8 {
            break;
        }
    }
    assert!(found >= 2, "expected several models, found {}", found);
}
