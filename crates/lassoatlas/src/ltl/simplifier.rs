//! Rewriting into the tableau base
//!
//! The tableau works on a restricted rewriting base: implications and
//! biconditionals are gone, negations are pushed inward until they wrap only
//! atoms and untils, and the boolean constants survive only as a whole-formula
//! result. `simplify` is a fixed point: simplifying twice equals simplifying
//! once.

use super::formula::{Formula, FormulaRef};

/// Rewrite a formula into the tableau base.
pub fn simplify(f: &FormulaRef) -> FormulaRef {
    match f.as_ref() {
        Formula::True | Formula::False | Formula::Atom(_) => f.clone(),
        Formula::Not(x) => negated(&simplify(x)),
        Formula::Next(x) => mk_next(simplify(x)),
        Formula::Always(x) => mk_always(simplify(x)),
        Formula::Eventually(x) => mk_eventually(simplify(x)),
        Formula::And(a, b) => mk_and(simplify(a), simplify(b)),
        Formula::Or(a, b) => mk_or(simplify(a), simplify(b)),
        Formula::Until(a, b) => mk_until(simplify(a), simplify(b)),
        Formula::Implies(a, b) => {
            let a = simplify(a);
            mk_or(negated(&a), simplify(b))
        }
        Formula::Iff(a, b) => {
            let a = simplify(a);
            let b = simplify(b);
            mk_and(
                mk_or(negated(&a), b.clone()),
                mk_or(negated(&b), a),
            )
        }
    }
}

/// Simplified negation of an already-simplified formula.
///
/// Dualises connectives and temporal skins so that the result stays in the
/// tableau base; only atoms and untils end up under a `Not`. The closure
/// builder uses this to seed the negation half of the closure.
pub fn negated(f: &FormulaRef) -> FormulaRef {
    match f.as_ref() {
        Formula::True => Formula::bottom(),
        Formula::False => Formula::top(),
        Formula::Atom(_) | Formula::Until(..) => Formula::not(f.clone()),
        Formula::Not(x) => x.clone(),
        Formula::Next(x) => mk_next(negated(x)),
        Formula::Always(x) => mk_eventually(negated(x)),
        Formula::Eventually(x) => mk_always(negated(x)),
        Formula::And(a, b) => mk_or(negated(a), negated(b)),
        Formula::Or(a, b) => mk_and(negated(a), negated(b)),
        // Not part of the base; normalise first.
        Formula::Implies(..) | Formula::Iff(..) => negated(&simplify(f)),
    }
}

fn mk_next(x: FormulaRef) -> FormulaRef {
    match x.as_ref() {
        Formula::True | Formula::False => x,
        _ => Formula::next(x),
    }
}

fn mk_always(x: FormulaRef) -> FormulaRef {
    match x.as_ref() {
        Formula::True | Formula::False | Formula::Always(_) => x,
        _ => Formula::always(x),
    }
}

fn mk_eventually(x: FormulaRef) -> FormulaRef {
    match x.as_ref() {
        Formula::True | Formula::False | Formula::Eventually(_) => x,
        _ => Formula::eventually(x),
    }
}

fn mk_and(a: FormulaRef, b: FormulaRef) -> FormulaRef {
    match (a.as_ref(), b.as_ref()) {
        (Formula::False, _) | (_, Formula::False) => Formula::bottom(),
        (Formula::True, _) => b,
        (_, Formula::True) => a,
        _ if a == b => a,
        _ if negated(&a) == b => Formula::bottom(),
        _ => Formula::and(a, b),
    }
}

fn mk_or(a: FormulaRef, b: FormulaRef) -> FormulaRef {
    match (a.as_ref(), b.as_ref()) {
        (Formula::True, _) | (_, Formula::True) => Formula::top(),
        (Formula::False, _) => b,
        (_, Formula::False) => a,
        _ if a == b => a,
        _ if negated(&a) == b => Formula::top(),
        _ => Formula::or(a, b),
    }
}

fn mk_until(a: FormulaRef, b: FormulaRef) -> FormulaRef {
    match (a.as_ref(), b.as_ref()) {
        (_, Formula::True) => Formula::top(),
        (_, Formula::False) => Formula::bottom(),
        (Formula::False, _) => b,
        (Formula::True, _) => mk_eventually(b),
        _ if a == b => a,
        _ => Formula::until(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// After simplification, `Not` wraps only atoms and untils, and the
    /// surface connectives are gone.
    fn in_tableau_base(f: &Formula) -> bool {
        match f {
            Formula::True | Formula::False | Formula::Atom(_) => true,
            Formula::Not(x) => matches!(x.as_ref(), Formula::Atom(_) | Formula::Until(..)),
            Formula::Next(x) | Formula::Always(x) | Formula::Eventually(x) => in_tableau_base(x),
            Formula::And(a, b) | Formula::Or(a, b) | Formula::Until(a, b) => {
                in_tableau_base(a) && in_tableau_base(b)
            }
            Formula::Implies(..) | Formula::Iff(..) => false,
        }
    }

    #[test]
    fn implication_is_eliminated() {
        let f = Formula::implies(Formula::atom("p"), Formula::atom("q"));
        let s = simplify(&f);
        assert_eq!(
            s,
            Formula::or(Formula::not(Formula::atom("p")), Formula::atom("q"))
        );
    }

    #[test]
    fn negation_pushes_through_temporal_skins() {
        let f = Formula::not(Formula::always(Formula::atom("p")));
        assert_eq!(
            simplify(&f),
            Formula::eventually(Formula::not(Formula::atom("p")))
        );

        let f = Formula::not(Formula::next(Formula::atom("p")));
        assert_eq!(simplify(&f), Formula::next(Formula::not(Formula::atom("p"))));
    }

    #[test]
    fn negated_until_is_kept() {
        let u = Formula::until(Formula::atom("p"), Formula::atom("q"));
        let f = Formula::not(u.clone());
        assert_eq!(simplify(&f), Formula::not(u));
    }

    #[test]
    fn excluded_middle_folds_to_true() {
        let f = Formula::or(Formula::atom("p"), Formula::not(Formula::atom("p")));
        assert_eq!(simplify(&f), Formula::top());

        let f = Formula::and(Formula::atom("p"), Formula::not(Formula::atom("p")));
        assert_eq!(simplify(&f), Formula::bottom());
    }

    #[test]
    fn until_constant_folding() {
        let p = Formula::atom("p");
        assert_eq!(
            simplify(&Formula::until(Formula::top(), p.clone())),
            Formula::eventually(p.clone())
        );
        assert_eq!(simplify(&Formula::until(Formula::bottom(), p.clone())), p);
        assert_eq!(
            simplify(&Formula::until(p.clone(), Formula::top())),
            Formula::top()
        );
    }

    #[test]
    fn simplify_is_idempotent_on_samples() {
        let p = Formula::atom("p");
        let q = Formula::atom("q");
        let samples = vec![
            Formula::iff(p.clone(), q.clone()),
            Formula::not(Formula::until(p.clone(), q.clone())),
            Formula::not(Formula::and(Formula::always(p.clone()), q.clone())),
            Formula::implies(Formula::always(p.clone()), Formula::eventually(q.clone())),
            Formula::always(Formula::always(p.clone())),
            Formula::next(Formula::not(Formula::next(q.clone()))),
        ];
        for f in samples {
            let once = simplify(&f);
            assert!(in_tableau_base(&once), "not in base: {}", once);
            assert_eq!(simplify(&once), once, "not a fixed point: {}", f);
        }
    }
}
