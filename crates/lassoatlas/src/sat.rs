//! Propositional backend for the SAT bridge
//!
//! The engine only ever needs four operations from a CDCL solver: allocate a
//! variable, add a clause, solve, and read a model value. This wrapper keeps
//! that surface narrow so the backend stays swappable; it is currently backed
//! by CaDiCaL. Variables are the closure indices of the frame that owns the
//! solver, mapped to the backend's 1-based DIMACS literals internally.

/// Narrow new-var/add-clause/solve/value wrapper around the CDCL backend
pub struct SatBackend {
    solver: cadical::Solver,
    variables: usize,
}

impl SatBackend {
    pub fn new() -> Self {
        SatBackend {
            solver: cadical::Solver::new(),
            variables: 0,
        }
    }

    /// Allocate the next propositional variable
    pub fn new_var(&mut self) -> usize {
        self.variables += 1;
        self.variables - 1
    }

    pub fn var_count(&self) -> usize {
        self.variables
    }

    /// Add a clause over (variable, negated) literals
    pub fn add_clause<I>(&mut self, literals: I)
    where
        I: IntoIterator<Item = (usize, bool)>,
    {
        self.solver
            .add_clause(literals.into_iter().map(|(var, negated)| encode(var, negated)));
    }

    /// Solve under the clauses added so far. Treats an interrupted or
    /// unknown outcome as unsatisfiable: the bridge then simply rolls back.
    pub fn solve(&mut self) -> bool {
        self.solver.solve().unwrap_or(false)
    }

    /// Model value of a variable after a successful `solve`. `None` means
    /// the backend left the variable unconstrained.
    pub fn value(&mut self, var: usize) -> Option<bool> {
        self.solver.value(encode(var, false))
    }
}

impl Default for SatBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(var: usize, negated: bool) -> i32 {
    let lit = (var + 1) as i32;
    if negated {
        -lit
    } else {
        lit
    }
}
