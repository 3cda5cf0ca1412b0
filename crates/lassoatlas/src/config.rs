//! Solver configuration types.

/// Configuration for the tableau search
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Bound on the time index of any frame; STEP is refused beyond it
    pub maximum_depth: u64,
    /// Probability (0–100) of running the LOOP/REP lookback after a frame
    /// completes; lower values trade completeness for speed
    pub backtrack_probability: u32,
    /// Reserved for the partial-lookback heuristic; clamped, not used
    pub minimum_backtrack: u32,
    /// Reserved for the partial-lookback heuristic; clamped, not used
    pub maximum_backtrack: u32,
    /// Delegate local disjunction resolution to the SAT backend
    pub use_sat: bool,
    /// Seed for the lookback coin; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            maximum_depth: 100,
            backtrack_probability: 100,
            minimum_backtrack: 0,
            maximum_backtrack: 100,
            use_sat: false,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Clamp the probability knobs into range; out-of-range values are not
    /// an error.
    pub fn clamped(mut self) -> Self {
        self.backtrack_probability = self.backtrack_probability.min(100);
        self.maximum_backtrack = self.maximum_backtrack.min(100);
        if self.minimum_backtrack > self.maximum_backtrack {
            self.minimum_backtrack = self.maximum_backtrack;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_knobs_are_clamped() {
        let config = SolverConfig {
            backtrack_probability: 250,
            minimum_backtrack: 90,
            maximum_backtrack: 40,
            ..SolverConfig::default()
        }
        .clamped();
        assert_eq!(config.backtrack_probability, 100);
        assert_eq!(config.maximum_backtrack, 40);
        assert_eq!(config.minimum_backtrack, 40);
    }
}
