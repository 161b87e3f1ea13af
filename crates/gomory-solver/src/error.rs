use thiserror::Error;

/// Failures of the solver itself.
///
/// Infeasible, unbounded and budget-exhausted runs are not errors; they are
/// reported through [`crate::SolutionStatus`] and [`crate::TraceStatus`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Malformed problem: {0}")]
    MalformedProblem(String),
    #[error("Degenerate pivot at row {row}, column {col} (value {value:e})")]
    DegeneratePivot { row: usize, col: usize, value: f64 },
    #[error("Simplex {phase} did not finish within {limit} iterations")]
    IterationLimit { phase: Phase, limit: usize },
}

/// Which simplex loop was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    One,
    Two,
    Dual,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::One => write!(f, "phase 1"),
            Phase::Two => write!(f, "phase 2"),
            Phase::Dual => write!(f, "dual phase"),
        }
    }
}
