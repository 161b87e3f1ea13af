mod cut;
mod driver;
mod error;
mod problem;
mod simplex;
mod solution;
mod tableau;

pub use cut::{
    CutRowSelection, FRACTION_TOLERANCE, GomoryCutGenerator, fractional_part, is_fractional,
};
pub use driver::{CutRun, CuttingPlaneDriver, DriverConfig, Reoptimize, solve};
pub use error::{Phase, SolverError};
pub use problem::{Constraint, Cut, Objective, ProblemSpec, Relation, Sense};
pub use simplex::SimplexSolver;
pub use solution::{BasicSolution, Iteration, SolutionStatus, SolutionTrace, TraceStatus};
pub use tableau::{ColumnKind, TOLERANCE, Tableau};
