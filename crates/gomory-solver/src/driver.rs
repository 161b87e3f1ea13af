use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::cut::{CutRowSelection, FRACTION_TOLERANCE, GomoryCutGenerator};
use crate::error::SolverError;
use crate::problem::ProblemSpec;
use crate::simplex::SimplexSolver;
use crate::solution::{SolutionStatus, SolutionTrace, TraceStatus};

/// How the relaxation is re-solved after a cut is added
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reoptimize {
    /// Build a fresh tableau from the extended problem
    #[default]
    Rebuild,
    /// Append the cut row to the optimal tableau and run the dual simplex
    DualSimplex,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Maximum number of cuts before the run is reported exhausted
    pub max_cuts: usize,
    pub reoptimize: Reoptimize,
    pub row_selection: CutRowSelection,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_cuts: 10,
            reoptimize: Reoptimize::default(),
            row_selection: CutRowSelection::default(),
        }
    }
}

/// The problem with every generated cut appended, and the trace of solves
#[derive(Debug, Clone)]
pub struct CutRun {
    pub problem: ProblemSpec,
    pub trace: SolutionTrace,
}

/// Runs solve → cut → re-solve until the relaxation optimum is integral
/// or the cut budget is spent.
#[derive(Debug, Clone, Default)]
pub struct CuttingPlaneDriver {
    config: DriverConfig,
    solver: SimplexSolver,
    cancel: Option<Arc<AtomicBool>>,
}

impl CuttingPlaneDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            solver: SimplexSolver::default(),
            cancel: None,
        }
    }

    pub fn with_max_cuts(mut self, max_cuts: usize) -> Self {
        self.config.max_cuts = max_cuts;
        self
    }

    pub fn with_solver(mut self, solver: SimplexSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Stop before the next re-solve once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn run(&self, mut problem: ProblemSpec) -> Result<CutRun, SolverError> {
        problem.validate()?;
        if !problem.has_integral_data(FRACTION_TOLERANCE) {
            warn!(
                component = "driver",
                operation = "run",
                status = "warn",
                "Constraint data is not integral; Gomory cuts may exclude integer points"
            );
        }

        let generator = GomoryCutGenerator::new().with_selection(self.config.row_selection);
        let mut trace = SolutionTrace::new();
        let (mut tableau, mut solution) = self.solver.solve_problem(&problem)?;

        loop {
            debug!(
                component = "driver",
                operation = "solve",
                status = ?solution.status,
                iteration = trace.len(),
                objective = solution.objective_value,
                "Solved relaxation"
            );
            trace.push(solution.clone());

            match solution.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::Infeasible => {
                    trace.status = TraceStatus::Infeasible;
                    break;
                }
                SolutionStatus::Unbounded => {
                    trace.status = TraceStatus::Unbounded;
                    break;
                }
            }

            let Some(row) = generator.find_cut_row(&solution, &tableau) else {
                trace.status = TraceStatus::Converged;
                break;
            };

            if trace.cuts_generated >= self.config.max_cuts {
                warn!(
                    component = "driver",
                    operation = "run",
                    status = "exhausted",
                    max_cuts = self.config.max_cuts,
                    "Cut budget reached without an integral solution"
                );
                trace.status = TraceStatus::Exhausted;
                break;
            }

            let name = format!("gomory_r{}_n{}", row, trace.cuts_generated);
            let cut = generator.build_cut(row, &tableau, name);
            debug!(
                component = "driver",
                operation = "add_cut",
                status = "success",
                cut = cut.name.as_str(),
                row,
                "Added Gomory cut"
            );
            problem.push_constraint(cut.clone());
            trace.record_cut(cut.clone());

            if self.is_cancelled() {
                trace.status = TraceStatus::Cancelled;
                break;
            }

            solution = match self.config.reoptimize {
                Reoptimize::Rebuild => {
                    let (rebuilt, solution) = self.solver.solve_problem(&problem)?;
                    tableau = rebuilt;
                    solution
                }
                Reoptimize::DualSimplex => {
                    tableau.append_cut_row(&cut)?;
                    self.solver.reoptimize(&mut tableau)?
                }
            };
        }

        debug!(
            component = "driver",
            operation = "run",
            status = ?trace.status,
            iterations = trace.len(),
            cuts = trace.cuts_generated,
            "Cutting-plane run finished"
        );

        Ok(CutRun { problem, trace })
    }
}

/// Solve `problem` by Gomory cutting planes with at most `max_cuts` cuts
pub fn solve(problem: &ProblemSpec, max_cuts: usize) -> Result<SolutionTrace, SolverError> {
    let run = CuttingPlaneDriver::default()
        .with_max_cuts(max_cuts)
        .run(problem.clone())?;
    Ok(run.trace)
}
