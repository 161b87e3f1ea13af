use tracing::debug;

use crate::error::{Phase, SolverError};
use crate::problem::{ProblemSpec, Sense};
use crate::solution::{BasicSolution, SolutionStatus};
use crate::tableau::{TOLERANCE, Tableau};

/// Two-phase simplex solver over a dense [`Tableau`].
///
/// Entering column: most negative reduced cost, lowest index on ties.
/// Leaving row: minimum ratio, lowest row on ties.
#[derive(Debug, Clone)]
pub struct SimplexSolver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for SimplexSolver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: TOLERANCE,
        }
    }
}

impl SimplexSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Build the tableau for `problem` and solve it
    pub fn solve_problem(
        &self,
        problem: &ProblemSpec,
    ) -> Result<(Tableau, BasicSolution), SolverError> {
        let mut tableau = Tableau::build(problem)?;
        let solution = self.solve(&mut tableau)?;
        Ok((tableau, solution))
    }

    /// Drive `tableau` from its initial basis to an optimal one.
    /// On return the tableau holds the final basis, which the cut
    /// generator reads.
    pub fn solve(&self, tableau: &mut Tableau) -> Result<BasicSolution, SolverError> {
        // Phase 1: find an initial basic feasible solution
        if tableau.has_artificial() && !self.phase1(tableau)? {
            debug!(
                component = "simplex",
                operation = "phase1",
                status = "infeasible",
                "Artificial variables could not be driven to zero"
            );
            return Ok(BasicSolution::infeasible());
        }

        // Phase 2: optimize
        match self.run_primal(tableau, false, Phase::Two)? {
            SimplexResult::Optimal => Ok(self.extract_solution(tableau)),
            SimplexResult::Unbounded => Ok(BasicSolution::unbounded(tableau.sense())),
            SimplexResult::Infeasible => Ok(BasicSolution::infeasible()),
        }
    }

    /// Restore optimality after rows with a negative rhs were appended to an
    /// optimal tableau, using the dual simplex method.
    pub fn reoptimize(&self, tableau: &mut Tableau) -> Result<BasicSolution, SolverError> {
        if self.dual_phase(tableau)? == SimplexResult::Infeasible {
            return Ok(BasicSolution::infeasible());
        }
        match self.run_primal(tableau, false, Phase::Two)? {
            SimplexResult::Optimal => Ok(self.extract_solution(tableau)),
            SimplexResult::Unbounded => Ok(BasicSolution::unbounded(tableau.sense())),
            SimplexResult::Infeasible => Ok(BasicSolution::infeasible()),
        }
    }

    fn phase1(&self, tableau: &mut Tableau) -> Result<bool, SolverError> {
        // Maximize -sum(artificials), i.e. minimize their sum
        let weights: Vec<(usize, f64)> = tableau
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, kind)| kind.is_artificial())
            .map(|(j, _)| (j, 1.0))
            .collect();
        tableau.set_objective_row(&weights);

        // Unbounded in phase 1 means infeasible original
        if self.run_primal(tableau, true, Phase::One)? != SimplexResult::Optimal {
            return Ok(false);
        }

        // Check if all artificials are zero
        for (i, &b) in tableau.basis().iter().enumerate() {
            if tableau.column(b).is_artificial() && tableau.rhs(i) > self.tolerance {
                return Ok(false);
            }
        }

        self.drive_out_artificials(tableau)?;
        tableau.load_objective();
        Ok(true)
    }

    /// Pivot zero-level artificials out of the basis. A row with no
    /// non-artificial entry is redundant and keeps its artificial.
    fn drive_out_artificials(&self, tableau: &mut Tableau) -> Result<(), SolverError> {
        for row in 0..tableau.num_rows() {
            let basic = tableau.basis()[row];
            if !tableau.column(basic).is_artificial() {
                continue;
            }
            let replacement = (0..tableau.num_cols()).find(|&j| {
                !tableau.column(j).is_artificial() && tableau.value(row, j).abs() > self.tolerance
            });
            if let Some(col) = replacement {
                tableau.pivot(row, col)?;
            }
        }
        Ok(())
    }

    fn run_primal(
        &self,
        tableau: &mut Tableau,
        allow_artificial: bool,
        phase: Phase,
    ) -> Result<SimplexResult, SolverError> {
        let mut pivots = 0;
        loop {
            let Some(pivot_col) = self.find_pivot_column(tableau, allow_artificial) else {
                debug!(
                    component = "simplex",
                    operation = "primal",
                    status = "optimal",
                    phase = %phase,
                    pivots,
                    objective = tableau.rhs(tableau.objective_row()),
                    "Reached optimal basis"
                );
                return Ok(SimplexResult::Optimal);
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                debug!(
                    component = "simplex",
                    operation = "primal",
                    status = "unbounded",
                    phase = %phase,
                    col = pivot_col,
                    "Entering column has no positive entry"
                );
                return Ok(SimplexResult::Unbounded);
            };
            if pivots == self.max_iterations {
                return Err(SolverError::IterationLimit {
                    phase,
                    limit: self.max_iterations,
                });
            }
            tableau.pivot(pivot_row, pivot_col)?;
            pivots += 1;
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, allow_artificial: bool) -> Option<usize> {
        // Look for the most negative reduced cost (can improve objective)
        let mut min_val = -self.tolerance;
        let mut min_col = None;

        for j in 0..tableau.num_cols() {
            if !allow_artificial && tableau.column(j).is_artificial() {
                continue;
            }
            let rc = tableau.reduced_cost(j);
            if rc < min_val {
                min_val = rc;
                min_col = Some(j);
            }
        }

        min_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 0..tableau.num_rows() {
            let val = tableau.value(i, col);
            if val > self.tolerance {
                let ratio = tableau.rhs(i).max(0.0) / val;
                if ratio < min_ratio - self.tolerance {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn dual_phase(&self, tableau: &mut Tableau) -> Result<SimplexResult, SolverError> {
        let mut pivots = 0;
        loop {
            let mut min_rhs = -self.tolerance;
            let mut leaving = None;
            for i in 0..tableau.num_rows() {
                if tableau.rhs(i) < min_rhs {
                    min_rhs = tableau.rhs(i);
                    leaving = Some(i);
                }
            }
            let Some(pivot_row) = leaving else {
                debug!(
                    component = "simplex",
                    operation = "dual",
                    status = "feasible",
                    pivots,
                    "Dual simplex restored primal feasibility"
                );
                return Ok(SimplexResult::Optimal);
            };

            let mut min_ratio = f64::INFINITY;
            let mut entering = None;
            for j in 0..tableau.num_cols() {
                if tableau.column(j).is_artificial() {
                    continue;
                }
                let val = tableau.value(pivot_row, j);
                if val < -self.tolerance {
                    let ratio = tableau.reduced_cost(j).max(0.0) / -val;
                    if ratio < min_ratio - self.tolerance {
                        min_ratio = ratio;
                        entering = Some(j);
                    }
                }
            }
            let Some(pivot_col) = entering else {
                debug!(
                    component = "simplex",
                    operation = "dual",
                    status = "infeasible",
                    row = pivot_row,
                    "Row has no negative entry to pivot on"
                );
                return Ok(SimplexResult::Infeasible);
            };

            if pivots == self.max_iterations {
                return Err(SolverError::IterationLimit {
                    phase: Phase::Dual,
                    limit: self.max_iterations,
                });
            }
            tableau.pivot(pivot_row, pivot_col)?;
            pivots += 1;
        }
    }

    fn extract_solution(&self, tableau: &Tableau) -> BasicSolution {
        let values: Vec<f64> = tableau
            .decision_values()
            .into_iter()
            .map(|v| if v.abs() < self.tolerance { 0.0 } else { v })
            .collect();

        // The objective row rhs is z in maximization form
        let z = tableau.rhs(tableau.objective_row());
        let objective_value = match tableau.sense() {
            Sense::Maximize => z,
            Sense::Minimize => -z,
        };

        BasicSolution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            basis: tableau.basis().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
}
