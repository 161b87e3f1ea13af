use tracing::trace;

use crate::problem::{Constraint, Cut, Relation};
use crate::solution::BasicSolution;
use crate::tableau::{ColumnKind, TOLERANCE, Tableau};

/// Fractional parts at or below this are treated as integral
pub const FRACTION_TOLERANCE: f64 = 1e-5;

/// How the generator picks the source row among fractional ones
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutRowSelection {
    /// First fractional row in row order
    #[default]
    FirstFractional,
    /// Row whose value is farthest from an integer (lowest row on ties)
    MostFractional,
}

/// `v - floor(v)`, or 0 when `v` is within `tolerance` of an integer
pub fn fractional_part(v: f64, tolerance: f64) -> f64 {
    if (v - v.round()).abs() <= tolerance {
        0.0
    } else {
        v - v.floor()
    }
}

pub fn is_fractional(v: f64, tolerance: f64) -> bool {
    fractional_part(v, tolerance) > 0.0
}

/// Derives Gomory fractional cuts from an optimal tableau
#[derive(Debug, Clone)]
pub struct GomoryCutGenerator {
    tolerance: f64,
    selection: CutRowSelection,
}

impl Default for GomoryCutGenerator {
    fn default() -> Self {
        Self {
            tolerance: FRACTION_TOLERANCE,
            selection: CutRowSelection::default(),
        }
    }
}

impl GomoryCutGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_selection(mut self, selection: CutRowSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Row of `tableau` whose basic decision variable has a fractional
    /// value, or `None` if the solution is integral (or not optimal).
    pub fn find_cut_row(&self, solution: &BasicSolution, tableau: &Tableau) -> Option<usize> {
        if !solution.is_optimal() {
            return None;
        }

        let mut candidates = solution
            .basis
            .iter()
            .enumerate()
            .filter(|&(_, &b)| matches!(tableau.column(b), ColumnKind::Structural(_)))
            .map(|(row, _)| (row, fractional_part(tableau.rhs(row), self.tolerance)))
            .filter(|&(_, f)| f > 0.0);

        match self.selection {
            CutRowSelection::FirstFractional => candidates.next().map(|(row, _)| row),
            CutRowSelection::MostFractional => {
                let mut best: Option<(usize, f64)> = None;
                for (row, f) in candidates {
                    let distance = f.min(1.0 - f);
                    if best.is_none_or(|(_, d)| distance > d + self.tolerance) {
                        best = Some((row, distance));
                    }
                }
                best.map(|(row, _)| row)
            }
        }
    }

    /// Gomory fractional cut from tableau row `row`.
    ///
    /// The row reads `x_B + Σ a_j·t_j = b` over the non-basic columns `t_j`.
    /// Every integer point satisfies `Σ frac(a_j)·t_j >= frac(b)`, while the
    /// current vertex (all `t_j = 0`) does not. The cut is returned negated as
    /// a `<=` constraint, with every slack `t_j` rewritten through its row so
    /// only decision variables remain.
    pub fn build_cut(&self, row: usize, tableau: &Tableau, name: impl Into<String>) -> Cut {
        let n_vars = tableau.num_variables();
        let mut coefficients = vec![0.0; n_vars];
        let mut rhs = -fractional_part(tableau.rhs(row), self.tolerance);

        for (j, kind) in tableau.columns().iter().enumerate() {
            if tableau.is_basic(j) {
                continue;
            }
            let f = fractional_part(tableau.value(row, j), self.tolerance);
            if f == 0.0 {
                continue;
            }
            match *kind {
                ColumnKind::Structural(v) => coefficients[v] -= f,
                ColumnKind::Slack { .. } => {
                    // -f·s with s = constant - g·x
                    if let Some((g, constant)) = tableau.slack_expression(j) {
                        for (c, gv) in coefficients.iter_mut().zip(&g) {
                            *c += f * gv;
                        }
                        rhs += f * constant;
                    }
                }
                // Artificials are fixed at zero once phase 1 succeeds
                ColumnKind::Artificial { .. } => {}
            }
        }

        for c in coefficients.iter_mut() {
            if c.abs() < TOLERANCE {
                *c = 0.0;
            }
        }

        let cut = Constraint::new(name, coefficients, Relation::LessEq, rhs);
        trace!(
            component = "cut",
            operation = "build_cut",
            status = "success",
            row,
            cut = cut.name.as_str(),
            rhs = cut.rhs,
            "Built Gomory cut"
        );
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ProblemSpec, Sense};
    use crate::simplex::SimplexSolver;

    fn scenario_two() -> ProblemSpec {
        let mut problem = ProblemSpec::with_variable_count(2);
        problem.set_objective(vec![1.0, 1.0], Sense::Maximize);
        problem.add_constraint("c1", vec![2.0, 1.0], Relation::LessEq, 5.0);
        problem.add_constraint("c2", vec![1.0, 3.0], Relation::LessEq, 6.0);
        problem
    }

    fn assert_cut_is_valid(problem: &ProblemSpec, solution: &BasicSolution, cut: &Cut) {
        let lhs = cut.lhs(&solution.values);
        assert!(
            lhs > cut.rhs + FRACTION_TOLERANCE,
            "cut {:?} does not remove {:?}",
            cut,
            solution.values
        );
        let points = problem.integer_points(10);
        assert!(!points.is_empty());
        for point in &points {
            assert!(
                cut.is_satisfied_by(point, 1e-6),
                "cut {:?} excludes integer point {:?}",
                cut,
                point
            );
        }
    }

    #[test]
    fn test_fractional_part() {
        assert!((fractional_part(1.5, FRACTION_TOLERANCE) - 0.5).abs() < 1e-12);
        assert!((fractional_part(-0.25, FRACTION_TOLERANCE) - 0.75).abs() < 1e-12);
        assert_eq!(fractional_part(2.9999999, FRACTION_TOLERANCE), 0.0);
        assert_eq!(fractional_part(3.0000001, FRACTION_TOLERANCE), 0.0);
        assert_eq!(fractional_part(-4.0, FRACTION_TOLERANCE), 0.0);
        assert!(is_fractional(0.4, FRACTION_TOLERANCE));
        assert!(!is_fractional(7.0, FRACTION_TOLERANCE));
    }

    #[test]
    fn test_first_fractional_row_cut() {
        let problem = scenario_two();
        let (tableau, solution) = SimplexSolver::new().solve_problem(&problem).unwrap();
        let generator = GomoryCutGenerator::new();

        let row = generator.find_cut_row(&solution, &tableau);
        assert_eq!(row, Some(0));

        let cut = generator.build_cut(0, &tableau, "gomory_r0_n0");
        // -0.6 s1 - 0.8 s2 <= -0.8 rewritten: 2 x1 + 3 x2 <= 7
        assert_eq!(cut.relation, Relation::LessEq);
        assert!((cut.coefficients[0] - 2.0).abs() < 1e-9, "{:?}", cut);
        assert!((cut.coefficients[1] - 3.0).abs() < 1e-9, "{:?}", cut);
        assert!((cut.rhs - 7.0).abs() < 1e-9, "{:?}", cut);
        assert_cut_is_valid(&problem, &solution, &cut);
    }

    #[test]
    fn test_most_fractional_row_cut() {
        let problem = scenario_two();
        let (tableau, solution) = SimplexSolver::new().solve_problem(&problem).unwrap();
        let generator = GomoryCutGenerator::new().with_selection(CutRowSelection::MostFractional);

        // x1 = 1.8 is 0.2 from an integer, x2 = 1.4 is 0.4 away
        let row = generator.find_cut_row(&solution, &tableau).unwrap();
        assert_eq!(row, 1);

        let cut = generator.build_cut(row, &tableau, "gomory_r1_n0");
        // x1 + x2 <= 3, scaled by 2
        assert!((cut.coefficients[0] - 2.0).abs() < 1e-9, "{:?}", cut);
        assert!((cut.coefficients[1] - 2.0).abs() < 1e-9, "{:?}", cut);
        assert!((cut.rhs - 6.0).abs() < 1e-9, "{:?}", cut);
        assert_cut_is_valid(&problem, &solution, &cut);
    }

    #[test]
    fn test_integral_solution_has_no_cut_row() {
        let mut problem = ProblemSpec::with_variable_count(2);
        problem.set_objective(vec![3.0, 2.0], Sense::Maximize);
        problem.add_constraint("c1", vec![1.0, 1.0], Relation::LessEq, 4.0);
        problem.add_constraint("c2", vec![1.0, 3.0], Relation::LessEq, 6.0);
        let (tableau, solution) = SimplexSolver::new().solve_problem(&problem).unwrap();

        assert_eq!(GomoryCutGenerator::new().find_cut_row(&solution, &tableau), None);
    }

    #[test]
    fn test_non_optimal_solution_has_no_cut_row() {
        let problem = scenario_two();
        let (tableau, _) = SimplexSolver::new().solve_problem(&problem).unwrap();

        let infeasible = BasicSolution::infeasible();
        assert_eq!(GomoryCutGenerator::new().find_cut_row(&infeasible, &tableau), None);
    }

    #[test]
    fn test_cut_validity_with_ge_and_eq_rows() {
        // Minimize x1 + x2
        //   2x1 + 2x2 >= 3
        //   x1 - x2 = 0
        //   x1 <= 5
        // Relaxation optimum is (0.75, 0.75)
        let mut problem = ProblemSpec::with_variable_count(2);
        problem.set_objective(vec![1.0, 1.0], Sense::Minimize);
        problem.add_constraint("cover", vec![2.0, 2.0], Relation::GreaterEq, 3.0);
        problem.add_constraint("tie", vec![1.0, -1.0], Relation::Equal, 0.0);
        problem.add_constraint("cap", vec![1.0, 0.0], Relation::LessEq, 5.0);
        let (tableau, solution) = SimplexSolver::new().solve_problem(&problem).unwrap();
        assert!((solution.values[0] - 0.75).abs() < 1e-9);

        let generator = GomoryCutGenerator::new();
        let row = generator.find_cut_row(&solution, &tableau).unwrap();
        let cut = generator.build_cut(row, &tableau, "cut");
        assert_cut_is_valid(&problem, &solution, &cut);
    }

    #[test]
    fn test_cut_validity_three_variables() {
        let mut problem = ProblemSpec::with_variable_count(3);
        problem.set_objective(vec![2.0, 3.0, 1.0], Sense::Maximize);
        problem.add_constraint("c1", vec![1.0, 2.0, 1.0], Relation::LessEq, 7.0);
        problem.add_constraint("c2", vec![3.0, 1.0, 2.0], Relation::LessEq, 8.0);
        let (tableau, solution) = SimplexSolver::new().solve_problem(&problem).unwrap();

        let generator = GomoryCutGenerator::new();
        let row = generator.find_cut_row(&solution, &tableau).unwrap();
        let cut = generator.build_cut(row, &tableau, "cut");
        assert_cut_is_valid(&problem, &solution, &cut);
    }
}
