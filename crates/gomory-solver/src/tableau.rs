use tracing::{debug, trace};

use crate::error::SolverError;
use crate::problem::{Constraint, ProblemSpec, Relation, Sense};

/// Absolute tolerance for zero tests on tableau entries
pub const TOLERANCE: f64 = 1e-9;

/// What a tableau column stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Decision variable `j`
    Structural(usize),
    /// Slack or surplus of constraint `constraint`
    Slack { constraint: usize },
    /// Phase 1 artificial of constraint `constraint`
    Artificial { constraint: usize },
}

impl ColumnKind {
    pub fn is_artificial(self) -> bool {
        matches!(self, ColumnKind::Artificial { .. })
    }
}

/// A constraint row as it entered the tableau: `coefficients·x + sign·s = rhs`
#[derive(Debug, Clone, PartialEq)]
struct RowOrigin {
    coefficients: Vec<f64>,
    rhs: f64,
    slack_sign: f64,
}

/// Dense simplex tableau.
///
/// Rows `0..num_rows()` are constraints, the last row holds the objective
/// in maximization form (`z - c·x = 0`). The last column is the rhs.
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    data: Vec<Vec<f64>>,
    basis: Vec<usize>,
    columns: Vec<ColumnKind>,
    origins: Vec<RowOrigin>,
    /// Objective coefficients, already negated for minimization
    costs: Vec<f64>,
    sense: Sense,
}

impl Tableau {
    /// Convert `problem` into an initial tableau with a slack or artificial
    /// basis. Rows with a negative rhs are negated first.
    pub fn build(problem: &ProblemSpec) -> Result<Self, SolverError> {
        problem.validate()?;

        let n_vars = problem.num_variables();
        let normalized: Vec<(Vec<f64>, Relation, f64)> = problem
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    (
                        c.coefficients.iter().map(|v| -v).collect(),
                        c.relation.flipped(),
                        -c.rhs,
                    )
                } else {
                    (c.coefficients.clone(), c.relation, c.rhs)
                }
            })
            .collect();

        let mut columns: Vec<ColumnKind> = (0..n_vars).map(ColumnKind::Structural).collect();
        for (i, (_, relation, _)) in normalized.iter().enumerate() {
            if *relation != Relation::Equal {
                columns.push(ColumnKind::Slack { constraint: i });
            }
        }
        for (i, (_, relation, _)) in normalized.iter().enumerate() {
            if *relation != Relation::LessEq {
                columns.push(ColumnKind::Artificial { constraint: i });
            }
        }

        let n_cols = columns.len();
        let n_rows = normalized.len();
        let mut data = vec![vec![0.0; n_cols + 1]; n_rows + 1];
        let mut basis = vec![0; n_rows];
        let mut origins = Vec::with_capacity(n_rows);

        for (i, (coefficients, relation, rhs)) in normalized.into_iter().enumerate() {
            data[i][..n_vars].copy_from_slice(&coefficients);
            data[i][n_cols] = rhs;

            let mut slack_sign = 0.0;
            for (j, kind) in columns.iter().enumerate() {
                match *kind {
                    ColumnKind::Slack { constraint } if constraint == i => {
                        slack_sign = if relation == Relation::LessEq { 1.0 } else { -1.0 };
                        data[i][j] = slack_sign;
                        if relation == Relation::LessEq {
                            basis[i] = j;
                        }
                    }
                    ColumnKind::Artificial { constraint } if constraint == i => {
                        data[i][j] = 1.0;
                        basis[i] = j;
                    }
                    _ => {}
                }
            }

            origins.push(RowOrigin {
                coefficients,
                rhs,
                slack_sign,
            });
        }

        let costs: Vec<f64> = match problem.objective.sense {
            Sense::Maximize => problem.objective.coefficients.clone(),
            Sense::Minimize => problem.objective.coefficients.iter().map(|c| -c).collect(),
        };

        let mut tableau = Tableau {
            data,
            basis,
            columns,
            origins,
            costs,
            sense: problem.objective.sense,
        };
        tableau.load_objective();

        debug!(
            component = "tableau",
            operation = "build",
            status = "success",
            rows = tableau.num_rows(),
            cols = tableau.num_cols(),
            artificial = tableau.has_artificial(),
            "Built tableau"
        );

        Ok(tableau)
    }

    /// Number of constraint rows
    pub fn num_rows(&self) -> usize {
        self.basis.len()
    }

    /// Number of variable columns (excluding the rhs)
    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn num_variables(&self) -> usize {
        self.costs.len()
    }

    pub fn rhs_col(&self) -> usize {
        self.columns.len()
    }

    pub fn objective_row(&self) -> usize {
        self.basis.len()
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.data[row][self.rhs_col()]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row]
    }

    /// Reduced cost of column `col` in the current objective row
    pub fn reduced_cost(&self, col: usize) -> f64 {
        self.data[self.objective_row()][col]
    }

    pub fn basis(&self) -> &[usize] {
        &self.basis
    }

    pub fn columns(&self) -> &[ColumnKind] {
        &self.columns
    }

    pub fn column(&self, col: usize) -> ColumnKind {
        self.columns[col]
    }

    pub fn is_basic(&self, col: usize) -> bool {
        self.basis.contains(&col)
    }

    pub fn has_artificial(&self) -> bool {
        self.columns.iter().any(|k| k.is_artificial())
    }

    /// Current decision variable values; non-basic variables are zero
    pub fn decision_values(&self) -> Vec<f64> {
        let mut values = vec![0.0; self.num_variables()];
        for (i, &b) in self.basis.iter().enumerate() {
            if let ColumnKind::Structural(j) = self.columns[b] {
                values[j] = self.rhs(i);
            }
        }
        values
    }

    /// Express the slack column `col` through the decision variables as
    /// `s = constant - coefficients·x`. `None` for non-slack columns.
    pub fn slack_expression(&self, col: usize) -> Option<(Vec<f64>, f64)> {
        let ColumnKind::Slack { constraint } = self.columns[col] else {
            return None;
        };
        let origin = &self.origins[constraint];
        let coefficients = origin
            .coefficients
            .iter()
            .map(|a| origin.slack_sign * a)
            .collect();
        Some((coefficients, origin.slack_sign * origin.rhs))
    }

    /// Divide row `row` by the pivot element and eliminate column `col`
    /// from every other row, objective included.
    pub fn pivot(&mut self, row: usize, col: usize) -> Result<(), SolverError> {
        let pivot_val = self.data[row][col];
        if pivot_val.abs() < TOLERANCE {
            return Err(SolverError::DegeneratePivot {
                row,
                col,
                value: pivot_val,
            });
        }

        for v in self.data[row].iter_mut() {
            *v /= pivot_val;
        }
        self.data[row][col] = 1.0;

        let pivot_row = self.data[row].clone();
        for (i, current) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = current[col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in current.iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
            current[col] = 0.0;
        }

        self.basis[row] = col;

        trace!(
            component = "tableau",
            operation = "pivot",
            status = "success",
            row,
            col,
            pivot = pivot_val,
            "Pivoted"
        );
        debug_assert!(self.basis_is_canonical(1e-6));

        Ok(())
    }

    /// Every basic column is a unit column with its 1 in its own row
    /// (objective row included).
    pub fn basis_is_canonical(&self, tolerance: f64) -> bool {
        self.basis.iter().enumerate().all(|(r, &b)| {
            self.data.iter().enumerate().all(|(i, row)| {
                let expected = if i == r { 1.0 } else { 0.0 };
                (row[b] - expected).abs() <= tolerance
            })
        })
    }

    /// Extend the tableau with `cut` as a new row and a new basic slack
    /// column. The row is reduced against the current basis, so the rhs of
    /// the new row may come out negative.
    pub fn append_cut_row(&mut self, cut: &Constraint) -> Result<(), SolverError> {
        if cut.coefficients.len() != self.num_variables() {
            return Err(SolverError::MalformedProblem(format!(
                "cut {} has {} coefficients, expected {}",
                cut.name,
                cut.coefficients.len(),
                self.num_variables()
            )));
        }
        let (coefficients, rhs) = match cut.relation {
            Relation::LessEq => (cut.coefficients.clone(), cut.rhs),
            Relation::GreaterEq => (cut.coefficients.iter().map(|v| -v).collect(), -cut.rhs),
            Relation::Equal => {
                return Err(SolverError::MalformedProblem(format!(
                    "cut {} must be an inequality",
                    cut.name
                )));
            }
        };

        let slack_col = self.num_cols();
        for row in self.data.iter_mut() {
            row.insert(slack_col, 0.0);
        }
        let constraint = self.origins.len();
        self.columns.push(ColumnKind::Slack { constraint });

        let mut new_row = vec![0.0; self.num_cols() + 1];
        for (j, kind) in self.columns.iter().enumerate() {
            if let ColumnKind::Structural(v) = *kind {
                new_row[j] = coefficients[v];
            }
        }
        new_row[slack_col] = 1.0;
        new_row[slack_col + 1] = rhs;

        for (i, &b) in self.basis.iter().enumerate() {
            let factor = new_row[b];
            if factor.abs() <= TOLERANCE {
                new_row[b] = 0.0;
                continue;
            }
            for (v, p) in new_row.iter_mut().zip(&self.data[i]) {
                *v -= factor * p;
            }
            new_row[b] = 0.0;
        }

        let objective_row = self.objective_row();
        self.data.insert(objective_row, new_row);
        self.basis.push(slack_col);
        self.origins.push(RowOrigin {
            coefficients,
            rhs,
            slack_sign: 1.0,
        });

        debug!(
            component = "tableau",
            operation = "append_cut_row",
            status = "success",
            cut = cut.name.as_str(),
            rows = self.num_rows(),
            cols = self.num_cols(),
            rhs = self.rhs(self.num_rows() - 1),
            "Appended cut row"
        );

        Ok(())
    }

    /// Replace the objective row with `z + Σ weight_j·t_j = 0` and price out
    /// the current basis.
    pub(crate) fn set_objective_row(&mut self, weights: &[(usize, f64)]) {
        let objective_row = self.objective_row();
        let width = self.num_cols() + 1;
        let mut row = vec![0.0; width];
        for &(col, weight) in weights {
            row[col] = weight;
        }
        for (i, &b) in self.basis.iter().enumerate() {
            let factor = row[b];
            if factor.abs() <= TOLERANCE {
                continue;
            }
            for (v, p) in row.iter_mut().zip(&self.data[i]) {
                *v -= factor * p;
            }
            row[b] = 0.0;
        }
        self.data[objective_row] = row;
    }

    /// Install the real objective (maximization form) and price it out
    pub(crate) fn load_objective(&mut self) {
        let weights: Vec<(usize, f64)> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(j, kind)| match *kind {
                ColumnKind::Structural(v) => Some((j, -self.costs[v])),
                _ => None,
            })
            .collect();
        self.set_objective_row(&weights);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_two() -> ProblemSpec {
        let mut problem = ProblemSpec::with_variable_count(2);
        problem.set_objective(vec![1.0, 1.0], Sense::Maximize);
        problem.add_constraint("c1", vec![2.0, 1.0], Relation::LessEq, 5.0);
        problem.add_constraint("c2", vec![1.0, 3.0], Relation::LessEq, 6.0);
        problem
    }

    #[test]
    fn test_build_slack_basis() {
        let tableau = Tableau::build(&scenario_two()).unwrap();

        assert_eq!(tableau.num_rows(), 2);
        assert_eq!(tableau.num_cols(), 4);
        assert_eq!(tableau.basis(), &[2, 3]);
        assert!(!tableau.has_artificial());
        assert!(tableau.basis_is_canonical(TOLERANCE));
        assert_eq!(tableau.row(0), &[2.0, 1.0, 1.0, 0.0, 5.0]);
        // objective row holds -c
        assert_eq!(tableau.row(2), &[-1.0, -1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_build_ge_and_eq_rows() {
        let mut problem = ProblemSpec::with_variable_count(2);
        problem.set_objective(vec![1.0, 1.0], Sense::Minimize);
        problem.add_constraint("ge", vec![1.0, 1.0], Relation::GreaterEq, 2.0);
        problem.add_constraint("eq", vec![1.0, -1.0], Relation::Equal, 0.0);
        let tableau = Tableau::build(&problem).unwrap();

        // x1 x2 | surplus | art(ge) art(eq) | rhs
        assert_eq!(
            tableau.columns(),
            &[
                ColumnKind::Structural(0),
                ColumnKind::Structural(1),
                ColumnKind::Slack { constraint: 0 },
                ColumnKind::Artificial { constraint: 0 },
                ColumnKind::Artificial { constraint: 1 },
            ]
        );
        assert_eq!(tableau.row(0), &[1.0, 1.0, -1.0, 1.0, 0.0, 2.0]);
        assert_eq!(tableau.basis(), &[3, 4]);
        // minimization is stored negated
        assert_eq!(tableau.reduced_cost(0), 1.0);
    }

    #[test]
    fn test_build_flips_negative_rhs() {
        let mut problem = ProblemSpec::with_variable_count(1);
        problem.set_objective(vec![1.0], Sense::Maximize);
        problem.add_constraint("neg", vec![1.0], Relation::LessEq, -1.0);
        let tableau = Tableau::build(&problem).unwrap();

        // x1 <= -1 becomes -x1 >= 1
        assert_eq!(tableau.row(0), &[-1.0, -1.0, 1.0, 1.0]);
        assert!(tableau.column(tableau.basis()[0]).is_artificial());
        let (coefficients, constant) = tableau.slack_expression(1).unwrap();
        // surplus s = -x1 - 1
        assert_eq!(coefficients, vec![1.0]);
        assert_eq!(constant, -1.0);
    }

    #[test]
    fn test_build_rejects_malformed() {
        let mut problem = scenario_two();
        problem.add_constraint("short", vec![1.0], Relation::LessEq, 1.0);
        assert!(matches!(
            Tableau::build(&problem),
            Err(SolverError::MalformedProblem(_))
        ));
    }

    #[test]
    fn test_pivot_keeps_identity_columns() {
        let mut tableau = Tableau::build(&scenario_two()).unwrap();
        tableau.pivot(0, 0).unwrap();

        assert_eq!(tableau.basis(), &[0, 3]);
        assert!(tableau.basis_is_canonical(TOLERANCE));
        assert!((tableau.rhs(0) - 2.5).abs() < 1e-12);
        assert!((tableau.rhs(1) - 3.5).abs() < 1e-12);
        assert!((tableau.rhs(tableau.objective_row()) - 2.5).abs() < 1e-12);
        assert_eq!(tableau.decision_values(), vec![2.5, 0.0]);
    }

    #[test]
    fn test_pivot_on_zero_is_degenerate() {
        let mut problem = ProblemSpec::with_variable_count(2);
        problem.set_objective(vec![1.0, 1.0], Sense::Maximize);
        problem.add_constraint("c1", vec![1.0, 0.0], Relation::LessEq, 1.0);
        let mut tableau = Tableau::build(&problem).unwrap();

        let err = tableau.pivot(0, 1).unwrap_err();
        assert!(matches!(err, SolverError::DegeneratePivot { row: 0, col: 1, .. }));
        // nothing changed
        assert_eq!(tableau.basis(), &[2]);
    }

    #[test]
    fn test_append_cut_row_reduces_against_basis() {
        let mut tableau = Tableau::build(&scenario_two()).unwrap();
        tableau.pivot(0, 0).unwrap();
        tableau.pivot(1, 1).unwrap();
        // x1 = 1.8, x2 = 1.4
        let cut = Constraint::new("cut", vec![2.0, 3.0], Relation::LessEq, 7.0);
        tableau.append_cut_row(&cut).unwrap();

        assert_eq!(tableau.num_rows(), 3);
        assert_eq!(tableau.num_cols(), 5);
        assert_eq!(tableau.basis()[2], 4);
        assert_eq!(tableau.column(4), ColumnKind::Slack { constraint: 2 });
        assert!(tableau.basis_is_canonical(1e-9));
        // 7 - (2*1.8 + 3*1.4)
        assert!((tableau.rhs(2) + 0.8).abs() < 1e-9, "rhs = {}", tableau.rhs(2));
        // objective row untouched by the new column
        assert_eq!(tableau.reduced_cost(4), 0.0);
    }

    #[test]
    fn test_append_rejects_equality_cut() {
        let mut tableau = Tableau::build(&scenario_two()).unwrap();
        let cut = Constraint::new("cut", vec![1.0, 1.0], Relation::Equal, 3.0);
        assert!(tableau.append_cut_row(&cut).is_err());
        let cut = Constraint::new("cut", vec![1.0], Relation::LessEq, 3.0);
        assert!(tableau.append_cut_row(&cut).is_err());
    }
}
