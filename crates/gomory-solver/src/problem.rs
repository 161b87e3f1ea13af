use crate::error::SolverError;

/// An integer linear program: every variable is non-negative and integral
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSpec {
    /// Variable names
    pub variables: Vec<String>,
    /// Objective function
    pub objective: Objective,
    /// Constraints, in insertion order. Cuts are appended at the end.
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to maximize or minimize
    pub sense: Sense,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison relation
    pub relation: Relation,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Less than or equal (<=)
    LessEq,
    /// Greater than or equal (>=)
    GreaterEq,
    /// Equal (=)
    Equal,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::LessEq => "<=",
            Relation::GreaterEq => ">=",
            Relation::Equal => "=",
        }
    }

    /// The relation obtained by multiplying both sides by -1
    pub fn flipped(self) -> Self {
        match self {
            Relation::LessEq => Relation::GreaterEq,
            Relation::GreaterEq => Relation::LessEq,
            Relation::Equal => Relation::Equal,
        }
    }
}

/// A Gomory cut. Always a `<=` constraint over the decision variables.
pub type Cut = Constraint;

impl Constraint {
    pub fn new(
        name: impl Into<String>,
        coefficients: Vec<f64>,
        relation: Relation,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            coefficients,
            relation,
            rhs,
        }
    }

    /// Left-hand side evaluated at `values`
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(a, x)| a * x)
            .sum()
    }

    /// Amount by which `values` violate this constraint (0 when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.lhs(values);
        match self.relation {
            Relation::LessEq => (lhs - self.rhs).max(0.0),
            Relation::GreaterEq => (self.rhs - lhs).max(0.0),
            Relation::Equal => (lhs - self.rhs).abs(),
        }
    }

    pub fn is_satisfied_by(&self, values: &[f64], tolerance: f64) -> bool {
        self.violation(values) <= tolerance
    }
}

impl ProblemSpec {
    /// Create a problem over `variables` with a zero objective and no constraints
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                sense: Sense::Maximize,
            },
            constraints: Vec::new(),
        }
    }

    /// Create a problem with variables named `x1..xn`
    pub fn with_variable_count(n: usize) -> Self {
        Self::new((1..=n).map(|i| format!("x{}", i)).collect())
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, sense: Sense) {
        self.objective = Objective { coefficients, sense };
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(Constraint::new(name, coefficients, relation, rhs));
    }

    pub fn push_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Objective value at `values`
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Check the structural invariants: at least one variable and one
    /// constraint, and every coefficient row matching the variable count.
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.num_variables();
        if n == 0 {
            return Err(SolverError::MalformedProblem(
                "problem has no variables".to_string(),
            ));
        }
        if self.constraints.is_empty() {
            return Err(SolverError::MalformedProblem(
                "problem has no constraints".to_string(),
            ));
        }
        if self.objective.coefficients.len() != n {
            return Err(SolverError::MalformedProblem(format!(
                "objective has {} coefficients, expected {}",
                self.objective.coefficients.len(),
                n
            )));
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolverError::MalformedProblem(format!(
                    "constraint {} has {} coefficients, expected {}",
                    c.name,
                    c.coefficients.len(),
                    n
                )));
            }
            let finite = c.rhs.is_finite() && c.coefficients.iter().all(|v| v.is_finite());
            if !finite {
                return Err(SolverError::MalformedProblem(format!(
                    "constraint {} has a non-finite value",
                    c.name
                )));
            }
        }
        if !self.objective.coefficients.iter().all(|v| v.is_finite()) {
            return Err(SolverError::MalformedProblem(
                "objective has a non-finite coefficient".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether every constraint coefficient and rhs is an integer.
    /// Gomory cuts are only guaranteed valid for such data.
    pub fn has_integral_data(&self, tolerance: f64) -> bool {
        self.constraints.iter().all(|c| {
            c.coefficients
                .iter()
                .chain(std::iter::once(&c.rhs))
                .all(|v| (v - v.round()).abs() <= tolerance)
        })
    }

    /// Whether `values` satisfies every constraint and non-negativity
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        values.len() == self.num_variables()
            && values.iter().all(|&v| v >= -tolerance)
            && self.constraints.iter().all(|c| c.is_satisfied_by(values, tolerance))
    }
}

#[cfg(test)]
impl ProblemSpec {
    /// Feasible integer points with every coordinate in `0..=bound`
    pub(crate) fn integer_points(&self, bound: i64) -> Vec<Vec<f64>> {
        let n = self.num_variables();
        let mut points = Vec::new();
        let mut current = vec![0i64; n];
        loop {
            let point: Vec<f64> = current.iter().map(|&v| v as f64).collect();
            if self.is_feasible(&point, 1e-9) {
                points.push(point);
            }
            let mut k = 0;
            while k < n && current[k] == bound {
                current[k] = 0;
                k += 1;
            }
            if k == n {
                break;
            }
            current[k] += 1;
        }
        points
    }
}
