use crate::problem::{Cut, Sense};

/// The result of one simplex solve
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BasicSolution {
    /// Solution status
    pub status: SolutionStatus,
    /// Value of each decision variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Objective value in the problem's own sense
    pub objective_value: f64,
    /// Tableau column basic in each constraint row
    pub basis: Vec<usize>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
}

impl BasicSolution {
    pub fn infeasible() -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: Vec::new(),
            objective_value: f64::INFINITY,
            basis: Vec::new(),
        }
    }

    /// The objective grows without bound in the direction of `sense`
    pub fn unbounded(sense: Sense) -> Self {
        let objective_value = match sense {
            Sense::Maximize => f64::INFINITY,
            Sense::Minimize => f64::NEG_INFINITY,
        };
        Self {
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            objective_value,
            basis: Vec::new(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Whether every variable value is within `tolerance` of an integer
    pub fn is_integral(&self, tolerance: f64) -> bool {
        self.is_optimal() && self.values.iter().all(|v| (v - v.round()).abs() <= tolerance)
    }
}

/// One solve of the cutting-plane loop
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    pub solution: BasicSolution,
    /// Cut derived from this solution, if the loop went on
    pub cut: Option<Cut>,
}

/// How a cutting-plane run ended
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStatus {
    /// The last relaxation optimum is integral
    Converged,
    /// The cut budget ran out before an integral optimum was found
    Exhausted,
    /// A relaxation turned out infeasible
    Infeasible,
    /// A relaxation turned out unbounded
    Unbounded,
    /// The host asked the run to stop
    Cancelled,
}

/// Every solve of a cutting-plane run, in order
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionTrace {
    pub iterations: Vec<Iteration>,
    pub status: TraceStatus,
    pub cuts_generated: usize,
}

impl SolutionTrace {
    pub(crate) fn new() -> Self {
        Self {
            iterations: Vec::new(),
            status: TraceStatus::Converged,
            cuts_generated: 0,
        }
    }

    pub(crate) fn push(&mut self, solution: BasicSolution) {
        self.iterations.push(Iteration { solution, cut: None });
    }

    /// Attach `cut` to the most recent iteration
    pub(crate) fn record_cut(&mut self, cut: Cut) {
        if let Some(last) = self.iterations.last_mut() {
            last.cut = Some(cut);
            self.cuts_generated += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn final_solution(&self) -> Option<&BasicSolution> {
        self.iterations.last().map(|it| &it.solution)
    }

    pub fn solutions(&self) -> impl Iterator<Item = &BasicSolution> {
        self.iterations.iter().map(|it| &it.solution)
    }

    pub fn cuts(&self) -> impl Iterator<Item = &Cut> {
        self.iterations.iter().filter_map(|it| it.cut.as_ref())
    }

    /// True only for a run certified integral-optimal
    pub fn is_converged(&self) -> bool {
        self.status == TraceStatus::Converged
    }
}
