use std::fmt::Write;

use gomory_solver::{
    BasicSolution, Constraint, Iteration, ProblemSpec, Sense, SolutionStatus, SolutionTrace,
    TraceStatus,
};

/// Integers print bare, everything else with four decimals
pub fn format_number(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        let r = v.round();
        if r == 0.0 { "0".to_string() } else { format!("{}", r) }
    } else {
        format!("{:.4}", v)
    }
}

/// `3*x1 - x2 + 0.5*x3`, skipping zero coefficients
pub fn format_linear(coefficients: &[f64], variables: &[String]) -> String {
    let mut out = String::new();
    for (coef, name) in coefficients.iter().zip(variables) {
        if coef.abs() < 1e-9 {
            continue;
        }
        let magnitude = coef.abs();
        if out.is_empty() {
            if *coef < 0.0 {
                out.push('-');
            }
        } else if *coef < 0.0 {
            out.push_str(" - ");
        } else {
            out.push_str(" + ");
        }
        if (magnitude - 1.0).abs() < 1e-9 {
            out.push_str(name);
        } else {
            let _ = write!(out, "{}*{}", format_number(magnitude), name);
        }
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}

pub fn format_constraint(constraint: &Constraint, variables: &[String]) -> String {
    format!(
        "{}: {} {} {}",
        constraint.name,
        format_linear(&constraint.coefficients, variables),
        constraint.relation.symbol(),
        format_number(constraint.rhs)
    )
}

pub fn render_model(problem: &ProblemSpec) -> String {
    let mut out = String::new();
    let sense = match problem.objective.sense {
        Sense::Maximize => "Maximize",
        Sense::Minimize => "Minimize",
    };
    let _ = writeln!(
        out,
        "{}: {}",
        sense,
        format_linear(&problem.objective.coefficients, &problem.variables)
    );
    let _ = writeln!(out, "Subject to:");
    for c in &problem.constraints {
        let _ = writeln!(out, "  {}", format_constraint(c, &problem.variables));
    }
    let _ = writeln!(out, "  {} >= 0, integer", problem.variables.join(", "));
    out
}

fn render_solution(out: &mut String, solution: &BasicSolution, variables: &[String]) {
    match solution.status {
        SolutionStatus::Optimal => {
            for (name, value) in variables.iter().zip(&solution.values) {
                let _ = writeln!(out, "  {} = {}", name, format_number(*value));
            }
            let _ = writeln!(out, "  Z = {:.4}", solution.objective_value);
        }
        SolutionStatus::Infeasible => {
            let _ = writeln!(out, "  No solution satisfies all constraints.");
        }
        SolutionStatus::Unbounded => {
            let _ = writeln!(out, "  The objective has no finite optimum.");
        }
    }
}

pub fn render_iteration(
    out: &mut String,
    index: usize,
    iteration: &Iteration,
    variables: &[String],
) {
    let _ = writeln!(out, "Iteration {}: {:?}", index + 1, iteration.solution.status);
    render_solution(out, &iteration.solution, variables);
    if let Some(cut) = &iteration.cut {
        let _ = writeln!(out, "  Added cut {}", format_constraint(cut, variables));
    }
}

pub fn status_message(trace: &SolutionTrace, max_cuts: usize) -> String {
    match trace.status {
        TraceStatus::Converged => format!(
            "Integral optimum found after {} cut(s).",
            trace.cuts_generated
        ),
        TraceStatus::Exhausted => format!(
            "Reached the maximum of {} cuts without an integral solution.",
            max_cuts
        ),
        TraceStatus::Infeasible => {
            "The relaxation is infeasible; no integer solution exists.".to_string()
        }
        TraceStatus::Unbounded => "The relaxation is unbounded.".to_string(),
        TraceStatus::Cancelled => "The run was cancelled before the next solve.".to_string(),
    }
}

pub fn render_trace(trace: &SolutionTrace, variables: &[String], max_cuts: usize) -> String {
    let mut out = String::new();
    for (i, iteration) in trace.iterations.iter().enumerate() {
        render_iteration(&mut out, i, iteration, variables);
        out.push('\n');
    }
    let _ = writeln!(out, "{}", status_message(trace, max_cuts));
    out
}

/// Model description followed by every iteration, for `--output`
pub fn render_report(problem: &ProblemSpec, trace: &SolutionTrace, max_cuts: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Integer linear program");
    out.push_str(&render_model(problem));
    let _ = writeln!(out);
    let _ = writeln!(out, "Results:");
    out.push_str(&render_trace(trace, &problem.variables, max_cuts));
    out
}
