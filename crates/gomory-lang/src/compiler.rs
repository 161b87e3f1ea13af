use std::collections::{HashMap, HashSet};

use gomory_solver::{ProblemSpec, SolverError};
use thiserror::Error;

use crate::ast::*;
use crate::Parser;
use crate::parser::ParseError;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Model has no constraints")]
    NoConstraints,
    #[error("Objective contains a constant term at position {0:?}")]
    ConstantInObjective(crate::lexer::Span),
    #[error("Constraint {0} has no variables")]
    EmptyConstraint(String),
    #[error("Duplicate constraint name: {0}")]
    DuplicateName(String),
    #[error("Invalid model: {0}")]
    Invalid(#[from] SolverError),
}

/// Lowers a parsed [`Model`] to a [`ProblemSpec`].
///
/// Variables are numbered in order of first appearance, objective first.
/// Variable terms move to the left-hand side and constants to the right.
#[derive(Debug, Default)]
pub struct Compiler {
    variables: Vec<String>,
    index: HashMap<String, usize>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and lower `source` in one step
    pub fn compile_source(source: &str) -> Result<ProblemSpec, CompileError> {
        let model = Parser::parse(source)?;
        Compiler::new().compile(&model)
    }

    fn register(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.variables.len();
        self.variables.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }

    fn register_expr(&mut self, expr: &LinearExpr) {
        for term in &expr.terms {
            if let Some(name) = &term.variable {
                self.register(name);
            }
        }
    }

    /// Dense coefficients of the variable terms plus the sum of constants
    fn dense(&self, expr: &LinearExpr) -> (Vec<f64>, f64) {
        let mut coefficients = vec![0.0; self.variables.len()];
        let mut constant = 0.0;
        for term in &expr.terms {
            match &term.variable {
                Some(name) => coefficients[self.index[name]] += term.coefficient,
                None => constant += term.coefficient,
            }
        }
        (coefficients, constant)
    }

    pub fn compile(&mut self, model: &Model) -> Result<ProblemSpec, CompileError> {
        self.variables.clear();
        self.index.clear();

        if model.constraints.is_empty() {
            return Err(CompileError::NoConstraints);
        }
        if let Some(term) = model.objective.expr.terms.iter().find(|t| t.variable.is_none()) {
            return Err(CompileError::ConstantInObjective(term.span));
        }

        self.register_expr(&model.objective.expr);
        for c in &model.constraints {
            self.register_expr(&c.lhs);
            self.register_expr(&c.rhs);
        }

        let mut problem = ProblemSpec::new(self.variables.clone());
        let (objective, _) = self.dense(&model.objective.expr);
        problem.set_objective(objective, model.objective.sense);

        let mut names = HashSet::new();
        for (i, c) in model.constraints.iter().enumerate() {
            let name = c.name.clone().unwrap_or_else(|| format!("c{}", i + 1));
            if !names.insert(name.clone()) {
                return Err(CompileError::DuplicateName(name));
            }

            let (lhs, lhs_constant) = self.dense(&c.lhs);
            let (rhs, rhs_constant) = self.dense(&c.rhs);
            let coefficients: Vec<f64> = lhs.iter().zip(&rhs).map(|(l, r)| l - r).collect();
            if coefficients.iter().all(|&v| v == 0.0) {
                return Err(CompileError::EmptyConstraint(name));
            }

            problem.add_constraint(name, coefficients, c.relation, rhs_constant - lhs_constant);
        }

        problem.validate()?;
        Ok(problem)
    }
}
