//! Solver orchestration.
//!
//! [`Solver`] wires the literal mapping, the preference-ordered search and
//! the cardinality pass together over an injected [`BooleanEngine`], and
//! converts engine outcomes into the crate's result types. One solver
//! instance owns its engine exclusively; separate solves in separate
//! threads need separate instances.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{Error, Result},
    solver::{
        constraint::NotSatisfiable,
        lit_mapping::LitMapping,
        minimize::minimize_extras,
        sat::{BooleanEngine, DpllEngine, Lit},
        search::{Search, SearchOutcome},
        stats::SearchStats,
        tracer::{NoopTracer, Tracer},
        variable::Variable,
    },
};

/// A clonable, thread-safe cancellation signal.
///
/// Cancellation is cooperative: the search polls the token between scope
/// pushes and, once it observes the signal, issues no further engine calls
/// and reports [`Error::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Explicit configuration for one solver instance.
///
/// Passed in as a plain value; there are no package-global defaults to
/// reach around it.
pub struct SolverConfig {
    pub tracer: Box<dyn Tracer>,
    pub cancel: Cancel,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tracer: Box::new(NoopTracer),
            cancel: Cancel::default(),
        }
    }
}

/// Resolves variables against their constraints into a deterministic,
/// preference-respecting selection.
pub struct Solver<E: BooleanEngine = DpllEngine> {
    variables: Vec<Variable>,
    engine: E,
    config: SolverConfig,
}

impl Solver<DpllEngine> {
    /// A solver over the crate's default engine.
    pub fn new(variables: Vec<Variable>) -> Self {
        Self::with_engine(DpllEngine::new(), variables)
    }
}

impl<E: BooleanEngine> Solver<E> {
    pub fn with_engine(engine: E, variables: Vec<Variable>) -> Self {
        Self {
            variables,
            engine,
            config: SolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// A handle for cancelling this solver from another thread.
    pub fn cancel_token(&self) -> Cancel {
        self.config.cancel.clone()
    }

    /// Runs one closed, self-contained resolution over the input.
    ///
    /// Returns the selected variables in input order, or
    /// [`Error::NotSatisfiable`] with the conflicting applied constraints,
    /// or [`Error::Cancelled`] if the token fired mid-search. Aggregated
    /// internal-consistency errors override any other outcome.
    pub fn solve(&mut self) -> Result<(Vec<Variable>, SearchStats)> {
        let mut stats = SearchStats::default();
        let mut mapping = LitMapping::new(&mut self.engine, &self.variables)?;
        mapping.assume_constraints(&mut self.engine);

        let result = {
            let mut search = Search::new(
                &mut self.engine,
                &mapping,
                self.config.tracer.as_ref(),
                &self.config.cancel,
                &mut stats,
            );
            search.run()
        };
        match result.outcome {
            SearchOutcome::Cancelled => {
                mapping.check()?;
                return Err(Error::Cancelled);
            }
            SearchOutcome::Unsatisfiable => {
                let why = self.engine.why();
                let conflicts = mapping.conflicts(&why);
                mapping.check()?;
                debug!(conflicts = conflicts.len(), "constraints unsatisfiable");
                return Err(Error::NotSatisfiable(NotSatisfiable(conflicts)));
            }
            SearchOutcome::Satisfiable => {}
        }

        let assumed: HashSet<Lit> = result.assumptions.iter().copied().collect();
        let minimized = minimize_extras(&mut self.engine, &mapping, &assumed, &mut stats);

        let mut selection = Vec::new();
        for variable in &self.variables {
            if let Some(lit) = mapping.lit_of(variable.id()) {
                if self.engine.value(lit) {
                    selection.push(variable.clone());
                }
            }
        }
        // Mapping/engine disagreements trump whatever was computed above.
        mapping.check()?;
        minimized?;
        debug!(selected = selection.len(), "resolution complete");
        Ok((selection, stats))
    }
}
