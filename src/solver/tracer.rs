//! Observational hooks into the search.
//!
//! A tracer sees every scope the search pushes, with the identifiers
//! currently assumed and the conflicts of the most recent failure. It is
//! purely observational: nothing a tracer does may change the outcome.

use tracing::debug;

use crate::solver::{constraint::AppliedConstraint, variable::Identifier};

/// A snapshot of the search handed to a [`Tracer`] at every scope push.
#[derive(Debug)]
pub struct SearchPosition<'a> {
    /// Identifiers assumed in the current scope chain, outermost first.
    pub identifiers: Vec<&'a Identifier>,
    /// Conflicts explaining the most recent unsatisfiable scope; empty
    /// while the branch is still open.
    pub conflicts: Vec<AppliedConstraint>,
}

pub trait Tracer {
    fn trace(&self, position: &SearchPosition<'_>);
}

/// The default tracer: sees everything, says nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn trace(&self, _position: &SearchPosition<'_>) {}
}

/// Logs every search position through `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTracer;

impl Tracer for LoggingTracer {
    fn trace(&self, position: &SearchPosition<'_>) {
        debug!(
            assumed = ?position.identifiers,
            conflicts = position.conflicts.len(),
            "search position"
        );
    }
}
