use crate::solver::{constraint::NotSatisfiable, sat::Lit, variable::Identifier};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A single dangling-reference record.
///
/// These indicate disagreement between the literal mapping and the engine,
/// which is a resolver bug rather than bad input. They are aggregated
/// during a solve and surfaced together at the end instead of being thrown
/// mid-build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("no literal allocated for identifier {0}")]
    MissingLiteral(Identifier),
    #[error("no constraint recorded for literal {0:?}")]
    MissingConstraint(Lit),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Input validation failure; detected before any search work.
    #[error("duplicate identifier {0} in input")]
    DuplicateIdentifier(Identifier),

    /// The expected, recoverable failure: the caller may relax constraints
    /// and try again with different input.
    #[error(transparent)]
    NotSatisfiable(#[from] NotSatisfiable),

    /// The solve was cancelled before reaching a verdict. Absence of proof
    /// is not proof of absence: this must never be read as unsatisfiable.
    #[error("resolution cancelled before a verdict was reached")]
    Cancelled,

    /// Aggregated dangling-reference records; overrides any computed
    /// result.
    #[error("internal consistency violated: {}", render(.0))]
    Consistency(Vec<ConsistencyError>),

    /// The cardinality sweep refuted every bound even though the search
    /// proved satisfiability; only an implementation bug can cause this.
    #[error("cardinality minimization exhausted every bound after a satisfiable search")]
    MinimizeExhausted,
}

fn render(errors: &[ConsistencyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
