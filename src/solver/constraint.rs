//! The closed set of constraint kinds understood by the resolver, plus the
//! diagnostic types built from them.
//!
//! Each constraint, applied to a subject variable, contributes exactly one
//! clause literal to the boolean circuit (see
//! [`LitMapping`](crate::solver::lit_mapping::LitMapping)) and one human
//! readable message used when the subject shows up in a conflict.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::solver::variable::Identifier;

/// A rule limiting when a variable may appear in a solution.
///
/// The set of kinds is closed on purpose: an exhaustive `match` over this
/// enum is how the clause builder and the diagnostic formatter stay in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// The subject must appear in every solution.
    Mandatory,
    /// The subject may never appear in a solution.
    Prohibited,
    /// If the subject is selected, at least one of the listed identifiers
    /// must be selected too. The list order is the preference order: the
    /// first entry is tried first by the search.
    Dependency(Vec<Identifier>),
    /// The subject and the listed identifier may never be selected together.
    Conflict(Identifier),
    /// At most `n` of the listed identifiers may be selected, regardless of
    /// whether the subject itself is.
    AtMost(usize, Vec<Identifier>),
    /// A generic binary clause over the subject and one operand, with
    /// either side optionally negated.
    Or {
        operand: Identifier,
        negate_subject: bool,
        negate_operand: bool,
    },
}

impl Constraint {
    /// Whether this constraint's literal is asserted unconditionally,
    /// seeding the baseline assumption set of the search.
    pub fn anchor(&self) -> bool {
        matches!(self, Constraint::Mandatory)
    }

    /// The preference-ordered candidate list of this constraint.
    ///
    /// Non-empty only for [`Constraint::Dependency`]; every other kind
    /// offers the search nothing to choose between.
    pub fn order(&self) -> &[Identifier] {
        match self {
            Constraint::Dependency(ids) => ids,
            _ => &[],
        }
    }

    fn message(&self, subject: &Identifier) -> String {
        match self {
            Constraint::Mandatory => format!("{subject} is mandatory"),
            Constraint::Prohibited => format!("{subject} is prohibited"),
            Constraint::Dependency(ids) if ids.is_empty() => {
                format!("{subject} has a dependency without any candidates")
            }
            Constraint::Dependency(ids) => {
                format!("{subject} requires at least one of {}", join(ids))
            }
            Constraint::Conflict(id) => format!("{subject} conflicts with {id}"),
            Constraint::AtMost(n, ids) => {
                format!("{subject} permits at most {n} of {}", join(ids))
            }
            Constraint::Or {
                operand,
                negate_subject,
                negate_operand,
            } => {
                let subject = render_term(subject, *negate_subject);
                let operand = render_term(operand, *negate_operand);
                format!("{subject} or {operand} must hold")
            }
        }
    }
}

fn join(ids: &[Identifier]) -> String {
    ids.iter()
        .map(Identifier::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_term(id: &Identifier, negated: bool) -> String {
    if negated {
        format!("not {id}")
    } else {
        id.to_string()
    }
}

/// A constraint bound to the concrete variable it was declared on.
///
/// This is the unit of conflict diagnosis: when the engine reports why a
/// set of assumptions is unsatisfiable, each failed literal is mapped back
/// to the applied constraint that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedConstraint {
    pub variable: Identifier,
    pub constraint: Constraint,
}

impl AppliedConstraint {
    pub fn new(variable: Identifier, constraint: Constraint) -> Self {
        Self {
            variable,
            constraint,
        }
    }
}

impl fmt::Display for AppliedConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.constraint.message(&self.variable))
    }
}

/// An ordered set of applied constraints that cannot all hold at once.
///
/// The core is engine-reported: it is small enough to act on but not
/// guaranteed to be globally minimal. Ordering follows the order in which
/// the constraints were recorded, so diagnostics are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotSatisfiable(pub Vec<AppliedConstraint>);

impl fmt::Display for NotSatisfiable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "constraints not satisfiable: {rendered}")
    }
}

impl std::error::Error for NotSatisfiable {}
