use std::fmt;

use serde::{Deserialize, Serialize};

use crate::solver::constraint::Constraint;

/// An opaque, unique name for a [`Variable`].
///
/// Identifiers are plain string tokens; the solver attaches no meaning to
/// their content beyond equality. Within one solve call every declared
/// variable must carry a distinct identifier, but constraints may freely
/// reference identifiers that were never declared (for example a dependency
/// on a candidate that no catalog currently provides).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The unit of selection: an identifier together with the ordered list of
/// constraints that govern when it may appear in a solution.
///
/// Variables are caller-supplied and treated as immutable for the duration
/// of one solve call. Constraint order matters: it fixes the order in which
/// clauses are built and therefore the order of diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    id: Identifier,
    constraints: Vec<Constraint>,
}

impl Variable {
    pub fn new(id: impl Into<Identifier>, constraints: Vec<Constraint>) -> Self {
        Self {
            id: id.into(),
            constraints,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn identifier_displays_as_bare_token() {
        assert_eq!(Identifier::from("pkg-a.v1").to_string(), "pkg-a.v1");
    }

    #[test]
    fn variable_preserves_constraint_order() {
        let variable = Variable::new(
            "a",
            vec![
                Constraint::Mandatory,
                Constraint::Dependency(vec!["b".into(), "c".into()]),
            ],
        );
        assert_eq!(variable.id(), &Identifier::from("a"));
        assert_eq!(variable.constraints().len(), 2);
        assert_eq!(variable.constraints()[0], Constraint::Mandatory);
    }
}
