//! Deligo is a deterministic, preference-respecting dependency and
//! constraint resolution engine.
//!
//! You describe a universe of named variables, each carrying constraints
//! (mandatory, prohibited, preference-ordered dependencies, conflicts,
//! at-most bounds, binary or-clauses), and the solver returns the subset of
//! variables to select, or an explanation of why no subset works. The same
//! input always produces the same output, and the selection honors stated
//! preferences: the first listed candidate of every dependency wins unless
//! some other constraint rules it out.
//!
//! # Core Concepts
//!
//! - **[`Variable`]**: a named unit of selection, bundling an [`Identifier`]
//!   with the [`Constraint`]s declared on it.
//! - **[`Solver`]**: the orchestrator. It compiles variables into a boolean
//!   circuit, runs a preference-ordered backtracking search over scoped
//!   assumptions, and minimizes gratuitous selections before answering.
//! - **[`BooleanEngine`]**: the seam to the underlying satisfiability
//!   engine. The crate ships [`DpllEngine`], and anything implementing the
//!   trait can be swapped in via [`Solver::with_engine`].
//! - **[`NotSatisfiable`]**: the structured failure, listing the applied
//!   constraints that cannot all hold at once, in input order.
//!
//! # Example: A Dependency Pulls Its Target In
//!
//! ```
//! use deligo::solver::{constraint::Constraint, engine::Solver, variable::Variable};
//!
//! let variables = vec![
//!     Variable::new("ssl", vec![]),
//!     Variable::new(
//!         "http",
//!         vec![
//!             Constraint::Mandatory,
//!             Constraint::Dependency(vec!["ssl".into()]),
//!         ],
//!     ),
//! ];
//!
//! let (selection, _stats) = Solver::new(variables).solve().unwrap();
//! let names: Vec<&str> = selection.iter().map(|v| v.id().as_str()).collect();
//! assert_eq!(names, vec!["ssl", "http"]);
//! ```
//!
//! [`Variable`]: solver::variable::Variable
//! [`Identifier`]: solver::variable::Identifier
//! [`Constraint`]: solver::constraint::Constraint
//! [`Solver`]: solver::engine::Solver
//! [`Solver::with_engine`]: solver::engine::Solver::with_engine
//! [`BooleanEngine`]: solver::sat::BooleanEngine
//! [`DpllEngine`]: solver::sat::DpllEngine
//! [`NotSatisfiable`]: solver::constraint::NotSatisfiable

pub mod error;
pub mod solver;
