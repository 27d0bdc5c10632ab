//! The bridge between declared variables and engine literals.
//!
//! A [`LitMapping`] assigns exactly one literal per identifier (allocated
//! lazily on first reference, so dependency targets need not be declared),
//! builds the boolean circuit for every variable's constraints, and keeps
//! the provenance needed to turn engine conflicts back into
//! [`AppliedConstraint`] diagnostics. A mapping lives for exactly one solve
//! call and is never reused.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::{
    error::{ConsistencyError, Error, Result},
    solver::{
        constraint::{AppliedConstraint, Constraint},
        sat::{BooleanEngine, Lit},
        variable::{Identifier, Variable},
    },
};

/// One dependency's subject and its candidate literals, in preference
/// order. The search walks these to build its guess frontier.
#[derive(Debug, Clone)]
pub(crate) struct CandidateSet {
    pub subject: Lit,
    pub candidates: Vec<Lit>,
}

#[derive(Debug)]
pub struct LitMapping {
    /// Identifiers in first-reference order; drives deterministic
    /// iteration everywhere downstream.
    ordered: Vec<Identifier>,
    lits: HashMap<Identifier, Lit>,
    identifiers: HashMap<Lit, Identifier>,
    /// Clause literal -> the constraint that produced it.
    provenance: HashMap<Lit, AppliedConstraint>,
    /// Clause literals in recorded order; this is both the base assumption
    /// set and the ordering of conflict diagnostics.
    recorded: Vec<Lit>,
    anchors: Vec<Identifier>,
    dependencies: Vec<CandidateSet>,
    /// Dangling-reference records, aggregated instead of raised mid-build.
    errors: Vec<ConsistencyError>,
}

impl LitMapping {
    /// Builds the circuit for `variables` on top of `engine`.
    ///
    /// Fails fast on duplicate identifiers; no literal is allocated and no
    /// clause is built in that case.
    pub fn new<E: BooleanEngine>(engine: &mut E, variables: &[Variable]) -> Result<Self> {
        let mut seen = HashSet::new();
        for variable in variables {
            if !seen.insert(variable.id().clone()) {
                return Err(Error::DuplicateIdentifier(variable.id().clone()));
            }
        }

        let mut mapping = Self {
            ordered: Vec::new(),
            lits: HashMap::new(),
            identifiers: HashMap::new(),
            provenance: HashMap::new(),
            recorded: Vec::new(),
            anchors: Vec::new(),
            dependencies: Vec::new(),
            errors: Vec::new(),
        };

        for variable in variables {
            let subject = mapping.ensure_lit(engine, variable.id());
            for constraint in variable.constraints() {
                let clause = mapping.build_clause(engine, subject, constraint);
                if constraint.anchor() && !mapping.anchors.contains(variable.id()) {
                    mapping.anchors.push(variable.id().clone());
                }
                if clause == engine.always() {
                    // Vacuous clause; built, but useless as a diagnostic.
                    continue;
                }
                if let Entry::Vacant(entry) = mapping.provenance.entry(clause) {
                    entry.insert(AppliedConstraint::new(
                        variable.id().clone(),
                        constraint.clone(),
                    ));
                    mapping.recorded.push(clause);
                }
            }
        }
        trace!(
            identifiers = mapping.ordered.len(),
            clauses = mapping.recorded.len(),
            anchors = mapping.anchors.len(),
            "literal mapping built"
        );
        Ok(mapping)
    }

    fn ensure_lit<E: BooleanEngine>(&mut self, engine: &mut E, id: &Identifier) -> Lit {
        if let Some(&lit) = self.lits.get(id) {
            return lit;
        }
        let lit = engine.allocate();
        self.lits.insert(id.clone(), lit);
        self.identifiers.insert(lit, id.clone());
        self.ordered.push(id.clone());
        lit
    }

    fn build_clause<E: BooleanEngine>(
        &mut self,
        engine: &mut E,
        subject: Lit,
        constraint: &Constraint,
    ) -> Lit {
        match constraint {
            Constraint::Mandatory => subject,
            Constraint::Prohibited => !subject,
            Constraint::Dependency(ids) => {
                let candidates: Vec<Lit> = ids
                    .iter()
                    .map(|id| self.ensure_lit(engine, id))
                    .collect();
                let mut terms = Vec::with_capacity(candidates.len() + 1);
                terms.push(!subject);
                terms.extend_from_slice(&candidates);
                let clause = engine.or(&terms);
                if !candidates.is_empty() {
                    self.dependencies.push(CandidateSet {
                        subject,
                        candidates,
                    });
                }
                clause
            }
            Constraint::Conflict(other) => {
                let other = self.ensure_lit(engine, other);
                engine.or(&[!subject, !other])
            }
            Constraint::AtMost(n, ids) => {
                let lits: Vec<Lit> = ids
                    .iter()
                    .map(|id| self.ensure_lit(engine, id))
                    .collect();
                engine.card_sort(&lits).leq(*n)
            }
            Constraint::Or {
                operand,
                negate_subject,
                negate_operand,
            } => {
                let operand = self.ensure_lit(engine, operand);
                let left = if *negate_subject { !subject } else { subject };
                let right = if *negate_operand { !operand } else { operand };
                engine.or(&[left, right])
            }
        }
    }

    /// Assumes every recorded clause literal, forming the base scope under
    /// which the whole search runs. Clauses are assumed rather than hard
    /// asserted so that the engine's conflict explanation can name them.
    pub fn assume_constraints<E: BooleanEngine>(&self, engine: &mut E) {
        engine.assume(&self.recorded);
    }

    /// Identifiers carrying at least one anchor constraint, in input order.
    pub fn anchor_identifiers(&self) -> &[Identifier] {
        &self.anchors
    }

    /// The anchor assumption literals, in input order.
    pub fn anchor_lits(&self) -> Vec<Lit> {
        self.anchors
            .iter()
            .filter_map(|id| self.lits.get(id).copied())
            .collect()
    }

    /// All identifier literals in first-reference order.
    pub fn lits(&self) -> Vec<Lit> {
        self.ordered
            .iter()
            .filter_map(|id| self.lits.get(id).copied())
            .collect()
    }

    pub(crate) fn dependencies(&self) -> &[CandidateSet] {
        &self.dependencies
    }

    /// Non-recording literal lookup.
    pub fn get_lit(&self, id: &Identifier) -> Option<Lit> {
        self.lits.get(id).copied()
    }

    /// Literal lookup that records a consistency error on a miss. A miss
    /// here means the mapping and the engine disagree, which is a bug in
    /// the resolver rather than bad input.
    pub fn lit_of(&mut self, id: &Identifier) -> Option<Lit> {
        match self.lits.get(id) {
            Some(&lit) => Some(lit),
            None => {
                self.errors
                    .push(ConsistencyError::MissingLiteral(id.clone()));
                None
            }
        }
    }

    pub fn identifier_of(&self, lit: Lit) -> Option<&Identifier> {
        self.identifiers.get(&lit)
    }

    /// Non-recording provenance lookup, used for observational tracing.
    pub fn applied_for(&self, lit: Lit) -> Option<&AppliedConstraint> {
        self.provenance.get(&lit)
    }

    /// Maps an engine conflict explanation to applied constraints, in
    /// recorded order. Literals that are plain identifier assumptions
    /// (anchors or search guesses) carry no provenance and are skipped;
    /// literals the mapping has never seen at all are recorded as
    /// consistency errors.
    pub fn conflicts(&mut self, why: &[Lit]) -> Vec<AppliedConstraint> {
        let failed: HashSet<Lit> = why.iter().copied().collect();
        let conflicts: Vec<AppliedConstraint> = self
            .recorded
            .iter()
            .filter(|lit| failed.contains(lit))
            .filter_map(|lit| self.provenance.get(lit).cloned())
            .collect();
        for &lit in why {
            let known = self.provenance.contains_key(&lit)
                || self.identifiers.contains_key(&lit)
                || self.identifiers.contains_key(&!lit);
            if !known {
                self.errors.push(ConsistencyError::MissingConstraint(lit));
            }
        }
        conflicts
    }

    /// Surfaces every aggregated dangling-reference record. Any error here
    /// overrides whatever result the solve computed.
    pub fn check(&self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Consistency(self.errors.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::solver::sat::DpllEngine;

    fn id(s: &str) -> Identifier {
        Identifier::from(s)
    }

    #[test]
    fn duplicate_identifiers_are_rejected_before_allocation() {
        let mut engine = DpllEngine::new();
        let variables = vec![Variable::new("a", vec![]), Variable::new("a", vec![])];
        let err = LitMapping::new(&mut engine, &variables).unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentifier(ref dup) if dup == &id("a")));
    }

    #[test]
    fn dependency_targets_are_allocated_lazily() {
        let mut engine = DpllEngine::new();
        let variables = vec![Variable::new(
            "a",
            vec![Constraint::Dependency(vec![id("ghost")])],
        )];
        let mapping = LitMapping::new(&mut engine, &variables).unwrap();
        assert!(mapping.get_lit(&id("ghost")).is_some());
        assert_eq!(mapping.lits().len(), 2);
    }

    #[test]
    fn anchors_follow_input_order() {
        let mut engine = DpllEngine::new();
        let variables = vec![
            Variable::new("a", vec![Constraint::Mandatory]),
            Variable::new("b", vec![Constraint::Prohibited]),
            Variable::new("c", vec![Constraint::Mandatory]),
        ];
        let mapping = LitMapping::new(&mut engine, &variables).unwrap();
        assert_eq!(mapping.anchor_identifiers(), &[id("a"), id("c")]);
        assert_eq!(mapping.anchor_lits().len(), 2);
    }

    #[test]
    fn repeated_anchor_constraints_register_once() {
        let mut engine = DpllEngine::new();
        let variables = vec![Variable::new(
            "a",
            vec![Constraint::Mandatory, Constraint::Mandatory],
        )];
        let mapping = LitMapping::new(&mut engine, &variables).unwrap();
        assert_eq!(mapping.anchor_identifiers(), &[id("a")]);
        assert_eq!(mapping.anchor_lits().len(), 1);
    }

    #[test]
    fn mandatory_provenance_sits_on_the_subject_literal() {
        let mut engine = DpllEngine::new();
        let variables = vec![Variable::new("a", vec![Constraint::Mandatory])];
        let mapping = LitMapping::new(&mut engine, &variables).unwrap();
        let lit = mapping.get_lit(&id("a")).unwrap();
        let applied = mapping.applied_for(lit).unwrap();
        assert_eq!(applied.constraint, Constraint::Mandatory);
        assert_eq!(applied.variable, id("a"));
    }

    #[test]
    fn conflicts_come_back_in_recorded_order() {
        let mut engine = DpllEngine::new();
        let variables = vec![
            Variable::new("a", vec![Constraint::Mandatory]),
            Variable::new("b", vec![Constraint::Mandatory, Constraint::Conflict(id("a"))]),
        ];
        let mut mapping = LitMapping::new(&mut engine, &variables).unwrap();
        // Hand the mapping a why list in scrambled order.
        let mut why: Vec<Lit> = mapping.recorded.clone();
        why.reverse();
        let conflicts = mapping.conflicts(&why);
        let rendered: Vec<String> = conflicts.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "a is mandatory",
                "b is mandatory",
                "b conflicts with a",
            ]
        );
        mapping.check().unwrap();
    }

    #[test]
    fn unknown_why_literals_are_aggregated_not_thrown() {
        let mut engine = DpllEngine::new();
        let variables = vec![Variable::new("a", vec![Constraint::Mandatory])];
        let mut mapping = LitMapping::new(&mut engine, &variables).unwrap();
        let stray = engine.allocate();
        let conflicts = mapping.conflicts(&[stray]);
        assert!(conflicts.is_empty());
        let err = mapping.check().unwrap_err();
        assert!(matches!(err, Error::Consistency(ref errors) if errors.len() == 1));
    }

    #[test]
    fn empty_dependency_prohibits_the_subject_without_a_candidate_set() {
        let mut engine = DpllEngine::new();
        let variables = vec![Variable::new("a", vec![Constraint::Dependency(vec![])])];
        let mapping = LitMapping::new(&mut engine, &variables).unwrap();
        assert!(mapping.dependencies().is_empty());
        let subject = mapping.get_lit(&id("a")).unwrap();
        let applied = mapping.applied_for(!subject).unwrap();
        assert_eq!(applied.to_string(), "a has a dependency without any candidates");
    }
}
