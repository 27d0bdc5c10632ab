//! Preference-ordered backtracking over the engine's assumption scopes.
//!
//! The search keeps an explicit stack of frames instead of recursing, so
//! depth, cancellation checks and backtracking order are all plain data.
//! Each frame owns one engine scope and the guesses that scope assumed:
//! one candidate per dependency that was active (subject assumed, no
//! candidate assumed yet) when the frame was pushed. An unsatisfiable
//! scope advances the rearmost guess with candidates remaining, popping
//! exhausted guesses from the back; an empty frame pops one level.

use std::collections::HashSet;

use tracing::debug;

use crate::solver::{
    engine::Cancel,
    lit_mapping::LitMapping,
    sat::{BooleanEngine, Lit, Outcome},
    stats::SearchStats,
    tracer::{SearchPosition, Tracer},
};

/// Terminal verdict of one search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchOutcome {
    Satisfiable,
    Unsatisfiable,
    Cancelled,
}

#[derive(Debug)]
pub(crate) struct SearchResult {
    pub outcome: SearchOutcome,
    /// The ordered assumption literals of the satisfying scope chain:
    /// base clause literals, anchors, then guesses. Empty unless
    /// satisfiable.
    pub assumptions: Vec<Lit>,
}

/// One tentative candidate choice for one dependency.
#[derive(Debug, Clone, Copy)]
struct Guess {
    dep: usize,
    choice: usize,
}

/// One engine scope: the guesses it assumed and the literals it newly
/// added to the assumption set (for precise removal on pop).
#[derive(Debug)]
struct Frame {
    guesses: Vec<Guess>,
    added: Vec<Lit>,
}

pub(crate) struct Search<'a, E: BooleanEngine> {
    engine: &'a mut E,
    mapping: &'a LitMapping,
    tracer: &'a dyn Tracer,
    cancel: &'a Cancel,
    stats: &'a mut SearchStats,
    assumed: HashSet<Lit>,
    ordered: Vec<Lit>,
    frames: Vec<Frame>,
}

impl<'a, E: BooleanEngine> Search<'a, E> {
    pub fn new(
        engine: &'a mut E,
        mapping: &'a LitMapping,
        tracer: &'a dyn Tracer,
        cancel: &'a Cancel,
        stats: &'a mut SearchStats,
    ) -> Self {
        Self {
            engine,
            mapping,
            tracer,
            cancel,
            stats,
            assumed: HashSet::new(),
            ordered: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Runs to a terminal state. The first frame assumes the anchors (plus
    /// whatever the caller buffered into the engine, normally the base
    /// clause literals); subsequent frames assume dependency guesses.
    pub fn run(&mut self) -> SearchResult {
        let mut next: (Vec<Guess>, Vec<Lit>) = (Vec::new(), self.mapping.anchor_lits());
        loop {
            // Cancellation is polled before every scope push; once it
            // fires, no further engine calls are issued.
            if self.cancel.is_cancelled() {
                self.unwind();
                return SearchResult {
                    outcome: SearchOutcome::Cancelled,
                    assumptions: Vec::new(),
                };
            }
            let (guesses, batch) = next;
            let (outcome, consumed) = self.engine.test(&batch);
            self.stats.scopes_pushed += 1;
            let mut added = Vec::new();
            for &lit in &consumed {
                if self.assumed.insert(lit) {
                    self.ordered.push(lit);
                    added.push(lit);
                }
            }
            self.frames.push(Frame { guesses, added });
            self.trace_position(outcome);
            match outcome {
                Outcome::Satisfiable => return self.satisfied(),
                Outcome::Unsatisfiable => match self.backtrack() {
                    Some(batch) => next = batch,
                    None => return self.exhausted(),
                },
                Outcome::Undecided => match self.frontier() {
                    Some(batch) => next = batch,
                    None => {
                        // Every active dependency has an assumed candidate;
                        // hand the branch to the engine for a full verdict.
                        self.stats.engine_solves += 1;
                        match self.engine.solve() {
                            Outcome::Satisfiable => return self.satisfied(),
                            _ => match self.backtrack() {
                                Some(batch) => next = batch,
                                None => return self.exhausted(),
                            },
                        }
                    }
                },
            }
        }
    }

    /// The next batch of first-preference candidates, one per active
    /// dependency, in input order.
    fn frontier(&self) -> Option<(Vec<Guess>, Vec<Lit>)> {
        let mut guesses = Vec::new();
        let mut batch = Vec::new();
        for (dep, candidate_set) in self.mapping.dependencies().iter().enumerate() {
            if !self.assumed.contains(&candidate_set.subject) {
                continue;
            }
            if candidate_set
                .candidates
                .iter()
                .any(|candidate| self.assumed.contains(candidate))
            {
                continue;
            }
            guesses.push(Guess { dep, choice: 0 });
            batch.push(candidate_set.candidates[0]);
        }
        if guesses.is_empty() {
            None
        } else {
            debug!(guesses = guesses.len(), "new frontier");
            Some((guesses, batch))
        }
    }

    /// Pops the failing scope and produces the next batch to try, or
    /// `None` when every alternative is exhausted.
    fn backtrack(&mut self) -> Option<(Vec<Guess>, Vec<Lit>)> {
        loop {
            let frame = self.frames.pop()?;
            self.engine.untest();
            self.stats.backtracks += 1;
            for lit in &frame.added {
                self.assumed.remove(lit);
            }
            self.ordered.truncate(self.ordered.len() - frame.added.len());

            let mut guesses = frame.guesses;
            while let Some(last) = guesses.last_mut() {
                let candidates = &self.mapping.dependencies()[last.dep].candidates;
                if last.choice + 1 < candidates.len() {
                    last.choice += 1;
                    let batch = guesses
                        .iter()
                        .map(|guess| {
                            self.mapping.dependencies()[guess.dep].candidates[guess.choice]
                        })
                        .collect();
                    return Some((guesses, batch));
                }
                guesses.pop();
            }
            if self.frames.is_empty() {
                // The anchor frame itself failed or ran out of guesses.
                return None;
            }
        }
    }

    fn satisfied(&mut self) -> SearchResult {
        SearchResult {
            outcome: SearchOutcome::Satisfiable,
            assumptions: self.ordered.clone(),
        }
    }

    fn exhausted(&mut self) -> SearchResult {
        SearchResult {
            outcome: SearchOutcome::Unsatisfiable,
            assumptions: Vec::new(),
        }
    }

    fn unwind(&mut self) {
        while self.frames.pop().is_some() {
            self.engine.untest();
        }
        self.assumed.clear();
        self.ordered.clear();
    }

    fn trace_position(&self, outcome: Outcome) {
        let identifiers = self
            .ordered
            .iter()
            .filter_map(|&lit| self.mapping.identifier_of(lit))
            .collect();
        let conflicts = if outcome == Outcome::Unsatisfiable {
            self.engine
                .why()
                .iter()
                .filter_map(|&lit| self.mapping.applied_for(lit).cloned())
                .collect()
        } else {
            Vec::new()
        };
        self.tracer.trace(&SearchPosition {
            identifiers,
            conflicts,
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::solver::{
        constraint::Constraint,
        sat::DpllEngine,
        tracer::NoopTracer,
        variable::{Identifier, Variable},
    };

    fn id(s: &str) -> Identifier {
        Identifier::from(s)
    }

    fn run_search(variables: &[Variable]) -> (DpllEngine, LitMapping, SearchResult) {
        let mut engine = DpllEngine::new();
        let mapping = LitMapping::new(&mut engine, variables).unwrap();
        mapping.assume_constraints(&mut engine);
        let cancel = Cancel::default();
        let mut stats = SearchStats::default();
        let result = {
            let mut search =
                Search::new(&mut engine, &mapping, &NoopTracer, &cancel, &mut stats);
            search.run()
        };
        (engine, mapping, result)
    }

    #[test]
    fn first_listed_candidate_is_guessed_first() {
        let variables = vec![
            Variable::new("c", vec![Constraint::Mandatory, Constraint::Dependency(vec![id("a"), id("b")])]),
            Variable::new("a", vec![]),
            Variable::new("b", vec![]),
        ];
        let (_, mapping, result) = run_search(&variables);
        assert_eq!(result.outcome, SearchOutcome::Satisfiable);
        let a = mapping.get_lit(&id("a")).unwrap();
        let b = mapping.get_lit(&id("b")).unwrap();
        assert!(result.assumptions.contains(&a));
        assert!(!result.assumptions.contains(&b));
    }

    #[test]
    fn propagation_resolves_a_dependency_without_guessing() {
        // x is prohibited, so propagation alone forces y; no guess is made.
        let variables = vec![
            Variable::new("c", vec![Constraint::Mandatory, Constraint::Dependency(vec![id("x"), id("y")])]),
            Variable::new("x", vec![Constraint::Prohibited]),
            Variable::new("y", vec![]),
        ];
        let (engine, mapping, result) = run_search(&variables);
        assert_eq!(result.outcome, SearchOutcome::Satisfiable);
        let y = mapping.get_lit(&id("y")).unwrap();
        assert!(engine.value(y));
        assert!(!result.assumptions.contains(&y));
    }

    #[test]
    fn failed_guess_advances_to_the_next_candidate() {
        // Both dependencies first guess different candidates, which the
        // at-most bound rejects; the rearmost guess then advances so the
        // two dependencies share x.
        let variables = vec![
            Variable::new("z", vec![Constraint::AtMost(1, vec![id("x"), id("y")])]),
            Variable::new("a", vec![Constraint::Mandatory, Constraint::Dependency(vec![id("x"), id("y")])]),
            Variable::new("b", vec![Constraint::Mandatory, Constraint::Dependency(vec![id("y"), id("x")])]),
            Variable::new("x", vec![]),
            Variable::new("y", vec![]),
        ];
        let (engine, mapping, result) = run_search(&variables);
        assert_eq!(result.outcome, SearchOutcome::Satisfiable);
        let x = mapping.get_lit(&id("x")).unwrap();
        let y = mapping.get_lit(&id("y")).unwrap();
        assert!(result.assumptions.contains(&x));
        assert!(!result.assumptions.contains(&y));
        assert!(engine.value(x));
        assert!(!engine.value(y));
    }

    #[test]
    fn dependencies_of_unselected_subjects_stay_inactive() {
        // a is never assumed, so its dependency must not drag x in.
        let variables = vec![
            Variable::new("a", vec![Constraint::Dependency(vec![id("x")])]),
            Variable::new("b", vec![Constraint::Mandatory]),
            Variable::new("x", vec![]),
        ];
        let (_, mapping, result) = run_search(&variables);
        assert_eq!(result.outcome, SearchOutcome::Satisfiable);
        let x = mapping.get_lit(&id("x")).unwrap();
        assert!(!result.assumptions.contains(&x));
    }

    #[test]
    fn exhausted_candidates_report_unsatisfiable() {
        let variables = vec![
            Variable::new("c", vec![Constraint::Mandatory, Constraint::Dependency(vec![id("x"), id("y")])]),
            Variable::new("x", vec![Constraint::Prohibited]),
            Variable::new("y", vec![Constraint::Prohibited]),
        ];
        let (_, _, result) = run_search(&variables);
        assert_eq!(result.outcome, SearchOutcome::Unsatisfiable);
    }

    #[test]
    fn cancelled_before_the_first_scope() {
        let mut engine = DpllEngine::new();
        let variables = vec![Variable::new("a", vec![Constraint::Mandatory])];
        let mapping = LitMapping::new(&mut engine, &variables).unwrap();
        mapping.assume_constraints(&mut engine);
        let cancel = Cancel::default();
        cancel.cancel();
        let mut stats = SearchStats::default();
        let result = {
            let mut search =
                Search::new(&mut engine, &mapping, &NoopTracer, &cancel, &mut stats);
            search.run()
        };
        assert_eq!(result.outcome, SearchOutcome::Cancelled);
        assert_eq!(stats.scopes_pushed, 0);
    }
}
