//! The post-search cardinality pass.
//!
//! A satisfying model may set optional literals true gratuitously: the
//! engine was free to pick any value for variables nothing forced. This
//! pass pins the search's assumptions, forces every model-false identifier
//! to stay false, and then sweeps a counting network over the remaining
//! "extra" identifiers for the smallest satisfiable count.

use std::collections::HashSet;

use tracing::debug;

use crate::{
    error::{Error, Result},
    solver::{
        lit_mapping::LitMapping,
        sat::{BooleanEngine, Lit, Outcome},
        stats::SearchStats,
    },
};

/// Shrinks the current model to a minimal set of extra selections.
///
/// `assumed` is the assumption set the search ended on; those literals are
/// already pinned by the engine's scope stack and are not touched here.
/// Finding no satisfiable bound at all contradicts the search's own
/// satisfiable verdict and is reported as a fatal internal error.
pub(crate) fn minimize_extras<E: BooleanEngine>(
    engine: &mut E,
    mapping: &LitMapping,
    assumed: &HashSet<Lit>,
    stats: &mut SearchStats,
) -> Result<()> {
    let mut extras = Vec::new();
    let mut excluded = Vec::new();
    for lit in mapping.lits() {
        if assumed.contains(&lit) {
            continue;
        }
        if engine.value(lit) {
            extras.push(lit);
        } else {
            excluded.push(!lit);
        }
    }
    if extras.is_empty() {
        debug!("model has no gratuitous selections");
        return Ok(());
    }

    let card = engine.card_sort(&extras);
    for bound in 0..=card.n() {
        stats.minimize_rounds += 1;
        stats.engine_solves += 1;
        engine.assume(&excluded);
        engine.assume(&[card.leq(bound)]);
        if engine.solve() == Outcome::Satisfiable {
            debug!(extras = extras.len(), bound, "minimized extra selections");
            return Ok(());
        }
    }
    Err(Error::MinimizeExhausted)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::solver::{
        constraint::Constraint,
        sat::DpllEngine,
        variable::{Identifier, Variable},
    };

    fn id(s: &str) -> Identifier {
        Identifier::from(s)
    }

    #[test]
    fn gratuitously_true_literals_are_forced_back_off() {
        // Nothing references b, but we deliberately hand the pass a model
        // where b is true and unassumed.
        let mut engine = DpllEngine::new();
        let variables = vec![
            Variable::new("a", vec![Constraint::Mandatory]),
            Variable::new("b", vec![]),
        ];
        let mapping = LitMapping::new(&mut engine, &variables).unwrap();
        let a = mapping.get_lit(&id("a")).unwrap();
        let b = mapping.get_lit(&id("b")).unwrap();
        let (outcome, _) = engine.test(&[a, b]);
        assert_eq!(outcome, Outcome::Satisfiable);
        // Pretend only a was assumed by the search; b is then an extra
        // left over in the model once its scope is popped.
        let assumed: HashSet<Lit> = [a].into_iter().collect();
        engine.untest();
        let (outcome, _) = engine.test(&[a]);
        assert_eq!(outcome, Outcome::Undecided);
        let mut stats = SearchStats::default();
        minimize_extras(&mut engine, &mapping, &assumed, &mut stats).unwrap();
        assert!(engine.value(a));
        assert!(!engine.value(b));
        assert_eq!(stats.minimize_rounds, 1);
    }

    #[test]
    fn forced_extras_settle_at_the_smallest_bound() {
        // a is assumed; its dependency forces b even though b was never
        // assumed, so the sweep must stop at exactly one extra.
        let mut engine = DpllEngine::new();
        let variables = vec![
            Variable::new(
                "a",
                vec![Constraint::Mandatory, Constraint::Dependency(vec![id("b")])],
            ),
            Variable::new("b", vec![]),
            Variable::new("c", vec![]),
        ];
        let mapping = LitMapping::new(&mut engine, &variables).unwrap();
        mapping.assume_constraints(&mut engine);
        let anchors = mapping.anchor_lits();
        let (outcome, consumed) = engine.test(&anchors);
        assert_eq!(outcome, Outcome::Undecided);
        assert_eq!(engine.solve(), Outcome::Satisfiable);
        let assumed: HashSet<Lit> = consumed.into_iter().collect();
        let mut stats = SearchStats::default();
        minimize_extras(&mut engine, &mapping, &assumed, &mut stats).unwrap();
        assert!(engine.value(mapping.get_lit(&id("b")).unwrap()));
        assert!(!engine.value(mapping.get_lit(&id("c")).unwrap()));
        // Bound zero fails (b is forced), bound one succeeds.
        assert_eq!(stats.minimize_rounds, 2);
    }
}
