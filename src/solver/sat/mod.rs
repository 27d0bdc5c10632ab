//! The boolean-engine seam.
//!
//! The resolver never talks to a concrete satisfiability implementation
//! directly; everything goes through the [`BooleanEngine`] trait so the
//! underlying engine is swappable without touching the literal mapping or
//! the search. The crate ships one implementation, [`DpllEngine`], which is
//! sufficient for the problem sizes a dependency resolver sees.

pub mod dpll;

use std::fmt;
use std::ops::Not;

pub use dpll::DpllEngine;

/// A boolean-engine handle for one variable's truth value.
///
/// Literals follow the DIMACS convention: a non-zero integer whose sign
/// carries the polarity, so negation is just sign flipping and `!!lit`
/// round-trips.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(i32);

impl Lit {
    pub(crate) fn new(code: i32) -> Self {
        debug_assert!(code != 0, "literal codes are non-zero by construction");
        Self(code)
    }

    /// The underlying engine variable, ignoring polarity.
    pub fn var(self) -> u32 {
        self.0.unsigned_abs()
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn code(self) -> i32 {
        self.0
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit(-self.0)
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lit({})", self.0)
    }
}

/// The verdict of one `test` or `solve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Satisfiable,
    Unsatisfiable,
    /// Propagation alone neither satisfied nor refuted the formula under
    /// the current assumptions.
    Undecided,
}

/// A handle over the sorted outputs of a counting network.
///
/// `outputs[i]` is true exactly when at least `i + 1` of the network's
/// input literals are true, so "at most k" is the negation of
/// `outputs[k]`.
#[derive(Debug, Clone)]
pub struct CardSort {
    outputs: Vec<Lit>,
    always: Lit,
}

impl CardSort {
    pub(crate) fn new(outputs: Vec<Lit>, always: Lit) -> Self {
        Self { outputs, always }
    }

    /// The number of input literals counted by the network.
    pub fn n(&self) -> usize {
        self.outputs.len()
    }

    /// A literal that holds exactly when at most `k` inputs are true.
    ///
    /// For `k >= n` the bound is vacuous and the engine's constant-true
    /// literal is returned.
    pub fn leq(&self, k: usize) -> Lit {
        match self.outputs.get(k) {
            Some(&output) => !output,
            None => self.always,
        }
    }
}

/// An external, stateful satisfiability engine owned by one solve call.
///
/// The interface is deliberately small: circuit construction (literal
/// allocation, n-ary or, a counting network), scoped incremental
/// assumptions (`assume`/`test`/`untest`), a full `solve`, model access
/// (`value`) and a conflict explanation (`why`).
///
/// Assumption scoping works like a stack. `assume` buffers literals;
/// `test` consumes the buffer (plus any extras) into a new scope and
/// propagates; `untest` pops the most recent scope. `solve` also consumes
/// the buffer, but only for the duration of that one call — buffered
/// literals never outlive it.
pub trait BooleanEngine {
    /// Allocates a fresh literal.
    fn allocate(&mut self) -> Lit;

    /// The engine's constant-true literal.
    fn always(&self) -> Lit;

    /// Returns a literal equivalent to the disjunction of `lits`.
    ///
    /// An empty disjunction is constant false.
    fn or(&mut self, lits: &[Lit]) -> Lit;

    /// Unconditionally requires `lit` to hold.
    fn assert(&mut self, lit: Lit);

    /// Builds a counting network over `lits` and returns its handle.
    fn card_sort(&mut self, lits: &[Lit]) -> CardSort;

    /// Buffers assumption literals for the next `test` or `solve`.
    fn assume(&mut self, lits: &[Lit]);

    /// Pushes a scope assuming the buffered literals plus `extra`, then
    /// propagates. Returns the outcome and the batch the scope consumed.
    fn test(&mut self, extra: &[Lit]) -> (Outcome, Vec<Lit>);

    /// Pops the most recent scope and re-propagates what remains.
    fn untest(&mut self) -> Outcome;

    /// Searches for a model under all scoped and buffered assumptions.
    /// Never returns [`Outcome::Undecided`].
    fn solve(&mut self) -> Outcome;

    /// The truth value of `lit` in the most recent model. Only meaningful
    /// after a satisfiable `test` or `solve`.
    fn value(&self, lit: Lit) -> bool;

    /// The assumption literals implicated in the most recent conflict.
    fn why(&self) -> Vec<Lit>;
}
