//! A small DPLL engine behind the [`BooleanEngine`] seam.
//!
//! The engine keeps a plain clause database and implements scoped
//! assumptions by snapshotting its propagation state with persistent maps:
//! pushing a scope clones cheaply, popping drops the clone. Decisions are
//! taken false-first over ascending variable indices, which keeps every
//! model deterministic and biases gratuitous selections towards false
//! before the cardinality pass even runs.

use tracing::trace;

use crate::solver::sat::{BooleanEngine, CardSort, Lit, Outcome};

type Assignment = im::HashMap<u32, bool>;
type Reasons = im::HashMap<u32, Reason>;

#[derive(Debug, Clone, Copy)]
enum Reason {
    /// Seeded from a scoped assumption batch.
    Assumption,
    /// Forced by unit propagation of the indexed clause.
    Clause(usize),
    /// A free choice made during the full search; never part of a core.
    Decision,
}

/// The crate's default [`BooleanEngine`].
#[derive(Debug, Clone)]
pub struct DpllEngine {
    next_var: u32,
    always: Lit,
    clauses: Vec<Vec<Lit>>,
    scopes: Vec<Vec<Lit>>,
    pending: Vec<Lit>,
    model: Assignment,
    last_why: Vec<Lit>,
}

impl DpllEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            next_var: 0,
            always: Lit::new(1),
            clauses: Vec::new(),
            scopes: Vec::new(),
            pending: Vec::new(),
            model: Assignment::new(),
            last_why: Vec::new(),
        };
        // The first variable is reserved as the constant-true literal.
        let always = engine.fresh();
        engine.clauses.push(vec![always]);
        engine.always = always;
        engine
    }

    fn fresh(&mut self) -> Lit {
        self.next_var += 1;
        Lit::new(self.next_var as i32)
    }

    fn and_pair(&mut self, a: Lit, b: Lit) -> Lit {
        let gate = self.fresh();
        self.clauses.push(vec![!gate, a]);
        self.clauses.push(vec![!gate, b]);
        self.clauses.push(vec![!a, !b, gate]);
        gate
    }

    /// Batcher odd-even sorting network. Outputs are ordered true-first:
    /// `out[i]` holds exactly when at least `i + 1` inputs hold.
    fn sorted_outputs(&mut self, lits: &[Lit]) -> Vec<Lit> {
        if lits.is_empty() {
            return Vec::new();
        }
        let mut wires = lits.to_vec();
        let padded = lits.len().next_power_of_two();
        wires.resize(padded, !self.always);
        self.oe_sort(&mut wires, 0, padded);
        wires.truncate(lits.len());
        wires
    }

    fn oe_sort(&mut self, wires: &mut [Lit], lo: usize, n: usize) {
        if n > 1 {
            let m = n / 2;
            self.oe_sort(wires, lo, m);
            self.oe_sort(wires, lo + m, m);
            self.oe_merge(wires, lo, n, 1);
        }
    }

    fn oe_merge(&mut self, wires: &mut [Lit], lo: usize, n: usize, r: usize) {
        let step = r * 2;
        if step < n {
            self.oe_merge(wires, lo, n, step);
            self.oe_merge(wires, lo + r, n, step);
            let mut i = lo + r;
            while i + r < lo + n {
                self.compare(wires, i, i + r);
                i += step;
            }
        } else {
            self.compare(wires, lo, lo + r);
        }
    }

    fn compare(&mut self, wires: &mut [Lit], i: usize, j: usize) {
        let hi = self.or(&[wires[i], wires[j]]);
        let lo = self.and_pair(wires[i], wires[j]);
        wires[i] = hi;
        wires[j] = lo;
    }

    fn scoped_assumptions(&self) -> Vec<Lit> {
        self.scopes.iter().flatten().copied().collect()
    }

    /// Seeds every scoped assumption, then propagates to fixpoint.
    fn seed_and_propagate(&self) -> Result<(Assignment, Reasons), Vec<Lit>> {
        let mut assignment = Assignment::new();
        let mut reasons = Reasons::new();
        for &lit in self.scopes.iter().flatten() {
            match assignment.get(&lit.var()) {
                Some(&value) if value != lit.is_positive() => {
                    // Two assumptions disagree on polarity; both are the core.
                    let prior = if value {
                        Lit::new(lit.var() as i32)
                    } else {
                        !Lit::new(lit.var() as i32)
                    };
                    return Err(vec![prior, lit]);
                }
                Some(_) => {}
                None => {
                    assignment.insert(lit.var(), lit.is_positive());
                    reasons.insert(lit.var(), Reason::Assumption);
                }
            }
        }
        self.propagate(&mut assignment, &mut reasons)?;
        Ok((assignment, reasons))
    }

    /// Unit propagation to fixpoint. On conflict, returns the assumption
    /// core supporting the falsified clause.
    fn propagate(
        &self,
        assignment: &mut Assignment,
        reasons: &mut Reasons,
    ) -> Result<(), Vec<Lit>> {
        loop {
            let mut changed = false;
            for (index, clause) in self.clauses.iter().enumerate() {
                let mut satisfied = false;
                let mut unassigned = None;
                let mut unassigned_count = 0;
                for &lit in clause {
                    match assignment.get(&lit.var()) {
                        Some(&value) if value == lit.is_positive() => {
                            satisfied = true;
                            break;
                        }
                        Some(_) => {}
                        None => {
                            unassigned_count += 1;
                            unassigned = Some(lit);
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                match (unassigned_count, unassigned) {
                    (0, _) => return Err(self.analyze(clause, assignment, reasons)),
                    (1, Some(unit)) => {
                        assignment.insert(unit.var(), unit.is_positive());
                        reasons.insert(unit.var(), Reason::Clause(index));
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

    /// Walks the implication graph from a falsified clause back to the
    /// assumption literals that support it.
    fn analyze(&self, clause: &[Lit], assignment: &Assignment, reasons: &Reasons) -> Vec<Lit> {
        let mut core = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut stack: Vec<u32> = clause.iter().map(|lit| lit.var()).collect();
        while let Some(var) = stack.pop() {
            if !seen.insert(var) {
                continue;
            }
            match reasons.get(&var) {
                Some(Reason::Assumption) => {
                    let lit = if assignment.get(&var).copied().unwrap_or(false) {
                        Lit::new(var as i32)
                    } else {
                        !Lit::new(var as i32)
                    };
                    core.push(lit);
                }
                Some(Reason::Clause(index)) => {
                    stack.extend(self.clauses[*index].iter().map(|lit| lit.var()));
                }
                Some(Reason::Decision) | None => {}
            }
        }
        core.sort_unstable();
        core
    }

    fn propagation_outcome(&mut self) -> Outcome {
        match self.seed_and_propagate() {
            Err(core) => {
                self.last_why = core;
                Outcome::Unsatisfiable
            }
            Ok((assignment, _)) => {
                if self.is_complete(&assignment) {
                    self.model = assignment;
                    Outcome::Satisfiable
                } else {
                    Outcome::Undecided
                }
            }
        }
    }

    fn is_complete(&self, assignment: &Assignment) -> bool {
        (1..=self.next_var).all(|var| assignment.contains_key(&var))
    }

    fn search(&self, assignment: Assignment, reasons: Reasons) -> Option<Assignment> {
        let Some(var) = (1..=self.next_var).find(|var| !assignment.contains_key(var)) else {
            return Some(assignment);
        };
        for value in [false, true] {
            let mut guessed = assignment.clone();
            let mut guessed_reasons = reasons.clone();
            guessed.insert(var, value);
            guessed_reasons.insert(var, Reason::Decision);
            if self.propagate(&mut guessed, &mut guessed_reasons).is_ok() {
                if let Some(model) = self.search(guessed, guessed_reasons) {
                    return Some(model);
                }
            }
        }
        None
    }
}

impl Default for DpllEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BooleanEngine for DpllEngine {
    fn allocate(&mut self) -> Lit {
        self.fresh()
    }

    fn always(&self) -> Lit {
        self.always
    }

    fn or(&mut self, lits: &[Lit]) -> Lit {
        match lits {
            [] => !self.always,
            [single] => *single,
            _ => {
                let gate = self.fresh();
                let mut forward = Vec::with_capacity(lits.len() + 1);
                forward.push(!gate);
                forward.extend_from_slice(lits);
                self.clauses.push(forward);
                for &lit in lits {
                    self.clauses.push(vec![!lit, gate]);
                }
                gate
            }
        }
    }

    fn assert(&mut self, lit: Lit) {
        self.clauses.push(vec![lit]);
    }

    fn card_sort(&mut self, lits: &[Lit]) -> CardSort {
        let outputs = self.sorted_outputs(lits);
        CardSort::new(outputs, self.always)
    }

    fn assume(&mut self, lits: &[Lit]) {
        self.pending.extend_from_slice(lits);
    }

    fn test(&mut self, extra: &[Lit]) -> (Outcome, Vec<Lit>) {
        let mut batch = std::mem::take(&mut self.pending);
        batch.extend_from_slice(extra);
        self.scopes.push(batch.clone());
        let outcome = self.propagation_outcome();
        trace!(depth = self.scopes.len(), ?outcome, "test scope pushed");
        (outcome, batch)
    }

    fn untest(&mut self) -> Outcome {
        self.scopes.pop();
        let outcome = self.propagation_outcome();
        trace!(depth = self.scopes.len(), ?outcome, "test scope popped");
        outcome
    }

    fn solve(&mut self) -> Outcome {
        let extra = std::mem::take(&mut self.pending);
        self.scopes.push(extra);
        let outcome = match self.seed_and_propagate() {
            Err(core) => {
                self.last_why = core;
                Outcome::Unsatisfiable
            }
            Ok((assignment, reasons)) => match self.search(assignment, reasons) {
                Some(model) => {
                    self.model = model;
                    Outcome::Satisfiable
                }
                None => {
                    self.last_why = self.scoped_assumptions();
                    Outcome::Unsatisfiable
                }
            },
        };
        self.scopes.pop();
        trace!(?outcome, "solve finished");
        outcome
    }

    fn value(&self, lit: Lit) -> bool {
        match self.model.get(&lit.var()) {
            Some(&value) => value == lit.is_positive(),
            None => false,
        }
    }

    fn why(&self) -> Vec<Lit> {
        self.last_why.clone()
    }
}
