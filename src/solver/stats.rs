use prettytable::{Cell, Row, Table};

/// Counters describing how much work one solve call performed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchStats {
    /// Assumption scopes pushed by the search, including the base scope.
    pub scopes_pushed: u64,
    /// Scopes popped again after an unsatisfiable verdict.
    pub backtracks: u64,
    /// Full engine solves issued (frontier-exhausted branches and the
    /// cardinality sweep).
    pub engine_solves: u64,
    /// Cardinality bounds tried before the minimal extra count was found.
    pub minimize_rounds: u64,
}

pub fn render_stats_table(stats: &SearchStats) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Counter"), Cell::new("Value")]));
    for (name, value) in [
        ("Scopes pushed", stats.scopes_pushed),
        ("Backtracks", stats.backtracks),
        ("Engine solves", stats.engine_solves),
        ("Minimize rounds", stats.minimize_rounds),
    ] {
        table.add_row(Row::new(vec![
            Cell::new(name),
            Cell::new(&value.to_string()),
        ]));
    }
    table.to_string()
}
