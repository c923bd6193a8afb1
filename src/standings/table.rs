use serde::Serialize;

use super::types::StandingsRow;
use crate::scoring::{ClassifiedResult, OutcomeHint};
use crate::source::Event;

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cell {
    Entered(ClassifiedResult),
    NotEntered,
}

impl Cell {
    pub fn label(&self) -> String {
        match self {
            Cell::Entered(result) => result.outcome.label(),
            Cell::NotEntered => "-".to_string(),
        }
    }

    pub fn hint(&self) -> OutcomeHint {
        match self {
            Cell::Entered(result) => result.hint,
            Cell::NotEntered => OutcomeHint::NotEntered,
        }
    }
}

/// Column header: one per event, in round order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub round: u32,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub rank: usize,
    pub key: String,
    pub name: String,
    pub cells: Vec<Cell>, // same length and order as `Table::columns`
    pub total: f64,
    pub wins: u32,
    pub podiums: u32,
}

/// Entrant × event matrix with a trailing total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Lay the standings out as a grid. Rows keep the given order; every event
/// gets a column even when no entrant has a result for it.
pub fn build_table(rows: &[StandingsRow], events: &[Event]) -> Table {
    let columns = events
        .iter()
        .map(|e| Column {
            round: e.round,
            code: e.code.clone(),
        })
        .collect();

    let rows = rows
        .iter()
        .map(|row| TableRow {
            rank: row.rank,
            key: row.entrant.key.clone(),
            name: row.entrant.name.clone(),
            cells: events
                .iter()
                .map(|e| match row.results.get(&e.round) {
                    Some(result) => Cell::Entered(*result),
                    None => Cell::NotEntered,
                })
                .collect(),
            total: row.points,
            wins: row.wins,
            podiums: row.podiums,
        })
        .collect();

    Table { columns, rows }
}
