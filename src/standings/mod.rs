pub mod aggregator;
pub mod table;
pub mod types;

pub use aggregator::{aggregate, constructor_standings, driver_standings};
pub use table::{build_table, Cell, Column, Table, TableRow};
pub use types::{
    AggregateOptions, Entrant, ParticipantKind, PointsSource, RoundPoints, SkippedSession,
    Standings, StandingsError, StandingsRow, FIRST_SEASON,
};
