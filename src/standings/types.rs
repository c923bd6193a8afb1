use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::scoring::ClassifiedResult;
use crate::source::{Event, SessionKind};

/// Earliest season of the world championship
pub const FIRST_SEASON: i32 = 1950;

/// What is being ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParticipantKind {
    Driver,
    Constructor,
}

impl fmt::Display for ParticipantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantKind::Driver => write!(f, "Driver"),
            ParticipantKind::Constructor => write!(f, "Constructor"),
        }
    }
}

/// Where per-row points come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsSource {
    /// Recompute from finishing position with the season's scale
    #[default]
    Recompute,
    /// Trust the points reported by the results source
    Reported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    /// Count sprint wins and podiums toward the trophy tallies
    pub include_sprint_wins_podiums: bool,
    /// Keep a per-round points breakdown on every row
    pub debug: bool,
    pub points_source: PointsSource,
    /// Rounds fetched at once; 1 fetches strictly one after another
    pub concurrency: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            include_sprint_wins_podiums: false,
            debug: false,
            points_source: PointsSource::Recompute,
            concurrency: 4,
        }
    }
}

/// A driver or constructor being ranked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entrant {
    pub key: String,          // "VER" or "Red Bull"
    pub name: String,         // "Max Verstappen" or "Red Bull"
    pub team: Option<String>, // drivers only: team at first appearance
}

/// Points one entrant collected at one round (debug breakdown)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundPoints {
    pub round: u32,
    pub code: String,
    pub race: f64,
    pub sprint: f64,
}

impl RoundPoints {
    pub fn total(&self) -> f64 {
        self.race + self.sprint
    }
}

/// Final, ranked aggregate for one entrant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsRow {
    pub rank: usize,
    pub entrant: Entrant,
    pub points: f64,
    pub wins: u32,
    pub podiums: u32,
    /// Outcome per round the entrant took part in, keyed by round number
    pub results: BTreeMap<u32, ClassifiedResult>,
    /// Per-round points; only populated in debug mode
    pub breakdown: Option<Vec<RoundPoints>>,
}

/// A session that could not be used for the standings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSession {
    pub round: u32,
    pub code: String,
    pub session: SessionKind,
    pub reason: String,
}

impl SkippedSession {
    pub fn error(&self) -> StandingsError {
        StandingsError::RoundUnavailable {
            round: self.round,
            session: self.session,
            reason: self.reason.clone(),
        }
    }
}

/// Result of a season computation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standings {
    pub year: i32,
    pub kind: ParticipantKind,
    /// Every event of the season that can have results, in round order
    pub events: Vec<Event>,
    /// Sorted by points, then wins, then podiums
    pub rows: Vec<StandingsRow>,
    /// Rounds skipped entirely (race unavailable) and sprints that failed
    pub skipped: Vec<SkippedSession>,
}

impl Standings {
    /// Rounds whose race could not be used; these show as not entered for everyone
    pub fn skipped_rounds(&self) -> Vec<u32> {
        self.skipped
            .iter()
            .filter(|s| s.session == SessionKind::Race)
            .map(|s| s.round)
            .collect()
    }
}

/// Failures of a standings computation
#[derive(Debug, Clone, PartialEq)]
pub enum StandingsError {
    /// Year outside the seasons that can have results
    InvalidYear { year: i32, latest: i32 },
    /// The season's schedule could not be loaded
    ScheduleUnavailable { year: i32, reason: String },
    /// One round's session could not be loaded. Recovered inside the
    /// aggregator; surfaces only through `Standings::skipped`.
    RoundUnavailable {
        round: u32,
        session: SessionKind,
        reason: String,
    },
}

impl fmt::Display for StandingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StandingsError::InvalidYear { year, latest } => write!(
                f,
                "Invalid season {}: enter a year between {} and {}",
                year, FIRST_SEASON, latest
            ),
            StandingsError::ScheduleUnavailable { year, reason } => {
                write!(f, "Could not load the {} schedule: {}", year, reason)
            }
            StandingsError::RoundUnavailable {
                round,
                session,
                reason,
            } => write!(f, "Round {} {} unavailable: {}", round, session, reason),
        }
    }
}

impl std::error::Error for StandingsError {}
