pub mod cache;
pub mod ergast;
pub mod season_file;
pub mod types;

pub use cache::{clear_cache, get_cache_path, ResponseCache};
pub use ergast::{create_client, ErgastSource, DEFAULT_BASE_URL};
pub use season_file::SeasonFile;
pub use types::{DriverInfo, Event, EventFormat, SessionKind, SessionResult};

use anyhow::Result;
use std::future::Future;

/// Where schedules and session classifications come from.
///
/// `get_session_results` distinguishes a session that does not exist or has
/// no published data (`Ok(None)`) from a failed lookup (`Err`). Callers treat
/// both as "this round is unavailable"; neither is fatal to a season.
pub trait ResultsSource: Send + Sync {
    fn get_schedule(&self, year: i32) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// `label` is a session label such as "R", "S" or "Sprint"
    fn get_session_results(
        &self,
        year: i32,
        round: u32,
        label: &str,
    ) -> impl Future<Output = Result<Option<Vec<SessionResult>>>> + Send;

    /// Labels to try, in order, when looking up a session. Sources that map
    /// every label of a kind to the same lookup should return just one.
    fn session_labels(&self, kind: SessionKind) -> &'static [&'static str] {
        kind.labels()
    }
}
