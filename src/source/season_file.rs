use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::types::{Event, EventFormat, SessionResult};
use super::ResultsSource;

/// Offline results source: one season stored in a YAML or JSON file.
///
/// Example YAML:
/// ```yaml
/// year: 2023
/// events:
///   - round: 1
///     name: Bahrain Grand Prix
///     date: 2023-03-05
///     format: conventional
///     sessions:
///       R:
///         - { driver: { code: VER }, team: Red Bull, position: 1, status: Finished, points: 25 }
/// ```
///
/// A round without an entry for a session label has no data for it.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonFile {
    pub year: i32,
    #[serde(default)]
    pub events: Vec<SeasonFileEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonFileEvent {
    pub round: u32,
    pub name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub format: EventFormat,
    #[serde(default)]
    pub sessions: HashMap<String, Vec<SessionResult>>, // session label -> classification
}

impl SeasonFile {
    /// Load a season file; `.json` files are parsed as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read season file at {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content).with_context(|| {
                format!("Failed to parse season file: invalid JSON in {}", path.display())
            })
        } else {
            Self::from_yaml_str(&content).with_context(|| {
                format!("Failed to parse season file: invalid YAML in {}", path.display())
            })
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_saphyr::from_str(content)?)
    }
}

impl ResultsSource for SeasonFile {
    async fn get_schedule(&self, year: i32) -> Result<Vec<Event>> {
        if year != self.year {
            bail!("Season file holds {} results, not {}", self.year, year);
        }

        let mut events: Vec<Event> = self
            .events
            .iter()
            .map(|e| Event::new(e.round, &e.name, e.date, e.format))
            .collect();
        events.sort_by_key(|e| e.round);
        Ok(events)
    }

    async fn get_session_results(
        &self,
        year: i32,
        round: u32,
        label: &str,
    ) -> Result<Option<Vec<SessionResult>>> {
        if year != self.year {
            bail!("Season file holds {} results, not {}", self.year, year);
        }

        let Some(event) = self.events.iter().find(|e| e.round == round) else {
            return Ok(None);
        };

        let rows = event.sessions.get(label).or_else(|| {
            event
                .sessions
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(label))
                .map(|(_, rows)| rows)
        });

        Ok(rows.cloned())
    }
}
