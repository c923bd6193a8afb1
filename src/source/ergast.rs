use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};

use super::cache::ResponseCache;
use super::types::{DriverInfo, Event, EventFormat, SessionKind, SessionResult};
use super::ResultsSource;

/// Public Ergast-compatible endpoint (Jolpica mirror)
pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";

/// Seasons before this one never had sprint sessions
const FIRST_SPRINT_SEASON: i32 = 2021;

/// Create the HTTP client used for all API requests
pub fn create_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("gridtable/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Results source backed by an Ergast-compatible JSON API
pub struct ErgastSource {
    client: reqwest::Client,
    base_url: String,
    cache: ResponseCache,
    current_year: i32,
}

impl ErgastSource {
    pub fn new(client: reqwest::Client, base_url: &str, cache: ResponseCache) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
            current_year: chrono::Local::now().year(),
        }
    }

    /// GET a JSON document, going through the response cache.
    /// Returns `Ok(None)` when the API answers 404.
    ///
    /// Only answers accepted by `cacheable` are stored. An empty race table
    /// means "not published yet" and must be asked for again next time.
    async fn fetch(
        &self,
        url: &str,
        year: i32,
        cacheable: impl Fn(&RaceTable) -> bool,
    ) -> Result<Option<RaceTable>> {
        let volatile = year >= self.current_year;

        if let Some(body) = self.cache.get(url, volatile) {
            match serde_json::from_slice::<ApiResponse>(&body) {
                Ok(response) => {
                    tracing::debug!(url, "cache hit");
                    return Ok(Some(response.mr_data.race_table));
                }
                Err(e) => tracing::debug!(url, error = %e, "ignoring unreadable cache entry"),
            }
        }

        // One try plus up to 3 retries with exponential backoff
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        let client = &self.client;
        let body = Retry::spawn(retry_strategy, || async move {
            let response = client.get(url).send().await.map_err(|e| {
                if e.is_timeout() {
                    anyhow!("Request timed out: {}", url)
                } else if e.is_connect() {
                    anyhow!("Could not connect to results API. Check your network connection.")
                } else {
                    anyhow!("Results API error: {}", e)
                }
            })?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                bail!("Results API rate limit exceeded. Wait a few seconds and try again.");
            }
            if !status.is_success() {
                bail!("Results API returned HTTP {} for {}", status, url);
            }

            let bytes = response
                .bytes()
                .await
                .context("Failed to read response body")?;
            Ok::<_, anyhow::Error>(Some(bytes))
        })
        .await?;

        let Some(body) = body else {
            return Ok(None);
        };

        let response: ApiResponse = serde_json::from_slice(&body)
            .with_context(|| format!("Failed to parse results API response from {}", url))?;
        let table = response.mr_data.race_table;
        if cacheable(&table) {
            self.cache.put(url, &body);
        } else {
            tracing::debug!(url, "not caching empty response");
        }

        Ok(Some(table))
    }
}

impl ResultsSource for ErgastSource {
    async fn get_schedule(&self, year: i32) -> Result<Vec<Event>> {
        let url = format!("{}/{}.json?limit=100", self.base_url, year);
        let table = self
            .fetch(&url, year, |table| !table.races.is_empty())
            .await?
            .ok_or_else(|| anyhow!("No schedule published for {}", year))?;

        let mut events = Vec::with_capacity(table.races.len());
        for race in table.races {
            let round: u32 = race
                .round
                .trim()
                .parse()
                .with_context(|| format!("Invalid round number '{}' in schedule", race.round))?;
            let date = race
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            // The schedule lists a Sprint block for every sprint weekend
            let format = if race.sprint.is_some() {
                EventFormat::Sprint
            } else {
                EventFormat::Conventional
            };
            events.push(Event::new(round, &race.race_name, date, format));
        }
        events.sort_by_key(|e| e.round);

        Ok(events)
    }

    async fn get_session_results(
        &self,
        year: i32,
        round: u32,
        label: &str,
    ) -> Result<Option<Vec<SessionResult>>> {
        let kind = SessionKind::from_label(label)
            .ok_or_else(|| anyhow!("Unsupported session label '{}'", label))?;

        if kind == SessionKind::Sprint && year < FIRST_SPRINT_SEASON {
            return Ok(None);
        }

        let endpoint = match kind {
            SessionKind::Race => "results",
            SessionKind::Sprint => "sprint",
        };
        let url = format!("{}/{}/{}/{}.json?limit=100", self.base_url, year, round, endpoint);

        let has_rows = |table: &RaceTable| {
            table
                .races
                .first()
                .is_some_and(|race| !race.session_rows(kind).is_empty())
        };
        let Some(table) = self.fetch(&url, year, has_rows).await? else {
            return Ok(None);
        };
        let Some(race) = table.races.into_iter().next() else {
            return Ok(None);
        };

        let rows = match kind {
            SessionKind::Race => race.results,
            SessionKind::Sprint => race.sprint_results,
        };
        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(rows.into_iter().map(normalize_row).collect()))
    }

    // "S" and "Sprint" both resolve to sprint.json
    fn session_labels(&self, kind: SessionKind) -> &'static [&'static str] {
        match kind {
            SessionKind::Race => &["R"],
            SessionKind::Sprint => &["S"],
        }
    }
}

/// Build the status the outcome classifier understands.
///
/// A raw status that already names a retirement, non-start, withdrawal or
/// disqualification is kept as-is. Otherwise the one-letter classification
/// code decides; mechanical reasons ("Engine", "Collision") only ever appear
/// with code `R`.
pub(crate) fn normalize_status(position_text: &str, raw_status: &str) -> String {
    let lower = raw_status.to_lowercase();
    let already_keyword = [
        "dnf",
        "retired",
        "not classified",
        "did not start",
        "withdrew",
        "dsq",
        "disqualified",
        "excluded",
    ]
    .iter()
    .any(|k| lower.contains(k));
    if already_keyword {
        return raw_status.to_string();
    }

    match position_text.trim() {
        "R" if raw_status.is_empty() => "Retired".to_string(),
        "R" => format!("Retired ({})", raw_status),
        "N" => "Not classified".to_string(),
        "W" => "Withdrew".to_string(),
        "D" => "Disqualified".to_string(),
        "E" => "Excluded".to_string(),
        _ => raw_status.to_string(),
    }
}

fn normalize_row(row: ApiResult) -> SessionResult {
    let position_text = row.position_text.unwrap_or_default();
    let raw_status = row.status.unwrap_or_default();

    let given = row.driver.given_name.unwrap_or_default();
    let family = row.driver.family_name.unwrap_or_default();
    let name = format!("{} {}", given, family).trim().to_string();

    SessionResult {
        driver: DriverInfo {
            code: row.driver.code,
            id: row.driver.driver_id,
            number: row.number.or(row.driver.permanent_number),
            name,
        },
        team: row.constructor.map(|c| c.name).unwrap_or_default(),
        position: position_text.trim().parse().ok(),
        status: normalize_status(&position_text, &raw_status),
        points: row.points.and_then(|p| p.trim().parse().ok()),
        fastest_lap_rank: row
            .fastest_lap
            .and_then(|fl| fl.rank)
            .and_then(|r| r.trim().parse().ok()),
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "MRData")]
    mr_data: MrData,
}

#[derive(Debug, Deserialize)]
struct MrData {
    #[serde(rename = "RaceTable")]
    race_table: RaceTable,
}

#[derive(Debug, Deserialize)]
struct RaceTable {
    #[serde(rename = "Races", default)]
    races: Vec<ApiRace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRace {
    round: String,
    race_name: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(rename = "Sprint", default)]
    sprint: Option<serde_json::Value>,
    #[serde(rename = "Results", default)]
    results: Vec<ApiResult>,
    #[serde(rename = "SprintResults", default)]
    sprint_results: Vec<ApiResult>,
}

impl ApiRace {
    fn session_rows(&self, kind: SessionKind) -> &[ApiResult] {
        match kind {
            SessionKind::Race => &self.results,
            SessionKind::Sprint => &self.sprint_results,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResult {
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    position_text: Option<String>,
    #[serde(default)]
    points: Option<String>,
    #[serde(rename = "Driver")]
    driver: ApiDriver,
    #[serde(rename = "Constructor", default)]
    constructor: Option<ApiConstructor>,
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "FastestLap", default)]
    fastest_lap: Option<ApiFastestLap>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiDriver {
    #[serde(default)]
    driver_id: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    permanent_number: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiConstructor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiFastestLap {
    #[serde(default)]
    rank: Option<String>,
}
