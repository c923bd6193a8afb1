use chrono::{Datelike, NaiveDate};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};

use super::types::{
    AggregateOptions, Entrant, ParticipantKind, PointsSource, RoundPoints, SkippedSession,
    Standings, StandingsError, StandingsRow, FIRST_SEASON,
};
use crate::scoring::{
    classify, fastest_lap_bonus, points_for_position, race_points_multiplier, ClassifiedResult,
};
use crate::source::{Event, EventFormat, ResultsSource, SessionKind, SessionResult};

/// Driver standings for `year`, as of today
pub async fn driver_standings<S: ResultsSource>(
    source: &S,
    year: i32,
    options: &AggregateOptions,
) -> Result<Standings, StandingsError> {
    let today = chrono::Local::now().date_naive();
    aggregate(source, year, ParticipantKind::Driver, options, today).await
}

/// Constructor standings for `year`, as of today
pub async fn constructor_standings<S: ResultsSource>(
    source: &S,
    year: i32,
    options: &AggregateOptions,
) -> Result<Standings, StandingsError> {
    let today = chrono::Local::now().date_naive();
    aggregate(source, year, ParticipantKind::Constructor, options, today).await
}

/// Compute the standings of one season.
///
/// Only an invalid year or a missing schedule fail the computation. A round
/// whose race cannot be loaded is skipped (no points, no cells) and listed in
/// `Standings::skipped`; a failed sprint only loses that sprint's points.
///
/// Sessions of different rounds are fetched concurrently, but their rows are
/// folded into the totals strictly in round order, so the result does not
/// depend on `options.concurrency`.
pub async fn aggregate<S: ResultsSource>(
    source: &S,
    year: i32,
    kind: ParticipantKind,
    options: &AggregateOptions,
    today: NaiveDate,
) -> Result<Standings, StandingsError> {
    let latest = today.year();
    if !(FIRST_SEASON..=latest).contains(&year) {
        return Err(StandingsError::InvalidYear { year, latest });
    }

    let mut events = source
        .get_schedule(year)
        .await
        .map_err(|e| StandingsError::ScheduleUnavailable {
            year,
            reason: format!("{:#}", e),
        })?;

    // Taken before future rounds are dropped: an unfinished season has not
    // reached its final round yet
    let final_round = events.iter().map(|e| e.round).max();

    if year == latest {
        // Rounds still ahead cannot have results yet
        events.retain(|e| e.date.is_none_or(|d| d <= today));
    }

    tracing::info!(year, %kind, rounds = events.len(), "computing standings");

    let fetched: Vec<RoundData> = stream::iter(events.iter())
        .map(|event| fetch_round(source, year, event))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut tally = Tally {
        final_round,
        ..Tally::default()
    };
    let mut skipped = Vec::new();

    for (event, data) in events.iter().zip(fetched) {
        let race = match data.race {
            Ok(rows) => rows,
            Err(reason) => {
                let skip = SkippedSession {
                    round: event.round,
                    code: event.code.clone(),
                    session: SessionKind::Race,
                    reason,
                };
                tracing::warn!(code = %event.code, "skipping round: {}", skip.error());
                skipped.push(skip);
                continue;
            }
        };

        let sprint = match data.sprint {
            Ok(rows) => rows,
            Err(reason) => {
                let skip = SkippedSession {
                    round: event.round,
                    code: event.code.clone(),
                    session: SessionKind::Sprint,
                    reason,
                };
                tracing::warn!(code = %event.code, "{}", skip.error());
                skipped.push(skip);
                None
            }
        };

        tally.add_round(year, kind, options, event, &race, sprint.as_deref());
    }

    let rows = tally.finish(options.debug);

    if options.debug {
        for row in &rows {
            for rp in row.breakdown.iter().flatten() {
                tracing::debug!(
                    entrant = %row.entrant.key,
                    round = rp.round,
                    code = %rp.code,
                    race = rp.race,
                    sprint = rp.sprint,
                    "round points"
                );
            }
        }
    }

    Ok(Standings {
        year,
        kind,
        events,
        rows,
        skipped,
    })
}

/// Sessions of one round as fetched. Errors are kept as text; they only
/// ever end up in `SkippedSession`.
struct RoundData {
    race: Result<Vec<SessionResult>, String>,
    sprint: Result<Option<Vec<SessionResult>>, String>,
}

async fn fetch_round<S: ResultsSource>(source: &S, year: i32, event: &Event) -> RoundData {
    let race = match fetch_session(source, year, event.round, SessionKind::Race).await {
        Ok(Some(rows)) => Ok(rows),
        Ok(None) => Err("no race results published".to_string()),
        Err(e) => Err(format!("{:#}", e)),
    };

    // A round without a race is skipped, so its sprint is not needed
    let sprint = if race.is_ok() && event.may_have_sprint() {
        match fetch_session(source, year, event.round, SessionKind::Sprint).await {
            Ok(Some(rows)) => Ok(Some(rows)),
            Ok(None) if event.format == EventFormat::Sprint => {
                Err("no sprint results published".to_string())
            }
            Ok(None) => Ok(None),
            Err(e) => Err(format!("{:#}", e)),
        }
    } else {
        Ok(None)
    };

    RoundData { race, sprint }
}

/// Try each label the source publishes the session under; the first one with
/// data wins. Absence under every label is `Ok(None)`; an error is returned
/// only when no label produced data and at least one lookup failed.
async fn fetch_session<S: ResultsSource>(
    source: &S,
    year: i32,
    round: u32,
    kind: SessionKind,
) -> anyhow::Result<Option<Vec<SessionResult>>> {
    let mut last_error = None;

    for label in source.session_labels(kind) {
        match source.get_session_results(year, round, label).await {
            Ok(Some(rows)) => return Ok(Some(rows)),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(round, label, error = %e, "session lookup failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

/// Running totals for one entrant
struct EntrantTally {
    entrant: Entrant,
    points: f64,
    wins: u32,
    podiums: u32,
    results: BTreeMap<u32, ClassifiedResult>,
    breakdown: Vec<RoundPoints>,
}

impl EntrantTally {
    fn round_points(&mut self, event: &Event) -> &mut RoundPoints {
        if self.breakdown.last().map(|rp| rp.round) != Some(event.round) {
            self.breakdown.push(RoundPoints {
                round: event.round,
                code: event.code.clone(),
                race: 0.0,
                sprint: 0.0,
            });
        }
        let last = self.breakdown.len() - 1;
        &mut self.breakdown[last]
    }

    fn count_trophies(&mut self, position: Option<u32>) {
        if position == Some(1) {
            self.wins += 1;
        }
        if matches!(position, Some(1..=3)) {
            self.podiums += 1;
        }
    }

    /// Record a cell. Drivers keep their single result; constructors keep
    /// the best car: lowest classified position, else the first outcome seen.
    fn record(&mut self, round: u32, result: ClassifiedResult) {
        match self.results.get(&round) {
            None => {
                self.results.insert(round, result);
            }
            Some(existing) => {
                let better = match (
                    result.outcome.finishing_position(),
                    existing.outcome.finishing_position(),
                ) {
                    (Some(new), Some(old)) => new < old,
                    (Some(_), None) => true,
                    _ => false,
                };
                if better {
                    self.results.insert(round, result);
                }
            }
        }
    }
}

/// Per-entrant tallies in order of first appearance
#[derive(Default)]
struct Tally {
    entries: Vec<EntrantTally>,
    index: HashMap<String, usize>,
    /// Last round of the full schedule, for the 2014 double-points finale
    final_round: Option<u32>,
}

impl Tally {
    fn entry(&mut self, entrant: Entrant) -> &mut EntrantTally {
        let idx = match self.index.get(&entrant.key) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.index.insert(entrant.key.clone(), idx);
                self.entries.push(EntrantTally {
                    entrant,
                    points: 0.0,
                    wins: 0,
                    podiums: 0,
                    results: BTreeMap::new(),
                    breakdown: Vec::new(),
                });
                idx
            }
        };
        &mut self.entries[idx]
    }

    fn add_round(
        &mut self,
        year: i32,
        kind: ParticipantKind,
        options: &AggregateOptions,
        event: &Event,
        race: &[SessionResult],
        sprint: Option<&[SessionResult]>,
    ) {
        let sprint = sprint.unwrap_or_default();
        let multiplier = race_points_multiplier(year, self.final_round == Some(event.round));

        // Best sprint finish per entrant, for the cell annotation
        let mut sprint_positions: HashMap<String, u32> = HashMap::new();
        for row in sprint {
            if let (Some(entrant), Some(position)) =
                (entrant_for(kind, row), effective_position(year, row))
            {
                sprint_positions
                    .entry(entrant.key)
                    .and_modify(|best| *best = (*best).min(position))
                    .or_insert(position);
            }
        }

        for row in race {
            let Some(entrant) = entrant_for(kind, row) else {
                tracing::debug!(round = event.round, "race row without entrant key, ignoring");
                continue;
            };
            let sprint_position = sprint_positions.get(&entrant.key).copied();
            let result = classify(year, row.position, &row.status, sprint_position);
            let position = result.outcome.finishing_position();
            let points = match options.points_source {
                PointsSource::Recompute => {
                    points_for_position(SessionKind::Race, year, position) * multiplier
                        + fastest_lap_bonus(year, position, row.fastest_lap_rank)
                }
                PointsSource::Reported => row.points.unwrap_or(0.0),
            };

            let tally = self.entry(entrant);
            tally.points += points;
            tally.round_points(event).race += points;
            tally.count_trophies(position);
            tally.record(event.round, result);
        }

        for row in sprint {
            let Some(entrant) = entrant_for(kind, row) else {
                tracing::debug!(round = event.round, "sprint row without entrant key, ignoring");
                continue;
            };
            let position = effective_position(year, row);
            let points = match options.points_source {
                PointsSource::Recompute => points_for_position(SessionKind::Sprint, year, position),
                PointsSource::Reported => row.points.unwrap_or(0.0),
            };

            let tally = self.entry(entrant);
            tally.points += points;
            tally.round_points(event).sprint += points;
            if options.include_sprint_wins_podiums {
                tally.count_trophies(position);
            }
        }
    }

    /// Sort by points, wins, podiums (all descending). The sort is stable,
    /// so full ties keep order of first appearance.
    fn finish(self, debug: bool) -> Vec<StandingsRow> {
        let mut rows: Vec<StandingsRow> = self
            .entries
            .into_iter()
            .map(|t| StandingsRow {
                rank: 0,
                entrant: t.entrant,
                points: t.points,
                wins: t.wins,
                podiums: t.podiums,
                results: t.results,
                breakdown: debug.then_some(t.breakdown),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.points
                .total_cmp(&a.points)
                .then_with(|| b.wins.cmp(&a.wins))
                .then_with(|| b.podiums.cmp(&a.podiums))
        });

        for (idx, row) in rows.iter_mut().enumerate() {
            row.rank = idx + 1;
        }

        rows
    }
}

/// Position that counts for points and trophies: none for rows whose status
/// says they retired, did not start, withdrew or were disqualified
fn effective_position(year: i32, row: &SessionResult) -> Option<u32> {
    classify(year, row.position, &row.status, None)
        .outcome
        .finishing_position()
}

fn entrant_for(kind: ParticipantKind, row: &SessionResult) -> Option<Entrant> {
    match kind {
        ParticipantKind::Driver => {
            let key = row.driver.key()?;
            let name = if row.driver.name.trim().is_empty() {
                key.clone()
            } else {
                row.driver.name.trim().to_string()
            };
            let team = Some(row.team.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            Some(Entrant { key, name, team })
        }
        ParticipantKind::Constructor => {
            let team = row.team.trim();
            if team.is_empty() {
                return None;
            }
            Some(Entrant {
                key: team.to_string(),
                name: team.to_string(),
                team: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{Outcome, OutcomeHint};
    use crate::source::DriverInfo;

    fn row(code: &str, team: &str, position: Option<u32>, status: &str) -> SessionResult {
        SessionResult {
            driver: DriverInfo {
                code: Some(code.to_string()),
                name: format!("Driver {}", code),
                ..Default::default()
            },
            team: team.to_string(),
            position,
            status: status.to_string(),
            points: None,
            fastest_lap_rank: None,
        }
    }

    fn event(round: u32) -> Event {
        Event::new(round, "Bahrain Grand Prix", None, EventFormat::Conventional)
    }

    #[test]
    fn test_tally_keeps_first_appearance_order() {
        let mut tally = Tally::default();
        let options = AggregateOptions::default();
        let race = vec![
            row("AAA", "Alpha", Some(2), "Finished"),
            row("BBB", "Beta", Some(1), "Finished"),
        ];
        tally.add_round(2023, ParticipantKind::Driver, &options, &event(1), &race, None);

        assert_eq!(tally.entries[0].entrant.key, "AAA");
        assert_eq!(tally.entries[1].entrant.key, "BBB");
        assert_eq!(tally.entries[1].points, 25.0);
        assert_eq!(tally.entries[1].wins, 1);
    }

    #[test]
    fn test_constructor_cell_keeps_best_car() {
        let mut tally = Tally::default();
        let options = AggregateOptions::default();
        let race = vec![
            row("AAA", "Alpha", None, "Retired"),
            row("BBB", "Alpha", Some(7), "Finished"),
            row("CCC", "Alpha", Some(4), "Finished"),
        ];
        tally.add_round(2023, ParticipantKind::Constructor, &options, &event(1), &race, None);

        let team = &tally.entries[0];
        assert_eq!(team.points, 12.0 + 6.0);
        assert_eq!(team.results[&1].outcome.finishing_position(), Some(4));
        assert_eq!(team.results[&1].hint, OutcomeHint::Points);
    }

    #[test]
    fn test_constructor_cell_all_retired_keeps_first() {
        let mut tally = Tally::default();
        let options = AggregateOptions::default();
        let race = vec![
            row("AAA", "Alpha", None, "Disqualified"),
            row("BBB", "Alpha", None, "Retired"),
        ];
        tally.add_round(2023, ParticipantKind::Constructor, &options, &event(1), &race, None);
        assert_eq!(tally.entries[0].results[&1].outcome, Outcome::Disqualified);
    }

    #[test]
    fn test_rows_without_key_are_ignored() {
        let mut tally = Tally::default();
        let options = AggregateOptions::default();
        let mut anonymous = row("", "", Some(1), "Finished");
        anonymous.driver.code = None;
        let race = [anonymous];
        tally.add_round(2023, ParticipantKind::Driver, &options, &event(1), &race, None);
        tally.add_round(2023, ParticipantKind::Constructor, &options, &event(1), &race, None);
        assert!(tally.entries.is_empty());
    }

    #[test]
    fn test_disqualified_row_scores_nothing() {
        let mut tally = Tally::default();
        let options = AggregateOptions::default();
        let race = vec![row("AAA", "Alpha", Some(1), "Disqualified")];
        tally.add_round(2023, ParticipantKind::Driver, &options, &event(1), &race, None);
        assert_eq!(tally.entries[0].points, 0.0);
        assert_eq!(tally.entries[0].wins, 0);
        assert_eq!(tally.entries[0].results[&1].outcome, Outcome::Disqualified);
    }

    #[test]
    fn test_final_round_of_2014_pays_double() {
        let mut tally = Tally {
            final_round: Some(19),
            ..Tally::default()
        };
        let options = AggregateOptions::default();
        let race = vec![
            row("HAM", "Mercedes", Some(1), "Finished"),
            row("ROS", "Mercedes", Some(14), "Finished"),
        ];
        tally.add_round(2014, ParticipantKind::Driver, &options, &event(18), &race, None);
        tally.add_round(2014, ParticipantKind::Driver, &options, &event(19), &race, None);
        assert_eq!(tally.entries[0].points, 25.0 + 50.0);
        assert_eq!(tally.entries[1].points, 0.0);

        let mut tally = Tally {
            final_round: Some(19),
            ..Tally::default()
        };
        tally.add_round(2015, ParticipantKind::Driver, &options, &event(19), &race, None);
        assert_eq!(tally.entries[0].points, 25.0);
    }

    #[test]
    fn test_finish_sorts_and_ranks() {
        let mut tally = Tally::default();
        let options = AggregateOptions::default();
        let race = vec![
            row("AAA", "Alpha", Some(3), "Finished"),
            row("BBB", "Beta", Some(1), "Finished"),
            row("CCC", "Gamma", Some(2), "Finished"),
        ];
        tally.add_round(2023, ParticipantKind::Driver, &options, &event(1), &race, None);
        let rows = tally.finish(false);

        let keys: Vec<&str> = rows.iter().map(|r| r.entrant.key.as_str()).collect();
        assert_eq!(keys, vec!["BBB", "CCC", "AAA"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[2].rank, 3);
        assert!(rows[0].breakdown.is_none());
    }

    #[test]
    fn test_breakdown_groups_race_and_sprint() {
        let mut tally = Tally::default();
        let options = AggregateOptions::default();
        let race = vec![row("AAA", "Alpha", Some(1), "Finished")];
        let sprint = vec![row("AAA", "Alpha", Some(2), "Finished")];
        tally.add_round(2023, ParticipantKind::Driver, &options, &event(1), &race, Some(&sprint));
        tally.add_round(2023, ParticipantKind::Driver, &options, &event(2), &race, None);

        let rows = tally.finish(true);
        let breakdown = rows[0].breakdown.as_ref().unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].race, 25.0);
        assert_eq!(breakdown[0].sprint, 7.0);
        assert_eq!(breakdown[1].total(), 25.0);
        assert_eq!(rows[0].points, 57.0);
    }
}
