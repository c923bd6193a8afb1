use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

use gridtable::source::{
    create_client, ErgastSource, EventFormat, ResponseCache, ResultsSource, SessionKind,
};
use gridtable::standings::{aggregate, AggregateOptions, ParticipantKind};

fn source_for(server: &MockServer, cache: ResponseCache) -> ErgastSource {
    let client = create_client(Duration::from_secs(5)).unwrap();
    ErgastSource::new(client, &server.base_url(), cache)
}

fn schedule_body() -> serde_json::Value {
    json!({
        "MRData": {
            "RaceTable": {
                "season": "2023",
                "Races": [
                    {
                        "season": "2023",
                        "round": "2",
                        "raceName": "Saudi Arabian Grand Prix",
                        "date": "2023-03-19"
                    },
                    {
                        "season": "2023",
                        "round": "1",
                        "raceName": "Bahrain Grand Prix",
                        "date": "2023-03-05"
                    },
                    {
                        "season": "2023",
                        "round": "4",
                        "raceName": "Azerbaijan Grand Prix",
                        "date": "2023-04-30",
                        "Sprint": { "date": "2023-04-29" }
                    }
                ]
            }
        }
    })
}

fn result(
    position_text: &str,
    code: &str,
    family: &str,
    team: &str,
    status: &str,
    points: &str,
) -> serde_json::Value {
    json!({
        "number": "1",
        "position": "1",
        "positionText": position_text,
        "points": points,
        "Driver": {
            "driverId": family.to_lowercase(),
            "code": code,
            "givenName": "Test",
            "familyName": family
        },
        "Constructor": { "constructorId": team.to_lowercase(), "name": team },
        "status": status
    })
}

fn results_body(round: &str, key: &str, rows: Vec<serde_json::Value>) -> serde_json::Value {
    json!({
        "MRData": {
            "RaceTable": {
                "season": "2023",
                "round": round,
                "Races": [
                    {
                        "season": "2023",
                        "round": round,
                        "raceName": "Grand Prix",
                        key: rows
                    }
                ]
            }
        }
    })
}

#[tokio::test]
async fn test_schedule_is_sorted_and_flags_sprints() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/2023.json").query_param("limit", "100");
            then.status(200).json_body(schedule_body());
        })
        .await;

    let source = source_for(&server, ResponseCache::disabled());
    let events = source.get_schedule(2023).await.unwrap();

    mock.assert_async().await;
    let rounds: Vec<u32> = events.iter().map(|e| e.round).collect();
    assert_eq!(rounds, vec![1, 2, 4]);
    assert_eq!(events[0].code, "BHR");
    assert_eq!(events[0].format, EventFormat::Conventional);
    assert_eq!(events[2].format, EventFormat::Sprint);
    assert_eq!(
        events[2].date.map(|d| d.to_string()),
        Some("2023-04-30".to_string())
    );
}

#[tokio::test]
async fn test_race_results_are_normalised() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/1/results.json");
            then.status(200).json_body(results_body(
                "1",
                "Results",
                vec![
                    result("1", "VER", "Verstappen", "Red Bull", "Finished", "25"),
                    result("R", "LEC", "Leclerc", "Ferrari", "Fuel pressure", "0"),
                    result("D", "HAM", "Hamilton", "Mercedes", "Finished", "0"),
                ],
            ));
        })
        .await;

    let source = source_for(&server, ResponseCache::disabled());
    let rows = source
        .get_session_results(2023, 1, "R")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].driver.code.as_deref(), Some("VER"));
    assert_eq!(rows[0].driver.name, "Test Verstappen");
    assert_eq!(rows[0].position, Some(1));
    assert_eq!(rows[0].points, Some(25.0));

    assert_eq!(rows[1].position, None);
    assert_eq!(rows[1].status, "Retired (Fuel pressure)");
    assert_eq!(rows[2].status, "Disqualified");
}

#[tokio::test]
async fn test_missing_session_is_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/9/results.json");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/10/results.json");
            then.status(200).json_body(json!({
                "MRData": { "RaceTable": { "season": "2023", "Races": [] } }
            }));
        })
        .await;

    let source = source_for(&server, ResponseCache::disabled());
    assert!(source.get_session_results(2023, 9, "R").await.unwrap().is_none());
    assert!(source.get_session_results(2023, 10, "R").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sprint_before_sprint_era_is_not_requested() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("sprint");
            then.status(500);
        })
        .await;

    let source = source_for(&server, ResponseCache::disabled());
    assert!(source.get_session_results(2019, 3, "S").await.unwrap().is_none());
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_server_error_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/1/results.json");
            then.status(503);
        })
        .await;

    let source = source_for(&server, ResponseCache::disabled());
    let err = source.get_session_results(2023, 1, "R").await.unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_cached_responses_skip_the_network() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/2023.json");
            then.status(200).json_body(schedule_body());
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = ResponseCache::new(dir.path().to_path_buf(), Duration::from_secs(3600));
    let source = source_for(&server, cache);

    let first = source.get_schedule(2023).await.unwrap();
    let second = source.get_schedule(2023).await.unwrap();

    assert_eq!(first, second);
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_season_from_api() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023.json");
            then.status(200).json_body(schedule_body());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/1/results.json");
            then.status(200).json_body(results_body(
                "1",
                "Results",
                vec![
                    result("1", "VER", "Verstappen", "Red Bull", "Finished", "25"),
                    result("2", "PER", "Perez", "Red Bull", "Finished", "18"),
                ],
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/2/results.json");
            then.status(200).json_body(results_body(
                "2",
                "Results",
                vec![
                    result("1", "PER", "Perez", "Red Bull", "Finished", "25"),
                    result("2", "VER", "Verstappen", "Red Bull", "Finished", "18"),
                ],
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/4/results.json");
            then.status(200).json_body(results_body(
                "4",
                "Results",
                vec![
                    result("1", "PER", "Perez", "Red Bull", "Finished", "25"),
                    result("2", "VER", "Verstappen", "Red Bull", "Finished", "18"),
                ],
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/4/sprint.json");
            then.status(200).json_body(results_body(
                "4",
                "SprintResults",
                vec![
                    result("1", "PER", "Perez", "Red Bull", "Finished", "8"),
                    result("2", "VER", "Verstappen", "Red Bull", "Finished", "7"),
                ],
            ));
        })
        .await;

    let source = source_for(&server, ResponseCache::disabled());
    let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let standings = aggregate(
        &source,
        2023,
        ParticipantKind::Driver,
        &AggregateOptions::default(),
        today,
    )
    .await
    .unwrap();

    // PER 18 + 25 + 25 + 8, VER 25 + 18 + 18 + 7
    assert_eq!(standings.rows[0].entrant.key, "PER");
    assert_eq!(standings.rows[0].points, 76.0);
    assert_eq!(standings.rows[1].points, 68.0);
    assert_eq!(standings.rows[0].results[&4].outcome.label(), "1¹");
    assert!(standings.skipped.is_empty());
}

#[tokio::test]
async fn test_unpublished_results_are_not_cached() {
    let server = MockServer::start_async().await;
    let mut empty = server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/5/results.json");
            then.status(200).json_body(json!({
                "MRData": { "RaceTable": { "season": "2023", "Races": [] } }
            }));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = ResponseCache::new(dir.path().to_path_buf(), Duration::from_secs(3600));
    let source = source_for(&server, cache);

    assert!(source.get_session_results(2023, 5, "R").await.unwrap().is_none());
    empty.assert_hits_async(1).await;
    empty.delete_async().await;

    let published = server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/5/results.json");
            then.status(200).json_body(results_body(
                "5",
                "Results",
                vec![result("1", "VER", "Verstappen", "Red Bull", "Finished", "25")],
            ));
        })
        .await;

    let rows = source.get_session_results(2023, 5, "R").await.unwrap();
    assert_eq!(rows.map(|r| r.len()), Some(1));
    published.assert_hits_async(1).await;

    // The populated answer is cached
    assert!(source.get_session_results(2023, 5, "R").await.unwrap().is_some());
    published.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_race_without_rows_is_not_cached() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/6/sprint.json");
            then.status(200).json_body(results_body("6", "SprintResults", vec![]));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = ResponseCache::new(dir.path().to_path_buf(), Duration::from_secs(3600));
    let source = source_for(&server, cache);

    assert!(source.get_session_results(2023, 6, "S").await.unwrap().is_none());
    assert!(source.get_session_results(2023, 6, "S").await.unwrap().is_none());
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_missing_sprint_is_requested_once() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023.json");
            then.status(200).json_body(json!({
                "MRData": {
                    "RaceTable": {
                        "season": "2023",
                        "Races": [
                            {
                                "season": "2023",
                                "round": "4",
                                "raceName": "Azerbaijan Grand Prix",
                                "date": "2023-04-30",
                                "Sprint": { "date": "2023-04-29" }
                            }
                        ]
                    }
                }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/4/results.json");
            then.status(200).json_body(results_body(
                "4",
                "Results",
                vec![result("1", "PER", "Perez", "Red Bull", "Finished", "25")],
            ));
        })
        .await;
    let sprint = server
        .mock_async(|when, then| {
            when.method(GET).path("/2023/4/sprint.json");
            then.status(404);
        })
        .await;

    let source = source_for(&server, ResponseCache::disabled());
    assert_eq!(source.session_labels(SessionKind::Sprint), &["S"]);

    let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let standings = aggregate(
        &source,
        2023,
        ParticipantKind::Driver,
        &AggregateOptions::default(),
        today,
    )
    .await
    .unwrap();

    sprint.assert_hits_async(1).await;
    assert_eq!(standings.skipped.len(), 1);
    assert_eq!(standings.skipped[0].session, SessionKind::Sprint);
    assert_eq!(standings.rows[0].points, 25.0);
}
