use anyhow::Result;
use chrono::NaiveDate;
use std::io::Write;

use gridtable::output::{format_standings_list, format_tsv};
use gridtable::source::SeasonFile;
use gridtable::standings::{aggregate, build_table, AggregateOptions, ParticipantKind};

const SEASON: &str = r#"
year: 2021
events:
  - round: 1
    name: Bahrain Grand Prix
    date: 2021-03-28
    format: conventional
    sessions:
      R:
        - { driver: { code: HAM, name: Lewis Hamilton }, team: Mercedes, position: 1, status: Finished, points: 25 }
        - { driver: { code: VER, name: Max Verstappen }, team: Red Bull, position: 2, status: Finished, points: 18, fastest_lap_rank: 1 }
        - { driver: { code: BOT, name: Valtteri Bottas }, team: Mercedes, position: 3, status: Finished, points: 16 }
        - { driver: { code: PER, name: Sergio Perez }, team: Red Bull, position: "n/a", status: "Retired (Electrical)" }
  - round: 2
    name: British Grand Prix
    date: 2021-07-18
    format: sprint
    sessions:
      R:
        - { driver: { code: HAM, name: Lewis Hamilton }, team: Mercedes, position: 1, status: Finished, points: 25 }
        - { driver: { code: BOT, name: Valtteri Bottas }, team: Mercedes, position: 3, status: Finished, points: 15 }
        - { driver: { code: VER, name: Max Verstappen }, team: Red Bull, status: "Retired (Accident)" }
      Sprint:
        - { driver: { code: VER }, team: Red Bull, position: 1, status: Finished, points: 3 }
        - { driver: { code: HAM }, team: Mercedes, position: 2, status: Finished, points: 2 }
        - { driver: { code: BOT }, team: Mercedes, position: 3, status: Finished, points: 1 }
"#;

fn write_season(contents: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

fn after_season() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
}

#[tokio::test]
async fn test_driver_season_from_file() -> Result<()> {
    let file = write_season(SEASON)?;
    let season = SeasonFile::load(file.path())?;

    let standings = aggregate(
        &season,
        2021,
        ParticipantKind::Driver,
        &AggregateOptions::default(),
        after_season(),
    )
    .await?;

    // HAM 25 + 25 + 2, VER 18 + 1 (fastest lap) + 3, BOT 15 + 15 + 1
    let totals: Vec<(&str, f64)> = standings
        .rows
        .iter()
        .map(|r| (r.entrant.key.as_str(), r.points))
        .collect();
    assert_eq!(
        totals,
        vec![("HAM", 52.0), ("BOT", 31.0), ("VER", 22.0), ("PER", 0.0)]
    );

    let table = build_table(&standings.rows, &standings.events);
    let tsv = format_tsv(&table);
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines[0], "Pos\tEntrant\tBHR\tGBR\tTotal");
    assert_eq!(lines[1], "1\tHAM\t1\t1²\t52");
    assert_eq!(lines[3], "3\tVER\t2\tDNF\t22");
    // PER missed round 2 entirely
    assert_eq!(lines[4], "4\tPER\tDNF\t-\t0");

    Ok(())
}

#[tokio::test]
async fn test_constructor_season_from_file() -> Result<()> {
    let file = write_season(SEASON)?;
    let season = SeasonFile::load(file.path())?;

    let standings = aggregate(
        &season,
        2021,
        ParticipantKind::Constructor,
        &AggregateOptions::default(),
        after_season(),
    )
    .await?;

    // Mercedes 25 + 15 + 25 + 15 + 2 + 1, Red Bull 18 + 1 + 3
    assert_eq!(standings.rows[0].entrant.key, "Mercedes");
    assert_eq!(standings.rows[0].points, 83.0);
    assert_eq!(standings.rows[1].points, 22.0);

    let list = format_standings_list(&standings);
    assert!(list.contains("Mercedes"));
    assert!(list.contains("Red Bull"));

    Ok(())
}

#[tokio::test]
async fn test_season_file_year_mismatch() -> Result<()> {
    let file = write_season(SEASON)?;
    let season = SeasonFile::load(file.path())?;

    let err = aggregate(
        &season,
        2020,
        ParticipantKind::Driver,
        &AggregateOptions::default(),
        after_season(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("2020"));
    Ok(())
}
