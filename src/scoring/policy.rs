use crate::source::SessionKind;

/// Rank used for rows without a numeric finishing position. Larger than any
/// points-paying position in any era.
pub const UNCLASSIFIED_POSITION: u32 = 999;

/// First season paying points to the top eight in sprints
pub const SPRINT_EXPANSION_SEASON: i32 = 2022;

const RACE_1950_1959: &[f64] = &[8.0, 6.0, 4.0, 3.0, 2.0];
const RACE_1960: &[f64] = &[8.0, 6.0, 4.0, 3.0, 2.0, 1.0];
const RACE_1961_1990: &[f64] = &[9.0, 6.0, 4.0, 3.0, 2.0, 1.0];
const RACE_1991_2002: &[f64] = &[10.0, 6.0, 4.0, 3.0, 2.0, 1.0];
const RACE_2003_2009: &[f64] = &[10.0, 8.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
const RACE_2010_ON: &[f64] = &[25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0];

const SPRINT_2021: &[f64] = &[3.0, 2.0, 1.0];
const SPRINT_2022_ON: &[f64] = &[8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];

/// Season whose final race paid double points
const DOUBLE_POINTS_FINALE_SEASON: i32 = 2014;

/// Seasons awarding a point for the fastest lap to a top-ten finisher
const FASTEST_LAP_SEASONS: std::ops::RangeInclusive<i32> = 2019..=2024;

/// Points scale (index 0 = winner) for a session kind in a given season
pub fn points_table(kind: SessionKind, year: i32) -> &'static [f64] {
    match kind {
        SessionKind::Race => match year {
            ..=1959 => RACE_1950_1959,
            1960 => RACE_1960,
            1961..=1990 => RACE_1961_1990,
            1991..=2002 => RACE_1991_2002,
            2003..=2009 => RACE_2003_2009,
            _ => RACE_2010_ON,
        },
        SessionKind::Sprint => {
            if year < SPRINT_EXPANSION_SEASON {
                SPRINT_2021
            } else {
                SPRINT_2022_ON
            }
        }
    }
}

/// Number of points-paying positions
pub fn paid_positions(kind: SessionKind, year: i32) -> u32 {
    points_table(kind, year).len() as u32
}

/// Points for finishing `position` (1-based). Positions outside the paid
/// range, including 0 and the unclassified sentinel, score nothing.
pub fn points_for(kind: SessionKind, year: i32, position: u32) -> f64 {
    if position == 0 {
        return 0.0;
    }
    points_table(kind, year)
        .get(position as usize - 1)
        .copied()
        .unwrap_or(0.0)
}

/// `points_for` with a missing position resolved to the unclassified sentinel
pub fn points_for_position(kind: SessionKind, year: i32, position: Option<u32>) -> f64 {
    points_for(kind, year, position.unwrap_or(UNCLASSIFIED_POSITION))
}

/// Factor applied to race points: 2 for the final round of 2014, else 1
pub fn race_points_multiplier(year: i32, is_final_round: bool) -> f64 {
    if year == DOUBLE_POINTS_FINALE_SEASON && is_final_round {
        2.0
    } else {
        1.0
    }
}

/// Bonus point for the fastest lap of the race (2019-2024, top ten only)
pub fn fastest_lap_bonus(year: i32, position: Option<u32>, fastest_lap_rank: Option<u32>) -> f64 {
    let in_top_ten = matches!(position, Some(1..=10));
    if FASTEST_LAP_SEASONS.contains(&year) && in_top_ten && fastest_lap_rank == Some(1) {
        1.0
    } else {
        0.0
    }
}
