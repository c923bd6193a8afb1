use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use super::theme::{CellStyle, ThemeColors};
use crate::source::SessionKind;
use crate::standings::{ParticipantKind, Standings, Table};

/// Width of one result cell ("DSQ", "10¹")
const CELL_WIDTH: usize = 4;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
pub fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Format a points total: "575", "12.5"
pub fn format_points(points: f64) -> String {
    if points.fract().abs() < 1e-9 {
        format!("{:.0}", points)
    } else {
        format!("{:.1}", points)
    }
}

/// Rendering switches for `format_grid`
#[derive(Debug, Clone)]
pub struct GridOptions {
    pub use_colors: bool,
    /// Leave out entrant full names
    pub compact: bool,
    pub colors: ThemeColors,
}

/// Width of the grid in characters with and without the name column
pub fn grid_width(table: &Table, with_names: bool) -> usize {
    let (key_width, name_width, total_width) = column_widths(table);
    let names = if with_names { name_width + 1 } else { 0 };
    4 + key_width + 1 + names + table.columns.len() * (CELL_WIDTH + 1) + total_width
}

fn column_widths(table: &Table) -> (usize, usize, usize) {
    let key_width = table
        .rows
        .iter()
        .map(|r| r.key.chars().count())
        .chain(std::iter::once(5))
        .max()
        .unwrap_or(5);
    let name_width = table
        .rows
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0);
    let total_width = table
        .rows
        .iter()
        .map(|r| format_points(r.total).len())
        .chain(std::iter::once(5))
        .max()
        .unwrap_or(5);
    (key_width, name_width, total_width)
}

fn paint(text: &str, style: Option<CellStyle>, use_colors: bool) -> String {
    match style {
        Some(CellStyle { bg, fg }) if use_colors => text
            .on_truecolor(bg.0, bg.1, bg.2)
            .truecolor(fg.0, fg.1, fg.2)
            .to_string(),
        _ => text.to_string(),
    }
}

/// Format the race-by-race grid: one line per entrant, one cell per event,
/// total points last.
pub fn format_grid(table: &Table, title: &str, options: &GridOptions) -> String {
    if table.is_empty() {
        return "No results to display.".to_string();
    }

    let (key_width, name_width, total_width) = column_widths(table);
    let show_names = !options.compact && table.rows.iter().any(|r| r.name != r.key);
    let colors = &options.colors;

    let mut lines = Vec::with_capacity(table.rows.len() + 2);

    lines.push(if options.use_colors {
        title.bold().to_string()
    } else {
        title.to_string()
    });

    // Header
    let mut header = format!("{:>3} {:<key_width$}", "#", "Name", key_width = key_width);
    if show_names {
        header.push_str(&format!(" {:<name_width$}", "", name_width = name_width));
    }
    for column in &table.columns {
        header.push(' ');
        header.push_str(&format!("{:^CELL_WIDTH$}", column.code));
    }
    header.push_str(&format!(" {:>total_width$}", "Total", total_width = total_width));
    lines.push(if options.use_colors {
        paint(&header, Some(colors.header), true).bold().to_string()
    } else {
        header
    });

    for row in &table.rows {
        let mut line = format!("{:>2}.", row.rank);

        let label = format!(" {:<key_width$}", row.key, key_width = key_width);
        line.push_str(&paint(&label, colors.label, options.use_colors));

        if show_names {
            line.push_str(&format!(" {:<name_width$}", row.name, name_width = name_width));
        }

        for cell in &row.cells {
            line.push(' ');
            let text = format!("{:^CELL_WIDTH$}", cell.label());
            line.push_str(&paint(&text, colors.cell_style(cell.hint()), options.use_colors));
        }

        let total = format!(
            " {:>total_width$}",
            format_points(row.total),
            total_width = total_width
        );
        if options.use_colors {
            line.push_str(&total.bold().to_string());
        } else {
            line.push_str(&total);
        }

        lines.push(line);
    }

    lines.join("\n")
}

/// Ranked list with points, wins and podiums
pub fn format_standings_list(standings: &Standings) -> String {
    if standings.rows.is_empty() {
        return "No results to display.".to_string();
    }

    let label = match standings.kind {
        ParticipantKind::Driver => "Driver",
        ParticipantKind::Constructor => "Team",
    };
    let name_width = standings
        .rows
        .iter()
        .map(|r| {
            display_name(standings.kind, &r.entrant.key, &r.entrant.name)
                .chars()
                .count()
        })
        .chain(std::iter::once(label.len()))
        .max()
        .unwrap_or(label.len());

    // Drivers also show the team they first appeared for
    let show_team = standings.kind == ParticipantKind::Driver;
    let team_width = standings
        .rows
        .iter()
        .map(|r| r.entrant.team.as_deref().unwrap_or("-").chars().count())
        .chain(std::iter::once("Team".len()))
        .max()
        .unwrap_or(4);
    let team_column = |team: &str| {
        if show_team {
            format!("  {:<team_width$}", team, team_width = team_width)
        } else {
            String::new()
        }
    };

    let mut lines = vec![format!(
        "{:>3}  {:<name_width$}{}  {:>7}  {:>4}  {:>7}",
        "Pos",
        label,
        team_column("Team"),
        "Points",
        "Wins",
        "Podiums",
        name_width = name_width
    )];

    for row in &standings.rows {
        lines.push(format!(
            "{:>3}  {:<name_width$}{}  {:>7}  {:>4}  {:>7}",
            row.rank,
            display_name(standings.kind, &row.entrant.key, &row.entrant.name),
            team_column(row.entrant.team.as_deref().unwrap_or("-")),
            format_points(row.points),
            row.wins,
            row.podiums,
            name_width = name_width
        ));
    }

    lines.join("\n")
}

fn display_name(kind: ParticipantKind, key: &str, name: &str) -> String {
    match kind {
        ParticipantKind::Driver if name != key => format!("{} ({})", name, key),
        _ => name.to_string(),
    }
}

/// Champion, runner-up and third place plus entrant and race counts
pub fn format_summary(table: &Table, year: i32, kind: ParticipantKind) -> String {
    if table.is_empty() {
        return String::new();
    }

    let mut lines = vec![format!("=== F1 {} {} Championship Summary ===", year, kind)];

    for (row, place) in table
        .rows
        .iter()
        .zip(["Champion", "Runner-up", "Third place"])
    {
        lines.push(format!(
            "{}: {} ({} points)",
            place,
            row.key,
            format_points(row.total)
        ));
    }

    lines.push(String::new());
    let noun = match kind {
        ParticipantKind::Driver => "drivers",
        ParticipantKind::Constructor => "constructors",
    };
    lines.push(format!("Total {}: {}", noun, table.rows.len()));
    lines.push(format!("Total races: {}", table.columns.len()));

    lines.join("\n")
}

/// Debug listing of each entrant's points per round
pub fn format_breakdown(standings: &Standings) -> String {
    let mut lines = Vec::new();

    for row in &standings.rows {
        let Some(breakdown) = &row.breakdown else {
            continue;
        };
        let rounds = breakdown
            .iter()
            .map(|rp| {
                if rp.sprint != 0.0 {
                    format!(
                        "R{} {} {}+{}",
                        rp.round,
                        rp.code,
                        format_points(rp.race),
                        format_points(rp.sprint)
                    )
                } else {
                    format!("R{} {} {}", rp.round, rp.code, format_points(rp.race))
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "{:>2}. {} [{}]: {}",
            row.rank,
            row.entrant.key,
            format_points(row.points),
            rounds
        ));
    }

    lines.join("\n")
}

/// Notice listing skipped rounds and failed sprints, if any
pub fn format_skipped(standings: &Standings) -> Option<String> {
    if standings.skipped.is_empty() {
        return None;
    }

    let lines: Vec<String> = standings
        .skipped
        .iter()
        .map(|s| match s.session {
            SessionKind::Race => format!(
                "  Round {} ({}) skipped: {}",
                s.round, s.code, s.reason
            ),
            SessionKind::Sprint => format!(
                "  Round {} ({}) sprint missing: {}",
                s.round, s.code, s.reason
            ),
        })
        .collect();

    Some(format!("Incomplete data:\n{}", lines.join("\n")))
}

/// Format the grid as tab-separated values for scripting
/// Columns: rank, entrant, one per event, total (with a header line)
pub fn format_tsv(table: &Table) -> String {
    let mut header = vec!["Pos".to_string(), "Entrant".to_string()];
    header.extend(table.columns.iter().map(|c| c.code.clone()));
    header.push("Total".to_string());

    let mut lines = vec![header.join("\t")];
    for row in &table.rows {
        let mut fields = vec![row.rank.to_string(), row.key.clone()];
        fields.extend(row.cells.iter().map(|c| c.label()));
        fields.push(format_points(row.total));
        lines.push(fields.join("\t"));
    }

    lines.join("\n")
}
