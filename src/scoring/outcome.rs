use serde::Serialize;

use super::policy::{paid_positions, UNCLASSIFIED_POSITION};
use crate::source::SessionKind;

/// Normalized result of one entrant at one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Classified finisher. `position` is `UNCLASSIFIED_POSITION` when the
    /// source gave no usable position.
    Classified {
        position: u32,
        sprint_position: Option<u32>,
    },
    Dnf,
    Dns,
    Withdrew,
    Disqualified,
}

/// Presentation category of an outcome. Renderers map these to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeHint {
    Podium(u32),
    Points,
    NoPoints,
    Unclassified,
    Dnf,
    Dns,
    Withdrew,
    Disqualified,
    NotEntered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassifiedResult {
    pub outcome: Outcome,
    pub hint: OutcomeHint,
}

// Keyword families, checked in this order; first match wins
const RETIRED_KEYWORDS: &[&str] = &["dnf", "retired", "not classified"];
const DID_NOT_START_KEYWORDS: &[&str] = &["did not start"];
const WITHDREW_KEYWORDS: &[&str] = &["withdrew"];
const DISQUALIFIED_KEYWORDS: &[&str] = &["dsq", "disqualified", "excluded"];

/// Classify a race result from its position and status text.
///
/// `sprint_position` is attached to classified finishes only when it paid
/// points in `year`'s sprint format.
pub fn classify(
    year: i32,
    raw_position: Option<u32>,
    status: &str,
    sprint_position: Option<u32>,
) -> ClassifiedResult {
    let status_lower = status.to_lowercase();
    let matches_any = |keywords: &[&str]| keywords.iter().any(|k| status_lower.contains(k));

    let outcome = if matches_any(RETIRED_KEYWORDS) {
        Outcome::Dnf
    } else if matches_any(DID_NOT_START_KEYWORDS) {
        Outcome::Dns
    } else if matches_any(WITHDREW_KEYWORDS) {
        Outcome::Withdrew
    } else if matches_any(DISQUALIFIED_KEYWORDS) {
        Outcome::Disqualified
    } else {
        let paid_sprint = paid_positions(SessionKind::Sprint, year);
        Outcome::Classified {
            position: raw_position.unwrap_or(UNCLASSIFIED_POSITION),
            sprint_position: sprint_position.filter(|p| (1..=paid_sprint).contains(p)),
        }
    };

    ClassifiedResult {
        outcome,
        hint: hint_for(&outcome, year),
    }
}

fn hint_for(outcome: &Outcome, year: i32) -> OutcomeHint {
    match *outcome {
        Outcome::Classified { position, .. } => {
            if position == UNCLASSIFIED_POSITION || position == 0 {
                OutcomeHint::Unclassified
            } else if position <= 3 {
                OutcomeHint::Podium(position)
            } else if position <= paid_positions(SessionKind::Race, year) {
                OutcomeHint::Points
            } else {
                OutcomeHint::NoPoints
            }
        }
        Outcome::Dnf => OutcomeHint::Dnf,
        Outcome::Dns => OutcomeHint::Dns,
        Outcome::Withdrew => OutcomeHint::Withdrew,
        Outcome::Disqualified => OutcomeHint::Disqualified,
    }
}

impl Outcome {
    /// Numeric finishing position, if the entrant was classified with one
    pub fn finishing_position(&self) -> Option<u32> {
        match *self {
            Outcome::Classified { position, .. } if position != UNCLASSIFIED_POSITION => {
                Some(position)
            }
            _ => None,
        }
    }

    /// Cell text: "3", "1²" (sprint position as superscript), "DNF", ...
    pub fn label(&self) -> String {
        match *self {
            Outcome::Classified {
                position,
                sprint_position,
            } => {
                let mut text = if position == UNCLASSIFIED_POSITION {
                    "-".to_string()
                } else {
                    position.to_string()
                };
                if let Some(sprint) = sprint_position {
                    text.push_str(&to_superscript(sprint));
                }
                text
            }
            Outcome::Dnf => "DNF".to_string(),
            Outcome::Dns => "DNS".to_string(),
            Outcome::Withdrew => "WD".to_string(),
            Outcome::Disqualified => "DSQ".to_string(),
        }
    }
}

/// Render a number with Unicode superscript digits
pub fn to_superscript(n: u32) -> String {
    n.to_string()
        .chars()
        .map(|c| match c {
            '0' => '⁰',
            '1' => '¹',
            '2' => '²',
            '3' => '³',
            '4' => '⁴',
            '5' => '⁵',
            '6' => '⁶',
            '7' => '⁷',
            '8' => '⁸',
            '9' => '⁹',
            other => other,
        })
        .collect()
}
