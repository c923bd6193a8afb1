//! Colour palette for the standings grid

use crate::scoring::OutcomeHint;

pub type Rgb = (u8, u8, u8);

const BLACK: Rgb = (0, 0, 0);
const WHITE: Rgb = (255, 255, 255);

/// Background and text colour of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub bg: Rgb,
    pub fg: Rgb,
}

/// Terminal background brightness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Detect from the terminal background; assumes dark when the terminal
    /// doesn't answer
    pub fn detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.6 => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

/// Colours for everything that isn't a result cell
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub header: CellStyle,
    pub label: Option<CellStyle>, // entrant column; None = terminal default
    /// Rounds an entrant missed; None = terminal default
    pub not_entered: Option<CellStyle>,
}

impl ThemeColors {
    pub fn light() -> Self {
        Self {
            header: CellStyle {
                bg: (0x44, 0x72, 0xC4),
                fg: WHITE,
            },
            label: Some(CellStyle {
                bg: (0xF0, 0xF0, 0xF0),
                fg: BLACK,
            }),
            not_entered: Some(CellStyle {
                bg: (0xF7, 0xF7, 0xF7),
                fg: (0x99, 0x99, 0x99),
            }),
        }
    }

    pub fn dark() -> Self {
        Self {
            header: CellStyle {
                bg: (0x44, 0x72, 0xC4),
                fg: WHITE,
            },
            label: None,
            not_entered: None,
        }
    }

    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::light(),
            Theme::Dark => Self::dark(),
        }
    }

    /// Style of a result cell. Result colours are the same on both themes.
    pub fn cell_style(&self, hint: OutcomeHint) -> Option<CellStyle> {
        let (bg, fg) = match hint {
            OutcomeHint::Podium(1) => ((0xFF, 0xD7, 0x00), BLACK),
            OutcomeHint::Podium(2) => ((0xC0, 0xC0, 0xC0), BLACK),
            OutcomeHint::Podium(_) => ((0xEE, 0xCC, 0x6D), BLACK),
            OutcomeHint::Points => ((0xCC, 0xFF, 0xCC), BLACK),
            OutcomeHint::NoPoints | OutcomeHint::Unclassified => ((0xE5, 0xCC, 0xFF), BLACK),
            OutcomeHint::Dnf => ((0xFF, 0x99, 0x99), BLACK),
            OutcomeHint::Dns => (WHITE, BLACK),
            OutcomeHint::Withdrew => ((0xCC, 0xCC, 0xCC), BLACK),
            OutcomeHint::Disqualified => (BLACK, WHITE),
            OutcomeHint::NotEntered => return self.not_entered,
        };
        Some(CellStyle { bg, fg })
    }
}
