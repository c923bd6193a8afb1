use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// The two session kinds the standings are built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Race,
    Sprint,
}

impl SessionKind {
    /// Labels a results source may publish this session under, in the order
    /// they should be tried
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            SessionKind::Race => &["R"],
            SessionKind::Sprint => &["S", "Sprint"],
        }
    }

    /// Parse a session label ("R", "Race", "S", "Sprint"), case-insensitive
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("r") || label.eq_ignore_ascii_case("race") {
            Some(SessionKind::Race)
        } else if label.eq_ignore_ascii_case("s") || label.eq_ignore_ascii_case("sprint") {
            Some(SessionKind::Sprint)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::Race => write!(f, "race"),
            SessionKind::Sprint => write!(f, "sprint"),
        }
    }
}

/// Weekend format as published in the schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    Conventional,
    Sprint,
    #[default]
    Unknown, // source doesn't say; sprint is attempted anyway
}

/// One scheduled round of a season
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub round: u32,
    pub name: String,
    pub code: String, // FIA-style three letter code, used as column label
    pub date: Option<NaiveDate>,
    pub format: EventFormat,
}

impl Event {
    pub fn new(round: u32, name: &str, date: Option<NaiveDate>, format: EventFormat) -> Self {
        Self {
            round,
            name: name.to_string(),
            code: event_code(name),
            date,
            format,
        }
    }

    /// Whether a sprint session should be looked up for this round
    pub fn may_have_sprint(&self) -> bool {
        self.format != EventFormat::Conventional
    }
}

/// Three-letter code for a Grand Prix name.
///
/// Known names use the FIA abbreviation; anything else falls back to the first
/// three characters of the name, upper-cased.
pub fn event_code(name: &str) -> String {
    let known = match name.trim() {
        "Australian Grand Prix" => Some("AUS"),
        "Azerbaijan Grand Prix" => Some("AZE"),
        "Bahrain Grand Prix" => Some("BHR"),
        "Saudi Arabian Grand Prix" => Some("SAU"),
        "Miami Grand Prix" => Some("MIA"),
        "Monaco Grand Prix" => Some("MON"),
        "Spanish Grand Prix" => Some("ESP"),
        "Canadian Grand Prix" => Some("CAN"),
        "Austrian Grand Prix" => Some("AUT"),
        "British Grand Prix" => Some("GBR"),
        "Hungarian Grand Prix" => Some("HUN"),
        "Belgian Grand Prix" => Some("BEL"),
        "Dutch Grand Prix" => Some("NED"),
        "Italian Grand Prix" => Some("ITA"),
        "Singapore Grand Prix" => Some("SGP"),
        "Japanese Grand Prix" => Some("JPN"),
        "Qatar Grand Prix" => Some("QAT"),
        "United States Grand Prix" => Some("USA"),
        "Mexico City Grand Prix" => Some("MEX"),
        "São Paulo Grand Prix" => Some("SAP"),
        "Las Vegas Grand Prix" => Some("LVG"),
        "Abu Dhabi Grand Prix" => Some("ABU"),
        "Chinese Grand Prix" => Some("CHN"),
        "Emilia Romagna Grand Prix" => Some("EMI"),
        "Brazilian Grand Prix" => Some("BRA"),
        "Mexican Grand Prix" => Some("MEX"),
        "French Grand Prix" => Some("FRA"),
        "German Grand Prix" => Some("GER"),
        "Portuguese Grand Prix" => Some("POR"),
        "Russian Grand Prix" => Some("RUS"),
        "Turkish Grand Prix" => Some("TUR"),
        "Malaysian Grand Prix" => Some("MAL"),
        "Korean Grand Prix" => Some("KOR"),
        "Indian Grand Prix" => Some("IND"),
        "European Grand Prix" => Some("EUR"),
        "Styrian Grand Prix" => Some("STY"),
        "70th Anniversary Grand Prix" => Some("70A"),
        "Tuscan Grand Prix" => Some("TUS"),
        "Eifel Grand Prix" => Some("EIF"),
        "Sakhir Grand Prix" => Some("SKH"),
        _ => None,
    };

    match known {
        Some(code) => code.to_string(),
        None => name.trim().chars().take(3).collect::<String>().to_uppercase(),
    }
}

/// Identity of a driver as published by the source. Any field may be missing
/// in older seasons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    #[serde(default)]
    pub code: Option<String>, // "VER"
    #[serde(default)]
    pub id: Option<String>, // source-specific stable id, e.g. "max_verstappen"
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl DriverInfo {
    /// Stable key: abbreviation, then source id, then car number
    pub fn key(&self) -> Option<String> {
        [&self.code, &self.id, &self.number]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// One row of a race or sprint classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub driver: DriverInfo,
    #[serde(default)]
    pub team: String,
    /// Finishing position; `None` when unclassified or malformed
    #[serde(default, deserialize_with = "lenient::position")]
    pub position: Option<u32>,
    #[serde(default)]
    pub status: String,
    /// Points as awarded by the source; `None` when missing or malformed
    #[serde(default, deserialize_with = "lenient::points")]
    pub points: Option<f64>,
    #[serde(default, deserialize_with = "lenient::position")]
    pub fastest_lap_rank: Option<u32>,
}

/// Deserializers that turn malformed numeric fields into `None` instead of
/// failing the whole document.
mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
        Other(serde_json::Value),
    }

    pub fn position<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let raw: Option<Raw> = Option::deserialize(d)?;
        Ok(match raw {
            Some(Raw::Int(n)) => u32::try_from(n).ok().filter(|n| *n > 0),
            Some(Raw::Float(f)) if f.fract() == 0.0 && f >= 1.0 => Some(f as u32),
            Some(Raw::Text(s)) => s.trim().parse::<u32>().ok().filter(|n| *n > 0),
            _ => None,
        })
    }

    pub fn points<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let raw: Option<Raw> = Option::deserialize(d)?;
        Ok(match raw {
            Some(Raw::Int(n)) => Some(n as f64),
            Some(Raw::Float(f)) if f.is_finite() => Some(f),
            Some(Raw::Text(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        })
    }
}
