/// Traffic-light value recorded in the engagement, blockers, feedback and
/// health columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Green,
    Yellow,
    Red,
}

impl Indicator {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "red" => Some(Self::Red),
            _ => None,
        }
    }

    pub fn status_label(self) -> &'static str {
        match self {
            Self::Green => "Active",
            Self::Yellow => "At Risk",
            Self::Red => "Critical",
        }
    }

    pub fn score(self) -> u32 {
        match self {
            Self::Green => 100,
            Self::Yellow => 50,
            Self::Red => 25,
        }
    }
}

pub const UNKNOWN_STATUS: &str = "Unknown";
pub const BLOCKERS_PRESENT: &str = "Issues present";
pub const BLOCKERS_NONE: &str = "None";
pub const FEEDBACK_FALLBACK: &str = "See engagement status";

/// Score used when no indicator is filled in, and for values that are not
/// a recognized color.
pub const NEUTRAL_SCORE: u32 = 50;

const MIN_FEEDBACK_CHARS: usize = 10;

pub fn map_indicator_to_status(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return UNKNOWN_STATUS.to_string();
    };

    match Indicator::parse(raw) {
        Some(indicator) => indicator.status_label().to_string(),
        None => raw.trim().to_lowercase(),
    }
}

pub fn classify_blockers(raw: Option<&str>) -> &'static str {
    match raw.and_then(Indicator::parse) {
        Some(Indicator::Yellow | Indicator::Red) => BLOCKERS_PRESENT,
        _ => BLOCKERS_NONE,
    }
}

/// Keeps feedback as free text only when it says more than a short
/// status word.
pub fn feedback_text(raw: Option<&str>) -> String {
    match raw {
        Some(text) if text.chars().count() > MIN_FEEDBACK_CHARS => text.to_string(),
        _ => FEEDBACK_FALLBACK.to_string(),
    }
}

pub fn indicator_score(raw: &str) -> u32 {
    Indicator::parse(raw)
        .map(Indicator::score)
        .unwrap_or(NEUTRAL_SCORE)
}

/// Averages the filled-in indicators, truncating toward zero. Blank
/// indicators are left out of the average entirely.
pub fn calculate_health_score(
    engagement: Option<&str>,
    blockers: Option<&str>,
    feedback: Option<&str>,
    health: Option<&str>,
) -> u32 {
    let scores: Vec<u32> = [engagement, blockers, feedback, health]
        .into_iter()
        .flatten()
        .filter(|raw| !raw.trim().is_empty())
        .map(indicator_score)
        .collect();

    if scores.is_empty() {
        return NEUTRAL_SCORE;
    }

    scores.iter().sum::<u32>() / scores.len() as u32
}
