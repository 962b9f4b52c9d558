//! Maps a job's ball color to its display state.

use crate::config::{PanelColors, StatusCategory};
use crate::model::BallColor;
use serde::Serialize;

/// Colors and flags derived from a job's current signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayStatus {
    pub category: StatusCategory,
    pub background: String,
    pub foreground: String,
    pub fade_icon: &'static str,
    pub broken: bool,
    pub building: bool,
}

struct Rule {
    signals: &'static [BallColor],
    category: StatusCategory,
    broken: bool,
}

/// Ordered rule table; first match wins, anything unmatched is "other" and broken.
const RULES: &[Rule] = &[
    Rule {
        signals: &[BallColor::Blue, BallColor::BlueAnime],
        category: StatusCategory::Ok,
        broken: false,
    },
    Rule {
        signals: &[BallColor::Yellow, BallColor::YellowAnime],
        category: StatusCategory::Unstable,
        broken: false,
    },
    Rule {
        signals: &[BallColor::Red, BallColor::RedAnime],
        category: StatusCategory::Broken,
        broken: true,
    },
];

/// Classify a signal against the configured palette.
pub fn classify(signal: BallColor, colors: &PanelColors) -> DisplayStatus {
    let (category, broken) = RULES
        .iter()
        .find(|rule| rule.signals.contains(&signal))
        .map(|rule| (rule.category, rule.broken))
        .unwrap_or((StatusCategory::Other, true));

    DisplayStatus {
        category,
        background: colors.background(category).to_string(),
        foreground: colors.foreground(category).to_string(),
        fade_icon: category.fade_icon(),
        broken,
        building: signal.is_animated(),
    }
}
