//! Panel configuration: palette, blame policy, sort mode, claim toggles,
//! layout inputs and the manual priority table.
//!
//! Configuration arrives either as a JSON document (`PanelConfig::from_file`)
//! or as a flat form submission (`PanelConfig::apply_form`). A rejected form
//! leaves the previous configuration untouched.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Valid range for the number of layout columns.
pub const NUM_COLUMNS_RANGE: (i64, i64) = (1, 6);

/// Valid range for the refresh interval in seconds.
pub const REFRESH_RANGE: (i64, i64) = (1, 3600);

/// Valid range for every layout font size and height, in pixels.
pub const LAYOUT_SIZE_RANGE: (i64, i64) = (1, 1000);

const FALLBACK_OK: &str = "#7E7EFF";
const FALLBACK_UNSTABLE: &str = "#FFC130";
const FALLBACK_BROKEN: &str = "#FF0000";
const FALLBACK_OTHER: &str = "#CCCCCC";
const FALLBACK_FONT: &str = "#FFFFFF";

/// Who gets shown as responsible for a broken job.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlamePolicy {
    /// Responsibles are not shown at all.
    NotAtAll,

    /// Change-set authors of the last failed build.
    #[default]
    OnlyLastFailedBuild,

    /// Change-set authors of the first build after the last stable one.
    OnlyFirstFailedBuild,

    /// Server-computed culprits of the last build.
    EveryInvolved,
}

impl BlamePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            BlamePolicy::NotAtAll => "NOTATALL",
            BlamePolicy::OnlyLastFailedBuild => "ONLYLASTFAILEDBUILD",
            BlamePolicy::OnlyFirstFailedBuild => "ONLYFIRSTFAILEDBUILD",
            BlamePolicy::EveryInvolved => "EVERYINVOLVED",
        }
    }

    /// Parse a policy name, accepting both `NOTATALL` and `NOT_AT_ALL` spellings.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        [
            BlamePolicy::NotAtAll,
            BlamePolicy::OnlyLastFailedBuild,
            BlamePolicy::OnlyFirstFailedBuild,
            BlamePolicy::EveryInvolved,
        ]
        .into_iter()
        .find(|p| p.name() == normalized)
    }
}

/// Display category a job's status maps to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Ok,
    Unstable,
    Broken,
    Other,
}

impl StatusCategory {
    /// Image used to fade out overflowing text on this category's background.
    pub fn fade_icon(&self) -> &'static str {
        match self {
            StatusCategory::Ok => "build-fade-ok.png",
            StatusCategory::Unstable => "build-fade-fail.png",
            StatusCategory::Broken => "build-fade-broken.png",
            StatusCategory::Other => "build-fade-other.png",
        }
    }
}

#[derive(Deserialize)]
struct PanelColorsRecord {
    #[serde(default)]
    ok: String,
    #[serde(default)]
    unstable: String,
    #[serde(default)]
    broken: String,
    #[serde(default)]
    other: String,
    #[serde(default)]
    font: String,
}

impl From<PanelColorsRecord> for PanelColors {
    fn from(r: PanelColorsRecord) -> Self {
        PanelColors::new(&r.ok, &r.unstable, &r.broken, &r.other, &r.font)
    }
}

/// Background colors per category plus one shared build font color.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "PanelColorsRecord")]
pub struct PanelColors {
    ok: String,
    unstable: String,
    broken: String,
    other: String,
    font: String,
}

impl Default for PanelColors {
    fn default() -> Self {
        Self {
            ok: FALLBACK_OK.to_string(),
            unstable: FALLBACK_UNSTABLE.to_string(),
            broken: FALLBACK_BROKEN.to_string(),
            other: FALLBACK_OTHER.to_string(),
            font: FALLBACK_FONT.to_string(),
        }
    }
}

impl PanelColors {
    /// Build a palette; any value that is not a `#RRGGBB` string is replaced
    /// by the stock color for that slot.
    pub fn new(ok: &str, unstable: &str, broken: &str, other: &str, font: &str) -> Self {
        Self {
            ok: hex_or(ok, FALLBACK_OK),
            unstable: hex_or(unstable, FALLBACK_UNSTABLE),
            broken: hex_or(broken, FALLBACK_BROKEN),
            other: hex_or(other, FALLBACK_OTHER),
            font: hex_or(font, FALLBACK_FONT),
        }
    }

    pub fn background(&self, category: StatusCategory) -> &str {
        match category {
            StatusCategory::Ok => &self.ok,
            StatusCategory::Unstable => &self.unstable,
            StatusCategory::Broken => &self.broken,
            StatusCategory::Other => &self.other,
        }
    }

    /// Foreground color; every category shares the build font color.
    pub fn foreground(&self, _category: StatusCategory) -> &str {
        &self.font
    }

    pub fn font(&self) -> &str {
        &self.font
    }
}

fn hex_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.len() == 7 && value.starts_with('#') {
        value.to_string()
    } else {
        fallback.to_string()
    }
}

/// Ordering applied to the panel.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SortConfig {
    /// Reorder entries by failure severity, then recency.
    pub automatic: bool,

    /// Pre-sort jobs by the manual priority table instead of by name.
    pub manual: bool,

    /// Reverse the final list.
    pub descending: bool,
}

/// Claim plugin display toggles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClaimSettings {
    pub show_claim_info: bool,
    pub show_unstable_claim_info: bool,

    /// Show the unclaimed failure count instead of the raw failure count.
    pub replace_number_of_test_cases: bool,

    /// Claim line takes the place of the responsibles line.
    pub replace_responsibles: bool,
}

/// Inputs to the entry height computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    pub auto_resize: bool,

    /// Entry height used when auto-resize is off.
    pub fixed_height: u32,

    pub job_font_size: u32,
    pub info_font_size: u32,
    pub fail_font_size: u32,
    pub claim_font_size: u32,
    pub image_size: u32,
}

impl LayoutConfig {
    /// Named pixel sizes, in declaration order.
    pub fn sizes(&self) -> [(&'static str, u32); 6] {
        [
            ("fixed_height", self.fixed_height),
            ("job_font_size", self.job_font_size),
            ("info_font_size", self.info_font_size),
            ("fail_font_size", self.fail_font_size),
            ("claim_font_size", self.claim_font_size),
            ("image_size", self.image_size),
        ]
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            auto_resize: false,
            fixed_height: 200,
            job_font_size: 80,
            info_font_size: 30,
            fail_font_size: 100,
            claim_font_size: 30,
            image_size: 100,
        }
    }
}

/// Manual sort priority per job name. Lower values sort first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PriorityTable(BTreeMap<String, i32>);

impl PriorityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job: &str) -> Option<i32> {
        self.0.get(job).copied()
    }

    pub fn set(&mut self, job: impl Into<String>, priority: i32) {
        self.0.insert(job.into(), priority);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i32)> for PriorityTable {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Full panel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PanelConfig {
    pub num_columns: u32,

    /// Page refresh interval in seconds.
    pub refresh: u32,

    pub full_hd: bool,
    pub show_description: bool,
    pub show_zero_test_counts: bool,
    pub show_timestamp: bool,
    pub show_warning_icon: bool,

    pub colors: PanelColors,
    pub blame: BlamePolicy,
    pub max_responsibles: usize,
    pub sort: SortConfig,
    pub claims: ClaimSettings,
    pub layout: LayoutConfig,
    pub priorities: PriorityTable,

    /// Jobs selected for display on this panel.
    pub selected_jobs: Vec<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            num_columns: 1,
            refresh: 3,
            full_hd: false,
            show_description: false,
            show_zero_test_counts: true,
            show_timestamp: false,
            show_warning_icon: false,
            colors: PanelColors::default(),
            blame: BlamePolicy::default(),
            max_responsibles: 3,
            sort: SortConfig::default(),
            claims: ClaimSettings::default(),
            layout: LayoutConfig::default(),
            priorities: PriorityTable::default(),
            selected_jobs: Vec::new(),
        }
    }
}

impl PanelConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: PanelConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check numeric fields against their allowed ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("num_columns", i64::from(self.num_columns), NUM_COLUMNS_RANGE)?;
        check_range("refresh", i64::from(self.refresh), REFRESH_RANGE)?;
        for (name, value) in self.layout.sizes() {
            check_range(&format!("layout.{}", name), i64::from(value), LAYOUT_SIZE_RANGE)?;
        }
        Ok(())
    }

    /// Whether responsibles are shown at all.
    pub fn show_responsibles(&self) -> bool {
        self.blame != BlamePolicy::NotAtAll
    }

    /// Whether `job` is one of the jobs selected for this panel.
    pub fn is_selected(&self, job: &str) -> bool {
        self.selected_jobs.iter().any(|j| j == job)
    }

    /// Apply a flat form submission.
    ///
    /// `num_columns` and `refresh` are required integers. Checkbox fields are
    /// `false` when absent. Other numeric fields keep their current value when
    /// absent. Manual priorities arrive as `priority.<job name>` keys.
    ///
    /// Nothing is changed unless the whole submission is valid.
    pub fn apply_form(&mut self, form: &HashMap<String, String>) -> Result<(), ConfigError> {
        let mut next = self.clone();

        next.num_columns = required_int(form, "num_columns", NUM_COLUMNS_RANGE)? as u32;
        next.refresh = required_int(form, "refresh", REFRESH_RANGE)? as u32;

        next.full_hd = checkbox(form, "full_hd");
        next.show_description = checkbox(form, "show_description");
        next.show_zero_test_counts = checkbox(form, "show_zero_test_counts");
        next.show_timestamp = checkbox(form, "show_timestamp");
        next.show_warning_icon = checkbox(form, "show_warning_icon");

        next.sort = SortConfig {
            automatic: checkbox(form, "enable_automatic_sort"),
            manual: checkbox(form, "manual_sort"),
            descending: checkbox(form, "sort_descending"),
        };

        next.claims = ClaimSettings {
            show_claim_info: checkbox(form, "show_claim_info"),
            show_unstable_claim_info: checkbox(form, "show_unstable_claim_info"),
            replace_number_of_test_cases: checkbox(form, "replace_number_of_test_cases"),
            replace_responsibles: checkbox(form, "replace_responsibles"),
        };

        if let Some(value) = form.get("blame") {
            next.blame = BlamePolicy::parse(value).ok_or_else(|| ConfigError::InvalidChoice {
                field: "blame".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(n) = optional_int(form, "max_responsibles", (0, i64::from(u32::MAX)))? {
            next.max_responsibles = n as usize;
        }

        next.colors = PanelColors::new(
            form_str(form, "ok_color", next.colors.background(StatusCategory::Ok)),
            form_str(
                form,
                "unstable_color",
                next.colors.background(StatusCategory::Unstable),
            ),
            form_str(
                form,
                "broken_color",
                next.colors.background(StatusCategory::Broken),
            ),
            form_str(form, "other_color", next.colors.background(StatusCategory::Other)),
            form_str(form, "build_font_color", next.colors.font()),
        );

        next.layout.auto_resize = checkbox(form, "auto_resize");
        for (field, slot) in [
            ("fixed_height", &mut next.layout.fixed_height),
            ("job_font_size", &mut next.layout.job_font_size),
            ("info_font_size", &mut next.layout.info_font_size),
            ("fail_font_size", &mut next.layout.fail_font_size),
            ("claim_font_size", &mut next.layout.claim_font_size),
            ("image_size", &mut next.layout.image_size),
        ] {
            if let Some(n) = optional_int(form, field, LAYOUT_SIZE_RANGE)? {
                *slot = n as u32;
            }
        }

        if let Some(jobs) = form.get("jobs") {
            next.selected_jobs = jobs
                .split(',')
                .map(str::trim)
                .filter(|j| !j.is_empty())
                .map(str::to_string)
                .collect();
        }

        let mut priorities = PriorityTable::new();
        for (key, value) in form {
            if let Some(job) = key.strip_prefix("priority.") {
                let p = parse_int(key, value)?;
                let p = i32::try_from(p).map_err(|_| ConfigError::OutOfRange {
                    field: key.clone(),
                    value: p,
                    min: i64::from(i32::MIN),
                    max: i64::from(i32::MAX),
                })?;
                priorities.set(job, p);
            }
        }
        if !priorities.is_empty() {
            next.priorities = priorities;
        }

        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn checkbox(form: &HashMap<String, String>, field: &str) -> bool {
    form.get(field)
        .map(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("on"))
        .unwrap_or(false)
}

fn form_str<'a>(form: &'a HashMap<String, String>, field: &str, current: &'a str) -> &'a str {
    form.get(field).map(String::as_str).unwrap_or(current)
}

fn parse_int(field: &str, value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidInteger {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn check_range(field: &str, value: i64, (min, max): (i64, i64)) -> Result<i64, ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(value)
}

fn required_int(
    form: &HashMap<String, String>,
    field: &str,
    range: (i64, i64),
) -> Result<i64, ConfigError> {
    let raw = form.get(field).ok_or_else(|| ConfigError::MissingField {
        field: field.to_string(),
    })?;
    check_range(field, parse_int(field, raw)?, range)
}

fn optional_int(
    form: &HashMap<String, String>,
    field: &str,
    range: (i64, i64),
) -> Result<Option<i64>, ConfigError> {
    match form.get(field) {
        Some(raw) if !raw.trim().is_empty() => {
            Ok(Some(check_range(field, parse_int(field, raw)?, range)?))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_palette_round_trip() {
        let colors = PanelColors::new("#112233", "#445566", "#778899", "#AABBCC", "#DDEEFF");
        assert_eq!(colors.background(StatusCategory::Ok), "#112233");
        assert_eq!(colors.background(StatusCategory::Unstable), "#445566");
        assert_eq!(colors.background(StatusCategory::Broken), "#778899");
        assert_eq!(colors.background(StatusCategory::Other), "#AABBCC");
        for category in [
            StatusCategory::Ok,
            StatusCategory::Unstable,
            StatusCategory::Broken,
            StatusCategory::Other,
        ] {
            assert_eq!(colors.foreground(category), "#DDEEFF");
        }
    }

    #[test]
    fn test_palette_invalid_hex_falls_back() {
        let colors = PanelColors::new("red", "#12345", "", "#1234567", "FFFFFFF");
        assert_eq!(colors, PanelColors::default());
    }

    #[test]
    fn test_palette_deserialize_sanitizes() {
        let colors: PanelColors =
            serde_json::from_str(r##"{"ok": "#000000", "broken": "nope"}"##).unwrap();
        assert_eq!(colors.background(StatusCategory::Ok), "#000000");
        assert_eq!(colors.background(StatusCategory::Broken), "#FF0000");
        assert_eq!(colors.font(), "#FFFFFF");
    }

    #[test]
    fn test_blame_policy_parse() {
        assert_eq!(BlamePolicy::parse("NOTATALL"), Some(BlamePolicy::NotAtAll));
        assert_eq!(
            BlamePolicy::parse("only_first_failed_build"),
            Some(BlamePolicy::OnlyFirstFailedBuild)
        );
        assert_eq!(BlamePolicy::parse("somebody"), None);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = PanelConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.show_zero_test_counts);
        assert!(config.show_responsibles());
    }

    #[test]
    fn test_apply_form_success() {
        let mut config = PanelConfig::default();
        config
            .apply_form(&form(&[
                ("num_columns", "2"),
                ("refresh", "10"),
                ("sort_descending", "on"),
                ("manual_sort", "true"),
                ("blame", "EVERYINVOLVED"),
                ("max_responsibles", "5"),
                ("priority.api", "1"),
                ("priority.web", "2"),
                ("jobs", "api, web"),
            ]))
            .expect("form should apply");

        assert_eq!(config.num_columns, 2);
        assert_eq!(config.refresh, 10);
        assert!(config.sort.descending);
        assert!(config.sort.manual);
        assert!(!config.sort.automatic);
        assert_eq!(config.blame, BlamePolicy::EveryInvolved);
        assert_eq!(config.max_responsibles, 5);
        assert_eq!(config.priorities.get("web"), Some(2));
        assert!(config.is_selected("api"));
        assert!(!config.show_zero_test_counts);
    }

    #[test]
    fn test_apply_form_rejects_non_integer_and_keeps_last_good() {
        let mut config = PanelConfig::default();
        let before = config.clone();
        let err = config
            .apply_form(&form(&[("num_columns", "two"), ("refresh", "5")]))
            .unwrap_err();
        assert_eq!(err.field(), Some("num_columns"));
        assert_eq!(config, before);
    }

    #[test]
    fn test_apply_form_rejects_out_of_range_columns() {
        let mut config = PanelConfig::default();
        let err = config
            .apply_form(&form(&[("num_columns", "7"), ("refresh", "5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn test_apply_form_requires_refresh() {
        let mut config = PanelConfig::default();
        let err = config.apply_form(&form(&[("num_columns", "1")])).unwrap_err();
        assert_eq!(err.field(), Some("refresh"));
    }

    #[test]
    fn test_apply_form_bad_priority_names_field() {
        let mut config = PanelConfig::default();
        let err = config
            .apply_form(&form(&[
                ("num_columns", "1"),
                ("refresh", "3"),
                ("priority.api", "high"),
            ]))
            .unwrap_err();
        assert_eq!(err.field(), Some("priority.api"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PanelConfig =
            serde_json::from_str(r#"{"num_columns": 3, "sort": {"automatic": true}}"#).unwrap();
        assert_eq!(config.num_columns, 3);
        assert_eq!(config.refresh, 3);
        assert!(config.sort.automatic);
        assert!(!config.sort.descending);
        assert_eq!(config.colors, PanelColors::default());
    }

    #[test]
    fn test_validate_rejects_oversized_layout() {
        let config: PanelConfig = serde_json::from_str(
            r#"{"show_timestamp": true, "layout": {"auto_resize": true, "job_font_size": 80, "info_font_size": 1500000000}}"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("layout.info_font_size"));
        assert!(matches!(err, ConfigError::OutOfRange { max: 1000, .. }));
    }

    #[test]
    fn test_validate_rejects_zero_image_size() {
        let mut config = PanelConfig::default();
        config.layout.image_size = 0;
        assert_eq!(
            config.validate().unwrap_err().field(),
            Some("layout.image_size")
        );
    }

    #[test]
    fn test_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.json");
        std::fs::write(&path, r#"{"refresh": 0}"#).unwrap();
        let err = PanelConfig::from_file(&path).unwrap_err();
        assert_eq!(err.field(), Some("refresh"));
    }
}
