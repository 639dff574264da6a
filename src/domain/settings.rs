//! User settings for the digest run.
//!
//! Settings are the only value the user edits directly. They are validated
//! before save and persisted as a single current value.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest number of papers a digest may include.
pub const PAPER_LIMIT_MIN: u8 = 1;

/// Largest number of papers a digest may include.
pub const PAPER_LIMIT_MAX: u8 = 25;

/// arXiv subject categories the digest can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "cs.AI")]
    ArtificialIntelligence,
    #[serde(rename = "cs.LG")]
    MachineLearning,
    #[serde(rename = "cs.CV")]
    ComputerVision,
    #[serde(rename = "cs.CL")]
    ComputationAndLanguage,
    #[serde(rename = "cs.RO")]
    Robotics,
    #[serde(rename = "physics")]
    Physics,
    #[serde(rename = "math")]
    Mathematics,
    #[serde(rename = "q-bio")]
    QuantitativeBiology,
    #[serde(rename = "stat.ML")]
    StatisticsMl,
}

impl Category {
    /// The full catalog, in display order.
    pub const ALL: [Category; 9] = [
        Category::ArtificialIntelligence,
        Category::MachineLearning,
        Category::ComputerVision,
        Category::ComputationAndLanguage,
        Category::Robotics,
        Category::Physics,
        Category::Mathematics,
        Category::QuantitativeBiology,
        Category::StatisticsMl,
    ];

    /// arXiv code, e.g. `cs.AI`.
    pub fn code(self) -> &'static str {
        match self {
            Self::ArtificialIntelligence => "cs.AI",
            Self::MachineLearning => "cs.LG",
            Self::ComputerVision => "cs.CV",
            Self::ComputationAndLanguage => "cs.CL",
            Self::Robotics => "cs.RO",
            Self::Physics => "physics",
            Self::Mathematics => "math",
            Self::QuantitativeBiology => "q-bio",
            Self::StatisticsMl => "stat.ML",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::ArtificialIntelligence => "Artificial Intelligence",
            Self::MachineLearning => "Machine Learning",
            Self::ComputerVision => "Computer Vision",
            Self::ComputationAndLanguage => "Computation and Language",
            Self::Robotics => "Robotics",
            Self::Physics => "Physics",
            Self::Mathematics => "Mathematics",
            Self::QuantitativeBiology => "Quantitative Biology",
            Self::StatisticsMl => "Statistics - ML",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// How much detail the agent puts into each paper summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryDepth {
    Brief,
    #[default]
    Detailed,
}

impl SummaryDepth {
    /// Flip between brief and detailed.
    pub fn toggled(self) -> Self {
        match self {
            Self::Brief => Self::Detailed,
            Self::Detailed => Self::Brief,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brief => "brief",
            Self::Detailed => "detailed",
        }
    }
}

/// User preferences for the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Recipient address for the digest email
    pub email: String,
    /// Categories to scan
    pub categories: BTreeSet<Category>,
    /// Maximum number of papers per digest
    pub paper_limit: u8,
    /// Summary style
    pub summary_depth: SummaryDepth,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            email: String::new(),
            categories: BTreeSet::from([Category::ArtificialIntelligence, Category::MachineLearning]),
            paper_limit: 10,
            summary_depth: SummaryDepth::Detailed,
        }
    }
}

impl Settings {
    /// Clamp an arbitrary requested limit into the accepted range.
    pub fn clamp_paper_limit(requested: i64) -> u8 {
        requested.clamp(PAPER_LIMIT_MIN as i64, PAPER_LIMIT_MAX as i64) as u8
    }

    /// Move the paper limit by `delta`, staying inside the accepted range.
    pub fn step_paper_limit(&mut self, delta: i64) {
        self.paper_limit = Self::clamp_paper_limit(self.paper_limit as i64 + delta);
    }

    /// Add the category if absent, remove it if present.
    pub fn toggle_category(&mut self, category: Category) {
        if !self.categories.remove(&category) {
            self.categories.insert(category);
        }
    }

    /// Category codes joined for display or instructions.
    pub fn category_codes(&self) -> Vec<&'static str> {
        self.categories.iter().map(|c| c.code()).collect()
    }

    /// Check every field, collecting all problems at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if let Err(message) = check_email(&self.email) {
            issues.push(FieldIssue {
                field: SettingsField::Email,
                message,
            });
        }

        if self.categories.is_empty() {
            issues.push(FieldIssue {
                field: SettingsField::Categories,
                message: "select at least one category".to_string(),
            });
        }

        if !(PAPER_LIMIT_MIN..=PAPER_LIMIT_MAX).contains(&self.paper_limit) {
            issues.push(FieldIssue {
                field: SettingsField::PaperLimit,
                message: format!("must be between {} and {}", PAPER_LIMIT_MIN, PAPER_LIMIT_MAX),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn check_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("email address is required".to_string());
    }
    if email.chars().any(char::is_whitespace) {
        return Err("email address must not contain spaces".to_string());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err("email address must contain '@'".to_string());
    };

    if local.is_empty() || domain.contains('@') {
        return Err("invalid email address".to_string());
    }

    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err("email domain looks incomplete".to_string());
    }

    Ok(())
}

/// Editable fields of the settings form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsField {
    Email,
    Categories,
    PaperLimit,
    SummaryDepth,
}

/// A single problem with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: SettingsField,
    pub message: String,
}

/// Settings rejected before save. Never touches persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .issues.iter().map(|i| i.message.as_str()).collect::<Vec<_>>().join("; "))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Message for a specific field, if that field has a problem.
    pub fn message_for(&self, field: SettingsField) -> Option<&str> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Settings {
        Settings {
            email: "ada@example.org".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.email, "");
        assert_eq!(settings.paper_limit, 10);
        assert_eq!(settings.summary_depth, SummaryDepth::Detailed);
        assert_eq!(settings.category_codes(), vec!["cs.AI", "cs.LG"]);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(valid()).unwrap();
        assert_eq!(json["paperLimit"], 10);
        assert_eq!(json["summaryDepth"], "detailed");
        assert_eq!(json["categories"], serde_json::json!(["cs.AI", "cs.LG"]));
    }

    #[test]
    fn test_clamp_paper_limit() {
        assert_eq!(Settings::clamp_paper_limit(-4), 1);
        assert_eq!(Settings::clamp_paper_limit(0), 1);
        assert_eq!(Settings::clamp_paper_limit(12), 12);
        assert_eq!(Settings::clamp_paper_limit(26), 25);
        assert_eq!(Settings::clamp_paper_limit(1000), 25);
    }

    #[test]
    fn test_step_paper_limit_stays_in_range() {
        let mut settings = valid();
        settings.paper_limit = 25;
        settings.step_paper_limit(1);
        assert_eq!(settings.paper_limit, 25);

        settings.paper_limit = 1;
        settings.step_paper_limit(-1);
        assert_eq!(settings.paper_limit, 1);

        settings.step_paper_limit(5);
        assert_eq!(settings.paper_limit, 6);
    }

    #[test]
    fn test_toggle_category() {
        let mut settings = valid();
        settings.toggle_category(Category::Robotics);
        assert!(settings.categories.contains(&Category::Robotics));
        settings.toggle_category(Category::Robotics);
        assert!(!settings.categories.contains(&Category::Robotics));
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_limit() {
        for limit in [0u8, 26, 255] {
            let settings = Settings {
                paper_limit: limit,
                ..valid()
            };
            let err = settings.validate().unwrap_err();
            assert!(err.message_for(SettingsField::PaperLimit).is_some());
        }
    }

    #[test]
    fn test_validate_rejects_empty_categories() {
        let settings = Settings {
            categories: BTreeSet::new(),
            ..valid()
        };
        let err = settings.validate().unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].field, SettingsField::Categories);
    }

    #[test]
    fn test_validate_email_shapes() {
        for bad in ["", "   ", "no-at-sign", "@example.org", "a@b", "a@@b.org", "a b@c.org", "a@.org"] {
            let settings = Settings {
                email: bad.to_string(),
                ..valid()
            };
            let err = settings.validate().unwrap_err();
            assert!(err.message_for(SettingsField::Email).is_some(), "accepted {:?}", bad);
        }

        for good in ["a@b.co", "first.last+tag@uni.ac.uk", "研究者@例え.jp"] {
            let settings = Settings {
                email: good.to_string(),
                ..valid()
            };
            assert!(settings.validate().is_ok(), "rejected {:?}", good);
        }
    }

    #[test]
    fn test_validation_collects_all_issues() {
        let settings = Settings {
            email: String::new(),
            categories: BTreeSet::new(),
            paper_limit: 0,
            summary_depth: SummaryDepth::Brief,
        };
        let err = settings.validate().unwrap_err();
        assert_eq!(err.issues.len(), 3);
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_summary_depth_toggle() {
        assert_eq!(SummaryDepth::Brief.toggled(), SummaryDepth::Detailed);
        assert_eq!(SummaryDepth::Detailed.toggled(), SummaryDepth::Brief);
    }

    #[test]
    fn test_category_catalog() {
        assert_eq!(Category::ALL.len(), 9);
        assert_eq!(Category::StatisticsMl.code(), "stat.ML");
        assert_eq!(Category::QuantitativeBiology.label(), "Quantitative Biology");
        let json = serde_json::to_string(&Category::Physics).unwrap();
        assert_eq!(json, "\"physics\"");
    }
}
