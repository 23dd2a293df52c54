// Diagnosis domain model
use serde::Serialize;
use std::fmt;

/// Severity tiers in escalation order; the derived `Ord` follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityTier {
    Normal,
    Attention,
    Warning,
    Critical,
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SeverityTier::Normal => "NORMAL",
            SeverityTier::Attention => "ATTENTION",
            SeverityTier::Warning => "WARNING",
            SeverityTier::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub tier: SeverityTier,
    pub title: String,
    pub description: String,
}

impl Diagnosis {
    pub fn new(tier: SeverityTier, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tier,
            title: title.into(),
            description: description.into(),
        }
    }
}
