//! Professional Entity
//!
//! Verified tradespeople. Everything here is display data; the verification
//! level is a label, not something computed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    #[default]
    Pending,
    Basic,
    Enhanced,
}

impl VerificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationLevel::Pending => "pending",
            VerificationLevel::Basic => "basic",
            VerificationLevel::Enhanced => "enhanced",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "basic" => VerificationLevel::Basic,
            "enhanced" => VerificationLevel::Enhanced,
            _ => VerificationLevel::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: String,
    pub name: String,
    pub trade: String,
    pub years_of_experience: u32,
    pub rating: f32,
    pub completed_jobs: u32,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub service_areas: Vec<String>,
    pub availability: String,
    pub introduction: String,
    #[serde(default)]
    pub verification_level: VerificationLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
}

impl Professional {
    pub fn is_verified(&self) -> bool {
        self.verification_level != VerificationLevel::Pending
    }
}

impl Entity for Professional {
    const KIND: &'static str = "Professional";
    type Id = str;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_level_defaults_when_missing() {
        let pro: Professional = serde_json::from_value(serde_json::json!({
            "id": "pro-1",
            "name": "Li",
            "trade": "Electrician",
            "yearsOfExperience": 12,
            "rating": 4.8,
            "completedJobs": 186,
            "availability": "Mon-Sat",
            "introduction": "HVAC and fire systems"
        }))
        .unwrap();

        assert_eq!(pro.verification_level, VerificationLevel::Pending);
        assert!(!pro.is_verified());
        assert!(pro.certifications.is_empty());
    }

    #[test]
    fn test_level_strings() {
        assert_eq!(VerificationLevel::from_str("enhanced"), VerificationLevel::Enhanced);
        assert_eq!(VerificationLevel::Basic.as_str(), "basic");
        assert_eq!(VerificationLevel::from_str("?"), VerificationLevel::Pending);
    }
}
