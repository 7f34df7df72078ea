use serde::{Deserialize, Serialize};

/// Patient gender as used by banded reference ranges and the Framingham
/// tables. Reports that do not state it simply leave it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse common report spellings ("M", "Male", "F", "female", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Some(Gender::Male),
            "f" | "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Demographic and lifestyle context supplied at the input boundary.
///
/// Everything is optional: an empty context yields the default reference
/// ranges and no contextual risk adjustment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemographicContext {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    /// Declared conditions, e.g. "Diabetes", "Hypertension", "Heart Disease".
    #[serde(default)]
    pub medical_history: Vec<String>,
    /// Declared lifestyle factors, e.g. "smoker", "sedentary", "active".
    #[serde(default)]
    pub lifestyle: Vec<String>,
    /// Waist circumference in cm, used only by metabolic-syndrome detection.
    pub waist_circumference: Option<f64>,
    /// Whether declared hypertension is under treatment (Framingham points).
    #[serde(default)]
    pub treated_bp: bool,
}

impl DemographicContext {
    pub fn has_condition(&self, name: &str) -> bool {
        let needle = name.to_lowercase();
        self.medical_history
            .iter()
            .any(|c| c.to_lowercase() == needle)
    }

    pub fn has_lifestyle(&self, name: &str) -> bool {
        let needle = name.to_lowercase();
        self.lifestyle
            .iter()
            .any(|c| c.to_lowercase().contains(&needle))
    }

    /// Fill age/gender from report-extracted demographics where the caller
    /// did not supply them. Explicitly provided context always wins.
    pub fn merged_with_extracted(mut self, age: Option<u32>, gender: Option<Gender>) -> Self {
        if self.age.is_none() {
            self.age = age;
        }
        if self.gender.is_none() {
            self.gender = gender;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parses_report_spellings() {
        assert_eq!(Gender::parse("M"), Some(Gender::Male));
        assert_eq!(Gender::parse("female"), Some(Gender::Female));
        assert_eq!(Gender::parse(" F "), Some(Gender::Female));
        assert_eq!(Gender::parse("unknown"), None);
    }

    #[test]
    fn condition_lookup_is_case_insensitive() {
        let ctx = DemographicContext {
            medical_history: vec!["Diabetes".into(), "Hypertension".into()],
            ..Default::default()
        };
        assert!(ctx.has_condition("diabetes"));
        assert!(!ctx.has_condition("kidney disease"));
    }

    #[test]
    fn lifestyle_lookup_matches_substrings() {
        let ctx = DemographicContext {
            lifestyle: vec!["heavy smoker".into()],
            ..Default::default()
        };
        assert!(ctx.has_lifestyle("smoker"));
        assert!(!ctx.has_lifestyle("alcohol"));
    }

    #[test]
    fn explicit_context_wins_over_extracted() {
        let ctx = DemographicContext {
            age: Some(60),
            ..Default::default()
        };
        let merged = ctx.merged_with_extracted(Some(30), Some(Gender::Male));
        assert_eq!(merged.age, Some(60));
        assert_eq!(merged.gender, Some(Gender::Male));
    }
}
