use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One experience entry, used for both employment history and project lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(rename = "titel")]
    pub title: String,
    #[serde(rename = "unternehmen", default)]
    pub organization: Option<String>,
    #[serde(rename = "zeitraum", default)]
    pub period: Option<String>,
    #[serde(rename = "beschreibung", default)]
    pub description: Option<String>,
    #[serde(rename = "technologien", default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(rename = "abschluss")]
    pub degree: String,
    pub institution: String,
    #[serde(rename = "zeitraum", default)]
    pub period: Option<String>,
    #[serde(rename = "zusatz", default)]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub name: String,
    #[serde(rename = "aussteller", default)]
    pub issuer: Option<String>,
    #[serde(rename = "jahr", default)]
    pub year: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Language {
    #[serde(rename = "sprache")]
    pub language: String,
    #[serde(rename = "niveau")]
    pub proficiency: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Tailored,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Standard => "standard",
            Mode::Tailored => "tailored",
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

/// A structured candidate profile. Wire keys are the German names of the
/// extraction JSON contract; a profile is immutable once produced, tailoring
/// yields a new value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "vorname", default)]
    pub first_name: String,
    #[serde(rename = "nachname", default)]
    pub last_name: String,
    #[serde(rename = "titel", default)]
    pub title: Option<String>,
    #[serde(rename = "standort", default)]
    pub location: Option<String>,
    #[serde(rename = "verfuegbarkeit", default)]
    pub availability: Option<String>,
    #[serde(rename = "stundensatz", default)]
    pub rate: Option<String>,
    #[serde(rename = "zusammenfassung", default)]
    pub summary: Option<String>,
    #[serde(rename = "kernkompetenzen", default)]
    pub core_competencies: Vec<String>,
    /// Category name to ordered skill list. BTreeMap keeps serialized output
    /// deterministic.
    #[serde(rename = "technische_skills", default)]
    pub technical_skills: BTreeMap<String, Vec<String>>,
    #[serde(rename = "berufserfahrung", default)]
    pub experience: Vec<Experience>,
    #[serde(rename = "projekte", default)]
    pub projects: Vec<Experience>,
    #[serde(rename = "ausbildung", default)]
    pub education: Vec<Education>,
    #[serde(rename = "zertifikate", default)]
    pub certificates: Vec<Certificate>,
    #[serde(rename = "sprachen", default)]
    pub languages: Vec<Language>,
    #[serde(rename = "erstellt_am", default)]
    pub created_on: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(rename = "modus", default)]
    pub mode: Mode,
    #[serde(rename = "projekt_referenz", default)]
    pub project_reference: Option<String>,
}

// Derived Default would leave `version` empty; it must be "1.0" however the
// profile is constructed, not only on the deserialization path.
impl Default for Profile {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            title: None,
            location: None,
            availability: None,
            rate: None,
            summary: None,
            core_competencies: Vec::new(),
            technical_skills: BTreeMap::new(),
            experience: Vec::new(),
            projects: Vec::new(),
            education: Vec::new(),
            certificates: Vec::new(),
            languages: Vec::new(),
            created_on: None,
            version: default_version(),
            mode: Mode::default(),
            project_reference: None,
        }
    }
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Project requirements a profile gets tailored against.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRequirements {
    #[serde(rename = "titel", default)]
    pub title: String,
    #[serde(rename = "beschreibung", default)]
    pub description: String,
    #[serde(rename = "pflicht_skills", default)]
    pub required_skills: Vec<String>,
    #[serde(rename = "wunsch_skills", default)]
    pub optional_skills: Vec<String>,
    #[serde(rename = "branche", default)]
    pub industry: Option<String>,
    #[serde(rename = "dauer", default)]
    pub duration: Option<String>,
    /// Full free-text requisition; preferred over `description` when present.
    #[serde(rename = "rohe_ausschreibung", default)]
    pub raw_posting: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_the_german_wire_schema() {
        let json = r#"{
            "vorname": "Anna",
            "nachname": "Muster",
            "kernkompetenzen": ["Go", "Rust"],
            "berufserfahrung": [{
                "titel": "Engineer",
                "unternehmen": "ACME",
                "technologien": ["Go"],
                "highlights": []
            }],
            "sprachen": [{"sprache": "Deutsch", "niveau": "Muttersprache"}]
        }"#;
        let p: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(p.full_name(), "Anna Muster");
        assert_eq!(p.core_competencies, vec!["Go", "Rust"]);
        assert_eq!(p.experience[0].organization.as_deref(), Some("ACME"));
        assert_eq!(p.experience[0].period, None);
        assert_eq!(p.languages[0].proficiency, "Muttersprache");
        assert_eq!(p.version, "1.0");
        assert_eq!(p.mode, Mode::Standard);
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Tailored).unwrap(), "\"tailored\"");
        assert_eq!(Mode::Standard.as_str(), "standard");
    }

    #[test]
    fn full_name_trims_missing_parts() {
        let p = Profile {
            first_name: "".to_string(),
            last_name: "Muster".to_string(),
            ..Default::default()
        };
        assert_eq!(p.full_name(), "Muster");
        assert_eq!(Profile::default().full_name(), "");
    }

    #[test]
    fn default_constructed_profile_carries_version_one() {
        let p = Profile::default();
        assert_eq!(p.version, "1.0");
        assert_eq!(p.mode, Mode::Standard);
    }

    #[test]
    fn empty_object_deserializes_with_defaults() {
        let p: Profile = serde_json::from_str("{}").unwrap();
        assert_eq!(p.version, "1.0");
        assert!(p.core_competencies.is_empty());
        assert!(p.technical_skills.is_empty());
        assert_eq!(p.project_reference, None);
    }
}
