use serde::{Deserialize, Serialize};

/// Which linguistic capability backs stopword removal and stemming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinguisticKind {
    #[default]
    Indonesian,
    English,
    None,
}

impl std::str::FromStr for LinguisticKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "indonesian" | "id" => Ok(Self::Indonesian),
            "english" | "en" => Ok(Self::English),
            "none" | "noop" => Ok(Self::None),
            other => Err(format!("unknown linguistic capability: {other}")),
        }
    }
}

/// Toggles for the preprocessing pipeline. Recorded alongside a built index so
/// queries go through the same pipeline as the corpus did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "enabled")]
    pub stemming: bool,
    #[serde(default = "enabled")]
    pub stopwords: bool,
    #[serde(default)]
    pub linguistic: LinguisticKind,
}

fn enabled() -> bool { true }

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { stemming: true, stopwords: true, linguistic: LinguisticKind::default() }
    }
}
