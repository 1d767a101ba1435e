use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VocabularyRecord {
    pub id: u64,

    pub source_term: String,

    #[serde(default)]
    pub translation: String,

    #[serde(default)]
    pub corrected_translation: Option<String>,

    #[serde(default)]
    pub source_language: String,

    #[serde(default)]
    pub target_language: String,

    #[serde(default)]
    pub source_file: String,

    #[serde(default)]
    pub source_unit: Option<String>,

    #[serde(default)]
    pub status: RecordStatus,

    #[serde(default)]
    pub similarity: Option<f64>,

    #[serde(default)]
    pub translator_result: Option<String>,

    /// Raw OCR text around the first occurrence of the term.
    #[serde(default)]
    pub ocr_context: Option<String>,

    #[serde(default)]
    pub created_at: u64,

    #[serde(default)]
    pub updated_at: u64,
}

impl VocabularyRecord {
    /// Translation to export: the manual correction wins.
    pub fn effective_translation(&self) -> &str {
        self.corrected_translation
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.translation)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Valid,
    Suspicious,
    Corrected,
    Deleted,
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Pending
    }
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Valid => "valid",
            RecordStatus::Suspicious => "suspicious",
            RecordStatus::Corrected => "corrected",
            RecordStatus::Deleted => "deleted",
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RecordStatus::Pending),
            "valid" => Ok(RecordStatus::Valid),
            "suspicious" => Ok(RecordStatus::Suspicious),
            "corrected" => Ok(RecordStatus::Corrected),
            "deleted" => Ok(RecordStatus::Deleted),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Correction {
    pub id: u64,
    pub record_id: u64,
    pub old_translation: String,
    pub new_translation: String,

    /// manual, auto-matched, translator
    #[serde(default)]
    pub kind: String,

    /// user, raw_ocr, translator
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub created_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Suspicious".parse::<RecordStatus>(), Ok(RecordStatus::Suspicious));
        assert!("unknown".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let r: VocabularyRecord =
            serde_json::from_str(r#"{"id": 4, "source_term": "bay"}"#).unwrap();
        assert_eq!(r.status, RecordStatus::Pending);
        assert_eq!(r.effective_translation(), "");
    }
}
