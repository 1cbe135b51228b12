use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

/// Structured record parsed out of free-text CV content by the LLM backend.
///
/// This is the wire shape the extraction prompt asks for. Normalization
/// (education object -> string, skills -> list of strings) happens in the
/// llm_client module before a value of this type is handed downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub work_experience: Vec<ExperienceData>,
}

/// One work-experience entry as returned by the extraction backend.
/// Dates are free-form strings ("2021-03", "present") and are not validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceData {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub education: Option<String>,
    /// Canonical storage: JSON array of strings.
    pub skills: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkExperienceRow {
    pub id: i64,
    pub candidate_id: i64,
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RawCvRow {
    pub id: i64,
    pub candidate_id: i64,
    pub raw_text: String,
    pub source_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full candidate record as served by the search and listing endpoints:
/// the relational row with skills decoded back to an array and the
/// work-experience children embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub education: Option<String>,
    pub skills: Vec<String>,
    pub work_experience: Vec<WorkExperienceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkExperienceEntry {
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

impl CandidateRecord {
    pub fn from_rows(candidate: CandidateRow, experiences: Vec<WorkExperienceRow>) -> Self {
        let skills = decode_skills(candidate.id, candidate.skills.as_deref());
        CandidateRecord {
            id: candidate.id,
            name: candidate.name,
            email: candidate.email,
            phone: candidate.phone,
            education: candidate.education,
            skills,
            work_experience: experiences
                .into_iter()
                .map(|e| WorkExperienceEntry {
                    company: e.company,
                    position: e.position,
                    start_date: e.start_date,
                    end_date: e.end_date,
                    description: e.description,
                })
                .collect(),
        }
    }
}

/// Decodes the stored skills column back to a string array.
/// Rows written before the JSON-array representation was made canonical may
/// hold arbitrary text; those degrade to an empty list rather than failing
/// the whole read.
fn decode_skills(candidate_id: i64, stored: Option<&str>) -> Vec<String> {
    let Some(raw) = stored else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(skills) => skills,
        Err(_) => {
            warn!("Candidate {candidate_id} has non-JSON skills column, returning empty list");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(skills: Option<&str>) -> CandidateRow {
        CandidateRow {
            id: 7,
            name: "Ada".to_string(),
            email: None,
            phone: None,
            education: None,
            skills: skills.map(String::from),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_decodes_json_array_skills() {
        let record = CandidateRecord::from_rows(row(Some(r#"["Rust","SQL"]"#)), Vec::new());
        assert_eq!(record.skills, vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_record_tolerates_legacy_skills_text() {
        let record = CandidateRecord::from_rows(row(Some("Rust, SQL")), Vec::new());
        assert!(record.skills.is_empty());
    }

    #[test]
    fn test_record_with_null_skills() {
        let record = CandidateRecord::from_rows(row(None), Vec::new());
        assert!(record.skills.is_empty());
    }

    #[test]
    fn test_candidate_data_deserializes_with_missing_fields() {
        let data: CandidateData = serde_json::from_str(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(data.name, "Ada");
        assert!(data.email.is_none());
        assert!(data.skills.is_empty());
        assert!(data.work_experience.is_empty());
    }
}
