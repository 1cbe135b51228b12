// Prompt template for structured CV extraction.
// All LLM prompts used by the pipeline are defined here.

pub const CV_EXTRACT_PROMPT: &str = r#"Convert the following CV text into a structured JSON object with these fields:
- name: string
- email: string
- phone: string
- education: string
- skills: list of strings
- work_experience: list of objects with company, position, start_date, end_date, description

CV Text:
{raw_text}

Return ONLY the JSON object — no explanations, no code fences."#;

/// Builds the extraction prompt for one CV's raw text.
pub fn build_extraction_prompt(raw_text: &str) -> String {
    CV_EXTRACT_PROMPT.replace("{raw_text}", raw_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_raw_text() {
        let prompt = build_extraction_prompt("Jane Doe, Backend Engineer");
        assert!(prompt.contains("Jane Doe, Backend Engineer"));
        assert!(!prompt.contains("{raw_text}"));
    }

    #[test]
    fn test_prompt_names_all_seven_fields() {
        for field in [
            "name",
            "email",
            "phone",
            "education",
            "skills",
            "work_experience",
            "description",
        ] {
            assert!(CV_EXTRACT_PROMPT.contains(field), "missing field {field}");
        }
    }
}
