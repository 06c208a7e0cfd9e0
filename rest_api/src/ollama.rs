// rest_api/src/ollama.rs

//! Ollama-backed triage classifier (local inference, works offline).
//!
//! This is a thin I/O wrapper: it formats the intake into a prompt, calls
//! the local generate endpoint and repairs the model's JSON output into a
//! well-formed decision. Every failure mode maps to
//! `TriageError::UpstreamUnavailable` so the service layer substitutes the
//! deterministic fallback instead of surfacing an error to the caller.

use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use lib::TriageClassifier;
use models::{PatientIntake, RiskLevel, TriageDecision, TriageError, TriageResult};

use crate::config::ClassifierConfig;

const SYSTEM_PROMPT: &str = "You are a clinical decision-support triage assistant.\n\
\n\
YOUR CONSTRAINTS:\n\
1. You provide DECISION SUPPORT ONLY. You do NOT diagnose or prescribe.\n\
2. You summarize symptoms, assess urgency (LOW/MEDIUM/HIGH/CRITICAL), and suggest next steps.\n\
3. Your output must be valid JSON.\n\
\n\
For each triage, output STRICT JSON with:\n\
{\n\
  \"clinical_summary\": \"Brief factual summary of patient presentation\",\n\
  \"risk_level\": \"LOW | MEDIUM | HIGH | CRITICAL\",\n\
  \"suggested_next_steps\": \"Recommended next steps for clinical team\",\n\
  \"confidence_score\": 0.85\n\
}\n\
\n\
IMPORTANT CLINICAL SAFETY RULES:\n\
- Red-flag symptoms (e.g., chest pain, dyspnea, syncope) must NOT be classified as LOW risk.\n\
- Severity influences confidence, but safety-critical symptoms require escalation.\n\
- When uncertain, prioritize patient safety over specificity.";

pub struct OllamaClassifier {
    client: Client,
    url: String,
    model: String,
}

impl OllamaClassifier {
    pub fn new(config: &ClassifierConfig) -> TriageResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TriageError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            model: config.model.clone(),
        })
    }

    fn format_intake(intake: &PatientIntake) -> String {
        let symptoms_text = if intake.symptoms.is_empty() {
            "   None reported".to_string()
        } else {
            intake
                .symptoms
                .iter()
                .map(|s| {
                    let duration = s
                        .duration_hours
                        .map(|h| format!(" ({} hours)", h))
                        .unwrap_or_default();
                    format!("   - {} [{}]{}", s.name, s.severity, duration)
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let vitals_text = match intake.vital_signs {
            Some(ref v) => format!(
                "   - HR: {} bpm\n   - BP: {}/{} mmHg\n   - Temp: {} C\n   - SpO2: {}%",
                v.heart_rate.map_or("?".to_string(), |x| x.to_string()),
                v.systolic_bp.map_or("?".to_string(), |x| x.to_string()),
                v.diastolic_bp.map_or("?".to_string(), |x| x.to_string()),
                v.temperature.map_or("?".to_string(), |x| x.to_string()),
                v.oxygen_saturation.map_or("?".to_string(), |x| x.to_string()),
            ),
            None => "   Not yet obtained".to_string(),
        };

        format!(
            "PATIENT INTAKE:\nAge: {} | Gender: {}\nChief Complaint: {}\n\nSYMPTOMS:\n{}\n\nVITAL SIGNS:\n{}\n\nMEDICAL HISTORY:\n{}\n\nMEDICATIONS:\n{}\n\nALLERGIES:\n{}",
            intake.age.map_or("?".to_string(), |a| a.to_string()),
            intake.gender.as_deref().unwrap_or("?"),
            intake.chief_complaint,
            symptoms_text,
            vitals_text,
            intake.medical_history.as_deref().unwrap_or("None reported"),
            intake.medications.as_deref().unwrap_or("None reported"),
            intake.allergies.as_deref().unwrap_or("None reported"),
        )
    }

    fn build_prompt(intake: &PatientIntake) -> String {
        format!(
            "{}\n\n{}\n\nTRIAGE ASSESSMENT (output STRICT JSON):",
            SYSTEM_PROMPT,
            Self::format_intake(intake)
        )
    }

    /// Extracts the first JSON object from the model's free-form response
    /// and repairs missing or malformed fields into a valid decision.
    fn parse_response(text: &str) -> TriageResult<TriageDecision> {
        let start = text
            .find('{')
            .ok_or_else(|| TriageError::UpstreamUnavailable("no JSON in model output".to_string()))?;
        let end = text
            .rfind('}')
            .ok_or_else(|| TriageError::UpstreamUnavailable("no JSON in model output".to_string()))?;
        if end < start {
            return Err(TriageError::UpstreamUnavailable(
                "malformed JSON span in model output".to_string(),
            ));
        }

        let raw: Value = serde_json::from_str(&text[start..=end]).map_err(|e| {
            TriageError::UpstreamUnavailable(format!("unparsable model output: {}", e))
        })?;

        let risk_level = raw
            .get("risk_level")
            .and_then(Value::as_str)
            .and_then(|token| RiskLevel::from_str(token).ok())
            .unwrap_or(RiskLevel::Medium);

        let clinical_summary = raw
            .get("clinical_summary")
            .and_then(Value::as_str)
            .unwrap_or("Clinical summary not generated")
            .to_string();

        let suggested_next_steps = match raw.get("suggested_next_steps") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; "),
            _ => "Physician evaluation".to_string(),
        };

        let confidence_score = raw
            .get("confidence_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.75);

        let mut decision = TriageDecision::new(
            risk_level,
            confidence_score,
            clinical_summary,
            suggested_next_steps,
        );
        if let Some(reasoning) = raw.get("reasoning").and_then(Value::as_str) {
            if !reasoning.is_empty() {
                decision.append_reasoning(reasoning);
            }
        }
        Ok(decision)
    }
}

#[async_trait]
impl TriageClassifier for OllamaClassifier {
    async fn classify(&self, intake: &PatientIntake) -> TriageResult<TriageDecision> {
        let prompt = Self::build_prompt(intake);
        debug!(model = %self.model, "sending triage prompt to local inference");

        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "temperature": 0.3,
            }))
            .send()
            .await
            .map_err(|e| TriageError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TriageError::UpstreamUnavailable(format!(
                "classifier returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TriageError::UpstreamUnavailable(e.to_string()))?;
        let text = body
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Self::parse_response(text)
    }
}

#[cfg(test)]
mod tests {
    use super::OllamaClassifier;
    use models::{PatientIntake, RiskLevel, Symptom, SymptomSeverity, TriageError};

    #[test]
    fn should_parse_well_formed_model_output() {
        let text = r#"Here is my assessment:
{"clinical_summary": "58M with chest pain", "risk_level": "HIGH",
 "suggested_next_steps": "ECG within 10 minutes", "confidence_score": 0.88}"#;
        let decision = OllamaClassifier::parse_response(text).unwrap();
        assert_eq!(decision.risk_level, RiskLevel::High);
        assert_eq!(decision.clinical_summary, "58M with chest pain");
        assert!((decision.confidence_score - 0.88).abs() < 1e-9);
    }

    #[test]
    fn should_repair_missing_and_invalid_fields() {
        let text = r#"{"risk_level": "URGENT"}"#;
        let decision = OllamaClassifier::parse_response(text).unwrap();
        assert_eq!(decision.risk_level, RiskLevel::Medium);
        assert_eq!(decision.clinical_summary, "Clinical summary not generated");
        assert_eq!(decision.suggested_next_steps, "Physician evaluation");
        assert!((decision.confidence_score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn should_join_list_valued_next_steps() {
        let text = r#"{"risk_level": "LOW", "suggested_next_steps": ["rest", "hydrate"]}"#;
        let decision = OllamaClassifier::parse_response(text).unwrap();
        assert_eq!(decision.suggested_next_steps, "rest; hydrate");
    }

    #[test]
    fn should_clamp_out_of_range_confidence() {
        let text = r#"{"risk_level": "LOW", "confidence_score": 3.2}"#;
        let decision = OllamaClassifier::parse_response(text).unwrap();
        assert_eq!(decision.confidence_score, 1.0);
    }

    #[test]
    fn should_treat_missing_json_as_upstream_failure() {
        let err = OllamaClassifier::parse_response("I cannot help with that.").unwrap_err();
        assert!(matches!(err, TriageError::UpstreamUnavailable(_)));
    }

    #[test]
    fn should_include_symptoms_and_vitals_in_prompt() {
        let intake = PatientIntake {
            age: Some(58),
            gender: Some("M".to_string()),
            chief_complaint: "Chest pain".to_string(),
            symptoms: vec![Symptom::new("chest pain", SymptomSeverity::Severe)],
            vital_signs: None,
            medical_history: None,
            medications: None,
            allergies: None,
        };
        let prompt = OllamaClassifier::build_prompt(&intake);
        assert!(prompt.contains("Chief Complaint: Chest pain"));
        assert!(prompt.contains("chest pain [SEVERE]"));
        assert!(prompt.contains("Not yet obtained"));
        assert!(prompt.contains("STRICT JSON"));
    }
}
