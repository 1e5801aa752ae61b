//! Validation of pronunciation-analysis responses.
//!
//! Analysis services answer with loosely structured JSON that is neither
//! trusted nor consistent between clients. `PronunciationFeedback` is the one
//! shape the rest of the application sees; anything that cannot be mapped
//! onto it is rejected with a `FeedbackError`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Most items kept per list.
pub const MAX_ITEMS: usize = 10;

/// Longest item kept, in characters. Longer items are truncated.
pub const MAX_ITEM_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedbackError {
    #[error("response is not valid JSON: {0}")]
    Malformed(String),

    #[error("response must be a JSON object")]
    NotAnObject,

    #[error("response has no accuracy score")]
    MissingScore,

    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationFeedback {
    /// Pronunciation score, 0–100.
    pub accuracy: f64,
    /// Recognizer confidence, 0–1, when the response carries one.
    pub confidence: Option<f64>,
    /// What the speaker did well and what needs work.
    pub observations: Vec<String>,
    pub suggestions: Vec<String>,
}

impl PronunciationFeedback {
    /// Parse and validate a raw analysis response.
    ///
    /// The score is read from `accuracy`, then `scores.pronunciation`, then
    /// `scores.overall`. `feedback` may be a string, a list, or an object with
    /// `strengths`/`improvements`/`nextSteps`. Suggestions come from
    /// `suggestions`, `nextSteps`, and `feedback.nextSteps`.
    pub fn from_untrusted_json(raw: &str) -> Result<Self, FeedbackError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| FeedbackError::Malformed(e.to_string()))?;
        let root = value.as_object().ok_or(FeedbackError::NotAnObject)?;

        let scores = root.get("scores").and_then(Value::as_object);
        let (field, score) = [
            ("accuracy", root.get("accuracy")),
            ("scores.pronunciation", scores.and_then(|s| s.get("pronunciation"))),
            ("scores.overall", scores.and_then(|s| s.get("overall"))),
        ]
        .into_iter()
        .find_map(|(field, value)| value.filter(|v| !v.is_null()).map(|v| (field, v)))
        .ok_or(FeedbackError::MissingScore)?;
        let accuracy = bounded(field, score, 100.0)?;

        let confidence = match root.get("confidence") {
            None | Some(Value::Null) => None,
            Some(value) => Some(bounded("confidence", value, 1.0)?),
        };

        let mut observations = Vec::new();
        let mut suggestions = Vec::new();
        match root.get("feedback") {
            Some(Value::Object(feedback)) => {
                collect(feedback.get("strengths"), &mut observations);
                collect(feedback.get("improvements"), &mut observations);
                collect(feedback.get("nextSteps"), &mut suggestions);
            }
            other => collect(other, &mut observations),
        }
        collect(root.get("suggestions"), &mut suggestions);
        collect(root.get("nextSteps"), &mut suggestions);

        Ok(Self {
            accuracy,
            confidence,
            observations,
            suggestions,
        })
    }
}

fn bounded(field: &'static str, value: &Value, max: f64) -> Result<f64, FeedbackError> {
    let number = value.as_f64().ok_or(FeedbackError::NotANumber { field })?;
    if !(0.0..=max).contains(&number) {
        return Err(FeedbackError::OutOfRange { field, value: number });
    }
    Ok(number)
}

/// Append the usable strings in `value` (a string or a list) to `out`.
fn collect(value: Option<&Value>, out: &mut Vec<String>) {
    let items: &[Value] = match value {
        Some(Value::Array(items)) => items.as_slice(),
        Some(single @ Value::String(_)) => std::slice::from_ref(single),
        _ => return,
    };

    for item in items {
        if out.len() >= MAX_ITEMS {
            log::debug!("Dropping feedback items beyond {}", MAX_ITEMS);
            return;
        }
        let Some(text) = item.as_str().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        out.push(text.chars().take(MAX_ITEM_CHARS).collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_response() {
        let feedback = PronunciationFeedback::from_untrusted_json(
            r#"{
                "accuracy": 82,
                "feedback": "Clear vowels overall.",
                "suggestions": ["Slow down on the final consonant"],
                "nextSteps": ["Try the phrase again"]
            }"#,
        )
        .unwrap();

        assert_eq!(feedback.accuracy, 82.0);
        assert_eq!(feedback.confidence, None);
        assert_eq!(feedback.observations, vec!["Clear vowels overall."]);
        assert_eq!(
            feedback.suggestions,
            vec!["Slow down on the final consonant", "Try the phrase again"]
        );
    }

    #[test]
    fn nested_scores_and_feedback() {
        let feedback = PronunciationFeedback::from_untrusted_json(
            r#"{
                "confidence": 0.93,
                "scores": { "pronunciation": 71.5, "fluency": 60, "overall": 68 },
                "feedback": {
                    "strengths": ["Good rhythm"],
                    "improvements": ["  ", "Soften the 'r'  "],
                    "nextSteps": ["Repeat slowly"]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(feedback.accuracy, 71.5);
        assert_eq!(feedback.confidence, Some(0.93));
        assert_eq!(feedback.observations, vec!["Good rhythm", "Soften the 'r'"]);
        assert_eq!(feedback.suggestions, vec!["Repeat slowly"]);
    }

    #[test]
    fn falls_back_to_overall_score() {
        let feedback = PronunciationFeedback::from_untrusted_json(r#"{ "scores": { "overall": 90 } }"#).unwrap();
        assert_eq!(feedback.accuracy, 90.0);
        assert!(feedback.observations.is_empty());
    }

    #[test]
    fn rejects_bad_shapes() {
        let parse = PronunciationFeedback::from_untrusted_json;

        assert!(matches!(parse("{"), Err(FeedbackError::Malformed(_))));
        assert_eq!(parse("[1, 2]"), Err(FeedbackError::NotAnObject));
        assert_eq!(parse(r#""great job""#), Err(FeedbackError::NotAnObject));
        assert_eq!(parse(r#"{ "feedback": "nice" }"#), Err(FeedbackError::MissingScore));
        assert_eq!(
            parse(r#"{ "accuracy": "95%" }"#),
            Err(FeedbackError::NotANumber { field: "accuracy" })
        );
        assert_eq!(
            parse(r#"{ "scores": { "pronunciation": 140 } }"#),
            Err(FeedbackError::OutOfRange {
                field: "scores.pronunciation",
                value: 140.0
            })
        );
        assert_eq!(
            parse(r#"{ "accuracy": 50, "confidence": 7 }"#),
            Err(FeedbackError::OutOfRange {
                field: "confidence",
                value: 7.0
            })
        );
    }

    #[test]
    fn caps_and_cleans_lists() {
        let long = "x".repeat(MAX_ITEM_CHARS + 50);
        let many: Vec<String> = (0..MAX_ITEMS + 5).map(|i| format!("tip {i}")).collect();
        let raw = serde_json::json!({
            "accuracy": 40,
            "feedback": [long, 7, null, "ok"],
            "suggestions": many,
        })
        .to_string();

        let feedback = PronunciationFeedback::from_untrusted_json(&raw).unwrap();

        assert_eq!(feedback.observations.len(), 2);
        assert_eq!(feedback.observations[0].chars().count(), MAX_ITEM_CHARS);
        assert_eq!(feedback.observations[1], "ok");
        assert_eq!(feedback.suggestions.len(), MAX_ITEMS);
        assert_eq!(feedback.suggestions[0], "tip 0");
    }
}
