use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::db::question::{NewQuestion, Question};

/// A new or replacement question submitted by an admin.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub text: String,
    pub options: Vec<String>,
}

impl QuestionSpec {
    /// Check the spec is storable. Option labels become field paths in the
    /// vote map, so dots and leading dollars are rejected. Duplicate labels
    /// are allowed and will share a single tally.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.is_empty() {
            return Err("question text must not be empty".to_string());
        }
        if self.options.is_empty() {
            return Err("question must offer at least one option".to_string());
        }
        for label in &self.options {
            if label.contains('.') || label.starts_with('$') {
                return Err(format!("illegal option label: {label:?}"));
            }
        }
        Ok(())
    }

    /// Convert this spec into a storable question at the given position.
    pub fn into_question(self, order: i64) -> NewQuestion {
        NewQuestion::new(self.text, self.options, order)
    }
}

/// Public description of a question. Field names are the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDescription {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub is_active: bool,
    pub order: i64,
    pub votes: HashMap<String, u64>,
}

impl From<Question> for QuestionDescription {
    fn from(question: Question) -> Self {
        Self {
            id: question.id.to_string(),
            text: question.question.text,
            options: question.question.options,
            is_active: question.question.is_active,
            order: question.question.order,
            votes: question.question.votes,
        }
    }
}

/// A vote for one option of one question.
#[derive(Debug, Serialize, Deserialize)]
pub struct VoteSpec {
    pub option: String,
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use crate::model::db::question::Question;

    use super::*;

    #[test]
    fn examples_validate() {
        assert!(QuestionSpec::example1().validate().is_ok());
        assert!(QuestionSpec::example2().validate().is_ok());
    }

    #[test]
    fn rejects_empty_text() {
        let spec = QuestionSpec {
            text: String::new(),
            options: vec!["X".to_string()],
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn rejects_empty_options() {
        let spec = QuestionSpec {
            text: "Best?".to_string(),
            options: Vec::new(),
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn rejects_labels_that_cannot_be_field_paths() {
        for label in ["a.b", "$inc", "."] {
            let spec = QuestionSpec {
                text: "Best?".to_string(),
                options: vec![label.to_string()],
            };
            assert!(spec.validate().is_err(), "label {label:?} should be rejected");
        }
        // A dollar elsewhere in the label is fine.
        let spec = QuestionSpec {
            text: "Best?".to_string(),
            options: vec!["US$ pricing".to_string()],
        };
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn into_question_takes_the_given_position() {
        let question = QuestionSpec::example1().into_question(7);
        assert_eq!(question.order, 7);
        assert!(!question.is_active);
        assert_eq!(question.votes.len(), 2);
        assert!(question.votes.values().all(|count| *count == 0));
    }

    #[test]
    fn description_uses_the_wire_field_names() {
        let question = Question::example();
        let id = question.id.to_string();
        let value = serde_json::to_value(QuestionDescription::from(question)).unwrap();

        assert_eq!(value["id"], serde_json::json!(id));
        assert_eq!(value["isActive"], serde_json::json!(false));
        assert_eq!(value["order"], serde_json::json!(0));
        assert!(value["text"].is_string());
        assert!(value["options"].is_array());
        assert_eq!(value["votes"]["Mobile app"], serde_json::json!(0));
    }

    #[test]
    fn description_round_trips_through_json() {
        let description = QuestionDescription::from(Question::example());
        let json = serde_json::to_string(&description).unwrap();
        let parsed: QuestionDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(description, parsed);
    }
}
