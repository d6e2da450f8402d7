use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core question data, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCore {
    /// The prompt shown to voters.
    pub text: String,
    /// Option labels, in display order.
    pub options: Vec<String>,
    /// Is this the question currently open for voting?
    pub is_active: bool,
    /// Display position: the question count at the moment of creation.
    /// Never renumbered, so gaps and duplicates accumulate over time.
    pub order: i64,
    /// Tally per option label. Editing the options leaves this untouched,
    /// so counts can survive under labels that are no longer offered.
    pub votes: HashMap<String, u64>,
}

impl QuestionCore {
    /// A fresh question: inactive, every option's tally at zero.
    /// Duplicate labels collapse into a single tally key.
    pub fn new(text: String, options: Vec<String>, order: i64) -> Self {
        let votes = options.iter().map(|option| (option.clone(), 0)).collect();
        Self {
            text,
            options,
            is_active: false,
            order,
            votes,
        }
    }

    /// Total votes cast across all tally keys, orphaned ones included.
    pub fn total_votes(&self) -> u64 {
        self.votes.values().sum()
    }
}

/// A question without an ID, ready for insertion.
pub type NewQuestion = QuestionCore;

/// A question from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub question: QuestionCore,
}

impl Deref for Question {
    type Target = QuestionCore;

    fn deref(&self) -> &Self::Target {
        &self.question
    }
}

impl DerefMut for Question {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.question
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl QuestionCore {
        pub fn example() -> Self {
            Self::new(
                "What should we build next?".to_string(),
                vec!["Mobile app".to_string(), "Public API".to_string()],
                0,
            )
        }
    }

    impl Question {
        pub fn example() -> Self {
            Self {
                id: Id::new(),
                question: QuestionCore::example(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_question_starts_inactive_with_zeroed_tallies() {
        let question = QuestionCore::new(
            "Best?".to_string(),
            vec!["X".to_string(), "Y".to_string()],
            3,
        );
        assert!(!question.is_active);
        assert_eq!(question.order, 3);
        assert_eq!(question.votes.len(), 2);
        assert_eq!(question.votes["X"], 0);
        assert_eq!(question.votes["Y"], 0);
        assert_eq!(question.total_votes(), 0);
    }

    #[test]
    fn duplicate_labels_collapse_to_one_tally() {
        let question = QuestionCore::new(
            "Twice?".to_string(),
            vec!["A".to_string(), "A".to_string()],
            0,
        );
        assert_eq!(question.options.len(), 2);
        assert_eq!(question.votes.len(), 1);
        assert_eq!(question.votes["A"], 0);
    }

    #[test]
    fn total_includes_orphaned_tallies() {
        let mut question = QuestionCore::example();
        question.votes.insert("Mobile app".to_string(), 2);
        // A tally left behind by an earlier edit of the options.
        question.votes.insert("Desktop app".to_string(), 4);
        assert_eq!(question.total_votes(), 6);
    }
}
