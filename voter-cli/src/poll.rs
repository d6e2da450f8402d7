use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A question as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub is_active: bool,
    pub order: i64,
    pub votes: HashMap<String, u64>,
}

impl Question {
    /// Total votes cast, including tallies for labels no longer offered.
    pub fn total_votes(&self) -> u64 {
        self.votes.values().sum()
    }

    /// Current tally for one option; labels with no entry count as zero.
    pub fn votes_for(&self, option: &str) -> u64 {
        self.votes.get(option).copied().unwrap_or(0)
    }

    /// Share of the total as a whole percentage, rounded half-up.
    /// Defined as zero for every option while the total is zero.
    pub fn percentage(&self, option: &str) -> u64 {
        let total = self.total_votes();
        if total == 0 {
            return 0;
        }
        (self.votes_for(option) as f64 / total as f64 * 100.0).round() as u64
    }

    /// Apply one vote to this cached copy, mirroring the increment the
    /// server has already recorded. A missing tally key counts as zero.
    pub fn apply_vote(&mut self, option: &str) {
        *self.votes.entry(option.to_string()).or_insert(0) += 1;
    }
}

/// The question to present: the first active one in the order the store
/// delivered them.
pub fn active_question(questions: &[Question]) -> Option<&Question> {
    questions.iter().find(|question| question.is_active)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(votes: &[(&str, u64)]) -> Question {
        Question {
            id: "q1".to_string(),
            text: "Best?".to_string(),
            options: votes.iter().map(|(label, _)| label.to_string()).collect(),
            is_active: true,
            order: 0,
            votes: votes
                .iter()
                .map(|(label, count)| (label.to_string(), *count))
                .collect(),
        }
    }

    #[test]
    fn percentages_are_zero_without_votes() {
        let q = question(&[("X", 0), ("Y", 0)]);
        assert_eq!(q.total_votes(), 0);
        assert_eq!(q.percentage("X"), 0);
        assert_eq!(q.percentage("Y"), 0);
    }

    #[test]
    fn a_single_vote_takes_the_whole_bar() {
        let mut q = question(&[("X", 0), ("Y", 0)]);
        q.apply_vote("X");
        assert_eq!(q.votes_for("X"), 1);
        assert_eq!(q.percentage("X"), 100);
        assert_eq!(q.percentage("Y"), 0);
    }

    #[test]
    fn percentages_round_half_up() {
        let q = question(&[("X", 1), ("Y", 2)]);
        assert_eq!(q.percentage("X"), 33);
        assert_eq!(q.percentage("Y"), 67);

        // 12.5% rounds up, not to even.
        let q = question(&[("X", 1), ("Y", 7)]);
        assert_eq!(q.percentage("X"), 13);
        assert_eq!(q.percentage("Y"), 88);
    }

    #[test]
    fn percentages_stay_within_bounds() {
        let q = question(&[("X", 3), ("Y", 5), ("Z", 11)]);
        let total: u64 = q.options.iter().map(|o| q.votes_for(o)).sum();
        assert_eq!(total, q.total_votes());
        for option in &q.options {
            assert!(q.percentage(option) <= 100);
        }
    }

    #[test]
    fn missing_tally_keys_read_as_zero() {
        let mut q = question(&[("X", 2)]);
        q.votes.remove("X");
        assert_eq!(q.votes_for("X"), 0);
        assert_eq!(q.percentage("X"), 0);
        q.apply_vote("X");
        assert_eq!(q.votes_for("X"), 1);
    }

    #[test]
    fn first_active_question_wins() {
        let mut first = question(&[("X", 0)]);
        first.id = "1".to_string();
        first.is_active = false;
        let mut second = question(&[("X", 0)]);
        second.id = "2".to_string();
        let mut third = question(&[("X", 0)]);
        third.id = "3".to_string();

        let questions = vec![first, second, third];
        assert_eq!(active_question(&questions).unwrap().id, "2");
    }

    #[test]
    fn no_active_question_means_idle() {
        let mut q = question(&[("X", 0)]);
        q.is_active = false;
        assert!(active_question(&[q]).is_none());
        assert!(active_question(&[]).is_none());
    }

    #[test]
    fn full_replace_write_back_loses_concurrent_votes() {
        // Two clients start from the same cached snapshot and each write
        // their whole vote map back: the last write wins and one increment
        // vanishes. This is why the server applies increments instead of
        // accepting replacement maps.
        let snapshot = question(&[("X", 5), ("Y", 0)]);

        let mut client_a = snapshot.clone();
        let mut client_b = snapshot.clone();
        client_a.apply_vote("X");
        client_b.apply_vote("X");

        let store = client_b.votes.clone(); // Clobbers client A's write.
        assert_eq!(store["X"], 6);

        // Increment-based application keeps both votes.
        let mut store = snapshot;
        store.apply_vote("X");
        store.apply_vote("X");
        assert_eq!(store.votes_for("X"), 7);
    }

    #[test]
    fn parses_the_server_wire_shape() {
        let json = r#"{
            "id": "64a0f2c7e13d5a0001234567",
            "text": "Best?",
            "options": ["X", "Y"],
            "isActive": true,
            "order": 2,
            "votes": { "X": 1, "Y": 0 }
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert!(q.is_active);
        assert_eq!(q.order, 2);
        assert_eq!(q.votes_for("X"), 1);
        assert_eq!(q.percentage("X"), 100);
    }
}
