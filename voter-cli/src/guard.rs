use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;

/// Default name of the file holding the set of question IDs this profile
/// has voted on, stored as a JSON array of strings.
pub const GUARD_FILE: &str = ".voted_questions.json";

/// Per-profile record of questions already voted on. Grows monotonically;
/// entries are never pruned, even for questions that no longer exist, and
/// never shared between machines.
#[derive(Debug)]
pub struct VoteGuard {
    path: PathBuf,
    voted: HashSet<String>,
}

impl VoteGuard {
    /// Load the guard, starting empty if the file does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let voted = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("unreadable vote record {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to open vote record {}", path.display()))
            }
        };
        Ok(Self { path, voted })
    }

    /// Has this profile already voted on the given question?
    pub fn has_voted(&self, question_id: &str) -> bool {
        self.voted.contains(question_id)
    }

    /// Record an accepted vote and persist the set. Only call this after
    /// the server has confirmed the vote, so a failed cast stays retryable.
    pub fn record(&mut self, question_id: &str) -> anyhow::Result<()> {
        self.voted.insert(question_id.to_string());
        let contents = serde_json::to_string(&self.voted)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("failed to write vote record {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn starts_empty_when_no_record_exists() {
        let dir = tempdir().unwrap();
        let guard = VoteGuard::load(dir.path().join(GUARD_FILE)).unwrap();
        assert!(!guard.has_voted("q1"));
    }

    #[test]
    fn recorded_votes_survive_a_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(GUARD_FILE);

        let mut guard = VoteGuard::load(&path).unwrap();
        guard.record("q1").unwrap();
        assert!(guard.has_voted("q1"));

        let reloaded = VoteGuard::load(&path).unwrap();
        assert!(reloaded.has_voted("q1"));
        assert!(!reloaded.has_voted("q2"));
    }

    #[test]
    fn the_record_only_grows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(GUARD_FILE);

        let mut guard = VoteGuard::load(&path).unwrap();
        guard.record("q1").unwrap();
        guard.record("q2").unwrap();
        guard.record("q1").unwrap();

        let reloaded = VoteGuard::load(&path).unwrap();
        assert!(reloaded.has_voted("q1"));
        assert!(reloaded.has_voted("q2"));
    }

    #[test]
    fn voting_twice_is_blocked_before_any_network_traffic() {
        // The duplicate check needs nothing but the local record: a second
        // vote on the same question is rejected even for another option.
        let dir = tempdir().unwrap();
        let mut guard = VoteGuard::load(dir.path().join(GUARD_FILE)).unwrap();

        assert!(!guard.has_voted("q1"));
        guard.record("q1").unwrap();
        assert!(guard.has_voted("q1"));
    }

    #[test]
    fn a_corrupt_record_is_an_error_not_a_reset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(GUARD_FILE);
        fs::write(&path, "not json").unwrap();
        assert!(VoteGuard::load(&path).is_err());
    }
}
