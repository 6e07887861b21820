use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::info;

use super::{read_json, write_json};
use crate::models::candidate::QualifiedCandidate;

/// Qualified candidates, shared by the pipeline and the dashboard endpoint.
/// Backed by a JSON file so the list survives restarts.
pub struct CandidateStore {
    path: PathBuf,
    candidates: RwLock<Vec<QualifiedCandidate>>,
}

impl CandidateStore {
    pub async fn open(path: PathBuf) -> Self {
        let candidates: Vec<QualifiedCandidate> = read_json(&path).await;
        info!(
            "Loaded {} qualified candidate(s) from {}",
            candidates.len(),
            path.display()
        );
        Self {
            path,
            candidates: RwLock::new(candidates),
        }
    }

    pub async fn push(&self, candidate: QualifiedCandidate) -> Result<()> {
        let mut candidates = self.candidates.write().await;
        candidates.push(candidate);
        write_json(&self.path, &*candidates).await
    }

    pub async fn list(&self) -> Vec<QualifiedCandidate> {
        self.candidates.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::Verdict;

    fn verdict(name: &str) -> Verdict {
        Verdict {
            qualified: true,
            name: name.to_string(),
            current_role: "Intern".to_string(),
            summary: "Eager learner.".to_string(),
            experience: vec![],
            skills: "Rust".to_string(),
        }
    }

    #[tokio::test]
    async fn test_candidates_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");

        let store = CandidateStore::open(path.clone()).await;
        assert!(store.list().await.is_empty());
        store
            .push(QualifiedCandidate::from_verdict(&verdict("Ada"), None))
            .await
            .unwrap();
        store
            .push(QualifiedCandidate::from_verdict(&verdict("Grace"), None))
            .await
            .unwrap();

        let reopened = CandidateStore::open(path).await;
        let names: Vec<String> = reopened.list().await.into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Ada", "Grace"]);
    }
}
