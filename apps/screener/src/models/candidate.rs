use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured screening output for one resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub qualified: bool,
    pub name: String,
    pub current_role: String,
    pub summary: String,
    pub experience: Vec<String>,
    /// Comma-joined skill list.
    pub skills: String,
}

/// A qualified candidate as shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedCandidate {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub avatar_url: String,
    pub resume_details: String,
    #[serde(default)]
    pub meet_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QualifiedCandidate {
    pub fn from_verdict(verdict: &Verdict, meet_link: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: verdict.name.clone(),
            title: verdict.current_role.clone(),
            avatar_url: String::new(),
            resume_details: resume_details(verdict),
            meet_link,
            created_at: Utc::now(),
        }
    }
}

/// Markdown block rendered by the dashboard's candidate card.
fn resume_details(verdict: &Verdict) -> String {
    let experience: String = verdict
        .experience
        .iter()
        .map(|exp| format!("\n*   {exp}"))
        .collect();
    format!(
        "**Summary:** {} \n\n**Experience:**{}\n\n**Skills:** {}",
        verdict.summary, experience, verdict.skills
    )
}
