use serde::{Deserialize, Serialize};

/// GitHub `issues` event payload. Only the fields the pipeline consumes
/// are modeled; everything else in the delivery is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueEvent {
    pub action: String,
    pub issue: Issue,
    pub repository: EventRepository,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Present when the "issue" is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<PullRequestRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRef {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRepository {
    pub full_name: String,
    #[serde(default)]
    pub clone_url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl IssueEvent {
    pub fn is_pull_request(&self) -> bool {
        self.issue.pull_request.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.issue.state.as_deref() == Some("open")
    }

    /// Repository URL in the canonical `https://github.com/owner/repo` form.
    pub fn repository_url(&self) -> String {
        format!("https://github.com/{}", self.repository.full_name)
    }
}

/// GitHub `push` event payload. Unlike issue events, the clone URL is
/// required here: it is what the repository collaborator pulls from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub repository: PushRepository,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRepository {
    pub full_name: String,
    pub clone_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl PushEvent {
    /// Branch name from the ref, e.g. "refs/heads/main" -> "main".
    /// None for tag pushes and other non-branch refs.
    pub fn branch_name(&self) -> Option<&str> {
        self.git_ref.strip_prefix("refs/heads/")
    }

    pub fn is_default_branch(&self) -> bool {
        match (self.branch_name(), self.repository.default_branch.as_deref()) {
            (Some(branch), Some(default)) => branch == default,
            _ => false,
        }
    }
}
