//! Push events: secondary scan of commit messages and changed files.

use hookgate_core::{PayloadNode, SecurityCategory, SecurityEvent, Severity};
use serde::Serialize;
use tracing::{info, warn};

use super::{malformed, text_at, DispatchContext, DispatchError, EventHandler, EventSummary};

/// Keywords flagged in lowercased commit messages.
pub const SENSITIVE_KEYWORDS: [&str; 8] = [
    "password",
    "secret",
    "key",
    "token",
    "credential",
    "aws_access_key",
    "api_key",
    "private_key",
];

/// Fragments flagged in lowercased added or modified paths.
pub const SENSITIVE_FILE_FRAGMENTS: [&str; 4] = [".env", "credentials", "secrets", "private_key"];

/// A commit that looks like it carries secrets.
///
/// Holds only the commit id and which keywords and file fragments matched;
/// never the message or full paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitFinding {
    /// Commit SHA, or `unknown`.
    pub commit_id: String,
    /// Keywords found in the message.
    pub keywords: Vec<&'static str>,
    /// File fragments found in changed paths.
    pub files: Vec<&'static str>,
}

/// Handler for `push` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct PushHandler;

impl EventHandler for PushHandler {
    fn handle(&self, ctx: &DispatchContext<'_>) -> Result<EventSummary, DispatchError> {
        let mut summary = EventSummary::basic(ctx.payload);
        let commits = match ctx.payload.get("commits") {
            None => &[][..],
            Some(node) => node.as_array().ok_or_else(|| malformed("commits", "an array", node))?,
        };

        info!(
            delivery_id = ctx.delivery_id,
            repository = %summary.repository,
            commit_count = commits.len(),
            "processing push event"
        );

        for (index, commit) in commits.iter().enumerate() {
            if let Some(finding) = scan_commit(index, commit)? {
                warn!(
                    delivery_id = ctx.delivery_id,
                    repository = %summary.repository,
                    commit_id = %finding.commit_id,
                    keywords = ?finding.keywords,
                    files = ?finding.files,
                    "sensitive content in commit"
                );
                ctx.events.record(&SecurityEvent::new(
                    SecurityCategory::SensitiveDataDetected,
                    Severity::High,
                    ctx.event_type,
                    ctx.received_at,
                ));
                summary.commit_findings.push(finding);
            }
        }

        Ok(summary)
    }
}

fn scan_commit(index: usize, commit: &PayloadNode) -> Result<Option<CommitFinding>, DispatchError> {
    if !matches!(commit, PayloadNode::Object(_)) {
        return Err(malformed(&format!("commits.{index}"), "an object", commit));
    }

    let message =
        commit.get("message").and_then(PayloadNode::as_str).unwrap_or_default().to_lowercase();
    let keywords: Vec<_> = SENSITIVE_KEYWORDS.into_iter().filter(|k| message.contains(k)).collect();

    let mut paths = Vec::new();
    for list in ["added", "modified"] {
        let Some(node) = commit.get(list) else { continue };
        let field = format!("commits.{index}.{list}");
        let items = node.as_array().ok_or_else(|| malformed(&field, "an array", node))?;
        for item in items {
            let path = item.as_str().ok_or_else(|| malformed(&field, "an array of strings", item))?;
            paths.push(path.to_lowercase());
        }
    }
    let files: Vec<_> = SENSITIVE_FILE_FRAGMENTS
        .into_iter()
        .filter(|fragment| paths.iter().any(|p| p.contains(fragment)))
        .collect();

    if keywords.is_empty() && files.is_empty() {
        return Ok(None);
    }

    Ok(Some(CommitFinding {
        commit_id: text_at(commit, "id").unwrap_or_else(|| super::UNKNOWN.to_string()),
        keywords,
        files,
    }))
}
