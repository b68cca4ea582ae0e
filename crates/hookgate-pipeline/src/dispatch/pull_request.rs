//! Pull request event summary.

use tracing::info;

use super::{
    int_at, object_at, text_at, DispatchContext, DispatchError, EventHandler, EventSummary,
};

/// Handler for `pull_request` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct PullRequestHandler;

impl EventHandler for PullRequestHandler {
    fn handle(&self, ctx: &DispatchContext<'_>) -> Result<EventSummary, DispatchError> {
        let pull_request = object_at(ctx.payload, "pull_request")?;
        let summary = EventSummary {
            action: text_at(ctx.payload, "action"),
            pull_request_number: pull_request.and_then(|pr| int_at(pr, "number")),
            ..EventSummary::basic(ctx.payload)
        };

        info!(
            delivery_id = ctx.delivery_id,
            repository = %summary.repository,
            action = summary.action.as_deref().unwrap_or_default(),
            pr_number = summary.pull_request_number,
            "processing pull request event"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use hookgate_core::{NoOpSink, PayloadNode};
    use serde_json::json;

    use super::*;

    fn handle(payload: &PayloadNode) -> Result<EventSummary, DispatchError> {
        let ctx = DispatchContext {
            event_type: "pull_request",
            delivery_id: "d",
            payload,
            events: &NoOpSink,
            received_at: Utc::now(),
        };
        PullRequestHandler.handle(&ctx)
    }

    #[test]
    fn extracts_action_and_number() {
        let payload = PayloadNode::from_value(
            json!({
                "action": "opened",
                "pull_request": {"number": 42, "title": "Add feature"},
                "repository": {"full_name": "octo/hello"},
                "sender": {"login": "octocat"}
            }),
            16,
        )
        .unwrap();

        let summary = handle(&payload).unwrap();
        assert_eq!(summary.action.as_deref(), Some("opened"));
        assert_eq!(summary.pull_request_number, Some(42));
        assert_eq!(summary.sender, "octocat");
    }

    #[test]
    fn non_object_pull_request_is_malformed() {
        let payload = PayloadNode::from_value(json!({"pull_request": [1]}), 16).unwrap();

        assert!(handle(&payload).is_err());
    }
}
