//! Security alert events raised by the provider's own scanners.

use tracing::warn;

use super::{int_at, object_at, text_at, DispatchContext, DispatchError, EventHandler, EventSummary};

/// Handler for `secret_scanning_alert` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecretScanningAlertHandler;

impl EventHandler for SecretScanningAlertHandler {
    fn handle(&self, ctx: &DispatchContext<'_>) -> Result<EventSummary, DispatchError> {
        let alert = object_at(ctx.payload, "alert")?;
        let summary = EventSummary {
            action: text_at(ctx.payload, "action"),
            alert_number: alert.and_then(|a| int_at(a, "number")),
            secret_type: alert.and_then(|a| text_at(a, "secret_type")),
            ..EventSummary::basic(ctx.payload)
        };

        warn!(
            delivery_id = ctx.delivery_id,
            repository = %summary.repository,
            alert_number = summary.alert_number,
            secret_type = summary.secret_type.as_deref().unwrap_or_default(),
            "secret scanning alert"
        );

        Ok(summary)
    }
}

/// Handler for `code_scanning_alert` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeScanningAlertHandler;

impl EventHandler for CodeScanningAlertHandler {
    fn handle(&self, ctx: &DispatchContext<'_>) -> Result<EventSummary, DispatchError> {
        let alert = object_at(ctx.payload, "alert")?;
        let rule = match alert {
            Some(alert) => object_at(alert, "rule").map_err(|e| prefixed(e, "alert"))?,
            None => None,
        };
        let summary = EventSummary {
            action: text_at(ctx.payload, "action"),
            alert_number: alert.and_then(|a| int_at(a, "number")),
            rule_id: rule.and_then(|r| text_at(r, "id")),
            severity: rule.and_then(|r| text_at(r, "severity")),
            ..EventSummary::basic(ctx.payload)
        };

        warn!(
            delivery_id = ctx.delivery_id,
            repository = %summary.repository,
            rule_id = summary.rule_id.as_deref().unwrap_or_default(),
            severity = summary.severity.as_deref().unwrap_or_default(),
            "code scanning alert"
        );

        Ok(summary)
    }
}

/// Handler for `dependabot_alert` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependabotAlertHandler;

impl EventHandler for DependabotAlertHandler {
    fn handle(&self, ctx: &DispatchContext<'_>) -> Result<EventSummary, DispatchError> {
        let alert = object_at(ctx.payload, "alert")?;
        let advisory = match alert {
            Some(alert) => object_at(alert, "security_advisory").map_err(|e| prefixed(e, "alert"))?,
            None => None,
        };
        let summary = EventSummary {
            action: text_at(ctx.payload, "action"),
            alert_number: alert.and_then(|a| int_at(a, "number")),
            advisory_id: advisory.and_then(|a| text_at(a, "ghsa_id")),
            severity: advisory.and_then(|a| text_at(a, "severity")),
            ..EventSummary::basic(ctx.payload)
        };

        warn!(
            delivery_id = ctx.delivery_id,
            repository = %summary.repository,
            advisory_id = summary.advisory_id.as_deref().unwrap_or_default(),
            severity = summary.severity.as_deref().unwrap_or_default(),
            "dependabot alert"
        );

        Ok(summary)
    }
}

fn prefixed(error: DispatchError, parent: &str) -> DispatchError {
    match error {
        DispatchError::MalformedField { field, expected, found } => {
            DispatchError::MalformedField { field: format!("{parent}.{field}"), expected, found }
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use hookgate_core::{NoOpSink, PayloadNode};
    use serde_json::{json, Value};

    use super::*;

    fn handle(
        handler: &dyn EventHandler,
        event_type: &str,
        value: Value,
    ) -> Result<EventSummary, DispatchError> {
        let payload = PayloadNode::from_value(value, 16).unwrap();
        let ctx = DispatchContext {
            event_type,
            delivery_id: "d",
            payload: &payload,
            events: &NoOpSink,
            received_at: Utc::now(),
        };
        handler.handle(&ctx)
    }

    #[test]
    fn secret_scanning_extracts_type_and_number() {
        let summary = handle(
            &SecretScanningAlertHandler,
            "secret_scanning_alert",
            json!({
                "action": "created",
                "alert": {"number": 7, "secret_type": "github_personal_access_token"}
            }),
        )
        .unwrap();

        assert_eq!(summary.alert_number, Some(7));
        assert_eq!(summary.secret_type.as_deref(), Some("github_personal_access_token"));
        assert_eq!(summary.repository, "unknown");
    }

    #[test]
    fn code_scanning_extracts_rule() {
        let summary = handle(
            &CodeScanningAlertHandler,
            "code_scanning_alert",
            json!({"alert": {"number": 3, "rule": {"id": "js/xss", "severity": "error"}}}),
        )
        .unwrap();

        assert_eq!(summary.rule_id.as_deref(), Some("js/xss"));
        assert_eq!(summary.severity.as_deref(), Some("error"));
        assert_eq!(summary.alert_number, Some(3));
    }

    #[test]
    fn dependabot_extracts_advisory() {
        let summary = handle(
            &DependabotAlertHandler,
            "dependabot_alert",
            json!({"alert": {
                "number": 1,
                "security_advisory": {"ghsa_id": "GHSA-xxxx-yyyy-zzzz", "severity": "high"}
            }}),
        )
        .unwrap();

        assert_eq!(summary.advisory_id.as_deref(), Some("GHSA-xxxx-yyyy-zzzz"));
        assert_eq!(summary.severity.as_deref(), Some("high"));
    }

    #[test]
    fn missing_alert_yields_empty_fields() {
        let summary = handle(&CodeScanningAlertHandler, "code_scanning_alert", json!({})).unwrap();
        assert!(summary.rule_id.is_none());
        assert!(summary.alert_number.is_none());
    }

    #[test]
    fn nested_wrong_kind_reports_full_path() {
        let payload = json!({"alert": {"rule": "x"}});
        let err = handle(&CodeScanningAlertHandler, "code_scanning_alert", payload).unwrap_err();
        assert_eq!(
            err,
            DispatchError::MalformedField {
                field: "alert.rule".into(),
                expected: "an object",
                found: "string",
            }
        );
    }
}
