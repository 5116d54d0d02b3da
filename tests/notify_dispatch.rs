mod common;

use common::{context, query_value, RecordingTransport, Request};
use serde_json::Value;
use shipnote::config::{Configuration, SlackOverrides};
use shipnote::notify::{
    Backend, DeliveryStatus, Dispatcher, NotifyEvent, Placeholders, PLACEHOLDER_KEYS,
};
use shipnote::utils::template;
use shipnote::ErrorCode;

const WEBHOOK: &str = "https://hooks.slack.com/services/T/B/X";

fn token_config() -> Configuration {
    Configuration {
        slack: Some(SlackOverrides {
            token: Some("xoxp-1".to_string()),
            team: Some("acme".to_string()),
            channel: Some("#deploys".to_string()),
            ..SlackOverrides::default()
        }),
        ..Configuration::default()
    }
}

fn webhook_config() -> Configuration {
    Configuration {
        slack_webhook: Some(WEBHOOK.to_string()),
        application: Some("shop".to_string()),
        ..Configuration::default()
    }
}

fn only_get(transport: &RecordingTransport) -> Vec<(String, String)> {
    match &transport.requests.borrow()[0] {
        Request::Get { query, .. } => query.clone(),
        other => panic!("expected GET, got {:?}", other),
    }
}

fn only_post(transport: &RecordingTransport) -> (String, Value) {
    match &transport.requests.borrow()[0] {
        Request::Post { url, body } => (url.clone(), body.clone()),
        other => panic!("expected POST, got {:?}", other),
    }
}

#[test]
fn skip_flag_sends_nothing() {
    let transport = RecordingTransport::default();
    let config = Configuration {
        slack_skip_notification: true,
        ..token_config()
    };

    let result = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &config)
        .unwrap();

    assert_eq!(result.status, DeliveryStatus::Skipped);
    assert!(!result.is_delivered());
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn no_backend_is_not_configured() {
    let transport = RecordingTransport::default();

    let err = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &Configuration::default())
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotifyNotConfigured);
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn partial_slack_table_lists_missing_keys() {
    let transport = RecordingTransport::default();
    let config = Configuration {
        slack: Some(SlackOverrides {
            token: Some("xoxp-1".to_string()),
            ..SlackOverrides::default()
        }),
        ..Configuration::default()
    };

    let err = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &config)
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotifyNotConfigured);
    assert_eq!(err.details["args"], serde_json::json!(["team"]));
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn token_start_query_carries_channel_and_attachments() {
    let transport = RecordingTransport::default();

    let result = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &token_config())
        .unwrap();

    assert_eq!(result.backends, vec![Backend::Token]);
    assert!(result.is_delivered());

    let query = only_get(&transport);
    assert_eq!(query_value(&query, "channel"), Some("#deploys"));
    assert_eq!(query_value(&query, "token"), Some("xoxp-1"));
    assert_eq!(query_value(&query, "pretty"), Some("1"));
    assert_eq!(query_value(&query, "username"), Some("Deployer"));
    assert_eq!(query_value(&query, "icon_emoji"), Some(":sunny:"));
    assert_eq!(query_value(&query, "text"), None);

    let attachments: Value =
        serde_json::from_str(query_value(&query, "attachments").unwrap()).unwrap();
    assert_eq!(attachments[0]["title"], "Deployment initiated");
    assert_eq!(attachments[0]["color"], "#7CD197");
    assert_eq!(
        attachments[0]["text"],
        "Ada Lovelace <ada@example.com> has initiated a deployment\nTarget: release-1.2\nRelease: release-1.2 - fix bug"
    );
}

#[test]
fn token_text_is_rendered_when_enabled() {
    let transport = RecordingTransport::default();
    let mut config = token_config();
    if let Some(slack) = config.slack.as_mut() {
        slack.unset_text = Some(false);
    }

    Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &config)
        .unwrap();

    let query = only_get(&transport);
    assert_eq!(
        query_value(&query, "text"),
        Some("Deployment to `web1.example.com` on *deploy* of release-1.2")
    );
}

#[test]
fn token_success_has_fields_and_short_revision() {
    let transport = RecordingTransport::default();

    Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Success, &context(), &token_config())
        .unwrap();

    let query = only_get(&transport);
    let attachments: Value =
        serde_json::from_str(query_value(&query, "attachments").unwrap()).unwrap();
    assert_eq!(attachments[0]["title"], "Deployment Complete");
    assert_eq!(
        attachments[0]["text"],
        "Revision 9f8e7d deployed to deploy by Ada Lovelace"
    );
    assert_eq!(attachments[0]["fields"][3]["value"], "prod");
}

#[test]
fn slack_error_field_is_backend_rejection() {
    let transport = RecordingTransport::replying(vec![RecordingTransport::ok(
        200,
        r#"{"ok":false,"error":"invalid_auth"}"#,
    )]);

    let err = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &token_config())
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotifyBackendRejected);
    assert_eq!(err.details["reason"], "invalid_auth");
    assert_eq!(err.details["backend"], "token");
}

#[test]
fn unreachable_slack_is_retryable_transport_failure() {
    let transport = RecordingTransport::replying(vec![RecordingTransport::unreachable()]);

    let err = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &token_config())
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotifyTransportFailed);
    assert_eq!(err.retryable, Some(true));
    assert!(err.code.is_notification());
}

#[test]
fn webhook_posts_markdown_attachment() {
    let transport = RecordingTransport::replying(vec![RecordingTransport::ok(200, "ok")]);

    let result = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Success, &context(), &webhook_config())
        .unwrap();

    assert_eq!(result.backends, vec![Backend::Webhook]);

    let (url, body) = only_post(&transport);
    assert_eq!(url, WEBHOOK);
    let attachment = &body["attachments"][0];
    assert_eq!(attachment["title"], "shop");
    assert_eq!(attachment["mrkdwn_in"][0], "text");
    assert_eq!(
        attachment["text"],
        "*Ada Lovelace* _<ada@example.com>_ has deployed successfully!\nTarget: *release-1.2*\nRelease: *release-1.2* - _fix bug_"
    );
}

#[test]
fn webhook_server_error_is_backend_rejection() {
    let transport =
        RecordingTransport::replying(vec![RecordingTransport::ok(500, "internal_error")]);

    let err = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &webhook_config())
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotifyBackendRejected);
    assert_eq!(err.details["backend"], "webhook");
    assert_eq!(err.details["status"], 500);
    assert_eq!(err.details["reason"], "internal_error");
}

#[test]
fn both_backends_send_token_then_webhook() {
    let transport = RecordingTransport::default();
    let config = Configuration {
        slack_webhook: Some(WEBHOOK.to_string()),
        ..token_config()
    };

    let result = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &config)
        .unwrap();

    assert_eq!(result.backends, vec![Backend::Token, Backend::Webhook]);
    let requests = transport.requests.borrow();
    assert_eq!(requests.len(), 2);
    assert!(matches!(requests[0], Request::Get { .. }));
    assert!(matches!(requests[1], Request::Post { .. }));
}

#[test]
fn webhook_failure_after_token_delivery_is_partial() {
    let transport = RecordingTransport::replying(vec![
        RecordingTransport::ok(200, r#"{"ok":true}"#),
        RecordingTransport::ok(500, "boom"),
    ]);
    let config = Configuration {
        slack_webhook: Some(WEBHOOK.to_string()),
        ..token_config()
    };

    let result = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Success, &context(), &config)
        .unwrap();

    assert_eq!(transport.request_count(), 2);
    assert_eq!(result.status, DeliveryStatus::Delivered);
    assert!(result.is_delivered());
    assert_eq!(result.backends, vec![Backend::Token]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].backend, Backend::Webhook);
    assert_eq!(result.failures[0].error_code, "notify.backend_rejected");
}

#[test]
fn token_failure_still_tries_webhook() {
    let transport = RecordingTransport::replying(vec![
        RecordingTransport::unreachable(),
        RecordingTransport::ok(200, "ok"),
    ]);
    let config = Configuration {
        slack_webhook: Some(WEBHOOK.to_string()),
        ..token_config()
    };

    let result = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &config)
        .unwrap();

    assert_eq!(transport.request_count(), 2);
    assert_eq!(result.backends, vec![Backend::Webhook]);
    assert_eq!(result.failures[0].backend, Backend::Token);
    assert_eq!(result.failures[0].retryable, Some(true));
}

#[test]
fn every_backend_failing_returns_first_error() {
    let transport = RecordingTransport::replying(vec![
        RecordingTransport::unreachable(),
        RecordingTransport::ok(500, "boom"),
    ]);
    let config = Configuration {
        slack_webhook: Some(WEBHOOK.to_string()),
        ..token_config()
    };

    let err = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &config)
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotifyTransportFailed);
    assert_eq!(transport.request_count(), 2);
}

#[test]
fn serialized_result_omits_empty_failures() {
    let transport = RecordingTransport::default();

    let result = Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Start, &context(), &token_config())
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "delivered");
    assert_eq!(json["backends"], serde_json::json!(["token"]));
    assert!(json.get("failures").is_none());
}

#[test]
fn configured_success_color_wins() {
    let transport = RecordingTransport::replying(vec![RecordingTransport::ok(200, "ok")]);
    let config = Configuration {
        slack_success_color: Some("#ff0000".to_string()),
        ..webhook_config()
    };

    Dispatcher::new(&transport)
        .with_os_user("ci")
        .notify(NotifyEvent::Success, &context(), &config)
        .unwrap();

    let (_, body) = only_post(&transport);
    assert_eq!(body["attachments"][0]["color"], "#ff0000");
}

#[test]
fn every_placeholder_key_resolves() {
    let ctx = context();
    let placeholders = Placeholders::new(&ctx, "ci", "shop");
    let template_text: String = PLACEHOLDER_KEYS
        .iter()
        .map(|key| format!("{{{{{}}}}} ", key))
        .collect();

    let rendered = placeholders.render(&template_text);

    assert!(template::unresolved(&rendered).is_empty());
    assert!(!rendered.contains("{{"));
    assert!(rendered.contains("web1.example.com"));
    assert!(rendered.contains("ada@example.com"));
}

#[test]
fn unknown_placeholder_is_left_verbatim() {
    let placeholders = Placeholders::new(&context(), "ci", "shop");
    assert_eq!(
        placeholders.render("{{host}} {{nope}}"),
        "web1.example.com {{nope}}"
    );
}
