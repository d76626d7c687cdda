//! Request handling for the stateless webhook receiver.
//!
//! Two request kinds arrive from the provider hub:
//! - a GET handshake carrying a challenge token, answered by echoing the
//!   token and emitting a subscribe/unsubscribe confirmation event;
//! - a POST delivery carrying a signed JSON body and a notification id,
//!   verified and deduplicated before a stream event is emitted.
//!
//! The HTTP response is a fixed plain-text success regardless of
//! authentication or dedup outcome, so a caller cannot probe the
//! verification result. The CGI environment is passed in explicitly to keep
//! this module testable.

use std::collections::HashMap;

use crate::domain::types::{NotificationEvent, PARAM_SERVER, PARAM_USER_ID};
use crate::webhook::dedup::DedupStore;
use crate::webhook::signature::verify_signature;

/// Fixed response body returned for every request that does not echo a
/// challenge token.
pub const SUCCESS_BODY: &str = "OK\n";

/// The parts of an inbound HTTP request the receiver consumes.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub method: String,
    pub query: String,
    pub body: Vec<u8>,
    /// `X-Hub-Signature` header, `sha256=<hex>`.
    pub signature: Option<String>,
    /// Provider notification id header, required for dedup.
    pub notification_id: Option<String>,
}

/// What handling a request produced: the response body to emit, and at most
/// one event to push onto the target server's queue.
#[derive(Debug)]
pub struct Outcome {
    pub response: String,
    pub event: Option<(String, NotificationEvent)>,
}

impl Outcome {
    fn ack() -> Self {
        Self {
            response: SUCCESS_BODY.to_string(),
            event: None,
        }
    }
}

pub struct Receiver<'a> {
    secret: &'a [u8],
    store: &'a DedupStore,
}

impl<'a> Receiver<'a> {
    pub fn new(secret: &'a [u8], store: &'a DedupStore) -> Self {
        Self { secret, store }
    }

    pub fn handle(&self, request: &WebhookRequest) -> Outcome {
        let args = parse_query(&request.query);
        let Some(server) = args.get(PARAM_SERVER).cloned() else {
            tracing::warn!("request without a {PARAM_SERVER} parameter");
            return Outcome::ack();
        };
        tracing::info!("server={server}");
        if request.method == "GET" {
            self.handshake(&server, args)
        } else {
            self.delivery(&server, args, request)
        }
    }

    /// Challenge handshake. A callback without a user id parameter gets the
    /// fixed success body, challenge unanswered. Otherwise the challenge is
    /// echoed verbatim; a confirmation event is emitted only when the user
    /// id embedded in the topic matches the one in the callback query.
    fn handshake(&self, server: &str, args: HashMap<String, String>) -> Outcome {
        let Some(callback_user_id) = args.get(PARAM_USER_ID).cloned() else {
            tracing::warn!("handshake without a {PARAM_USER_ID} parameter");
            return Outcome::ack();
        };
        let Some(challenge) = args.get("hub.challenge").cloned() else {
            return Outcome::ack();
        };
        let mode = args.get("hub.mode").cloned().unwrap_or_default();
        let topic = args.get("hub.topic").cloned().unwrap_or_default();
        tracing::info!("handshake mode={mode} topic={topic}");
        let mut event = None;
        if let Some(topic_user_id) = topic_user_id(&topic) {
            if topic_user_id == callback_user_id {
                event = match mode.as_str() {
                    "subscribe" => Some(NotificationEvent::Subscribe { args }),
                    "unsubscribe" => Some(NotificationEvent::Unsubscribe { args }),
                    other => {
                        tracing::warn!("unknown handshake mode '{other}'");
                        None
                    }
                };
            } else {
                tracing::error!(
                    "user id mismatch: callback={callback_user_id} topic={topic_user_id}"
                );
            }
        }

        Outcome {
            response: challenge,
            event: event.map(|e| (server.to_string(), e)),
        }
    }

    /// Signed delivery. Order matters: signature first, then the notification
    /// id, then the dedup window. Every exit returns the fixed success body.
    fn delivery(
        &self,
        server: &str,
        args: HashMap<String, String>,
        request: &WebhookRequest,
    ) -> Outcome {
        let Some(signature) = request.signature.as_deref() else {
            tracing::error!("delivery without a signature header");
            return Outcome::ack();
        };
        if !verify_signature(&request.body, signature, self.secret) {
            tracing::error!("signature mismatch, dropping delivery");
            return Outcome::ack();
        }
        let Some(id) = request.notification_id.as_deref() else {
            tracing::info!("no notification id");
            return Outcome::ack();
        };
        tracing::info!("notification {id}");
        if self.store.check_and_record(server, id) {
            return Outcome::ack();
        }
        let data = match serde_json::from_slice::<serde_json::Value>(&request.body) {
            Ok(serde_json::Value::Object(mut obj)) => match obj.remove("data") {
                Some(serde_json::Value::Array(data)) => data,
                _ => {
                    tracing::error!("delivery body has no data array");
                    return Outcome::ack();
                }
            },
            Ok(_) => {
                tracing::error!("delivery body is not an object");
                return Outcome::ack();
            }
            Err(e) => {
                tracing::error!("undecodable delivery body: {e}");
                return Outcome::ack();
            }
        };
        Outcome {
            response: SUCCESS_BODY.to_string(),
            event: Some((
                server.to_string(),
                NotificationEvent::Stream {
                    args,
                    data,
                    id: id.to_string(),
                },
            )),
        }
    }
}

/// Parses a query string into a map; the first value wins for repeated keys.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut args = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        args.entry(key.into_owned()).or_insert(value.into_owned());
    }
    args
}

/// Extracts the user id from a topic URL. The topic is itself parsed as a
/// query string, so `https://host/streams?user_id=123` yields a single pair
/// whose key ends in `user_id`.
fn topic_user_id(topic: &str) -> Option<String> {
    url::form_urlencoded::parse(topic.as_bytes())
        .find(|(key, _)| key.ends_with("user_id"))
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::signature::{compute_signature, format_signature_header};

    const SECRET: &[u8] = b"test-secret";

    fn store() -> (tempfile::TempDir, DedupStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::new(dir.path());
        (dir, store)
    }

    fn handshake_query(server: &str, user_id: &str, topic_user_id: &str) -> String {
        format!(
            "herald.server={server}&herald.user_id={user_id}\
             &hub.mode=subscribe&hub.challenge=tok-xyz\
             &hub.topic=https%3A%2F%2Fapi.twitch.tv%2Fhelix%2Fstreams%3Fuser_id%3D{topic_user_id}"
        )
    }

    fn delivery_request(server: &str, id: Option<&str>, body: &[u8], secret: &[u8]) -> WebhookRequest {
        WebhookRequest {
            method: "POST".into(),
            query: format!("{PARAM_SERVER}={server}"),
            body: body.to_vec(),
            signature: Some(format_signature_header(&compute_signature(body, secret))),
            notification_id: id.map(str::to_string),
        }
    }

    #[test]
    fn matching_handshake_echoes_challenge_and_emits_confirm() {
        let (_dir, store) = store();
        let receiver = Receiver::new(SECRET, &store);
        let request = WebhookRequest {
            method: "GET".into(),
            query: handshake_query("42", "123", "123"),
            ..Default::default()
        };
        let outcome = receiver.handle(&request);
        assert_eq!(outcome.response, "tok-xyz");
        let (server, event) = outcome.event.expect("confirm event");
        assert_eq!(server, "42");
        assert!(matches!(event, NotificationEvent::Subscribe { .. }));
        assert_eq!(event.user_id(), Some("123"));
    }

    #[test]
    fn mismatched_handshake_emits_nothing() {
        let (_dir, store) = store();
        let receiver = Receiver::new(SECRET, &store);
        let request = WebhookRequest {
            method: "GET".into(),
            query: handshake_query("42", "123", "999"),
            ..Default::default()
        };
        let outcome = receiver.handle(&request);
        assert_eq!(outcome.response, "tok-xyz");
        assert!(outcome.event.is_none());
    }

    #[test]
    fn valid_delivery_emits_stream_event() {
        let (_dir, store) = store();
        let receiver = Receiver::new(SECRET, &store);
        let body = br#"{"data":[{"user_id":"7","title":"hi"}]}"#;
        let outcome = receiver.handle(&delivery_request("42", Some("n1"), body, SECRET));
        assert_eq!(outcome.response, SUCCESS_BODY);
        let (server, event) = outcome.event.expect("stream event");
        assert_eq!(server, "42");
        match event {
            NotificationEvent::Stream { data, id, .. } => {
                assert_eq!(id, "n1");
                assert_eq!(data.len(), 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn bad_signature_never_enqueues() {
        let (_dir, store) = store();
        let receiver = Receiver::new(SECRET, &store);
        let body = br#"{"data":[{"user_id":"7"}]}"#;
        let mut request = delivery_request("42", Some("n1"), body, b"wrong-secret");
        let outcome = receiver.handle(&request);
        assert_eq!(outcome.response, SUCCESS_BODY);
        assert!(outcome.event.is_none());

        request.signature = None;
        let outcome = receiver.handle(&request);
        assert_eq!(outcome.response, SUCCESS_BODY);
        assert!(outcome.event.is_none());
    }

    #[test]
    fn missing_notification_id_is_dropped() {
        let (_dir, store) = store();
        let receiver = Receiver::new(SECRET, &store);
        let body = br#"{"data":[]}"#;
        let outcome = receiver.handle(&delivery_request("42", None, body, SECRET));
        assert_eq!(outcome.response, SUCCESS_BODY);
        assert!(outcome.event.is_none());
    }

    #[test]
    fn duplicate_id_enqueues_exactly_once() {
        let (_dir, store) = store();
        let receiver = Receiver::new(SECRET, &store);
        let body = br#"{"data":[{"user_id":"7"}]}"#;
        let request = delivery_request("42", Some("abc123"), body, SECRET);

        let first = receiver.handle(&request);
        assert_eq!(first.response, SUCCESS_BODY);
        assert!(matches!(
            first.event,
            Some((_, NotificationEvent::Stream { .. }))
        ));

        let second = receiver.handle(&request);
        assert_eq!(second.response, SUCCESS_BODY);
        assert!(second.event.is_none());
    }

    #[test]
    fn missing_server_parameter_is_ignored() {
        let (_dir, store) = store();
        let receiver = Receiver::new(SECRET, &store);
        let request = WebhookRequest {
            method: "GET".into(),
            query: "hub.challenge=tok".into(),
            ..Default::default()
        };
        let outcome = receiver.handle(&request);
        assert_eq!(outcome.response, SUCCESS_BODY);
        assert!(outcome.event.is_none());
    }

    #[test]
    fn handshake_without_user_id_does_not_echo_challenge() {
        let (_dir, store) = store();
        let receiver = Receiver::new(SECRET, &store);
        let request = WebhookRequest {
            method: "GET".into(),
            query: format!(
                "{PARAM_SERVER}=42&hub.mode=subscribe&hub.challenge=tok-xyz\
                 &hub.topic=https%3A%2F%2Fapi.twitch.tv%2Fhelix%2Fstreams%3Fuser_id%3D123"
            ),
            ..Default::default()
        };
        let outcome = receiver.handle(&request);
        assert_eq!(outcome.response, SUCCESS_BODY);
        assert!(outcome.event.is_none());
    }

    #[test]
    fn topic_user_id_parses_full_topic_url() {
        assert_eq!(
            topic_user_id("https://api.twitch.tv/helix/streams?user_id=55"),
            Some("55".to_string())
        );
        assert_eq!(topic_user_id("no-user-here"), None);
    }
}
