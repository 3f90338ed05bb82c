//! Decoding of push payloads delivered to this device.

use serde::Deserialize;

/// Text to show for a received push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingNotification {
    pub body: String,
}

#[derive(Deserialize)]
struct Envelope {
    aps: Option<Aps>,
}

#[derive(Deserialize)]
struct Aps {
    alert: Option<String>,
}

impl IncomingNotification {
    /// Decode the `message` extra of a platform push.
    ///
    /// A JSON payload `{"aps":{"alert":..}}` yields the alert text, with the
    /// literal two-character sequences `\r\n` turned into newlines. JSON
    /// without an alert yields nothing. A payload that is not such JSON is
    /// shown as-is.
    ///
    /// ```
    /// use core_push::IncomingNotification;
    ///
    /// let shown = IncomingNotification::decode(Some(r#"{"aps":{"alert":"Hi\\r\\nthere"}}"#));
    /// assert_eq!(shown.unwrap().body, "Hi\nthere");
    /// ```
    pub fn decode(payload: Option<&str>) -> Option<Self> {
        let payload = payload?;

        let body = match serde_json::from_str::<Envelope>(payload) {
            Ok(envelope) => {
                let alert = envelope.aps?.alert?;
                if alert.is_empty() {
                    return None;
                }
                alert.replace("\\r\\n", "\n")
            }
            Err(_) if payload.is_empty() => "Error".to_string(),
            Err(_) => payload.to_string(),
        };

        Some(Self { body })
    }
}
