use crate::error::{PushError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Platform tag the backend expects for GCM/FCM devices.
pub const PLATFORM_GCM: &str = "G";

/// Server-assigned identifier of a registered device.
///
/// # Examples
///
/// ```
/// use core_push::DeviceId;
///
/// let id = DeviceId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
/// assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    pub fn parse(s: &str) -> std::result::Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DeviceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A device as sent to and returned by `pushes/devices`.
///
/// Requests serialize as `{"token","platform","tags"}`; the `uuid` is only
/// present on entities the backend returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<DeviceId>,
}

fn default_platform() -> String {
    PLATFORM_GCM.to_string()
}

impl DeviceRegistration {
    /// Registration request for `token` with already-parsed tags.
    pub fn new(token: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            token: token.into(),
            platform: default_platform(),
            tags,
            uuid: None,
        }
    }
}

/// Outgoing push message for `POST pushes`.
///
/// `target` addresses the audience (`all`, `user`, `device`, `tag`) and `to`
/// lists the concrete recipients for the non-broadcast targets. Fields the
/// backend adds to the returned entity are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub target: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(default)]
    pub payload: Value,
    /// Comma-separated platform tags, e.g. `"I,G"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Scheduled delivery time, `YYYYMMDDhhmm`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PushMessage {
    pub fn new(target: impl Into<String>, payload: Value) -> Self {
        Self {
            target: target.into(),
            to: Vec::new(),
            payload,
            platform: None,
            reserve: None,
            memo: None,
            uuid: None,
            extra: Map::new(),
        }
    }

    /// Message whose payload carries only an alert text.
    ///
    /// ```
    /// use core_push::PushMessage;
    ///
    /// let message = PushMessage::alert("all", "Server maintenance at 2am");
    /// assert_eq!(message.payload["alert"], "Server maintenance at 2am");
    /// ```
    pub fn alert(target: impl Into<String>, text: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("alert".to_string(), Value::String(text.into()));
        Self::new(target, Value::Object(payload))
    }

    pub fn to(mut self, recipients: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.to = recipients.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_reserve(mut self, reserve: impl Into<String>) -> Self {
        self.reserve = Some(reserve.into());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Check the message can be handed to the backend.
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(PushError::Validation(
                "push message target must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a registration entry point.
///
/// Only [`RegisterOutcome::Registered`] carries a device. `Exhausted` and
/// `Cancelled` are absent results, not errors; callers must check for them.
#[derive(Debug)]
pub enum RegisterOutcome {
    /// The backend accepted the device and local state was updated.
    Registered(DeviceRegistration),
    /// No platform token existed yet; one was requested from the provider.
    AwaitingToken,
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last_error: PushError },
    /// The cancellation token fired before an attempt or during a backoff wait.
    Cancelled,
}

impl RegisterOutcome {
    pub fn registration(&self) -> Option<&DeviceRegistration> {
        match self {
            RegisterOutcome::Registered(device) => Some(device),
            _ => None,
        }
    }

    pub fn into_registration(self) -> Option<DeviceRegistration> {
        match self {
            RegisterOutcome::Registered(device) => Some(device),
            _ => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, RegisterOutcome::Registered(_))
    }
}

/// Acknowledgement of a successful unregister.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnregisterReceipt {
    /// Device the backend was asked to forget; `None` when no uuid was stored.
    pub device_id: Option<DeviceId>,
    /// Status of the delete call; `None` when no call was made.
    pub status_code: Option<u16>,
}

/// Persisted registration state plus the locally requested tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationState {
    pub registered_on_server: bool,
    pub registered_username: String,
    /// Raw comma-joined tag string sent with the last successful registration
    pub registered_tags: String,
    pub device_uuid: Option<DeviceId>,
    /// Raw tag string the caller asked for most recently
    pub requested_tags: String,
}

impl RegistrationState {
    /// Why a registration is needed, for logs. `None` when it is not.
    pub fn staleness_reason(&self, username: &str) -> Option<&'static str> {
        if !self.registered_on_server {
            Some("not registered on server")
        } else if self.registered_username != username {
            Some("signed-in user changed")
        } else if self.registered_tags != self.requested_tags {
            Some("requested tags changed")
        } else {
            None
        }
    }
}
