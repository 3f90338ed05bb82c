use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{HttpClient, HttpRequest, HttpResponse, PushProvider, SettingsStore};
use core_push::FixedJitter;
use core_service::{
    ApiEndpoint, CoreError, CoreEvent, MessageEvent, PlatformPushEvent, PushConfig, PushError,
    PushMessage, PushService, RegisterOutcome,
};
use mockall::mock;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

#[derive(Default)]
struct MemorySettings {
    strings: Mutex<HashMap<String, String>>,
    bools: Mutex<HashMap<String, bool>>,
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.strings.lock().await.insert(key.into(), value.into());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.strings.lock().await.get(key).cloned())
    }

    async fn set_bool(&self, key: &str, value: bool) -> BridgeResult<()> {
        self.bools.lock().await.insert(key.into(), value);
        Ok(())
    }

    async fn get_bool(&self, key: &str) -> BridgeResult<Option<bool>> {
        Ok(self.bools.lock().await.get(key).copied())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.strings.lock().await.remove(key);
        self.bools.lock().await.remove(key);
        Ok(())
    }

    async fn has_key(&self, key: &str) -> BridgeResult<bool> {
        Ok(self.strings.lock().await.contains_key(key)
            || self.bools.lock().await.contains_key(key))
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        let mut keys: Vec<String> = self.strings.lock().await.keys().cloned().collect();
        keys.extend(self.bools.lock().await.keys().cloned());
        Ok(keys)
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.strings.lock().await.clear();
        self.bools.lock().await.clear();
        Ok(())
    }
}

#[derive(Default)]
struct StubProvider {
    token: String,
    register_calls: AtomicUsize,
}

#[async_trait]
impl PushProvider for StubProvider {
    async fn registration_token(&self) -> BridgeResult<String> {
        Ok(self.token.clone())
    }

    async fn register(&self, _sender_id: &str) -> BridgeResult<()> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn unregister(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn is_registered_locally(&self) -> BridgeResult<bool> {
        Ok(false)
    }

    async fn mark_registered_locally(&self, _registered: bool) -> BridgeResult<()> {
        Ok(())
    }
}

const DEVICE_UUID: &str = "6fa459ea-ee8a-3ca4-894e-db77e160355e";

fn created_response() -> BridgeResult<HttpResponse> {
    Ok(HttpResponse::new(
        201,
        serde_json::to_vec(&json!({"entities": [{"uuid": DEVICE_UUID, "token": "tok"}]})).unwrap(),
    ))
}

fn service_with(http: MockHttpClient, provider: StubProvider) -> PushService {
    let config = PushConfig::builder()
        .api_endpoint(ApiEndpoint::new("https://api.example.com", "acme", "news"))
        .sender_id("123456789012")
        .http_client(Arc::new(http))
        .settings_store(Arc::new(MemorySettings::default()))
        .push_provider(Arc::new(provider))
        .build()
        .expect("valid config");

    PushService::new(config)
        .expect("service")
        .with_jitter(Arc::new(FixedJitter(Duration::ZERO)))
}

fn service(http: MockHttpClient) -> PushService {
    service_with(http, StubProvider::default())
}

#[tokio::test]
async fn register_persists_state() {
    let mut http = MockHttpClient::new();
    http.expect_execute().times(1).returning(|_| created_response());
    let service = service(http);

    let outcome = service.register("tok").await.unwrap();

    assert!(outcome.is_registered());
    let state = service.registration_state().await.unwrap();
    assert!(state.registered_on_server);
    assert_eq!(state.device_uuid.unwrap().to_string(), DEVICE_UUID);
}

#[tokio::test]
async fn register_current_device_without_token_asks_platform() {
    let mut http = MockHttpClient::new();
    http.expect_execute().never();
    let provider = StubProvider::default();
    let service = service_with(http, provider);

    let outcome = service.register_current_device().await.unwrap();

    assert!(matches!(outcome, RegisterOutcome::AwaitingToken));
}

#[tokio::test]
async fn shutdown_cancels_registration() {
    let mut http = MockHttpClient::new();
    http.expect_execute().never();
    let service = service(http);

    service.shutdown();

    assert!(service.is_shut_down());
    let outcome = service.register("tok").await.unwrap();
    assert!(matches!(outcome, RegisterOutcome::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_backoff_ends_retry_loop() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(503, "")));
    let service = service(http);

    let worker = service.clone();
    let handle = tokio::spawn(async move { worker.register("tok").await });

    tokio::time::sleep(Duration::from_millis(500)).await;
    service.shutdown();

    let outcome = handle.await.unwrap().unwrap();
    assert!(matches!(outcome, RegisterOutcome::Cancelled));
}

#[tokio::test]
async fn send_push_validates_before_network() {
    let mut http = MockHttpClient::new();
    http.expect_execute().never();
    let service = service(http);

    let err = service
        .send_push(&PushMessage::alert("  ", "hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Push(PushError::Validation(_))));
}

#[tokio::test]
async fn unregister_on_empty_state_is_not_registered() {
    let mut http = MockHttpClient::new();
    http.expect_execute().never();
    let service = service(http);

    let err = service.unregister().await.unwrap_err();
    assert!(matches!(err.as_push(), Some(PushError::NotRegistered)));
}

#[tokio::test]
async fn platform_unregistered_on_empty_state_is_not_an_error() {
    let mut http = MockHttpClient::new();
    http.expect_execute().never();
    let service = service(http);

    service
        .handle_platform_event(PlatformPushEvent::Unregistered {
            token: "tok".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn platform_registered_registers_token() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|req| req.body.as_ref().is_some_and(|b| b.as_ref().windows(9).any(|w| w == b"fresh-tok")))
        .times(1)
        .returning(|_| created_response());
    let service = service(http);

    service
        .handle_platform_event(PlatformPushEvent::Registered {
            token: "fresh-tok".to_string(),
        })
        .await
        .unwrap();

    assert!(service.registration_state().await.unwrap().registered_on_server);
}

#[tokio::test]
async fn platform_message_emits_received_event() {
    let service = service(MockHttpClient::new());
    let mut events = service.subscribe_events();

    service
        .handle_platform_event(PlatformPushEvent::Message {
            payload: Some(r#"{"aps":{"alert":"Line one\\r\\nLine two"}}"#.to_string()),
        })
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        CoreEvent::Message(MessageEvent::Received { body }) => {
            assert_eq!(body, "Line one\nLine two");
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn platform_message_without_alert_emits_nothing() {
    let service = service(MockHttpClient::new());
    let mut events = service.subscribe_events();

    service
        .handle_platform_event(PlatformPushEvent::Message {
            payload: Some(r#"{"aps":{"badge":3}}"#.to_string()),
        })
        .await
        .unwrap();

    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn platform_errors_are_reported() {
    let service = service(MockHttpClient::new());
    let mut events = service.subscribe_events();

    service
        .handle_platform_event(PlatformPushEvent::Error {
            code: "SERVICE_NOT_AVAILABLE".to_string(),
        })
        .await
        .unwrap();
    service
        .handle_platform_event(PlatformPushEvent::RecoverableError {
            code: "TIMEOUT".to_string(),
        })
        .await
        .unwrap();

    let first = events.recv().await.unwrap();
    let second = events.recv().await.unwrap();
    assert!(matches!(
        first,
        CoreEvent::Message(MessageEvent::PlatformError { ref code, recoverable: false }) if code == "SERVICE_NOT_AVAILABLE"
    ));
    assert!(matches!(
        second,
        CoreEvent::Message(MessageEvent::PlatformError { recoverable: true, .. })
    ));
}

#[tokio::test]
async fn background_register_resolves() {
    let mut http = MockHttpClient::new();
    http.expect_execute().times(1).returning(|_| created_response());
    let service = service(http);

    let task = service.spawn_register("tok").unwrap();
    let outcome = task.wait().await.unwrap();

    assert!(outcome.is_registered());
}

#[tokio::test(start_paused = true)]
async fn background_cancel_stops_only_that_task() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(502, "")));
    let service = service(http);

    let mut task = service.spawn_register("tok").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(task.try_result().is_none());

    task.cancel();
    let outcome = task.wait().await.unwrap();

    assert!(matches!(outcome, RegisterOutcome::Cancelled));
    assert!(!service.is_shut_down());
}

#[tokio::test]
async fn background_callback_receives_result() {
    let mut http = MockHttpClient::new();
    http.expect_execute().never();
    let service = service(http);
    let (tx, rx) = tokio::sync::oneshot::channel();

    let task = service
        .spawn_send_push_with(PushMessage::alert("", "hi"), move |result| {
            let _ = tx.send(result);
        })
        .unwrap();

    task.wait().await.unwrap();
    let result = rx.await.unwrap();
    assert!(matches!(result, Err(CoreError::Push(PushError::Validation(_)))));
}

#[test]
fn background_without_runtime_fails() {
    let service = service(MockHttpClient::new());

    assert!(matches!(
        service.spawn_unregister(),
        Err(CoreError::NoRuntime)
    ));
}

#[test]
fn background_wait_blocking_from_plain_thread() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut http = MockHttpClient::new();
    http.expect_execute().times(1).returning(|_| created_response());
    let service = service(http);

    let task = {
        let _guard = runtime.enter();
        service.spawn_register("tok").unwrap()
    };

    let outcome = task.wait_blocking().unwrap();
    assert!(outcome.is_registered());
}

#[test]
fn blocking_api_outside_runtime() {
    let mut http = MockHttpClient::new();
    http.expect_execute().times(1).returning(|_| created_response());
    let service = service(http);
    let blocking = service.blocking();

    let outcome = blocking.register("tok").unwrap();
    assert!(outcome.is_registered());

    let err = blocking.register_if_needed("tok").unwrap_err();
    assert!(matches!(err, CoreError::Push(PushError::AlreadyRegistered)));
}

#[tokio::test]
async fn blocking_api_inside_runtime_is_rejected() {
    let service = service(MockHttpClient::new());

    let err = service.blocking().unregister().unwrap_err();
    assert!(matches!(err, CoreError::BlockingInAsyncContext));
}

#[test]
fn disabled_push_rejects_operations() {
    let config = PushConfig::builder()
        .api_endpoint(ApiEndpoint::new("https://api.example.com", "acme", "news"))
        .enable_push(false)
        .http_client(Arc::new(MockHttpClient::new()))
        .settings_store(Arc::new(MemorySettings::default()))
        .push_provider(Arc::new(StubProvider::default()))
        .build()
        .unwrap();
    let service = PushService::new(config).unwrap();

    let err = service.blocking().register("tok").unwrap_err();
    assert!(matches!(err, CoreError::Push(PushError::Config(_))));
}
