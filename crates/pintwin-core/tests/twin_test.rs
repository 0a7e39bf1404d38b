#![allow(clippy::unwrap_used)]
// Integration tests for `Twin` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pintwin_core::{
    ConnectivityState, CoreError, PinId, PinMode, RefreshOutcome, Twin, TwinConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn twin_for(server: &MockServer, poll_interval: Duration) -> Twin {
    let mut config = TwinConfig::new(Url::parse(&server.uri()).unwrap());
    config.poll_interval = poll_interval;
    config.debounce_delay = Duration::from_millis(50);
    Twin::new(config).unwrap()
}

fn board_state_body() -> serde_json::Value {
    json!({
        "status": {
            "time": "12:34:56",
            "temp_c": 24.5,
            "ip": "192.168.4.1",
            "ble_status": "Advertising",
            "ble_name": "pico-console",
            "wifi_ssid": "lab-net"
        },
        "adc_volts": { "adc0": 0.12, "adc1": 1.65, "adc2": 3.21 },
        "pins": [
            { "id": 5, "name": "GP5", "mode": "OUT", "value": 1, "pull": "NONE" },
            { "id": 6, "name": "GP6", "mode": "IN", "value": 0, "pull": "UP" },
            { "id": -1, "name": "GND", "mode": "FIXED" },
            { "id": 25, "name": "GP25 (LED)", "mode": "OUT", "value": 0, "pull": "NONE" }
        ],
        "server_log": ["[BOOT] console up", "[API] pin/mode/5/OUT: OK"]
    })
}

fn ack_ok(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": "ok", "message": message }))
}

// ── Refresh tests ───────────────────────────────────────────────────

#[tokio::test]
async fn refresh_applies_snapshot_and_connects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/board_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_state_body()))
        .mount(&server)
        .await;

    let twin = twin_for(&server, Duration::from_secs(60));
    assert_eq!(twin.connectivity_now(), ConnectivityState::Connecting);

    let outcome = twin.refresh().await;

    assert_eq!(outcome, RefreshOutcome::Applied);
    assert_eq!(twin.connectivity_now(), ConnectivityState::Connected);

    let snapshot = twin.current_snapshot().unwrap();
    assert_eq!(snapshot.pins.len(), 4);
    assert_eq!(snapshot.status.wifi_ssid, "lab-net");
    assert_eq!(snapshot.activity_log.len(), 2);

    let led = snapshot.pin(&PinId::Gpio(25)).unwrap();
    assert_eq!(led.mode, PinMode::Out);
    assert_eq!(led.value, Some(0));
}

#[tokio::test]
async fn concurrent_refresh_triggers_collapse_to_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/board_state"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(board_state_body())
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let twin = twin_for(&server, Duration::from_secs(60));
    let (first, second) = tokio::join!(twin.refresh(), twin.refresh());

    assert_eq!(first, RefreshOutcome::Applied);
    assert_eq!(second, RefreshOutcome::Dropped);
    server.verify().await;
}

#[tokio::test]
async fn malformed_snapshot_degrades_but_keeps_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/board_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pins": [] })))
        .mount(&server)
        .await;

    let twin = twin_for(&server, Duration::from_millis(20));
    twin.start_polling();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(twin.connectivity_now(), ConnectivityState::ApiError);
    assert!(twin.is_polling(), "soft failures must not halt the scheduler");
    assert!(twin.current_snapshot().is_none());
    twin.stop_polling();
}

#[tokio::test]
async fn unreachable_board_goes_offline_and_halts_polling() {
    // Bind a non-pooled server only to learn a dead address, then drop
    // it; pooled servers keep listening after drop.
    let server = MockServer::builder().start().await;
    let uri = server.uri();
    drop(server);

    let mut config = TwinConfig::new(Url::parse(&uri).unwrap());
    config.poll_interval = Duration::from_millis(20);
    let twin = Twin::new(config).unwrap();

    let mut connectivity = twin.connectivity();
    twin.start_polling();

    // Wait for the poll task to classify the first failure.
    tokio::time::timeout(Duration::from_secs(5), async {
        while *connectivity.borrow_and_update() != ConnectivityState::Offline {
            connectivity.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!twin.is_polling(), "offline must halt the scheduler");
}

#[tokio::test]
async fn polling_restarts_after_offline_halt() {
    let server = MockServer::builder().start().await;
    let uri = server.uri();
    drop(server);

    let mut config = TwinConfig::new(Url::parse(&uri).unwrap());
    config.poll_interval = Duration::from_millis(20);
    let twin = Twin::new(config).unwrap();

    twin.refresh().await;
    assert_eq!(twin.connectivity_now(), ConnectivityState::Offline);

    twin.start_polling();
    assert!(twin.is_polling(), "explicit restart must rearm the scheduler");
    twin.stop_polling();
}

// ── Command tests ───────────────────────────────────────────────────

#[tokio::test]
async fn toggle_sends_complement_of_current_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/board_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_state_body()))
        .mount(&server)
        .await;
    // GP5 reads high, so the toggle must drive it low.
    Mock::given(method("GET"))
        .and(path("/pin/value/5/0"))
        .respond_with(ack_ok("Pin 5 set to 0"))
        .expect(1)
        .mount(&server)
        .await;

    let twin = twin_for(&server, Duration::from_secs(60));
    twin.refresh().await;

    twin.toggle_pin(&PinId::Gpio(5)).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn toggle_rejects_non_output_pin_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/board_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_state_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pin/value/6/1"))
        .respond_with(ack_ok("unexpected"))
        .expect(0)
        .mount(&server)
        .await;

    let twin = twin_for(&server, Duration::from_secs(60));
    twin.refresh().await;

    let result = twin.toggle_pin(&PinId::Gpio(6)).await;
    assert!(matches!(result, Err(CoreError::NotAnOutput { .. })));
    assert!(result.unwrap_err().is_local());
    server.verify().await;
}

#[tokio::test]
async fn toggle_without_snapshot_is_rejected() {
    let server = MockServer::start().await;
    let twin = twin_for(&server, Duration::from_secs(60));

    let result = twin.toggle_pin(&PinId::Gpio(5)).await;
    assert!(matches!(result, Err(CoreError::NoSnapshot)));
}

#[tokio::test]
async fn command_success_triggers_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/board_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_state_body()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pin/mode/5/IN"))
        .respond_with(ack_ok("Pin 5 mode IN"))
        .expect(1)
        .mount(&server)
        .await;

    let twin = twin_for(&server, Duration::from_secs(60));
    twin.refresh().await;

    twin.set_pin_mode(&PinId::Gpio(5), PinMode::In).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn board_rejection_surfaces_as_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pin/mode/5/IN"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "error", "message": "pin is reserved" })),
        )
        .mount(&server)
        .await;

    let twin = twin_for(&server, Duration::from_secs(60));
    let mut diagnostics = twin.diagnostics();

    let result = twin.set_pin_mode(&PinId::Gpio(5), PinMode::In).await;

    assert!(matches!(result, Err(CoreError::Api(_))));
    assert_eq!(twin.connectivity_now(), ConnectivityState::ApiError);
    let line = diagnostics.recv().await.unwrap();
    assert!(line.contains("pin is reserved"), "diagnostic was: {line}");
}

#[tokio::test]
async fn pwm_validation_rejects_out_of_range_duty() {
    let server = MockServer::start().await;
    let twin = twin_for(&server, Duration::from_secs(60));

    let result = twin.set_pwm(&PinId::Gpio(2), 1000, 120.0).await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));

    let result = twin.set_pwm(&PinId::Gpio(2), 0, 50.0).await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));
}

#[tokio::test]
async fn debounced_pwm_collapses_to_trailing_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/board_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_state_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pwm/set/2/1000/75.0"))
        .respond_with(ack_ok("PWM set"))
        .expect(1)
        .mount(&server)
        .await;

    let twin = twin_for(&server, Duration::from_secs(60));
    for duty in [10.0, 30.0, 75.0] {
        twin.set_pwm_debounced(PinId::Gpio(2), 1000, duty);
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    server.verify().await;
}

// ── Wi-Fi tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn wifi_reconnect_halts_polling_and_goes_connecting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/board_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_state_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wifi/connect/lab-net/hunter2"))
        .respond_with(ack_ok("reconnecting"))
        .expect(1)
        .mount(&server)
        .await;

    let twin = twin_for(&server, Duration::from_secs(60));
    twin.start_polling();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(twin.is_polling());

    let password: secrecy::SecretString = "hunter2".to_string().into();
    twin.set_wifi_credentials("lab-net", &password).await.unwrap();

    assert_eq!(twin.connectivity_now(), ConnectivityState::Connecting);
    assert!(!twin.is_polling(), "credential change must halt the scheduler");
    server.verify().await;
}

#[tokio::test]
async fn wifi_reconnect_requires_credentials() {
    let server = MockServer::start().await;
    let twin = twin_for(&server, Duration::from_secs(60));

    let password: secrecy::SecretString = "hunter2".to_string().into();
    let result = twin.set_wifi_credentials("", &password).await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));

    let empty: secrecy::SecretString = String::new().into();
    let result = twin.set_wifi_credentials("lab-net", &empty).await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));
}
