use std::sync::{Arc, Mutex};
use std::time::Duration;

use icy_portal::{
    Accessory, AccessoryState, Bridge, CurrentHeatingCoolingState, Error, Mode, PortalClient,
    TargetHeatingCoolingState, Temperature, MAX_TARGET_TEMPERATURE, MIN_TARGET_TEMPERATURE,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingAccessory {
    states: Mutex<Vec<AccessoryState>>,
}

impl RecordingAccessory {
    fn count(&self) -> usize {
        self.states.lock().unwrap().len()
    }

    fn last(&self) -> AccessoryState {
        *self.states.lock().unwrap().last().expect("no state pushed")
    }
}

impl Accessory for RecordingAccessory {
    fn update(&self, state: &AccessoryState) {
        self.states.lock().unwrap().push(*state);
    }
}

async fn mount_portal(server: &MockServer, configuration: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"serialthermostat1": "S1", "token": "T1"})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "temperature1": 20.0,
            "temperature2": 18.5,
            "configuration": configuration
        })))
        .mount(server)
        .await;
}

async fn connected_bridge(server: &MockServer) -> (Bridge, Arc<RecordingAccessory>) {
    let accessory = Arc::new(RecordingAccessory::default());
    let client = PortalClient::builder()
        .base_url(server.uri())
        .build()
        .unwrap();
    let bridge = Bridge::connect(client, "user", "pass", accessory.clone())
        .await
        .expect("connect should succeed");
    (bridge, accessory)
}

#[tokio::test]
async fn connect_pushes_initial_state() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([32, 0, 0, 0, 10, 12, 18])).await;

    let (_bridge, accessory) = connected_bridge(&server).await;
    assert_eq!(accessory.count(), 1);
    let state = accessory.last();
    assert_eq!(state.current_temperature, Temperature::from_celsius(18.5));
    assert_eq!(state.target_temperature, Temperature::from_celsius(20.0));
    assert_eq!(state.current_state, CurrentHeatingCoolingState::Heat);
    assert_eq!(state.target_state, TargetHeatingCoolingState::Auto);
}

#[tokio::test]
async fn connect_fails_when_login_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let accessory = Arc::new(RecordingAccessory::default());
    let client = PortalClient::builder()
        .base_url(server.uri())
        .build()
        .unwrap();
    let result = Bridge::connect(client, "user", "wrong", accessory.clone()).await;
    assert!(matches!(result, Err(Error::Auth(_))));
    assert_eq!(accessory.count(), 0);
}

#[tokio::test]
async fn target_mode_auto_uploads_comfort_fallback() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([32, 0, 0, 0, 10, 12, 18])).await;
    Mock::given(method("POST"))
        .and(path("/data"))
        .and(body_string_contains("temperature1=9.0"))
        .and(body_string_contains("configuration%5B%5D=32"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (bridge, _accessory) = connected_bridge(&server).await;
    bridge
        .on_target_mode_changed(TargetHeatingCoolingState::Auto)
        .await
        .unwrap();

    let client = bridge.client().lock().await;
    assert_eq!(client.target_temperature(), Temperature::from_celsius(9.0));
    assert_eq!(client.mode().unwrap(), Mode::Comfort);
}

#[tokio::test]
async fn target_mode_cool_selects_saving() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([32, 0, 0, 0, 10, 12, 18])).await;
    Mock::given(method("POST"))
        .and(path("/data"))
        .and(body_string_contains("temperature1=6.0"))
        .and(body_string_contains("configuration%5B%5D=64"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (bridge, _accessory) = connected_bridge(&server).await;
    bridge
        .on_target_mode_changed(TargetHeatingCoolingState::Cool)
        .await
        .unwrap();
}

#[tokio::test]
async fn target_temperature_change_is_uploaded() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([32, 0, 0, 0, 10, 12, 18])).await;
    Mock::given(method("POST"))
        .and(path("/data"))
        .and(body_string_contains("temperature1=22.5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (bridge, _accessory) = connected_bridge(&server).await;
    bridge.on_target_temperature_changed(22.5).await.unwrap();
}

#[tokio::test]
async fn target_temperature_snaps_to_half_degree() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([32, 0, 0, 0, 10, 12, 18])).await;
    Mock::given(method("POST"))
        .and(path("/data"))
        .and(body_string_contains("temperature1=21.5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (bridge, _accessory) = connected_bridge(&server).await;
    bridge.on_target_temperature_changed(21.3).await.unwrap();
}

#[tokio::test]
async fn invalid_target_temperature_is_never_uploaded() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([32, 0, 0, 0, 10, 12, 18])).await;
    Mock::given(method("POST"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (bridge, _accessory) = connected_bridge(&server).await;
    for bad in [f64::NAN, 95.0, MIN_TARGET_TEMPERATURE - 1.0, MAX_TARGET_TEMPERATURE + 0.5] {
        let err = bridge.on_target_temperature_changed(bad).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTemperature(_)), "{bad} gave {err}");
    }

    let client = bridge.client().lock().await;
    assert_eq!(client.target_temperature(), Temperature::from_celsius(20.0));
}

#[tokio::test]
async fn failed_upload_is_returned_not_panicked() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([32, 0, 0, 0, 10, 12, 18])).await;
    Mock::given(method("POST"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (bridge, _accessory) = connected_bridge(&server).await;
    let err = bridge.on_target_temperature_changed(22.0).await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn connect_rejects_short_configuration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"serialthermostat1": "S1", "token": "T1"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "temperature1": 20.0,
            "temperature2": 18.5,
            "configuration": [32, 0]
        })))
        .mount(&server)
        .await;

    let accessory = Arc::new(RecordingAccessory::default());
    let client = PortalClient::builder()
        .base_url(server.uri())
        .build()
        .unwrap();
    let result = Bridge::connect(client, "user", "pass", accessory.clone()).await;
    assert!(matches!(result, Err(Error::ConfigurationTooShort { len: 2 })));
    assert_eq!(accessory.count(), 0);
}

#[tokio::test]
async fn zero_refresh_interval_is_rejected() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([32, 0, 0, 0, 10, 12, 18])).await;

    let (bridge, accessory) = connected_bridge(&server).await;
    assert!(matches!(
        bridge.spawn_refresh(Duration::ZERO),
        Err(Error::InvalidInterval)
    ));
    assert_eq!(accessory.count(), 1);
}

#[tokio::test]
async fn refresh_task_ticks_until_stopped() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([64, 0, 0, 0, 10, 12, 18])).await;

    let (bridge, accessory) = connected_bridge(&server).await;
    let task = bridge.spawn_refresh(Duration::from_millis(50)).unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    task.stop().await;

    let after_stop = accessory.count();
    assert!(after_stop >= 2, "expected refresh ticks, got {after_stop} updates");
    assert_eq!(accessory.last().target_state, TargetHeatingCoolingState::Off);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(accessory.count(), after_stop, "no refresh after stop");
}

#[tokio::test]
async fn refresh_task_survives_failed_ticks() {
    let server = MockServer::start().await;
    mount_portal(&server, serde_json::json!([32, 0, 0, 0, 10, 12, 18])).await;

    let (bridge, accessory) = connected_bridge(&server).await;

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "temperature1": 21.0,
            "temperature2": 19.0,
            "configuration": [32, 0, 0, 0, 10, 12, 18]
        })))
        .mount(&server)
        .await;

    let task = bridge.spawn_refresh(Duration::from_millis(40)).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    task.stop().await;

    assert!(accessory.count() >= 2);
    assert_eq!(
        accessory.last().target_temperature,
        Temperature::from_celsius(21.0)
    );
}
