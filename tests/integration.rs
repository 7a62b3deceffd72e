use icy_portal::PortalClient;

/// Run with: cargo test --test integration -- --ignored
/// Requires a real portal account:
///   PORTAL_USERNAME=... PORTAL_PASSWORD=... cargo test --test integration -- --ignored
/// Read-only: never writes back to the thermostat.
#[tokio::test]
#[ignore]
async fn login_and_read_live_portal() {
    let username = std::env::var("PORTAL_USERNAME").expect("PORTAL_USERNAME not set");
    let password = std::env::var("PORTAL_PASSWORD").expect("PORTAL_PASSWORD not set");

    let mut client = PortalClient::builder().build().expect("client build failed");
    let session = client
        .login(&username, &password)
        .await
        .expect("login failed");
    assert!(!session.token.is_empty());

    let status = client.read().await.expect("read failed");
    assert!(
        status.configuration.len() >= icy_portal::MIN_CONFIGURATION_LEN,
        "configuration too short: {:?}",
        status.configuration
    );

    println!(
        "current {} / target {} / mode {:?}",
        client.temperature(),
        client.target_temperature(),
        client.mode()
    );
}
