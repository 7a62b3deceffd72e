use std::env;
use std::sync::Arc;

use icy_portal::{
    Accessory, AccessoryState, Bridge, MessageLogMode, PortalClient, DEFAULT_REFRESH_INTERVAL,
};

struct PrintingAccessory;

impl Accessory for PrintingAccessory {
    fn update(&self, state: &AccessoryState) {
        println!(
            "{} -> {} | current: {:?} | target: {:?}",
            state.current_temperature,
            state.target_temperature,
            state.current_state,
            state.target_state,
        );
    }
}

#[tokio::main]
async fn main() -> icy_portal::Result<()> {
    tracing_subscriber::fmt::init();

    let username = env::var("PORTAL_USERNAME").expect("PORTAL_USERNAME not set");
    let password = env::var("PORTAL_PASSWORD").expect("PORTAL_PASSWORD not set");
    let log_path = env::args().nth(1);

    let mut builder = PortalClient::builder();
    if let Some(path) = log_path {
        builder = builder.message_log(MessageLogMode::Diffed, path);
    }
    let client = builder.build()?;

    println!("Logging in as {username}...");
    let bridge = Bridge::connect(client, &username, &password, Arc::new(PrintingAccessory)).await?;
    println!("Connected. Refreshing every {}s, Ctrl-C to stop.", DEFAULT_REFRESH_INTERVAL.as_secs());

    let refresh = bridge.spawn_refresh(DEFAULT_REFRESH_INTERVAL)?;
    tokio::signal::ctrl_c().await?;
    refresh.stop().await;
    Ok(())
}
