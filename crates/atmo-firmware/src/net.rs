//! WiFi connection management and the network stack runner.

use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice};
use log::{error, info, warn};

use crate::config;

/// How often the connection task re-checks the link state.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Pause before retrying a failed connect attempt.
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Brings the station interface up and keeps it connected, reconnecting
/// whenever the link drops.
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>) {
    let client = ClientConfig::default()
        .with_ssid(config::WIFI_SSID.into())
        .with_password(config::WIFI_PASSWORD.into());

    if let Err(error) = controller.set_config(&ModeConfig::Client(client)) {
        error!("Failed to apply WiFi configuration: {error:?}");
        return;
    }

    if let Err(error) = controller.start() {
        error!("Failed to start the WiFi controller: {error:?}");
        return;
    }

    info!("WiFi started, connecting to '{}'", config::WIFI_SSID);

    loop {
        match controller.connect() {
            Ok(()) => {
                while !controller.is_connected().unwrap_or(false) {
                    Timer::after(POLL_INTERVAL).await;
                }

                info!("WiFi connected");

                while controller.is_connected().unwrap_or(false) {
                    Timer::after(POLL_INTERVAL).await;
                }

                warn!("WiFi link lost, reconnecting");
            }
            Err(error) => {
                error!("WiFi connect failed: {error:?}");
                Timer::after(RETRY_BACKOFF).await;
            }
        }
    }
}

/// Drives the network stack. Sockets make no progress unless this task is
/// running.
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Waits until the link is up and DHCP has handed out an address.
pub async fn wait_for_network(stack: Stack<'_>) {
    stack.wait_link_up().await;
    info!("Network link up, waiting for DHCP");

    stack.wait_config_up().await;

    if let Some(config) = stack.config_v4() {
        info!("Network up, address {}", config.address);
    }
}
