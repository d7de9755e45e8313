//! Compile-time configuration.
//!
//! `build.rs` forwards these keys from a local `.env` file (or the ambient
//! environment) at build time. The fallbacks below suit a bench setup with
//! an MQTT broker on the local network.

/// Wireless network name. The firmware refuses to bring the radio up while
/// this is empty.
pub const WIFI_SSID: &str = match option_env!("WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};

/// Wireless network passphrase (WPA2 personal).
pub const WIFI_PASSWORD: &str = match option_env!("WIFI_PASSWORD") {
    Some(password) => password,
    None => "",
};

/// IPv4 address of the MQTT broker. Name resolution is out of scope for
/// this firmware, so this must be a literal address.
pub const MQTT_HOST: &str = match option_env!("MQTT_HOST") {
    Some(host) => host,
    None => "192.168.1.2",
};

/// MQTT broker port.
pub const MQTT_PORT: &str = match option_env!("MQTT_PORT") {
    Some(port) => port,
    None => "1883",
};

/// Client identifier presented to the broker.
pub const MQTT_CLIENT_ID: &str = match option_env!("MQTT_CLIENT_ID") {
    Some(client_id) => client_id,
    None => "esp32-sensors",
};

/// Every publish goes to a subtopic under this prefix.
pub const MQTT_TOPIC_PREFIX: &str = match option_env!("MQTT_TOPIC_PREFIX") {
    Some(prefix) => prefix,
    None => "atmo/sensors",
};
