//! Forwards configuration from a local `.env` file to the compiler so the
//! constants in `src/config.rs` can pick it up through `option_env!`.

const FORWARDED_KEYS: &[&str] = &[
    "WIFI_SSID",
    "WIFI_PASSWORD",
    "MQTT_HOST",
    "MQTT_PORT",
    "MQTT_CLIENT_ID",
    "MQTT_TOPIC_PREFIX",
];

fn main() {
    println!("cargo:rerun-if-changed=.env");

    if let Ok(entries) = dotenvy::dotenv_iter() {
        for (key, value) in entries.flatten() {
            if FORWARDED_KEYS.contains(&key.as_str()) {
                println!("cargo:rustc-env={key}={value}");
            }
        }
    }

    for key in FORWARDED_KEYS {
        println!("cargo:rerun-if-env-changed={key}");
    }
}
