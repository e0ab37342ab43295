//! Bakes factory defaults from a `.env` file into the firmware.
//!
//! Every variable listed in `FACTORY_KEYS` is forwarded as a compile-time
//! environment variable when present, either from the process environment or
//! from the nearest `.env` file. Missing keys simply leave the field empty.

const FACTORY_KEYS: [&str; 6] = [
    "AICU_WIFI_SSID",
    "AICU_WIFI_PASSWORD",
    "AICU_ACCOUNT_EMAIL",
    "AICU_ACCOUNT_PASSWORD",
    "AICU_FLOW_ID",
    "AICU_BASE_URL",
];

fn main() {
    if let Ok(path) = dotenvy::dotenv() {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    for key in FACTORY_KEYS {
        println!("cargo:rerun-if-env-changed={key}");
        if let Ok(value) = std::env::var(key) {
            println!("cargo:rustc-env={key}={value}");
        }
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
