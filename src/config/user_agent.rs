use crate::config::types::CrawlerConfig;
use crate::ConfigError;
use chrono::{Datelike, Local};

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15A5370a Safari/604.1";

const TABLET_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11; SAMSUNG SM-T875) AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/14.0 Chrome/87.0.4280.141 Safari/537.36";

/// Returns the user agent used for every request
///
/// A non-empty `user-agent` wins. Otherwise the agent is derived from
/// `device`; the desktop agent carries the current two-digit year as
/// Chrome major version.
pub fn resolve_user_agent(config: &CrawlerConfig) -> Result<String, ConfigError> {
    if let Some(agent) = config.user_agent.as_deref().map(str::trim) {
        if !agent.is_empty() {
            return Ok(agent.to_string());
        }
    }
    device_user_agent(&config.device)
}

/// Maps a device name to a browser user agent
pub fn device_user_agent(device: &str) -> Result<String, ConfigError> {
    match device.trim().to_ascii_lowercase().as_str() {
        "desktop" => Ok(format!(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{:02}.0.0.0 Safari/537.36",
            Local::now().year() % 100
        )),
        "mobile" => Ok(MOBILE_USER_AGENT.to_string()),
        "tablet" => Ok(TABLET_USER_AGENT.to_string()),
        _ => Err(ConfigError::UnsupportedDevice(device.to_string())),
    }
}
