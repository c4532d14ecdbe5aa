//! Server configuration.

use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (all interfaces).
    pub port: u16,

    /// Per-request timeout, bounding slow handlers and clients.
    pub request_timeout: Duration,

    /// How long in-flight connections may keep running after a shutdown
    /// signal before they are forcibly closed.
    pub graceful_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            request_timeout: Duration::from_secs(15),
            graceful_timeout: Duration::from_secs(15),
        }
    }
}

impl ServerConfig {
    /// Builder: set the listen port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder: set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder: set the shutdown grace period.
    pub fn with_graceful_timeout(mut self, timeout: Duration) -> Self {
        self.graceful_timeout = timeout;
        self
    }
}

/// Parses a human-friendly duration such as `15s`, `1m`, `500ms` or `2h`.
///
/// A bare number is read as seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }

    let (number, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };

    let number: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration {:?}", value))?;

    let seconds_for = |per_unit: u64| {
        number
            .checked_mul(per_unit)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration {:?} is too large", value))
    };

    match unit {
        "ms" => Ok(Duration::from_millis(number)),
        "s" => Ok(Duration::from_secs(number)),
        "m" => seconds_for(60),
        "h" => seconds_for(3600),
        _ => Err(format!(
            "invalid duration unit {:?} (expected ms, s, m or h)",
            unit
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.graceful_timeout, Duration::from_secs(15));
    }

    #[test]
    fn builder_methods() {
        let config = ServerConfig::default()
            .with_port(9090)
            .with_request_timeout(Duration::from_secs(5))
            .with_graceful_timeout(Duration::from_secs(60));

        assert_eq!(config.port, 9090);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.graceful_timeout, Duration::from_secs(60));
    }

    #[test]
    fn parse_durations() {
        assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration(" 15s ").unwrap(), Duration::from_secs(15));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("15x").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn parse_duration_rejects_overflowing_values() {
        assert!(parse_duration(&format!("{}m", u64::MAX)).is_err());
        assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
        // The same magnitude is still representable in seconds.
        assert!(parse_duration(&format!("{}s", u64::MAX)).is_ok());
    }
}
