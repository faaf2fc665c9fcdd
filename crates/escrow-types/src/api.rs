use serde::{Deserialize, Serialize};

// -- Health sidecar --

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AliveResponse {
    pub status: String,
    pub message: String,
}

impl AliveResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".into(),
            message: "Bot is alive!".into(),
        }
    }
}

/// Body of `GET /health`. `timestamp` is Unix seconds with sub-second precision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: f64,
}

impl HealthResponse {
    pub fn ok_at(now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            status: "ok".into(),
            timestamp: now.timestamp_micros() as f64 / 1_000_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alive_payload_shape() {
        let json = serde_json::to_value(AliveResponse::healthy()).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "healthy", "message": "Bot is alive!" }));
    }

    #[test]
    fn health_timestamp_keeps_fraction() {
        let now = chrono::DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        let body = HealthResponse::ok_at(now);
        assert_eq!(body.status, "ok");
        assert!((body.timestamp - 1_700_000_000.25).abs() < 1e-6);
    }
}
