use serde::{Deserialize, Serialize};

/// A structured configuration request for one device.
///
/// Every field is plain text and required; an empty string is accepted
/// and simply gives retrieval less to work with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRequest {
    pub vendor: String,
    pub model: String,
    pub os_version: String,
    pub feature: String,
    pub parameters: String,
    pub device_ip: String,
    pub device_name: String,
}

/// Device block nested inside a webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookDevice {
    #[serde(default = "unknown")]
    pub vendor: String,
    #[serde(default = "unknown")]
    pub model: String,
    #[serde(default = "unknown")]
    pub os_version: String,
}

/// Loosely-shaped payload posted by external automation (chat bots, ITSM hooks).
///
/// Missing device attributes and feature default to `"unknown"`, the rest
/// to an empty string.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default = "unknown_device")]
    pub device: WebhookDevice,
    #[serde(default = "unknown")]
    pub feature: String,
    #[serde(default)]
    pub parameters: String,
    #[serde(default)]
    pub device_ip: String,
    #[serde(default)]
    pub device_name: String,
}

fn unknown() -> String {
    "unknown".to_string()
}

fn unknown_device() -> WebhookDevice {
    WebhookDevice {
        vendor: unknown(),
        model: unknown(),
        os_version: unknown(),
    }
}

impl From<WebhookPayload> for ConfigRequest {
    fn from(payload: WebhookPayload) -> Self {
        Self {
            vendor: payload.device.vendor,
            model: payload.device.model,
            os_version: payload.device.os_version,
            feature: payload.feature,
            parameters: payload.parameters,
            device_ip: payload.device_ip,
            device_name: payload.device_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_payload_full() {
        let json = r#"{
            "device": {"vendor": "Cisco", "model": "Catalyst 9200", "os_version": "IOS XE"},
            "feature": "VLAN",
            "parameters": "Create VLAN 30 named IoT",
            "device_ip": "10.0.0.5",
            "device_name": "access-sw-01"
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        let request = ConfigRequest::from(payload);
        assert_eq!(request.vendor, "Cisco");
        assert_eq!(request.model, "Catalyst 9200");
        assert_eq!(request.os_version, "IOS XE");
        assert_eq!(request.feature, "VLAN");
        assert_eq!(request.device_name, "access-sw-01");
    }

    #[test]
    fn webhook_payload_defaults() {
        let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
        let request = ConfigRequest::from(payload);
        assert_eq!(request.vendor, "unknown");
        assert_eq!(request.model, "unknown");
        assert_eq!(request.os_version, "unknown");
        assert_eq!(request.feature, "unknown");
        assert_eq!(request.parameters, "");
        assert_eq!(request.device_ip, "");
    }

    #[test]
    fn webhook_payload_partial_device() {
        let json = r#"{"device": {"vendor": "Aruba"}, "feature": "ntp"}"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.device.vendor, "Aruba");
        assert_eq!(payload.device.model, "unknown");
        assert_eq!(payload.feature, "ntp");
    }

    #[test]
    fn config_request_requires_all_fields() {
        let json = r#"{"vendor": "Cisco", "model": "Nexus 9000"}"#;
        assert!(serde_json::from_str::<ConfigRequest>(json).is_err());
    }
}
