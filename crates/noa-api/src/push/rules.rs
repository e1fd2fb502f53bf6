//! Device-type classification from vendor and model strings.

use std::fmt;

/// Session driver family for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    CiscoIos,
    CiscoNxos,
    ArubaOs,
    Fortinet,
    HpComware,
    Autodetect,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CiscoIos => "cisco_ios",
            Self::CiscoNxos => "cisco_nxos",
            Self::ArubaOs => "aruba_os",
            Self::Fortinet => "fortinet",
            Self::HpComware => "hp_comware",
            Self::Autodetect => "autodetect",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy)]
enum Field {
    Vendor,
    Model,
}

/// Containment rules, checked in order. First hit wins.
const RULES: &[(Field, &str, DeviceType)] = &[
    (Field::Model, "catalyst", DeviceType::CiscoIos),
    (Field::Model, "nexus", DeviceType::CiscoNxos),
    (Field::Vendor, "aruba", DeviceType::ArubaOs),
    (Field::Vendor, "fortigate", DeviceType::Fortinet),
    (Field::Vendor, "hpe", DeviceType::HpComware),
    (Field::Model, "ff5700", DeviceType::HpComware),
];

/// Classify a device by case-insensitive substring rules.
pub fn classify(vendor: &str, model: &str) -> DeviceType {
    let vendor = vendor.to_lowercase();
    let model = model.to_lowercase();
    RULES
        .iter()
        .find(|(field, needle, _)| match field {
            Field::Vendor => vendor.contains(needle),
            Field::Model => model.contains(needle),
        })
        .map(|(_, _, device_type)| *device_type)
        .unwrap_or(DeviceType::Autodetect)
}
