use std::collections::HashSet;
use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::media::{AudioDevice, DeviceKind, MediaDeviceInfo};
use crate::traits::environment::RuntimeEnvironment;
use crate::traits::media_devices::MediaDevices;

/// Prefixes some platforms prepend to the label of a routed alias device.
const ALIAS_PREFIXES: [&str; 2] = ["default", "communications"];

/// Lists the microphones a user can pick from.
pub struct DeviceEnumerator {
    environment: Arc<dyn RuntimeEnvironment>,
    devices: Arc<dyn MediaDevices>,
}

impl DeviceEnumerator {
    pub fn new(environment: Arc<dyn RuntimeEnvironment>, devices: Arc<dyn MediaDevices>) -> Self {
        Self { environment, devices }
    }

    /// Audio inputs with normalized, unique labels in enumeration order.
    /// The first entry is the default selection.
    pub fn list_microphones(&self) -> Result<Vec<AudioDevice>, CaptureError> {
        if !self.environment.supports_device_enumeration() {
            return Err(CaptureError::UnsupportedEnvironment(
                "media device enumeration is not available".into(),
            ));
        }
        let devices = self.devices.enumerate_devices()?;
        let microphones = dedupe_microphones(devices);
        log::debug!("found {} microphone(s)", microphones.len());
        Ok(microphones)
    }
}

/// Keep audio inputs only, normalize their labels and drop repeated labels.
pub fn dedupe_microphones(devices: Vec<MediaDeviceInfo>) -> Vec<AudioDevice> {
    let mut seen = HashSet::new();
    devices
        .into_iter()
        .filter(|device| device.kind == DeviceKind::AudioInput)
        .filter_map(|device| {
            let label = normalize_label(&device.label);
            if !seen.insert(label.clone()) {
                log::debug!("skipping duplicate microphone '{}' ({})", label, device.device_id);
                return None;
            }
            Some(AudioDevice {
                device_id: device.device_id,
                label,
                group_id: device.group_id,
            })
        })
        .collect()
}

/// Strip leading "Default -" / "Communications -" prefixes, ignoring case and
/// the spacing around the dash.
pub fn normalize_label(label: &str) -> String {
    let mut current = label.trim();
    while let Some(rest) = strip_alias_prefix(current) {
        current = rest;
    }
    current.to_string()
}

fn strip_alias_prefix(label: &str) -> Option<&str> {
    ALIAS_PREFIXES.iter().find_map(|prefix| {
        let head = label.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) {
            return None;
        }
        let rest = label[prefix.len()..].trim_start().strip_prefix('-')?;
        Some(rest.trim())
    })
}
