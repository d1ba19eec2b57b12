use crate::capture::DeviceInfo;
use crate::settings::{FlipMode, FrameRate, Resolution, VideoSettings};
use serde::Serialize;

pub const NO_CAMERAS_LABEL: &str = "No cameras found";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuDevice {
    pub device_id: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuChoice<T> {
    pub value: T,
    pub label: String,
    pub checked: bool,
}

/// Everything a tray menu renders
///
/// Built only from persisted settings and the last reported device list; the
/// menu keeps no state of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuState {
    pub devices: Vec<MenuDevice>,
    pub resolutions: Vec<MenuChoice<Resolution>>,
    pub frame_rates: Vec<MenuChoice<FrameRate>>,
    pub flip_modes: Vec<MenuChoice<FlipMode>>,
    pub always_on_top: bool,
    pub show_info_overlay: bool,
}

impl MenuState {
    pub fn build(settings: &VideoSettings, devices: &[DeviceInfo]) -> Self {
        let selected = settings.selected_device_id.as_deref();
        let devices = devices
            .iter()
            .enumerate()
            .map(|(idx, device)| MenuDevice {
                device_id: device.device_id.clone(),
                label: device.display_label(),
                // With nothing selected the first device is the one in use
                checked: match selected {
                    Some(id) => id == device.device_id,
                    None => idx == 0,
                },
            })
            .collect();

        Self {
            devices,
            resolutions: Resolution::ALL
                .iter()
                .map(|r| MenuChoice {
                    value: *r,
                    label: r.label().to_string(),
                    checked: *r == settings.resolution,
                })
                .collect(),
            frame_rates: FrameRate::ALL
                .iter()
                .map(|f| MenuChoice {
                    value: *f,
                    label: f.label(),
                    checked: *f == settings.frame_rate,
                })
                .collect(),
            flip_modes: FlipMode::ALL
                .iter()
                .map(|m| MenuChoice {
                    value: *m,
                    label: m.label().to_string(),
                    checked: *m == settings.flip_mode,
                })
                .collect(),
            always_on_top: settings.always_on_top,
            show_info_overlay: settings.show_info_overlay,
        }
    }

    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Labels for the device submenu, with the placeholder when empty
    pub fn device_labels(&self) -> Vec<String> {
        if self.devices.is_empty() {
            return vec![NO_CAMERAS_LABEL.to_string()];
        }
        self.devices.iter().map(|d| d.label.clone()).collect()
    }

    pub fn selected_device(&self) -> Option<&MenuDevice> {
        self.devices.iter().find(|d| d.checked)
    }

    /// Device after the checked one, wrapping around
    pub fn next_device_id(&self) -> Option<String> {
        if self.devices.is_empty() {
            return None;
        }
        let current = self.devices.iter().position(|d| d.checked).unwrap_or(0);
        let next = (current + 1) % self.devices.len();
        Some(self.devices[next].device_id.clone())
    }

    pub fn resolution(&self) -> Resolution {
        checked_value(&self.resolutions).unwrap_or_default()
    }

    pub fn frame_rate(&self) -> FrameRate {
        checked_value(&self.frame_rates).unwrap_or_default()
    }

    pub fn flip_mode(&self) -> FlipMode {
        checked_value(&self.flip_modes).unwrap_or_default()
    }
}

impl Default for MenuState {
    fn default() -> Self {
        Self::build(&VideoSettings::default(), &[])
    }
}

fn checked_value<T: Copy>(choices: &[MenuChoice<T>]) -> Option<T> {
    choices.iter().find(|c| c.checked).map(|c| c.value)
}
