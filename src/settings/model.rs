use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ZOOM_MIN: f64 = 1.0;
pub const ZOOM_MAX: f64 = 5.0;
pub const ZOOM_DEFAULT: f64 = 1.0;
pub const OFFSET_LIMIT: i32 = 200;

/// Round a zoom level to one decimal place
pub fn round_zoom(zoom: f64) -> f64 {
    (zoom * 10.0).round() / 10.0
}

/// Clamp a zoom level into its domain and round it
pub fn clamp_zoom(zoom: f64) -> f64 {
    if !zoom.is_finite() {
        return ZOOM_DEFAULT;
    }
    round_zoom(zoom.clamp(ZOOM_MIN, ZOOM_MAX))
}

pub fn clamp_offset(offset: i32) -> i32 {
    offset.clamp(-OFFSET_LIMIT, OFFSET_LIMIT)
}

/// Capture resolution choices offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    #[default]
    Default,
    Uhd2160,
    Fhd1080,
    Hd720,
    Vga480,
    Nhd360,
}

impl Resolution {
    pub const ALL: [Resolution; 6] = [
        Resolution::Default,
        Resolution::Uhd2160,
        Resolution::Fhd1080,
        Resolution::Hd720,
        Resolution::Vga480,
        Resolution::Nhd360,
    ];

    /// Width and height, or `None` when the device default applies
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Resolution::Default => None,
            Resolution::Uhd2160 => Some((3840, 2160)),
            Resolution::Fhd1080 => Some((1920, 1080)),
            Resolution::Hd720 => Some((1280, 720)),
            Resolution::Vga480 => Some((640, 480)),
            Resolution::Nhd360 => Some((640, 360)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Default => "default",
            Resolution::Uhd2160 => "3840x2160",
            Resolution::Fhd1080 => "1920x1080",
            Resolution::Hd720 => "1280x720",
            Resolution::Vga480 => "640x480",
            Resolution::Nhd360 => "640x360",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Default => "Default",
            Resolution::Uhd2160 => "4K (3840x2160)",
            Resolution::Fhd1080 => "1080p (1920x1080)",
            Resolution::Hd720 => "720p (1280x720)",
            Resolution::Vga480 => "480p (640x480)",
            Resolution::Nhd360 => "360p (640x360)",
        }
    }

    pub fn next(&self) -> Self {
        cycle(&Self::ALL, self)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown resolution '{}'", s))
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.as_str().to_string()
    }
}

/// Capture frame-rate choices offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "FrameRateRepr", into = "FrameRateRepr")]
pub enum FrameRate {
    #[default]
    Default,
    Fps60,
    Fps59_94,
    Fps50,
    Fps30,
    Fps29_97,
    Fps25,
    Fps24,
}

/// Persisted shape: the string "default" or a bare number
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FrameRateRepr {
    Number(f64),
    Text(String),
}

impl FrameRate {
    pub const ALL: [FrameRate; 8] = [
        FrameRate::Default,
        FrameRate::Fps60,
        FrameRate::Fps59_94,
        FrameRate::Fps50,
        FrameRate::Fps30,
        FrameRate::Fps29_97,
        FrameRate::Fps25,
        FrameRate::Fps24,
    ];

    pub fn value(&self) -> Option<f64> {
        match self {
            FrameRate::Default => None,
            FrameRate::Fps60 => Some(60.0),
            FrameRate::Fps59_94 => Some(59.94),
            FrameRate::Fps50 => Some(50.0),
            FrameRate::Fps30 => Some(30.0),
            FrameRate::Fps29_97 => Some(29.97),
            FrameRate::Fps25 => Some(25.0),
            FrameRate::Fps24 => Some(24.0),
        }
    }

    pub fn from_value(value: f64) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|rate| matches!(rate.value(), Some(v) if (v - value).abs() < 0.001))
    }

    pub fn label(&self) -> String {
        match self.value() {
            None => "Default".to_string(),
            Some(v) => format!("{} FPS", v),
        }
    }

    pub fn next(&self) -> Self {
        cycle(&Self::ALL, self)
    }
}

impl TryFrom<FrameRateRepr> for FrameRate {
    type Error = String;

    fn try_from(value: FrameRateRepr) -> Result<Self, Self::Error> {
        match value {
            FrameRateRepr::Text(text) if text == "default" => Ok(FrameRate::Default),
            FrameRateRepr::Text(text) => text
                .parse::<f64>()
                .ok()
                .and_then(FrameRate::from_value)
                .ok_or_else(|| format!("unknown frame rate '{}'", text)),
            FrameRateRepr::Number(n) => {
                FrameRate::from_value(n).ok_or_else(|| format!("unknown frame rate {}", n))
            }
        }
    }
}

impl From<FrameRate> for FrameRateRepr {
    fn from(value: FrameRate) -> Self {
        match value.value() {
            None => FrameRateRepr::Text("default".to_string()),
            Some(v) => FrameRateRepr::Number(v),
        }
    }
}

/// User-selected mirroring mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipMode {
    #[default]
    Normal,
    Flipped,
    Auto,
}

impl FlipMode {
    pub const ALL: [FlipMode; 3] = [FlipMode::Normal, FlipMode::Flipped, FlipMode::Auto];

    pub fn label(&self) -> &'static str {
        match self {
            FlipMode::Normal => "Normal",
            FlipMode::Flipped => "Flipped",
            FlipMode::Auto => "Auto",
        }
    }

    pub fn next(&self) -> Self {
        cycle(&Self::ALL, self)
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: &T) -> T {
    let idx = all.iter().position(|v| v == current).unwrap_or(0);
    all[(idx + 1) % all.len()]
}

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSettings {
    pub resolution: Resolution,
    pub frame_rate: FrameRate,
    pub selected_device_id: Option<String>,
    pub zoom_level: f64,
    pub offset_x: i32,
    pub offset_y: i32,
    pub flip_mode: FlipMode,
    /// Last resolved automatic flip; only read while `flip_mode` is `Auto`
    pub auto_flip_active: bool,
    pub always_on_top: bool,
    pub show_info_overlay: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::Default,
            frame_rate: FrameRate::Default,
            selected_device_id: None,
            zoom_level: ZOOM_DEFAULT,
            offset_x: 0,
            offset_y: 0,
            flip_mode: FlipMode::Normal,
            auto_flip_active: false,
            always_on_top: false,
            show_info_overlay: false,
        }
    }
}

impl VideoSettings {
    /// Force zoom and offset back into their domains
    pub fn clamp(&mut self) {
        self.zoom_level = clamp_zoom(self.zoom_level);
        self.offset_x = clamp_offset(self.offset_x);
        self.offset_y = clamp_offset(self.offset_y);
    }

    pub fn clamped(mut self) -> Self {
        self.clamp();
        self
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom_level = clamp_zoom(zoom);
    }

    pub fn set_offset(&mut self, x: i32, y: i32) {
        self.offset_x = clamp_offset(x);
        self.offset_y = clamp_offset(y);
    }
}
