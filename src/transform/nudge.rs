use crate::settings::{clamp_offset, clamp_zoom, ZOOM_DEFAULT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomDirection {
    In,
    Out,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetDirection {
    Up,
    Down,
    Left,
    Right,
    Reset,
}

/// Resolve a zoom nudge against the current level
pub fn nudge_zoom(current: f64, direction: ZoomDirection, step: f64) -> f64 {
    let next = match direction {
        ZoomDirection::In => current + step,
        ZoomDirection::Out => current - step,
        ZoomDirection::Reset => ZOOM_DEFAULT,
    };
    clamp_zoom(next)
}

/// Resolve an offset nudge; each axis is clamped on its own
pub fn nudge_offset(current: (i32, i32), direction: OffsetDirection, step: i32) -> (i32, i32) {
    let (x, y) = current;
    match direction {
        OffsetDirection::Up => (x, clamp_offset(y - step)),
        OffsetDirection::Down => (x, clamp_offset(y + step)),
        OffsetDirection::Left => (clamp_offset(x - step), y),
        OffsetDirection::Right => (clamp_offset(x + step), y),
        OffsetDirection::Reset => (0, 0),
    }
}
