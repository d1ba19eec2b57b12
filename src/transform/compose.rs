use crate::settings::{clamp_offset, clamp_zoom, FlipMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mirror state actually rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveFlip {
    #[default]
    Normal,
    Flipped,
}

impl EffectiveFlip {
    /// Resolve the rendered flip from the selected mode and the auto-flip state
    pub fn resolve(mode: FlipMode, auto_flip_active: bool) -> Self {
        match mode {
            FlipMode::Normal => EffectiveFlip::Normal,
            FlipMode::Flipped => EffectiveFlip::Flipped,
            FlipMode::Auto if auto_flip_active => EffectiveFlip::Flipped,
            FlipMode::Auto => EffectiveFlip::Normal,
        }
    }
}

/// One step of the composed transform, in application order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformOp {
    Translate { x: f64, y: f64 },
    Scale(f64),
    MirrorHorizontal,
}

/// The single visual transform applied to the video surface
///
/// Application order is fixed: translate by the offset, scale by the zoom,
/// then mirror. Mirroring is outermost so offset and zoom always live in the
/// unmirrored frame. The origin is the visual center of the surface.
///
/// Once the stream's natural size is known the video is cover-fitted to the
/// surface, and the zoom applies on top of that fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    pub offset_x: i32,
    pub offset_y: i32,
    pub zoom_level: f64,
    pub effective_flip: EffectiveFlip,
    /// Surface center in surface pixels
    pub origin: (f64, f64),
    /// Scale that makes the natural video cover the surface, 1.0 when unknown
    pub fit_scale: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            zoom_level: 1.0,
            effective_flip: EffectiveFlip::Normal,
            origin: (0.0, 0.0),
            fit_scale: 1.0,
        }
    }
}

impl TransformState {
    /// Compose a transform, clamping offset and zoom into their domains
    pub fn compose(
        offset: (i32, i32),
        zoom_level: f64,
        effective_flip: EffectiveFlip,
        surface_size: (u32, u32),
        natural_size: Option<(u32, u32)>,
    ) -> Self {
        Self {
            offset_x: clamp_offset(offset.0),
            offset_y: clamp_offset(offset.1),
            zoom_level: clamp_zoom(zoom_level),
            effective_flip,
            origin: (surface_size.0 as f64 / 2.0, surface_size.1 as f64 / 2.0),
            fit_scale: cover_scale(surface_size, natural_size),
        }
    }

    /// Total scale applied to the natural video
    pub fn scale(&self) -> f64 {
        self.zoom_level * self.fit_scale
    }

    pub fn operations(&self) -> Vec<TransformOp> {
        let mut ops = vec![
            TransformOp::Translate {
                x: self.offset_x as f64,
                y: self.offset_y as f64,
            },
            TransformOp::Scale(self.scale()),
        ];
        if self.effective_flip == EffectiveFlip::Flipped {
            ops.push(TransformOp::MirrorHorizontal);
        }
        ops
    }

    /// Map a point given relative to the origin through every operation
    pub fn apply_to_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.operations()
            .iter()
            .fold((x, y), |(px, py), op| match *op {
                TransformOp::Translate { x, y } => (px + x, py + y),
                TransformOp::Scale(s) => (px * s, py * s),
                TransformOp::MirrorHorizontal => (-px, py),
            })
    }

    /// CSS-style rendering: leftmost function is outermost
    pub fn to_css(&self) -> String {
        self.operations()
            .iter()
            .rev()
            .map(|op| match op {
                TransformOp::Translate { x, y } => format!("translate({}px, {}px)", x, y),
                TransformOp::Scale(s) => format!("scale({})", s),
                TransformOp::MirrorHorizontal => "scaleX(-1)".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn cover_scale(surface: (u32, u32), natural: Option<(u32, u32)>) -> f64 {
    match natural {
        Some((width, height)) if width > 0 && height > 0 && surface.0 > 0 && surface.1 > 0 => {
            let horizontal = surface.0 as f64 / width as f64;
            let vertical = surface.1 as f64 / height as f64;
            horizontal.max(vertical)
        }
        _ => 1.0,
    }
}

impl fmt::Display for TransformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (origin {:.0},{:.0})",
            self.to_css(),
            self.origin.0,
            self.origin.1
        )
    }
}
