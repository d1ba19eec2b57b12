use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// On-screen placement of the overlay window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Horizontal extent of the screen the window lives on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub x: i32,
    pub width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySample {
    pub window: WindowGeometry,
    pub screen: ScreenGeometry,
}

impl GeometrySample {
    /// Fraction of the screen width at which the window's horizontal center sits
    pub fn horizontal_fraction(&self) -> Option<f64> {
        if self.screen.width == 0 {
            return None;
        }
        let center = self.window.x as f64 + self.window.width as f64 / 2.0;
        Some((center - self.screen.x as f64) / self.screen.width as f64)
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.window.width, self.window.height)
    }
}

/// Supplies window and screen measurements to the presentation side
pub trait GeometrySource: Send + Sync {
    /// `None` when the geometry cannot currently be measured
    fn sample(&self) -> Option<GeometrySample>;
}

/// Geometry published by the window collaborator over a watch channel
pub struct WatchGeometrySource {
    receiver: watch::Receiver<Option<GeometrySample>>,
}

impl WatchGeometrySource {
    pub fn new(
        initial: Option<GeometrySample>,
    ) -> (watch::Sender<Option<GeometrySample>>, Self) {
        let (sender, receiver) = watch::channel(initial);
        (sender, Self { receiver })
    }
}

impl GeometrySource for WatchGeometrySource {
    fn sample(&self) -> Option<GeometrySample> {
        *self.receiver.borrow()
    }
}
