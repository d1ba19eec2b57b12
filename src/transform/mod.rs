mod auto_flip;
mod compose;
mod geometry;
mod nudge;
#[cfg(test)]
mod tests;

pub use auto_flip::{
    AutoFlipController, AutoFlipState, AutoFlipStateMachine, FlipTimerFired, HysteresisBand,
    SampleOutcome,
};
pub use compose::{EffectiveFlip, TransformOp, TransformState};
pub use geometry::{
    GeometrySample, GeometrySource, ScreenGeometry, WatchGeometrySource, WindowGeometry,
};
pub use nudge::{nudge_offset, nudge_zoom, OffsetDirection, ZoomDirection};
