mod control;
mod menu;
mod presentation;
mod protocol;


pub use control::ControlSide;
pub use menu::{MenuChoice, MenuDevice, MenuState, NO_CAMERAS_LABEL};
pub use presentation::{enumerate_devices, PresentationSide};
pub use protocol::{
    CommandShape, ControlCommand, ControlMessage, OffsetCommand, PresentationMessage,
    SurfaceEvent, ZoomCommand,
};
