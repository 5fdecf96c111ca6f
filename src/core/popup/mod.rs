pub mod grabber;

pub use grabber::{PopupGrabCoordinator, PopupGrabber};
