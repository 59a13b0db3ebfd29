//! Contract between the window runtime and the application.

mod app;
mod clock;
mod ctx;

pub use app::{App, AppControl};
pub use clock::{FrameClock, FrameTime};
pub use ctx::FrameCtx;
