pub mod camera;
pub mod frame_stats;

pub use camera::{CameraInput, FlyCamera};
pub use frame_stats::{FpsSummary, FrameClock, FrameStats};
