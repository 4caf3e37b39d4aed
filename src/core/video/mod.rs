pub mod frame;
pub mod source;
pub mod timestamp;

pub use frame::Frame;
pub use source::{FrameSource, MemoryFrameSource, VideoFrameSource};
pub use timestamp::format_frame_timestamp;
