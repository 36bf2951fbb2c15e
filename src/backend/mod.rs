//! Backend abstraction layer
//!
//! The capture pass records into a [`RhiCommandList`] and asks a
//! [`CaptureTargetAllocator`] for its color target. The types here describe
//! fixed-function state independently of any GPU API; `wgpu_conversion` maps
//! them onto wgpu.

pub mod recording;
pub mod target_pool;
pub mod traits;
pub mod types;
pub mod wgpu_conversion;

pub use recording::{RecordedCommand, RecordingCommandList};
pub use target_pool::CaptureTargetPool;
pub use traits::*;
pub use types::*;
