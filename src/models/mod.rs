pub mod pointer;
pub mod video;

pub use pointer::{PointerError, VideoPointer};
pub use video::{CreateVideoRequest, VideoResponse};
