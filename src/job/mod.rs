mod model;
mod status;

pub use model::{GenerationJob, ImageParams, PollConfig, VideoParams};
pub use status::{JobStatus, Transition};
