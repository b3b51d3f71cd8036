pub mod client;
pub mod error;
pub mod types;

pub use client::{BigModelClient, GenerationService};
pub use error::BigModelError;
pub use types::{AsyncResult, ImageGenerationRequest, VideoGenerationRequest};
