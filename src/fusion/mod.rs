pub mod client;
pub mod error;
pub mod vm;

pub use client::{FusionClient, FusionConfig, DEFAULT_BASE_URL};
pub use error::FusionError;
