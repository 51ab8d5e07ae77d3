pub mod config;
pub mod error;
pub mod types;

pub use config::AnchorConfig;
pub use error::{AnchorError, Result};
pub use types::*;
