pub mod bbox;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod projection;
pub mod rotation;
pub mod trajectory;
pub mod transform;
pub mod types;
pub mod visualization;

pub use error::{PoseError, Result};
