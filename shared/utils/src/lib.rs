pub mod config;
pub mod logging;
pub mod error;
pub mod picking;

pub use config::*;
pub use logging::*;
pub use error::*;
pub use picking::*;
