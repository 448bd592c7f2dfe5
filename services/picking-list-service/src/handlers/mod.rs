pub mod health;
pub mod picking;

pub use health::*;
pub use picking::*;
