pub mod credential;
pub mod stats;

pub use credential::*;
pub use stats::*;
