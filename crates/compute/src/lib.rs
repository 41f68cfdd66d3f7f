pub mod flows;
pub mod pipeline;

pub use flows::*;
pub use pipeline::*;
