pub mod dataset;
pub mod entity;
pub mod selection;

pub use dataset::*;
pub use entity::*;
pub use selection::*;
