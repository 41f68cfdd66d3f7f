pub mod bubbles;
pub mod interact;
pub mod labels;
pub mod layer;
pub mod map;
pub mod profiles;
pub mod scales;
pub mod symbology;
pub mod viewport;

pub use layer::*;
