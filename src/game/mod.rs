pub mod demand;
pub use demand::*;

pub mod engine;
pub use engine::*;

pub mod view;
pub use view::*;
