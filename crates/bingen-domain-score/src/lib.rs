pub mod blocks;
pub mod library;
pub mod midi_import;
pub mod model;
pub mod section;
pub mod tempo;

pub use blocks::*;
pub use library::*;
pub use midi_import::*;
pub use model::*;
pub use section::*;
pub use tempo::*;
