pub mod audio;
pub mod instrument;
pub mod pitch;
pub mod scheduler;
pub mod storage;
pub mod types;

pub use audio::*;
pub use instrument::*;
pub use pitch::*;
pub use scheduler::*;
pub use storage::*;
pub use types::*;
