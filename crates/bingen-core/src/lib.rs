pub mod app;
pub mod audio_graph;
pub mod audio_params;
pub mod clock;
pub mod dynamics;
pub mod loader;
pub mod patterns;
pub mod playback_engine;
pub mod rack;
pub mod voices;

pub use app::*;
pub use audio_graph::*;
pub use audio_params::*;
pub use clock::*;
pub use dynamics::*;
pub use loader::*;
pub use patterns::*;
pub use playback_engine::*;
pub use rack::*;
pub use voices::*;
