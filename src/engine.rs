//! The broadcast queue engine.
//!
//! One dedicated thread owns the playlist, the current track and its pacer,
//! and pushes rate-limited chunks into the [`Hub`], which fans them out to
//! every connected listener. Listener churn only ever touches the hub's
//! client set; it never reaches into playlist or pacer state.

mod hub;
mod pacer;
mod player;
mod thread;
mod types;

pub use hub::Hub;
pub use pacer::Pacer;
pub use player::Player;
pub use types::{Chunk, ClientId, EngineCmd, PlaybackHandle, PlaybackInfo};
