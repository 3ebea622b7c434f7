//! HTTP Handlers

mod ping;
mod root;
mod video;

pub use ping::*;
pub use root::*;
pub use video::*;
