pub mod base;
pub mod logging;
pub mod plex;
pub mod server;
pub mod sessions;

pub use base::*;
pub use logging::*;
pub use plex::*;
pub use server::*;
pub use sessions::*;
