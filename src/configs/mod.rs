pub mod base;
pub mod logging;
pub mod output;
pub mod player;
pub mod sources;

pub use base::*;
pub use logging::*;
pub use output::*;
pub use player::*;
pub use sources::*;
