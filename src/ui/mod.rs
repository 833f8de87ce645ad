mod folders;
mod index;
mod message;
mod pane;
mod status;

pub use folders::*;
pub use index::*;
pub use message::*;
pub use status::*;
