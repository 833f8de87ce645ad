mod filter;
pub mod flags;
mod folder;
pub mod format;
mod message;
mod mime;

#[cfg(test)]
pub(crate) mod testutil;

pub use filter::Filter;
pub use flags::FlagSet;
pub use folder::{discover, Folder};
pub use format::{MessageDate, Token, DEFAULT_DATE_FORMATS};
pub use message::Message;
pub use mime::MimeDocument;
