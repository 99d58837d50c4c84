pub mod buffer;
pub mod types;

pub use buffer::ResponseBuffer;
pub use types::{ChatMessage, Role};
