//! rill-chat: conversation runtime
//!
//! Owns the message list, accepts questions, dispatches them through a
//! [`Transport`], and assembles the streamed answer into the conversation
//! as it arrives.

pub mod chat;
pub mod conversation;
pub mod error;
pub mod events;
pub mod handle;
pub mod session;
pub mod store;
pub mod transport;

pub use chat::{Chat, ChatConfig, Outcome, PendingQuestion, Phase};
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use events::ChatEvent;
pub use handle::ChatHandle;
pub use session::StreamSession;
pub use store::MessageStore;
pub use transport::{HttpTransport, Transport};
