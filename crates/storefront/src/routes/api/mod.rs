//! JSON endpoints used by the chat widgets.

pub mod chat;
