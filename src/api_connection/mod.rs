pub mod connection;
pub mod endpoints;

pub use connection::{strip_code_fences, ApiConnectionError};
pub use endpoints::{ChatMessage, MessagesRequest, MessagesResponse, Provider};
