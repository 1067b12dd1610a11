//! SOCKS5 command handling
//!
//! Parses client requests and builds replies.

mod parser;
mod reply;

pub use parser::parse_command;
pub use reply::{send_reply, send_success};
