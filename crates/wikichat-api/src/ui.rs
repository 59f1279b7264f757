//! The self-contained chat page.
//!
//! The page fetches its title, banner, and example questions from
//! `/api/page`, so the HTML itself carries no configuration.

/// Full HTML of the chat page.
pub const CHAT_HTML: &str = include_str!("../assets/chat.html");
