//! Reusable view components

pub mod input_bar;
pub mod message_list;
pub mod sidebar;
pub mod status_bar;

pub use input_bar::{InputBar, INPUT_HINT};
pub use message_list::MessageList;
pub use sidebar::Sidebar;
pub use status_bar::StatusBar;
