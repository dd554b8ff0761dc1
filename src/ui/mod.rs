//! UI rendering modules, organized by component:
//! - `auth`: sign-in and sign-up screens
//! - `panels`: sidebar (channels, contacts, session controls)
//! - `header`: conversation header
//! - `messages`: message feed and composer
//! - `dialogs`: modal dialogs and notices
//! - `theme`: colors and styling utilities

mod auth;
mod dialogs;
mod header;
mod messages;
mod panels;
pub mod theme;

pub use auth::{render_auth, AuthAction};
pub use dialogs::{
    render_create_channel, render_delete_confirm, render_notices, render_settings, DialogAction,
};
pub use header::render_header;
pub use messages::{render_composer, render_feed, MessageAction};
pub use panels::{render_sidebar, SidebarAction};
