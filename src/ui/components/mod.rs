//! Reusable UI components

pub mod auth_view;
pub mod input_bar;
pub mod message_list;
pub mod notifications;
pub mod profile_view;
pub mod projects_view;
pub mod sidebar;

pub use auth_view::AuthView;
pub use input_bar::InputBar;
pub use message_list::MessageList;
pub use notifications::Notifications;
pub use profile_view::ProfileView;
pub use projects_view::ProjectsView;
pub use sidebar::Sidebar;
