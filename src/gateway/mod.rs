//! Remote gateway access
//!
//! - **client**: typed async calls, one per remote capability
//! - **pipeline**: worker thread bridging the UI thread and the async client
//! - **types**: request and response shapes

pub mod client;
pub mod pipeline;
pub mod timestamp;
pub mod types;

pub use client::GatewayClient;
pub use pipeline::{GatewayCommand, GatewayEvent, GatewayPipeline, RequestTag, Waker};
pub use types::{
    AuthGrant, ChatReply, ChatSessionSummary, ContentKind, CreatedProject, Generation, Project,
    Reply, User,
};
