pub mod client;
pub mod error;
pub mod model;

pub use client::FeedApi;
pub use error::FeedError;
pub use model::{CommentView, PostView};
