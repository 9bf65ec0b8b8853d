//! Feed module: posts with optional image uploads, likes, comments and the
//! legacy star profile cards.
//!
//! Post authors come from the accounts module through `dyn AccountsApi`;
//! other modules read the feed through [`contract::FeedApi`].

pub mod contract;
pub use contract::{CommentView, FeedApi, FeedError, PostView};

pub mod module;
pub use module::Feed;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
