pub mod client;
pub mod state;

pub use client::GoogleIdentityProvider;
pub use state::InMemoryStateStore;
