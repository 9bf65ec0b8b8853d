//! Accounts module: registration, password and Google login, bearer sessions
//! and the password-reset lifecycle.
//!
//! Other modules depend only on [`contract`]: they resolve
//! `dyn AccountsApi` from the `ClientHub` to verify bearer tokens and look up
//! users.

pub mod contract;
pub use contract::{AccountsApi, AccountsError, SessionUser, User};

pub mod module;
pub use module::Accounts;

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
