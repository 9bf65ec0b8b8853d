//! # ModKit - module system for the Stargram server
//!
//! Modules are plain structs implementing [`Module`] plus any of the optional
//! capabilities ([`DbModule`], [`RestfulModule`], [`RestHostModule`],
//! [`StatefulModule`]). The binary registers them explicitly with a
//! [`RegistryBuilder`]; the runner then drives them through ordered phases:
//! init → db → rest → start → (wait) → stop.
//!
//! ```rust,ignore
//! let registry = RegistryBuilder::default()
//!     .register(ModuleEntry::new("api_ingress", ingress.clone()).rest_host(ingress.clone()).stateful(ingress))
//!     .register(ModuleEntry::new("accounts", accounts.clone()).deps(&["api_ingress"]).db(accounts.clone()).rest(accounts))
//!     .build()?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod api;
pub mod client_hub;
pub mod context;
pub mod contracts;
pub mod registry;
pub mod runtime;

pub use api::problem::{Problem, ProblemResponse};
pub use api::{OpenApiRegistry, OperationBuilder, RequestCtx};
pub use client_hub::ClientHub;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};
pub use contracts::{DbModule, Module, RestHostModule, RestfulModule, StatefulModule};
pub use registry::{ModuleEntry, ModuleRegistry, RegistryBuilder, RegistryError};
pub use runtime::{run, RunOptions, ShutdownOptions};
