//! REST building blocks shared by modules: the type-safe operation builder,
//! RFC 9457 problem responses and the per-request context extractor.

pub mod operation_builder;
pub mod problem;
pub mod request_ctx;

pub use operation_builder::{
    ensure_schema, state, Missing, OpenApiRegistry, OperationBuilder, OperationSpec,
    ParamLocation, ParamSpec, Present, RequestBodySpec, ResponseSpec, SchemaCollection,
};
pub use request_ctx::RequestCtx;
