use std::collections::BTreeMap;

use modkit::api::{OperationSpec, ParamLocation};
use serde_json::{json, Map, Value};

use crate::model::ComponentsRegistry;

#[derive(serde::Serialize)]
pub struct OpenApi {
    pub openapi: &'static str,
    pub info: OpenApiInfo,
    pub paths: BTreeMap<String, BTreeMap<String, Value>>,
    pub components: OpenApiComponents,
}

#[derive(serde::Serialize)]
pub struct OpenApiInfo {
    pub title: &'static str,
    pub version: String,
    pub description: Option<&'static str>,
}

#[derive(serde::Serialize, Default)]
pub struct OpenApiComponents {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Value>,
    #[serde(rename = "securitySchemes", skip_serializing_if = "BTreeMap::is_empty")]
    pub security_schemes: BTreeMap<String, Value>,
}

const BEARER_SCHEME: &str = "bearerAuth";

/// Schema for a content type: a `$ref` when the component is known, otherwise
/// a minimal inline schema.
fn make_schema(components: &ComponentsRegistry, content_type: &str, schema_name: Option<&str>) -> Value {
    if let Some(name) = schema_name {
        if components.has_schema(name) {
            return json!({ "$ref": format!("#/components/schemas/{name}") });
        }
    }
    match content_type {
        "application/json" | "application/problem+json" => json!({ "type": "object" }),
        "text/plain" | "text/html" => json!({ "type": "string" }),
        _ => json!({}),
    }
}

fn param_object(param: &modkit::api::ParamSpec) -> Value {
    let location = match param.location {
        ParamLocation::Path => "path",
        ParamLocation::Query => "query",
        ParamLocation::Header => "header",
    };
    let mut obj = Map::new();
    obj.insert("name".into(), Value::String(param.name.clone()));
    obj.insert("in".into(), Value::String(location.into()));
    // path params are always required in OpenAPI
    obj.insert(
        "required".into(),
        Value::Bool(param.location == ParamLocation::Path || param.required),
    );
    if let Some(d) = &param.description {
        obj.insert("description".into(), Value::String(d.clone()));
    }
    obj.insert("schema".into(), json!({ "type": param.param_type }));
    Value::Object(obj)
}

fn operation_object(spec: &OperationSpec, components: &ComponentsRegistry) -> Value {
    let mut op = Map::new();
    let op_id = spec
        .operation_id
        .clone()
        .unwrap_or_else(|| spec.handler_id.clone());
    op.insert("operationId".into(), Value::String(op_id));
    if let Some(summary) = &spec.summary {
        op.insert("summary".into(), Value::String(summary.clone()));
    }
    if let Some(description) = &spec.description {
        op.insert("description".into(), Value::String(description.clone()));
    }
    if !spec.tags.is_empty() {
        op.insert("tags".into(), json!(spec.tags));
    }
    if !spec.params.is_empty() {
        op.insert(
            "parameters".into(),
            Value::Array(spec.params.iter().map(param_object).collect()),
        );
    }

    if !spec.request_bodies.is_empty() {
        let mut content = Map::new();
        for body in &spec.request_bodies {
            content.insert(
                body.content_type.to_string(),
                json!({ "schema": make_schema(components, body.content_type, body.schema_name.as_deref()) }),
            );
        }
        let mut rb = Map::new();
        if let Some(desc) = spec.request_bodies.iter().find_map(|b| b.description.clone()) {
            rb.insert("description".into(), Value::String(desc));
        }
        rb.insert(
            "required".into(),
            Value::Bool(spec.request_bodies.iter().any(|b| b.required)),
        );
        rb.insert("content".into(), Value::Object(content));
        op.insert("requestBody".into(), Value::Object(rb));
    }

    let mut responses = Map::new();
    for resp in &spec.responses {
        let mut obj = Map::new();
        obj.insert("description".into(), Value::String(resp.description.clone()));
        if !resp.content_type.is_empty() {
            obj.insert(
                "content".into(),
                json!({
                    resp.content_type: {
                        "schema": make_schema(components, resp.content_type, resp.schema_name.as_deref())
                    }
                }),
            );
        }
        responses.insert(resp.status.to_string(), Value::Object(obj));
    }
    op.insert("responses".into(), Value::Object(responses));

    if spec.bearer_auth {
        op.insert("security".into(), json!([{ BEARER_SCHEME: [] }]));
    }
    Value::Object(op)
}

/// Assemble an OpenAPI 3.0 document from registered operations and components.
pub fn build<'a>(
    specs: impl IntoIterator<Item = &'a OperationSpec>,
    components: &ComponentsRegistry,
) -> anyhow::Result<OpenApi> {
    let mut paths: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
    let mut needs_bearer = false;

    for spec in specs {
        needs_bearer |= spec.bearer_auth;
        paths
            .entry(spec.path.clone())
            .or_default()
            .insert(spec.method.as_str().to_lowercase(), operation_object(spec, components));
    }

    let mut out = OpenApiComponents::default();
    for (name, schema) in &components.schemas {
        out.schemas.insert(name.clone(), serde_json::to_value(schema)?);
    }
    if needs_bearer {
        out.security_schemes.insert(
            BEARER_SCHEME.to_string(),
            json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }),
        );
    }

    Ok(OpenApi {
        openapi: "3.0.3",
        info: OpenApiInfo {
            title: "Stargram API",
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: Some("Stargram authentication and feed API"),
        },
        paths,
        components: out,
    })
}
