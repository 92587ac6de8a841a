//! OpenAPI document for every mounted route group, built from the resolved model.

use crate::config::{CollectionKind, ResolvedCollection, ResolvedModel};
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::info::InfoBuilder;
use utoipa::openapi::path::{
    HttpMethod, Operation, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder, PathsBuilder,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::schema::{ObjectBuilder, Schema, Type};
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{OpenApi, OpenApiBuilder, RefOr, Required};

const JSON: &str = "application/json";

fn schema(ty: Type, description: &str) -> RefOr<Schema> {
    RefOr::T(Schema::Object(
        ObjectBuilder::new()
            .schema_type(ty)
            .description(Some(description))
            .build(),
    ))
}

fn json_response(description: &str) -> RefOr<utoipa::openapi::response::Response> {
    RefOr::T(
        ResponseBuilder::new()
            .description(description)
            .content(
                JSON,
                ContentBuilder::new()
                    .schema(Some(schema(Type::Object, "Response envelope")))
                    .build(),
            )
            .build(),
    )
}

fn empty_response(description: &str) -> RefOr<utoipa::openapi::response::Response> {
    RefOr::T(ResponseBuilder::new().description(description).build())
}

fn body(description: &str) -> Option<utoipa::openapi::request_body::RequestBody> {
    Some(
        RequestBodyBuilder::new()
            .description(Some(description))
            .content(
                JSON,
                ContentBuilder::new()
                    .schema(Some(schema(Type::Object, "Record attributes")))
                    .build(),
            )
            .required(Some(Required::True))
            .build(),
    )
}

fn operation(c: &ResolvedCollection, id: &str, summary: String, description: String) -> OperationBuilder {
    OperationBuilder::new()
        .tag(c.path_segment.clone())
        .operation_id(Some(format!("{}_{}", c.name, id)))
        .summary(Some(summary))
        .description(Some(description))
}

fn with_key(op: OperationBuilder, c: &ResolvedCollection) -> OperationBuilder {
    op.parameter(
        ParameterBuilder::new()
            .name("key")
            .parameter_in(ParameterIn::Path)
            .required(Required::True)
            .description(Some(format!("The key of the {} record", c.name)))
            .schema(Some(schema(Type::String, "Record key")))
            .build(),
    )
}

fn collection_operations(c: &ResolvedCollection) -> [(bool, HttpMethod, Operation); 6] {
    let item = format!("{} record", c.name);
    let create_note = match c.kind {
        CollectionKind::Edge => " The body must carry `_from` and `_to` document handles.",
        CollectionKind::Document => "",
    };
    [
        (
            false,
            HttpMethod::Get,
            operation(c, "list", format!("List all {} records", c.name), format!("Retrieves a list of all {} records.", c.name))
                .response("200", json_response(&format!("A list of {} records.", c.name)))
                .build(),
        ),
        (
            false,
            HttpMethod::Post,
            operation(
                c,
                "create",
                format!("Create a new {}", item),
                format!("Creates a new {} from the request body and returns the saved record.{}", item, create_note),
            )
            .request_body(body(&format!("The {} to create.", item)))
            .response("201", json_response(&format!("The created {}.", item)))
            .response("409", json_response(&format!("The {} already exists.", item)))
            .build(),
        ),
        (
            true,
            HttpMethod::Get,
            with_key(operation(c, "detail", format!("Fetch a {}", item), format!("Retrieves a {} by its key.", item)), c)
                .response("200", json_response(&format!("The {}.", item)))
                .response("404", json_response(&format!("The {} does not exist.", item)))
                .build(),
        ),
        (
            true,
            HttpMethod::Put,
            with_key(
                operation(
                    c,
                    "replace",
                    format!("Replace a {}", item),
                    format!("Replaces an existing {} with the request body and returns the new record.", item),
                ),
                c,
            )
            .request_body(body(&format!("The data to replace the {} with.", item)))
            .response("200", json_response(&format!("The new {}.", item)))
            .response("404", json_response(&format!("The {} does not exist.", item)))
            .response("409", json_response("The revision in If-Match is stale."))
            .build(),
        ),
        (
            true,
            HttpMethod::Patch,
            with_key(
                operation(
                    c,
                    "update",
                    format!("Update a {}", item),
                    format!("Patches a {} with the request body and returns the updated record.", item),
                ),
                c,
            )
            .request_body(body(&format!("The data to update the {} with.", item)))
            .response("200", json_response(&format!("The updated {}.", item)))
            .response("404", json_response(&format!("The {} does not exist.", item)))
            .response("409", json_response("The revision in If-Match is stale."))
            .build(),
        ),
        (
            true,
            HttpMethod::Delete,
            with_key(operation(c, "delete", format!("Remove a {}", item), format!("Deletes a {} from the database.", item)), c)
                .response("204", empty_response(&format!("The {} was removed.", item)))
                .response("404", json_response(&format!("The {} does not exist.", item)))
                .build(),
        ),
    ]
}

pub fn build_openapi(model: &ResolvedModel) -> OpenApi {
    let mut paths = PathsBuilder::new();
    let mut tags = Vec::with_capacity(model.collections.len());
    for c in &model.collections {
        let mut collection_item = PathItemBuilder::new();
        let mut detail_item = PathItemBuilder::new();
        for (keyed, method, op) in collection_operations(c) {
            if keyed {
                detail_item = detail_item.operation(method, op);
            } else {
                collection_item = collection_item.operation(method, op);
            }
        }
        paths = paths
            .path(format!("/{}", c.path_segment), collection_item.build())
            .path(format!("/{}/{{key}}", c.path_segment), detail_item.build());
        tags.push(
            TagBuilder::new()
                .name(c.path_segment.clone())
                .description(Some(format!("{} collection ({})", c.name, c.kind.as_str())))
                .build(),
        );
    }

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(env!("CARGO_PKG_NAME"))
                .version(env!("CARGO_PKG_VERSION"))
                .description(Some(env!("CARGO_PKG_DESCRIPTION")))
                .build(),
        )
        .paths(paths.build())
        .tags(Some(tags))
        .build()
}

async fn openapi_json(State(doc): State<Arc<OpenApi>>) -> Json<OpenApi> {
    Json(doc.as_ref().clone())
}

/// GET /openapi.json
pub fn openapi_routes(model: &ResolvedModel) -> Router {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .with_state(Arc::new(build_openapi(model)))
}
