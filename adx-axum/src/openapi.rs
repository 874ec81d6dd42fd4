//! The OpenAPI document and its viewer.

use aide::{
    axum::{ApiRouter, IntoApiResponse, routing::get},
    openapi::{OpenApi, SecurityScheme, Tag},
    transform::TransformOpenApi,
};
use axum::{
    Extension, Json,
    response::{Html, IntoResponse as _},
};
use std::sync::Arc;

const VIEWER: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <script type="module" src="https://unpkg.com/rapidoc@9.3.8/dist/rapidoc-min.js"></script>
  </head>
  <body>
    <rapi-doc spec-url="/docs/api.json" render-style="focused"></rapi-doc>
  </body>
</html>"#;

/// `/docs` serves the viewer, `/docs/api.json` the document it renders.
pub(crate) fn docs_routes() -> ApiRouter {
    ApiRouter::new()
        .route("/", get(serve_viewer))
        .route("/api.json", get(serve_document))
}

async fn serve_viewer() -> impl IntoApiResponse {
    Html(VIEWER).into_response()
}

async fn serve_document(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}

fn tag(name: &str, description: &str) -> Tag {
    Tag {
        name: name.into(),
        description: Some(description.into()),
        ..Default::default()
    }
}

/// Document metadata, the bearer scheme and the exchange's tags.
pub(crate) fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("AdEx Exchange API")
        .description("Escrowed ad bids: advertisers fund a bid on an ad unit, a publisher accepts it into an ad slot, both attest delivery and the publisher claims the reward.")
        .version(env!("CARGO_PKG_VERSION"))
        .security_scheme(
            "jwt",
            SecurityScheme::Http {
                scheme: "bearer".into(),
                bearer_format: None,
                description: Some("Identifies the calling account".into()),
                extensions: Default::default(),
            },
        )
        .tag(tag("bid", "Bid lifecycle operations"))
        .tag(tag("query", "Read-only views of bids and their indices"))
}
