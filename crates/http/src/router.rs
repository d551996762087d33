//! Router builder for the bookshelf HTTP server

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::Uuid;

use bookshelf_kernel::{settings::CorsSettings, ModuleRegistry};

use crate::error;

/// Builder for constructing the main HTTP router
///
/// Layers only wrap routes that exist when they are added, so mount modules
/// and fallbacks before calling the `with_*` middleware methods.
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `/api/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        let api_path = format!("/api/{}", module_name);
        self.router = self.router.nest(&api_path, module_router);
        self
    }

    /// Answer unknown routes and unsupported methods with the error envelope
    pub fn with_fallbacks(mut self) -> Self {
        self.router = self
            .router
            .method_not_allowed_fallback(error::method_not_allowed)
            .fallback(error::route_not_found);
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware from configured origins, headers and methods
    pub fn with_cors(mut self, cors: &CorsSettings) -> Self {
        self.router = self.router.layer(cors_layer(cors));
        self
    }

    /// Add request ID middleware; the id is echoed back in `x-request-id`
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    /// Add OpenAPI documentation by collecting specs from all modules
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let openapi_spec = merge_openapi(registry);

        let openapi_obj: utoipa::openapi::OpenApi = serde_json::from_value(openapi_spec.clone())
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "merged OpenAPI document is invalid, serving a stub");
                utoipa::openapi::OpenApiBuilder::new()
                    .info(
                        utoipa::openapi::InfoBuilder::new()
                            .title("Bookshelf API")
                            .version("1.0.0")
                            .build(),
                    )
                    .build()
            });

        self.router = self.router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi_obj),
        );

        // Raw JSON document for external consumers
        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(openapi_spec.clone()) }),
        );

        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge module OpenAPI fragments into one document
pub fn merge_openapi(registry: &ModuleRegistry) -> serde_json::Value {
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Bookshelf API",
            "version": "1.0.0",
            "description": "Virtual bookshelf: list, create, rate, delete and search books"
        },
        "paths": {},
        "components": {
            "schemas": {}
        }
    });

    openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean" },
            "error_code": { "type": "integer" },
            "message": { "type": "string" }
        },
        "required": ["success", "error_code", "message"]
    });

    openapi_spec["paths"]["/healthz"] = serde_json::json!({
        "get": {
            "summary": "Health check",
            "responses": {
                "200": {
                    "description": "OK",
                    "content": {
                        "text/plain": {
                            "schema": { "type": "string" }
                        }
                    }
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };

        if let Some(paths) = module_spec.get("paths").and_then(|p| p.as_object()) {
            for (path, path_item) in paths {
                // "/" maps onto the mount point itself
                let suffix = if path == "/" { "" } else { path.as_str() };
                let prefixed_path = format!("/api/{}{}", module.name(), suffix);
                openapi_spec["paths"][prefixed_path] = path_item.clone();
            }
        }

        if let Some(schemas) = module_spec
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
        {
            for (schema_name, schema_def) in schemas {
                openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
            }
        }
    }

    openapi_spec
}

fn cors_layer(cors: &CorsSettings) -> CorsLayer {
    let origins = if is_wildcard(&cors.allowed_origins) {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_all(&cors.allowed_origins, "origin", |v| {
            v.parse::<HeaderValue>().ok()
        }))
    };

    let headers = if is_wildcard(&cors.allowed_headers) {
        AllowHeaders::any()
    } else {
        AllowHeaders::list(parse_all(&cors.allowed_headers, "header", |v| {
            v.parse::<HeaderName>().ok()
        }))
    };

    let methods = if is_wildcard(&cors.allowed_methods) {
        AllowMethods::any()
    } else {
        AllowMethods::list(parse_all(&cors.allowed_methods, "method", |v| {
            Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_headers(headers)
        .allow_methods(methods)
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|value| value.trim() == "*")
}

fn parse_all<T>(values: &[String], kind: &str, parse: impl Fn(&str) -> Option<T>) -> Vec<T> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .filter_map(|value| {
            let parsed = parse(value);
            if parsed.is_none() {
                tracing::warn!(kind, value, "ignoring invalid CORS entry");
            }
            parsed
        })
        .collect()
}

/// Request ID generator for tracing
#[derive(Clone)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let request_id = Uuid::now_v7().to_string().parse::<HeaderValue>().ok()?;
        Some(RequestId::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_mounted_module_is_reachable() {
        let module_router = Router::new().route("/ping", get(|| async { "pong" }));

        let router = RouterBuilder::new()
            .mount_module("test", module_router)
            .with_fallbacks()
            .build();

        let response = router
            .oneshot(request(Method::GET, "/api/test/ping"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fallbacks_use_envelope() {
        let router = RouterBuilder::new()
            .route("/healthz", get(|| async { "ok" }))
            .with_fallbacks()
            .build();

        let response = router
            .clone()
            .oneshot(request(Method::DELETE, "/healthz"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = router
            .oneshot(request(Method::GET, "/nowhere"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_code"], 404);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let router = RouterBuilder::new()
            .route("/healthz", get(|| async { "ok" }))
            .with_tracing()
            .with_cors(&CorsSettings::default())
            .with_request_id()
            .build();

        let response = router
            .oneshot(request(Method::GET, "/healthz"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn test_openapi_merges_only_base_without_modules() {
        let spec = merge_openapi(&ModuleRegistry::new());
        assert!(spec["paths"]["/healthz"].is_object());
        assert!(spec["components"]["schemas"]["ErrorResponse"].is_object());
    }

    #[test]
    fn test_parse_all_skips_invalid_entries() {
        let values = vec![
            "Content-Type".to_string(),
            " ".to_string(),
            "bad header".to_string(),
        ];
        let parsed = parse_all(&values, "header", |v| v.parse::<HeaderName>().ok());
        assert_eq!(parsed, vec![HeaderName::from_static("content-type")]);
    }
}
