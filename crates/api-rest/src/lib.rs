//! # API REST
//!
//! REST boundary for the `$apply` operation.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - mapping apply outcomes onto HTTP status codes with FHIR JSON bodies
//!
//! The router is built here; the `apply-run` binary owns configuration and the listener.

#![warn(rust_2018_idioms)]

use apply_core::{
    ApplyContext, ApplyError, ApplyHints, ApplyService, CoreConfig, DirectoryTemplateRepository,
    LiteralEvaluator,
};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Apply service as served over REST: templates from a directory, literal expressions.
pub type RestApplyService = ApplyService<DirectoryTemplateRepository, LiteralEvaluator>;

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<RestApplyService>,
}

impl AppState {
    pub fn new(service: RestApplyService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(ApplyService::new(
            DirectoryTemplateRepository::new(cfg.template_dir()),
            LiteralEvaluator,
        ))
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// `$apply` query parameters, named as in the FHIR operation definition.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ApplyParams {
    /// Subject reference, e.g. `Patient/123`
    pub patient: Option<String>,
    /// Practitioner reference
    pub practitioner: Option<String>,
    /// Organization reference
    pub organization: Option<String>,
    pub encounter: Option<String>,
    pub user_type: Option<String>,
    pub user_language: Option<String>,
    pub user_task_context: Option<String>,
    pub setting: Option<String>,
    pub setting_context: Option<String>,
}

impl ApplyParams {
    fn into_context(self) -> Result<ApplyContext, ApplyError> {
        let ctx = ApplyContext::from_ids(
            self.patient.as_deref().unwrap_or_default(),
            self.practitioner.as_deref(),
            self.organization.as_deref(),
        )?;
        Ok(ctx.with_hints(ApplyHints {
            encounter: self.encounter,
            user_type: self.user_type,
            user_language: self.user_language,
            user_task_context: self.user_task_context,
            setting: self.setting,
            setting_context: self.setting_context,
        }))
    }
}

#[derive(OpenApi)]
#[openapi(paths(health, apply), components(schemas(HealthRes)))]
struct ApiDoc;

/// Build the REST router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ActivityDefinition/:id/$apply", get(apply).post(apply))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "apply REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/ActivityDefinition/{id}/$apply",
    params(
        ("id" = String, Path, description = "ActivityDefinition id"),
        ApplyParams
    ),
    responses(
        (status = 200, description = "Produced request or event record (FHIR JSON)"),
        (status = 400, description = "Invalid apply parameters (OperationOutcome)"),
        (status = 404, description = "ActivityDefinition could not be resolved (OperationOutcome)"),
        (status = 422, description = "Template cannot be applied (OperationOutcome)")
    )
)]
/// Resolve an ActivityDefinition for a subject
///
/// Accepts the same query parameters on GET and POST.
///
/// # Errors
/// Returns an OperationOutcome body with:
/// - `400 Bad Request` if the subject or an actor reference is invalid,
/// - `404 Not Found` if the template cannot be looked up,
/// - `422 Unprocessable Entity` if the template cannot be applied to its kind,
/// - `500 Internal Server Error` if configuration or serialisation fails.
#[axum::debug_handler]
async fn apply(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(params): Query<ApplyParams>,
) -> (StatusCode, Json<serde_json::Value>) {
    let ctx = match params.into_context() {
        Ok(ctx) => ctx,
        Err(err) => return error_response(&err),
    };

    let outcome = match state.service.apply_by_id(&id, &ctx) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::info!("apply of ActivityDefinition/{id} failed: {err}");
            return error_response(&err);
        }
    };

    let status = if outcome.is_diagnostic() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    match outcome.into_resource_or_outcome() {
        Ok(body) => (status, Json(body)),
        Err(err) => {
            tracing::error!("failed to serialise apply outcome: {err}");
            error_response(&err)
        }
    }
}

fn status_for(err: &ApplyError) -> StatusCode {
    match err {
        ApplyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ApplyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ApplyError::UnknownKind(_)
        | ApplyError::MissingRequiredField { .. }
        | ApplyError::IllegalFieldForKind { .. }
        | ApplyError::DynamicValue { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(err: &ApplyError) -> (StatusCode, Json<serde_json::Value>) {
    let body = serde_json::to_value(err.to_operation_outcome()).unwrap_or_else(|_| {
        serde_json::json!({ "resourceType": "OperationOutcome", "issue": [] })
    });
    (status_for(err), Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(templates: &[(&str, &str)]) -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        for (name, body) in templates {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let service = ApplyService::new(DirectoryTemplateRepository::new(dir.path()), LiteralEvaluator);
        (dir, router(AppState::new(service)))
    }

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    const CBC: &str = r#"{"resourceType":"ActivityDefinition","kind":"ServiceRequest","code":{"text":"CBC"}}"#;

    #[tokio::test]
    async fn health_is_ok() {
        let (_dir, app) = app(&[]);
        let (status, body) = call(app, Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn apply_returns_record() {
        let (_dir, app) = app(&[("cbc.json", CBC)]);
        let (status, body) = call(
            app,
            Method::GET,
            "/ActivityDefinition/cbc/$apply?patient=Patient/1&practitioner=Practitioner/2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resourceType"], "ServiceRequest");
        assert_eq!(body["subject"]["reference"], "Patient/1");
        assert_eq!(body["requester"]["reference"], "Practitioner/2");
    }

    #[tokio::test]
    async fn post_is_accepted() {
        let (_dir, app) = app(&[("cbc.json", CBC)]);
        let (status, _) = call(app, Method::POST, "/ActivityDefinition/cbc/$apply?patient=Patient/1").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_template_is_404_outcome() {
        let (_dir, app) = app(&[]);
        let (status, body) =
            call(app, Method::GET, "/ActivityDefinition/nope/$apply?patient=Patient/1").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["resourceType"], "OperationOutcome");
        assert_eq!(body["issue"][0]["code"], "processing");
        assert_eq!(
            body["issue"][0]["details"]["text"],
            "Unable to resolve ActivityDefinition/nope"
        );
    }

    #[tokio::test]
    async fn rule_violation_is_422_outcome() {
        let (_dir, app) = app(&[(
            "supply.json",
            r#"{"resourceType":"ActivityDefinition","kind":"SupplyRequest"}"#,
        )]);
        let (status, body) =
            call(app, Method::GET, "/ActivityDefinition/supply/$apply?patient=Patient/1").await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["issue"][0]["code"], "required");
    }

    #[tokio::test]
    async fn missing_patient_is_400_outcome() {
        let (_dir, app) = app(&[("cbc.json", CBC)]);
        let (status, body) = call(app, Method::GET, "/ActivityDefinition/cbc/$apply").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["issue"][0]["code"], "invalid");
    }
}
