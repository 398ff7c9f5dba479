// Jurisdiction Data Quality - Web Server
// JSON API over the overview, detail cards and drill-down

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use jurisdiction_quality::{
    DashboardAggregator, DashboardConfig, DashboardError, EntityClass, IssueCatalog,
    IssueResolution, IssueResolver, IssueType, JurisdictionRow, SqliteStore,
};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "jurisdiction-quality-server", version, about = "Data-quality dashboard API")]
struct ServerArgs {
    #[command(flatten)]
    config: DashboardConfig,

    /// Address to listen on
    #[arg(long, env = "JQ_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        if err.is_caller_error() {
            warn!(error = %err, "rejected request");
        } else {
            error!(error = %err, "request failed");
        }

        ApiError {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

/// Run `f` against the store under the connection lock
fn with_store<T>(
    state: &AppState,
    f: impl FnOnce(&SqliteStore) -> jurisdiction_quality::Result<T>,
) -> std::result::Result<T, ApiError> {
    let conn = state.db.lock().map_err(|_| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "database lock poisoned".to_string(),
    })?;
    let store = SqliteStore::new(&conn);
    Ok(f(&store)?)
}

/// Card plus the drill-down route for it
#[derive(Serialize)]
struct CardResponse {
    slug: String,
    alert: bool,
    description: String,
    count: i64,
    issues_url: String,
}

#[derive(Serialize)]
struct DetailResponse {
    jurisdiction: String,
    cards: BTreeMap<EntityClass, Vec<CardResponse>>,
}

fn issues_url(jurisdiction: &str, class: EntityClass, slug: &str) -> String {
    format!(
        "/api/jurisdictions/{}/issues/{}/{}",
        urlencoding::encode(jurisdiction),
        class,
        slug
    )
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/catalog - The issue taxonomy
async fn get_catalog() -> Json<ApiResponse<&'static [IssueType]>> {
    Json(ApiResponse::ok(IssueCatalog::global().all_issue_types()))
}

/// GET /api/overview - One row per jurisdiction
async fn get_overview(State(state): State<AppState>) -> ApiResult<Vec<JurisdictionRow>> {
    let rows = with_store(&state, |store| {
        DashboardAggregator::new(IssueCatalog::global(), store, store).overview()
    })?;

    Ok(Json(ApiResponse::ok(rows)))
}

/// GET /api/jurisdictions/:name - Issue cards
async fn get_jurisdiction(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<DetailResponse> {
    let detail = with_store(&state, |store| {
        DashboardAggregator::new(IssueCatalog::global(), store, store).jurisdiction_detail(&name)
    })?;

    let cards = detail
        .into_iter()
        .map(|(class, cards)| {
            let cards = cards
                .into_iter()
                .map(|card| CardResponse {
                    issues_url: issues_url(&name, class, &card.slug),
                    slug: card.slug,
                    alert: card.alert,
                    description: card.description,
                    count: card.count,
                })
                .collect();
            (class, cards)
        })
        .collect();

    Ok(Json(ApiResponse::ok(DetailResponse {
        jurisdiction: name,
        cards,
    })))
}

fn resolve(
    state: &AppState,
    name: &str,
    class: &str,
    slug: Option<&str>,
) -> ApiResult<IssueResolution> {
    let resolution = with_store(state, |store| {
        IssueResolver::new(IssueCatalog::global(), store, store).resolve_issues(name, class, slug)
    })?;

    Ok(Json(ApiResponse::ok(resolution)))
}

/// GET /api/jurisdictions/:name/issues/:class - Every issue of a class
async fn get_class_issues(
    State(state): State<AppState>,
    Path((name, class)): Path<(String, String)>,
) -> ApiResult<IssueResolution> {
    resolve(&state, &name, &class, None)
}

/// GET /api/jurisdictions/:name/issues/:class/:slug - One issue
async fn get_issue(
    State(state): State<AppState>,
    Path((name, class, slug)): Path<(String, String, String)>,
) -> ApiResult<IssueResolution> {
    resolve(&state, &name, &class, Some(&slug))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/catalog", get(get_catalog))
        .route("/overview", get(get_overview))
        .route("/jurisdictions/:name", get(get_jurisdiction))
        .route("/jurisdictions/:name/issues/:class", get(get_class_issues))
        .route("/jurisdictions/:name/issues/:class/:slug", get(get_issue))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    args.config.init_logging();

    let conn = args.config.open_database()?;
    info!(database = %args.config.database.display(), "database opened");

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    info!(addr = %args.bind, "🚀 server running");

    axum::serve(listener, build_router(state))
        .await
        .context("server stopped")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use jurisdiction_quality::{
        insert_jurisdiction, insert_organization, replace_flagged_issues, save_report,
        setup_database, AggregateReport, Jurisdiction, Organization, ReportKind,
    };
    use tower::ServiceExt;

    fn test_state(with_reports: bool) -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        insert_jurisdiction(&conn, &Jurisdiction::new("ocd-jurisdiction/nm", "New Mexico")).unwrap();
        if with_reports {
            for kind in ReportKind::ALL {
                save_report(&conn, &AggregateReport::new("New Mexico", kind)).unwrap();
            }
            save_report(
                &conn,
                &AggregateReport::new("New Mexico", ReportKind::Organization)
                    .with_count("no-memberships", 1),
            )
            .unwrap();
        }

        insert_organization(
            &conn,
            &Organization {
                id: "ocd-organization/nm-senate".to_string(),
                name: "New Mexico Senate".to_string(),
                jurisdiction_id: "ocd-jurisdiction/nm".to_string(),
                classification: "upper".to_string(),
            },
        )
        .unwrap();
        replace_flagged_issues(
            &conn,
            "New Mexico",
            "organization-no-memberships",
            &["ocd-organization/nm-senate"],
        )
        .unwrap();

        AppState {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = build_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_overview_route() {
        let (status, body) = get_json(test_state(true), "/api/overview").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["name"], "New Mexico");
        assert_eq!(body["data"][0]["organizations"]["no_memberships"], 1);
        assert!(body["data"][0]["run"].is_null());
    }

    #[tokio::test]
    async fn test_missing_report_is_server_error() {
        let (status, body) = get_json(test_state(false), "/api/overview").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("New Mexico"));
    }

    #[tokio::test]
    async fn test_detail_route_links_to_drill_down() {
        let (status, body) = get_json(test_state(true), "/api/jurisdictions/New%20Mexico").await;

        assert_eq!(status, StatusCode::OK);
        let card = &body["data"]["cards"]["organization"][0];
        assert_eq!(card["slug"], "no-memberships");
        assert_eq!(card["alert"], true);
        assert_eq!(
            card["issues_url"],
            "/api/jurisdictions/New%20Mexico/issues/organization/no-memberships"
        );
    }

    #[tokio::test]
    async fn test_issue_routes() {
        let (status, body) = get_json(
            test_state(true),
            "/api/jurisdictions/New%20Mexico/issues/organization/no-memberships",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["edit_link"], "core_organization_change");
        assert_eq!(
            body["data"]["groups"]["No Memberships"][0]["id"],
            "ocd-organization/nm-senate"
        );

        let (status, body) =
            get_json(test_state(true), "/api/jurisdictions/New%20Mexico/issues/membership").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["edit_link"].is_null());
        assert_eq!(body["data"]["groups"]["Unmatched Person"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_class_is_not_found() {
        let (status, body) =
            get_json(test_state(true), "/api/jurisdictions/New%20Mexico/issues/committee").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown entity class `committee`");
    }

    #[tokio::test]
    async fn test_catalog_route() {
        let (status, body) = get_json(test_state(true), "/api/catalog").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"].as_array().unwrap().len(),
            IssueCatalog::global().len()
        );
    }
}
