//! Moods API Lambda - CRUD for mood entries plus AI analysis.
//!
//! Endpoints:
//! - GET /moods - List moods, newest first
//! - POST /moods - Create a mood
//! - GET /moods/analyze - Wellness reflection over the last 14 days
//! - GET /moods/{id} - Get a single mood
//! - PUT /moods/{id} - Replace a mood
//! - PATCH /moods/{id} - Partially update a mood
//! - DELETE /moods/{id} - Delete a mood

use chrono::Utc;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{analysis_response, empty_response, error_response, json_response};
use shared::prompt::window_start;
use shared::{
    get_api_key, get_database_credentials, parse_body, AnalysisConfig, Config, CreateMoodRequest,
    GeminiClient, MoodAnalysisService, MoodResponse, MoodStore, UpdateMoodRequest,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use validator::Validate;

/// Application state
struct AppState {
    store: MoodStore,
    analyzer: MoodAnalysisService<GeminiClient>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

        let db_creds = get_database_credentials(&secrets_client, &config.db_secret_arn).await?;
        let db_pool = shared::db::create_pool(&config, &db_creds).await?;

        let api_key = get_api_key(&secrets_client, &config).await?;
        let analysis_config = AnalysisConfig::from_env()?;
        let gemini = GeminiClient::new(api_key, &analysis_config)
            .map_err(|e| format!("Failed to create Gemini client: {:?}", e))?;

        info!("Mood analysis configured with model {}", analysis_config.model_id);

        Ok(Self {
            store: MoodStore::new(db_pool),
            analyzer: MoodAnalysisService::new(gemini, analysis_config),
        })
    }
}

/// Resolved request target.
#[derive(Debug, PartialEq)]
enum Route<'a> {
    Collection,
    Analyze,
    Item(&'a str),
    NotFound,
}

/// Match a path against the moods routes, ignoring the `/api` stage prefix and trailing slashes.
fn route(raw_path: &str) -> Route<'_> {
    let path = raw_path.strip_prefix("/api").unwrap_or(raw_path);
    let path = path.trim_end_matches('/');

    match path.strip_prefix("/moods") {
        Some("") => Route::Collection,
        Some("/analyze") => Route::Analyze,
        Some(rest) => match rest.strip_prefix('/') {
            Some(id) if !id.is_empty() && !id.contains('/') => Route::Item(id),
            _ => Route::NotFound,
        },
        None => Route::NotFound,
    }
}

/// Operation selected for a request.
#[derive(Debug, PartialEq)]
enum Action {
    Analyze,
    List,
    Create,
    Get(Uuid),
    Replace(Uuid),
    Patch(Uuid),
    Delete(Uuid),
}

/// Pick the operation for a route and method, or the status and message to reject it with.
fn dispatch(route: Route<'_>, method: &str) -> Result<Action, (u16, &'static str)> {
    match (route, method) {
        (Route::Analyze, "GET") => Ok(Action::Analyze),
        (Route::Collection, "GET") => Ok(Action::List),
        (Route::Collection, "POST") => Ok(Action::Create),
        (Route::Item(raw_id), _) => {
            let id = Uuid::parse_str(raw_id).map_err(|_| (400u16, "Invalid mood ID"))?;
            match method {
                "GET" => Ok(Action::Get(id)),
                "PUT" => Ok(Action::Replace(id)),
                "PATCH" => Ok(Action::Patch(id)),
                "DELETE" => Ok(Action::Delete(id)),
                _ => Err((405, "Method not allowed")),
            }
        }
        (Route::NotFound, _) => Err((404, "Not found")),
        _ => Err((405, "Method not allowed")),
    }
}

/// Log store failures and hide internal details from clients.
fn store_error(context: &str, e: shared::Error) -> Result<Response<Body>, Error> {
    error!("{}: {}", context, e);
    match e.status_code() {
        500 => error_response(500, "Internal server error"),
        status => error_response(status, e.to_string()),
    }
}

fn validation_error(e: validator::ValidationErrors) -> Result<Response<Body>, Error> {
    error_response(400, format!("Invalid request: {}", e))
}

async fn update(state: &AppState, id: Uuid, request: UpdateMoodRequest) -> Result<Response<Body>, Error> {
    if let Err(e) = request.validate() {
        return validation_error(e);
    }

    match state.store.update(id, &request).await {
        Ok(Some(entry)) => {
            info!("Updated mood {}", id);
            json_response(200, &MoodResponse::from(entry))
        }
        Ok(None) => error_response(404, "Mood not found"),
        Err(e) => store_error("Failed to update mood", e),
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = event.uri().path();

    info!("Moods request: {} {}", method, path);

    let action = match dispatch(route(path), method) {
        Ok(action) => action,
        Err((status, message)) => return error_response(status, message),
    };

    match action {
        Action::Analyze => {
            let now = Utc::now();
            let entries = match state.store.list(Some(window_start(now))).await {
                Ok(entries) => entries,
                Err(e) => return store_error("Failed to load moods for analysis", e),
            };

            analysis_response(state.analyzer.analyze_at(&entries, now).await)
        }

        Action::List => match state.store.list(None).await {
            Ok(entries) => {
                let moods: Vec<MoodResponse> = entries.into_iter().map(MoodResponse::from).collect();
                json_response(200, &moods)
            }
            Err(e) => store_error("Failed to list moods", e),
        },

        Action::Create => {
            let request: CreateMoodRequest = parse_body!(event.body());
            if let Err(e) = request.validate() {
                return validation_error(e);
            }

            match state.store.create(&request).await {
                Ok(entry) => {
                    info!("Created mood {} ({})", entry.id, entry.mood);
                    json_response(201, &MoodResponse::from(entry))
                }
                Err(e) => store_error("Failed to create mood", e),
            }
        }

        Action::Get(id) => match state.store.get(id).await {
            Ok(Some(entry)) => json_response(200, &MoodResponse::from(entry)),
            Ok(None) => error_response(404, "Mood not found"),
            Err(e) => store_error("Failed to fetch mood", e),
        },

        Action::Replace(id) => {
            let request: CreateMoodRequest = parse_body!(event.body());
            update(&state, id, request.into()).await
        }

        Action::Patch(id) => {
            let request: UpdateMoodRequest = parse_body!(event.body());
            update(&state, id, request).await
        }

        Action::Delete(id) => match state.store.delete(id).await {
            Ok(true) => {
                info!("Deleted mood {}", id);
                empty_response(204)
            }
            Ok(false) => error_response(404, "Mood not found"),
            Err(e) => store_error("Failed to delete mood", e),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_collection() {
        assert_eq!(route("/moods"), Route::Collection);
        assert_eq!(route("/moods/"), Route::Collection);
        assert_eq!(route("/api/moods/"), Route::Collection);
    }

    #[test]
    fn test_route_analyze() {
        assert_eq!(route("/moods/analyze"), Route::Analyze);
        assert_eq!(route("/api/moods/analyze/"), Route::Analyze);
    }

    #[test]
    fn test_route_item() {
        let id = "6f1c2d2e-8a4b-4f6e-9a51-3d2b9a0c7e11";
        assert_eq!(route(&format!("/moods/{}", id)), Route::Item(id));
        assert_eq!(route(&format!("/api/moods/{}/", id)), Route::Item(id));
    }

    #[test]
    fn test_route_not_found() {
        assert_eq!(route("/"), Route::NotFound);
        assert_eq!(route("/tags"), Route::NotFound);
        assert_eq!(route("/moodsx"), Route::NotFound);
        assert_eq!(route("/moods/a/b"), Route::NotFound);
    }

    const ID: &str = "6f1c2d2e-8a4b-4f6e-9a51-3d2b9a0c7e11";

    fn id() -> Uuid {
        Uuid::parse_str(ID).unwrap()
    }

    #[test]
    fn test_dispatch_collection_and_analyze() {
        assert_eq!(dispatch(Route::Collection, "GET"), Ok(Action::List));
        assert_eq!(dispatch(Route::Collection, "POST"), Ok(Action::Create));
        assert_eq!(dispatch(Route::Analyze, "GET"), Ok(Action::Analyze));
    }

    #[test]
    fn test_dispatch_item_methods() {
        assert_eq!(dispatch(Route::Item(ID), "GET"), Ok(Action::Get(id())));
        assert_eq!(dispatch(Route::Item(ID), "PUT"), Ok(Action::Replace(id())));
        assert_eq!(dispatch(Route::Item(ID), "PATCH"), Ok(Action::Patch(id())));
        assert_eq!(dispatch(Route::Item(ID), "DELETE"), Ok(Action::Delete(id())));
    }

    #[test]
    fn test_dispatch_wrong_method_is_405() {
        assert_eq!(dispatch(Route::Analyze, "POST"), Err((405, "Method not allowed")));
        assert_eq!(dispatch(Route::Collection, "DELETE"), Err((405, "Method not allowed")));
        assert_eq!(dispatch(Route::Item(ID), "POST"), Err((405, "Method not allowed")));
    }

    #[test]
    fn test_dispatch_invalid_id_is_400() {
        assert_eq!(dispatch(Route::Item("not-a-uuid"), "GET"), Err((400, "Invalid mood ID")));
        assert_eq!(dispatch(route("/api/moods/123/"), "DELETE"), Err((400, "Invalid mood ID")));
    }

    #[test]
    fn test_dispatch_unknown_path_is_404() {
        assert_eq!(dispatch(Route::NotFound, "GET"), Err((404, "Not found")));
        assert_eq!(dispatch(route("/tags"), "POST"), Err((404, "Not found")));
    }
}
