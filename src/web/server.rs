use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use colored::Colorize;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::external::Services;
use crate::flow::rt::context::{clean_expired_sessions, SessionStore};
use crate::flow::rt::facade as rt;
use crate::flow::scenarios::{build_flow_table, FlowTable};
use crate::man::settings::Settings;
use crate::result::Error;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything a request handler needs, shared behind one [`Arc`].
pub struct AppState {
    pub services: Services,
    pub store: Arc<SessionStore>,
    pub table: FlowTable,
}

pub async fn start_app() {
    let settings = Settings::from_env().expect("Invalid configuration");

    #[cfg(target_os = "windows")]
    let _ = colored::control::set_virtual_terminal(true).unwrap();

    let table = build_flow_table().expect("Flow table failed to build");
    log::info!("Flow table holds {} steps", table.len());

    let store = Arc::new(SessionStore::new());
    let (sender, recv) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(clean_expired_sessions(
        Arc::clone(&store),
        recv,
        settings.max_session_idle_min,
    ));

    log::info!(
        "  -->  Chat endpoint listening on {}{}:{}",
        "http://".bright_green(),
        settings.ip.bright_green(),
        settings.port.to_string().blue()
    );
    log::info!("Current version: {}", VERSION);
    log::info!(
        "  -->  Press {} to terminate this application",
        "Ctrl+C".bright_red()
    );

    let addr = format!("{}:{}", settings.ip, settings.port);
    let state = Arc::new(AppState {
        services: Services::new(settings),
        store,
        table,
    });
    let app = gen_router(state).fallback(fallback);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sender))
        .await
        .unwrap();
}

fn gen_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/flow/answer", post(rt::answer))
        .route("/management/settings", get(get_settings))
        .route("/version.json", get(version))
        .layer(
            // The widget is embedded on arbitrary portal pages.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers([header::CONTENT_TYPE])
                .allow_methods([Method::GET, Method::POST]),
        )
        .with_state(state)
}

async fn fallback(uri: Uri) -> Response {
    (StatusCode::NOT_FOUND, format!("Not Found: {}", uri.path())).into_response()
}

async fn get_settings(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    to_res(Ok(app.services.settings.clone()))
}

async fn version() -> impl IntoResponse {
    let mut v = String::with_capacity(15);
    v.push('"');
    v.push_str(VERSION);
    v.push('"');
    v
}

async fn shutdown_signal(sender: tokio::sync::oneshot::Sender<()>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    if sender.send(()).is_err() {
        log::info!("Session sweeper already stopped");
    }

    log::info!("This program has been terminated");
}

#[derive(Serialize)]
struct ResponseData<D> {
    pub(crate) status: u16,
    pub(crate) data: Option<D>,
    pub(crate) err: Option<Error>,
}

pub(crate) fn to_res<D>(r: Result<D, Error>) -> impl IntoResponse
where
    D: serde::Serialize + 'static,
{
    let data = match r {
        Ok(d) => {
            let res = ResponseData {
                status: StatusCode::OK.as_u16(),
                data: Some(&d),
                err: None,
            };
            serde_json::to_string(&res).unwrap()
        }
        Err(e) => {
            let res: ResponseData<D> = ResponseData {
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                data: None,
                err: Some(e),
            };
            serde_json::to_string(&res).unwrap()
        }
    };
    let mut header_map = HeaderMap::new();
    header_map.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    (StatusCode::OK, header_map, data)
}
