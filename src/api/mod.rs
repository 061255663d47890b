pub mod handlers;
pub mod response;

use crate::services::{AttendanceRecorder, Registry, Scheduler, TeacherReports};
use crate::store::Store;
use anyhow::Result;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Scheduler,
    pub recorder: AttendanceRecorder,
    pub reports: TeacherReports,
    pub registry: Registry,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            scheduler: Scheduler::new(store.clone()),
            recorder: AttendanceRecorder::new(store.clone()),
            reports: TeacherReports::new(store.clone()),
            registry: Registry::new(store),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/rooms",
            get(handlers::sessions::list_rooms).post(handlers::registry::create_room),
        )
        .route("/students", post(handlers::registry::create_student))
        .route("/students/:id", get(handlers::registry::get_student))
        .route(
            "/students/:id/attendance",
            get(handlers::attendance::student_attendance),
        )
        .route("/groups", post(handlers::registry::create_group))
        .route("/groups/:id", get(handlers::registry::get_group))
        .route("/sessions", post(handlers::sessions::create_session))
        .route("/attendance", post(handlers::attendance::create_attendance))
        .route("/attendance/qr", post(handlers::attendance::mark_by_qr))
        .route("/attendance/bulk", post(handlers::attendance::mark_bulk))
        .route("/teachers/:id/groups", get(handlers::teachers::groups))
        .route("/teachers/:id/sessions", get(handlers::teachers::sessions))
        .route(
            "/teachers/:id/attendance/stats",
            get(handlers::teachers::attendance_stats),
        )
        .route(
            "/teachers/:id/attendance/students",
            get(handlers::teachers::student_stats),
        )
        .route(
            "/teachers/:id/attendance/sessions",
            get(handlers::teachers::session_stats),
        )
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, store: Arc<dyn Store>) -> Result<()> {
    let app = create_router(AppState::new(store));

    let listener = TcpListener::bind(addr).await?;
    info!("Server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
