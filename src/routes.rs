use crate::{
    routes::{add_student::post_add_student, send_message::send_message},
    state::RosterState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

pub mod add_student;
pub mod send_message;

/// The largest request body the functions host accepts.
const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

fn route(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("/{prefix}/{name}"),
        None => format!("/{name}"),
    }
}

pub fn router(state: RosterState, prefix: Option<&str>) -> Router {
    Router::new()
        .route(&route(prefix, "addstudent"), post(post_add_student))
        .route(
            &route(prefix, "SendMessageFunction"),
            get(send_message).post(send_message),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
