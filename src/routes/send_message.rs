use crate::{
    data::message::QueueMessage,
    error::{MissingNameSnafu, RosterResult},
    state::RosterState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use snafu::OptionExt;

/// Only the query string is read, whichever method was used.
pub async fn send_message(
    State(state): State<RosterState>,
    Query(params): Query<Vec<(String, String)>>,
) -> RosterResult<(StatusCode, String)> {
    let name = params
        .into_iter()
        .find_map(|(key, value)| (key == "name").then_some(value))
        .filter(|name| !name.is_empty())
        .context(MissingNameSnafu)?;

    let message = QueueMessage::greeting(&name);
    state.messages().set(message.clone()).await?;

    Ok((StatusCode::OK, format!("Message sent to queue: {message}")))
}
