use crate::{data::student::StudentRecord, error::RosterResult, state::RosterState};
use axum::{body::Bytes, extract::State, http::StatusCode};

pub const INSERTED_BODY: &str = "Student inserted successfully.";

pub async fn post_add_student(
    State(state): State<RosterState>,
    body: Bytes,
) -> RosterResult<(StatusCode, &'static str)> {
    info!("Processing request to add student to SQL DB.");

    let record = StudentRecord::from_json_body(&body)?;
    state.students().set(record).await?;

    Ok((StatusCode::OK, INSERTED_BODY))
}
