use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use snafu::Snafu;
use std::num::ParseIntError;

pub type RosterResult<T> = Result<T, RosterError>;

pub const INVALID_STUDENT_BODY: &str = "Invalid input";
pub const MISSING_NAME_BODY: &str = "Please pass a name in the query string.";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse IP port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("`{}` is not a usable table name", table))]
    InvalidTableName { table: String },
    #[snafu(display("`{}` is not a valid storage queue name", queue))]
    InvalidQueueName { queue: String },
    #[snafu(display("Unknown queue message encoding {:?}", encoding))]
    UnknownMessageEncoding { encoding: String },
    #[snafu(display("Malformed storage connection string: {}", reason))]
    MalformedConnectionString { reason: &'static str },
    #[snafu(display("Storage account key is not valid base64"))]
    StorageKey { source: base64::DecodeError },
    #[snafu(display("Error talking to the storage queue"))]
    QueueRequest { source: reqwest::Error },
    #[snafu(display("Storage queue rejected {} with status {}: {}", action, status, body))]
    QueueRejected {
        action: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("Request body is not JSON"))]
    StudentBodyNotJson { source: serde_json::Error },
    #[snafu(display("Request body is not a JSON object"))]
    StudentBodyNotObject,
    #[snafu(display("Missing field `{}`", field))]
    MissingStudentField { field: &'static str },
    #[snafu(display("Field `name` must be a string, found {}", found))]
    StudentNameNotString { found: serde_json::Value },
    #[snafu(display("Field `grade` is not an integer: {}", found))]
    GradeNotInteger { found: serde_json::Value },
    #[snafu(display("No name in query string"))]
    MissingName,
}

impl RosterError {
    pub const fn is_invalid_student(&self) -> bool {
        matches!(
            self,
            Self::StudentBodyNotJson { .. }
                | Self::StudentBodyNotObject
                | Self::MissingStudentField { .. }
                | Self::StudentNameNotString { .. }
                | Self::GradeNotInteger { .. }
        )
    }
}

impl IntoResponse for RosterError {
    fn into_response(self) -> Response {
        if self.is_invalid_student() {
            error!(reason = %self, "Invalid input or missing fields");
            return (StatusCode::BAD_REQUEST, INVALID_STUDENT_BODY).into_response();
        }

        if matches!(self, Self::MissingName) {
            warn!("Send message called without a name");
            return (StatusCode::BAD_REQUEST, MISSING_NAME_BODY).into_response();
        }

        error!(?self, "Error!");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
