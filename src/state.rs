use crate::{
    bindings::{Output, queue::StorageQueueOutput, sql::SqlOutput},
    config::RuntimeConfiguration,
    data::{message::QueueMessage, student::StudentRecord},
    error::RosterResult,
};
use sqlx::postgres::PgPoolOptions;
use std::{fmt, sync::Arc};

#[derive(Clone)]
pub struct RosterState {
    students: Arc<dyn Output<StudentRecord>>,
    messages: Arc<dyn Output<QueueMessage>>,
}

impl RosterState {
    pub async fn new(options: PgPoolOptions, config: &RuntimeConfiguration) -> RosterResult<Self> {
        let students = SqlOutput::new(options, &config.db_config())?;
        match students.migrate().await {
            Ok(()) => info!(table = %config.db_config().table(), "SQL output binding ready"),
            Err(e) => error!(?e, "unable to migrate the students table, inserts will fail until the database is reachable"),
        }

        let messages = StorageQueueOutput::new(config.queue_config());
        if let Err(e) = messages.ensure_queue().await {
            error!(?e, "unable to ensure the storage queue exists, sends will fail until it is reachable");
        }

        Ok(Self::from_outputs(Arc::new(students), Arc::new(messages)))
    }

    pub fn from_outputs(
        students: Arc<dyn Output<StudentRecord>>,
        messages: Arc<dyn Output<QueueMessage>>,
    ) -> Self {
        Self { students, messages }
    }

    pub fn students(&self) -> &dyn Output<StudentRecord> {
        self.students.as_ref()
    }

    pub fn messages(&self) -> &dyn Output<QueueMessage> {
        self.messages.as_ref()
    }

    pub async fn sensible_shutdown(&self) {
        self.students.close().await;
        self.messages.close().await;
    }
}

impl fmt::Debug for RosterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RosterState").finish_non_exhaustive()
    }
}
