use crate::error::RosterResult;
use async_trait::async_trait;

pub mod queue;
pub mod sql;

/// A sink owned by the host that persists one value per call, so handlers never touch connections.
#[async_trait]
pub trait Output<T: Send + 'static>: Send + Sync {
    async fn set(&self, value: T) -> RosterResult<()>;

    async fn close(&self) {}
}

#[cfg(test)]
pub mod memory {
    use super::Output;
    use crate::error::{RosterError, RosterResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Keeps everything it is given.
    #[derive(Debug)]
    pub struct MemoryOutput<T> {
        values: Mutex<Vec<T>>,
    }

    impl<T> Default for MemoryOutput<T> {
        fn default() -> Self {
            Self {
                values: Mutex::new(Vec::new()),
            }
        }
    }

    impl<T: Clone> MemoryOutput<T> {
        pub fn values(&self) -> Vec<T> {
            self.values.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<T: Send + 'static> Output<T> for MemoryOutput<T> {
        async fn set(&self, value: T) -> RosterResult<()> {
            self.values.lock().unwrap().push(value);
            Ok(())
        }
    }

    /// Refuses everything, like a sink whose backing store is down.
    #[derive(Debug, Clone, Copy)]
    pub enum UnreachableOutput {
        Database,
        Queue,
    }

    #[async_trait]
    impl<T: Send + 'static> Output<T> for UnreachableOutput {
        async fn set(&self, _value: T) -> RosterResult<()> {
            Err(match self {
                Self::Database => RosterError::MakeQuery {
                    source: sqlx::Error::PoolTimedOut,
                },
                Self::Queue => RosterError::QueueRejected {
                    action: "message",
                    status: 503,
                    body: "unreachable".to_string(),
                },
            })
        }
    }
}
