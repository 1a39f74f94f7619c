use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone)]
pub enum QueueError {
    #[error("No queue entry for appointment {0}")]
    EntryNotFound(Uuid),
}
