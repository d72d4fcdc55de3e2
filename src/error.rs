use thiserror::Error;

/// Error taxonomy for the monitor pipeline.
///
/// Transport errors end the receive session; malformed messages are logged
/// and dropped; storage errors carry the attempted record payload so a
/// failed write can be replayed from the logs.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("transport failure: {0}")]
    Transport(#[from] zmq::Error),

    #[error("malformed notification: {reason}")]
    Malformed { reason: String },

    #[error("storage failure while writing {record}: {source}")]
    Storage {
        record: String,
        #[source]
        source: sqlx::Error,
    },
}

impl MonitorError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub fn storage(record: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Storage {
            record: record.into(),
            source,
        }
    }
}
