use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedlogError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("record parse error: {0}")]
    RecordParse(String),
    #[error("malformed timestamp {timestamp:?} (expected \"<number> sec\") in record {record}")]
    MalformedTimestamp { timestamp: String, record: String },
    #[error("unable to sort batch of {batch_size} records: {reason}; problematic record: {record}")]
    IncomparableKeys {
        batch_size: usize,
        reason: String,
        record: String,
    },
    #[error("no task metadata recorded for {0:?}")]
    MissingTaskMetadata(String),
    #[error("logger error: {0}")]
    Logger(String),
    #[error("scheduled unit failed: {0}")]
    Join(String),
}
