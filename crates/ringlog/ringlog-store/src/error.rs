#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("store is closed")]
    Closed,

    #[error("block {0} was overwritten while being read")]
    RolledOverMidRead(u64),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl From<StoreError> for std::io::Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(io_err) => io_err,
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}
