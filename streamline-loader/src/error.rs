use std::sync::Arc;
use streamline_base::ResourceId;

/// Errors raised by the streamer itself. Loading failures never show up here, they belong to the
/// loaders (see [`LoadError`]).
#[derive(Debug, Clone)]
pub enum StreamerError {
    // A worker thread could not be spawned
    IoError(Arc<std::io::Error>),
    // commit_load_request was called for a resource that is still loading
    AlreadyInFlight(ResourceId),
    // A worker thread panicked while running a loader, reported on shutdown
    WorkerPanicked(&'static str),
}

impl std::error::Error for StreamerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            StreamerError::IoError(ref e) => Some(&**e),
            StreamerError::AlreadyInFlight(_) => None,
            StreamerError::WorkerPanicked(_) => None,
        }
    }
}

impl core::fmt::Display for StreamerError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            StreamerError::IoError(ref e) => e.fmt(fmt),
            StreamerError::AlreadyInFlight(id) => {
                write!(fmt, "resource {} already has a load request in flight", id)
            }
            StreamerError::WorkerPanicked(stage) => {
                write!(fmt, "{} worker thread panicked", stage)
            }
        }
    }
}

impl From<std::io::Error> for StreamerError {
    fn from(error: std::io::Error) -> Self {
        StreamerError::IoError(Arc::new(error))
    }
}

pub type StreamerResult<T> = Result<T, StreamerError>;

/// Returned by [`ResourceLoader`](crate::ResourceLoader) stage operations. The pipeline logs these
/// and keeps moving the request, it is up to the loader to remember that it failed.
#[derive(Debug, Clone)]
pub enum LoadError {
    StringError(String),
    IoError(Arc<std::io::Error>),
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

impl LoadError {
    pub fn other<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        LoadError::Other(Arc::new(error))
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            LoadError::StringError(_) => None,
            LoadError::IoError(ref e) => Some(&**e),
            LoadError::Other(ref e) => Some(&**e),
        }
    }
}

impl core::fmt::Display for LoadError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            LoadError::StringError(ref e) => e.fmt(fmt),
            LoadError::IoError(ref e) => e.fmt(fmt),
            LoadError::Other(ref e) => e.fmt(fmt),
        }
    }
}

impl From<&str> for LoadError {
    fn from(str: &str) -> Self {
        LoadError::StringError(str.to_string())
    }
}

impl From<String> for LoadError {
    fn from(string: String) -> Self {
        LoadError::StringError(string)
    }
}

impl From<std::io::Error> for LoadError {
    fn from(error: std::io::Error) -> Self {
        LoadError::IoError(Arc::new(error))
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod test {
    use super::*;
    use std::error::Error;

    #[test]
    fn io_errors_keep_their_source() {
        let error: LoadError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert!(error.source().is_some());

        let error: StreamerError = std::io::Error::from(std::io::ErrorKind::Other).into();
        assert!(error.source().is_some());
    }

    #[test]
    fn display_messages() {
        let error = LoadError::from("bad header");
        assert_eq!(error.to_string(), "bad header");

        let error = StreamerError::AlreadyInFlight(ResourceId::from_u128(1));
        assert_eq!(
            error.to_string(),
            "resource 00000000-0000-0000-0000-000000000001 already has a load request in flight"
        );

        let error = StreamerError::WorkerPanicked("processing");
        assert_eq!(error.to_string(), "processing worker thread panicked");
    }
}
