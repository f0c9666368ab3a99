use std::fmt;

use catalog_core::{FetchFailure, ItemDetail, Page, RequestId, Taxon};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PageFetched {
        request_id: RequestId,
        result: Result<Page, UpstreamError>,
    },
    DetailFetched {
        request_id: RequestId,
        result: Result<ItemDetail, UpstreamError>,
    },
    TaxonomyFetched {
        request_id: RequestId,
        result: Result<Vec<Taxon>, UpstreamError>,
    },
}

impl EngineEvent {
    pub fn request_id(&self) -> RequestId {
        match self {
            EngineEvent::PageFetched { request_id, .. }
            | EngineEvent::DetailFetched { request_id, .. }
            | EngineEvent::TaxonomyFetched { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct UpstreamError {
    pub kind: ErrorKind,
    pub message: String,
}

impl UpstreamError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn aborted(reason: AbortReason) -> Self {
        Self::new(ErrorKind::Aborted(reason), reason.to_string())
    }

    /// HTTP status for upstream failures; `Some(0)` when no response arrived.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::Status(code) => Some(code),
            ErrorKind::Network => Some(0),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.kind, ErrorKind::Aborted(_))
    }

    /// Core-facing failure; `None` for aborted requests, which are not failures.
    pub fn to_fetch_failure(&self) -> Option<FetchFailure> {
        match self.kind {
            ErrorKind::Aborted(_) => None,
            ErrorKind::Status(code) => Some(FetchFailure::new(code, self.message.clone())),
            ErrorKind::Network | ErrorKind::InvalidBody | ErrorKind::Configuration => {
                Some(FetchFailure::new(0, self.message.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential; raised before any network IO.
    Configuration,
    Aborted(AbortReason),
    /// Non-success HTTP response.
    Status(u16),
    /// No response received.
    Network,
    /// Success status with a body that does not match the expected shape.
    InvalidBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    Cancelled,
    TimedOut,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Cancelled => write!(f, "cancelled"),
            AbortReason::TimedOut => write!(f, "timed out"),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration error"),
            ErrorKind::Aborted(reason) => write!(f, "aborted ({reason})"),
            ErrorKind::Status(code) => write!(f, "http status {code}"),
            ErrorKind::Network => write!(f, "network error"),
            ErrorKind::InvalidBody => write!(f, "invalid response body"),
        }
    }
}
