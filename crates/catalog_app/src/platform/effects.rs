use std::time::Duration;

use catalog_core::{Effect, Msg, Page, RequestId};
use catalog_engine::{ClientSettings, EngineEvent, EngineHandle, ErrorKind, UpstreamError};
use catalog_logging::{catalog_debug, catalog_info, catalog_warn};

/// Executes core effects on the engine and turns page completions back into
/// core messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings) -> Result<Self, UpstreamError> {
        Ok(Self {
            engine: EngineHandle::new(settings)?,
        })
    }

    #[cfg(test)]
    pub fn with_engine(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchPage {
                    request_id,
                    filter,
                    page,
                } => self.engine.fetch_page(request_id, filter, page),
                Effect::CancelFetch { request_id } => {
                    catalog_info!("CancelFetch request_id={}", request_id);
                    self.engine.cancel(request_id);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next page completion.
    ///
    /// A configuration failure is returned as an error: no later request can
    /// succeed either.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, UpstreamError> {
        loop {
            let Some(event) = self.engine.recv_timeout(timeout) else {
                return Ok(None);
            };
            match event {
                EngineEvent::PageFetched { request_id, result } => {
                    return page_msg(request_id, result).map(Some);
                }
                other => {
                    catalog_debug!("Ignoring event for request {}", other.request_id());
                }
            }
        }
    }
}

fn page_msg(request_id: RequestId, result: Result<Page, UpstreamError>) -> Result<Msg, UpstreamError> {
    match result {
        Ok(page) => Ok(Msg::PageFetched {
            request_id,
            result: Ok(page),
        }),
        Err(err) if err.kind == ErrorKind::Configuration => Err(err),
        Err(err) => match err.to_fetch_failure() {
            Some(failure) => {
                catalog_warn!("Page request {} failed: {}", request_id, err);
                Ok(Msg::PageFetched {
                    request_id,
                    result: Err(failure),
                })
            }
            None => Ok(Msg::FetchAborted { request_id }),
        },
    }
}

#[cfg(test)]
mod tests {
    use catalog_core::FetchFailure;
    use catalog_engine::AbortReason;

    use super::*;

    fn error(kind: ErrorKind, message: &str) -> UpstreamError {
        UpstreamError {
            kind,
            message: message.to_string(),
        }
    }

    #[test]
    fn aborted_requests_are_not_failures() {
        let msg = page_msg(4, Err(error(ErrorKind::Aborted(AbortReason::TimedOut), "timed out")));
        assert_eq!(msg, Ok(Msg::FetchAborted { request_id: 4 }));
    }

    #[test]
    fn upstream_failures_carry_status_and_message() {
        let msg = page_msg(2, Err(error(ErrorKind::Status(503), "Service Unavailable")));
        assert_eq!(
            msg,
            Ok(Msg::PageFetched {
                request_id: 2,
                result: Err(FetchFailure::new(503, "Service Unavailable")),
            })
        );

        let msg = page_msg(3, Err(error(ErrorKind::Network, "connection refused")));
        assert_eq!(
            msg,
            Ok(Msg::PageFetched {
                request_id: 3,
                result: Err(FetchFailure::new(0, "connection refused")),
            })
        );
    }

    #[test]
    fn missing_credential_is_fatal() {
        let err = error(ErrorKind::Configuration, "RAWG_API_KEY is not set");
        assert_eq!(page_msg(1, Err(err.clone())), Err(err));
    }
}
