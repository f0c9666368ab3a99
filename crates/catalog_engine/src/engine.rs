use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use catalog_core::{FilterValue, RequestId};
use catalog_logging::{catalog_debug, catalog_info};
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::client::{GetOptions, UpstreamClient};
use crate::gateway::{Catalog, ItemRef, ResourceGateway, Taxonomy};
use crate::{ClientSettings, EngineEvent, ErrorKind, UpstreamError};

enum EngineCommand {
    FetchPage {
        request_id: RequestId,
        filter: FilterValue,
        page: u32,
    },
    FetchDetail {
        request_id: RequestId,
        item: ItemRef,
    },
    FetchTaxonomy {
        request_id: RequestId,
        kind: Taxonomy,
        page_size: Option<u32>,
    },
    Cancel {
        request_id: RequestId,
    },
    Shutdown,
}

type InFlight = Arc<Mutex<HashMap<RequestId, CancellationToken>>>;

/// Runs fetches on a single-threaded runtime in a background thread and
/// reports completions as [`EngineEvent`]s.
///
/// Dropping the handle cancels everything still in flight.
pub struct EngineHandle {
    cmd_tx: UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, UpstreamError> {
        let client = UpstreamClient::new(settings)?;
        Self::with_catalog(Arc::new(ResourceGateway::new(client)))
    }

    pub fn with_catalog(catalog: Arc<dyn Catalog>) -> Result<Self, UpstreamError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| UpstreamError::new(ErrorKind::Configuration, err.to_string()))?;
        let (cmd_tx, cmd_rx) = unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            runtime.block_on(run_commands(catalog, cmd_rx, event_tx));
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn fetch_page(&self, request_id: RequestId, filter: FilterValue, page: u32) {
        catalog_info!(
            "FetchPage request_id={} page={} key={:?}",
            request_id,
            page,
            filter.cache_key()
        );
        let _ = self.cmd_tx.send(EngineCommand::FetchPage {
            request_id,
            filter,
            page,
        });
    }

    pub fn fetch_detail(&self, request_id: RequestId, item: ItemRef) {
        catalog_info!("FetchDetail request_id={} item={}", request_id, item);
        let _ = self
            .cmd_tx
            .send(EngineCommand::FetchDetail { request_id, item });
    }

    pub fn fetch_taxonomy(&self, request_id: RequestId, kind: Taxonomy, page_size: Option<u32>) {
        catalog_info!("FetchTaxonomy request_id={} kind={}", request_id, kind);
        let _ = self.cmd_tx.send(EngineCommand::FetchTaxonomy {
            request_id,
            kind,
            page_size,
        });
    }

    /// Triggers the request's cancellation token; the completion still
    /// arrives as an aborted event.
    pub fn cancel(&self, request_id: RequestId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { request_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}

async fn run_commands(
    catalog: Arc<dyn Catalog>,
    mut cmd_rx: UnboundedReceiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let root = CancellationToken::new();
    let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));

    while let Some(command) = cmd_rx.recv().await {
        match command {
            EngineCommand::FetchPage {
                request_id,
                filter,
                page,
            } => {
                let options = register(&in_flight, &root, request_id);
                let catalog = catalog.clone();
                let event_tx = event_tx.clone();
                let in_flight = in_flight.clone();
                tokio::spawn(async move {
                    let result = catalog.list(&filter, page, &options).await;
                    in_flight.lock().remove(&request_id);
                    log_outcome(request_id, result.as_ref().err());
                    let _ = event_tx.send(EngineEvent::PageFetched { request_id, result });
                });
            }
            EngineCommand::FetchDetail { request_id, item } => {
                let options = register(&in_flight, &root, request_id);
                let catalog = catalog.clone();
                let event_tx = event_tx.clone();
                let in_flight = in_flight.clone();
                tokio::spawn(async move {
                    let result = catalog.detail(&item, &options).await;
                    in_flight.lock().remove(&request_id);
                    log_outcome(request_id, result.as_ref().err());
                    let _ = event_tx.send(EngineEvent::DetailFetched { request_id, result });
                });
            }
            EngineCommand::FetchTaxonomy {
                request_id,
                kind,
                page_size,
            } => {
                let options = register(&in_flight, &root, request_id);
                let catalog = catalog.clone();
                let event_tx = event_tx.clone();
                let in_flight = in_flight.clone();
                tokio::spawn(async move {
                    let result = catalog.taxonomy(kind, page_size, &options).await;
                    in_flight.lock().remove(&request_id);
                    log_outcome(request_id, result.as_ref().err());
                    let _ = event_tx.send(EngineEvent::TaxonomyFetched { request_id, result });
                });
            }
            EngineCommand::Cancel { request_id } => {
                if let Some(token) = in_flight.lock().remove(&request_id) {
                    catalog_debug!("Cancel request_id={}", request_id);
                    token.cancel();
                }
            }
            EngineCommand::Shutdown => break,
        }
    }

    root.cancel();
}

fn register(in_flight: &InFlight, root: &CancellationToken, request_id: RequestId) -> GetOptions {
    let token = root.child_token();
    in_flight.lock().insert(request_id, token.clone());
    GetOptions::new().with_cancel(token)
}

fn log_outcome(request_id: RequestId, error: Option<&UpstreamError>) {
    match error {
        None => catalog_debug!("request_id={} completed", request_id),
        Some(err) if err.is_aborted() => catalog_debug!("request_id={} {}", request_id, err),
        Some(err) => catalog_info!("request_id={} failed: {}", request_id, err),
    }
}
