//! Catalog engine: upstream HTTP client, resource gateway and effect execution.
mod client;
mod config;
mod engine;
mod gateway;
mod types;
mod wire;

pub use client::{
    parse_retry_after, wait_or_cancel, GetOptions, ParamValue, Params, UpstreamClient,
    MAX_RETRY_AFTER,
};
pub use config::{ClientSettings, API_BASE_ENV, API_KEY_ENV, DEFAULT_BASE_URL};
pub use engine::EngineHandle;
pub use gateway::{list_params, Catalog, ItemRef, ResourceGateway, Taxonomy};
pub use types::{AbortReason, EngineEvent, ErrorKind, UpstreamError};
pub use tokio_util::sync::CancellationToken;
