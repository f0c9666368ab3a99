//! Catalog core: filter codec, address synchronization and the pure
//! paginated-fetch state machine.
mod address;
mod cache;
mod effect;
pub mod filter;
mod msg;
mod page;
mod state;
mod update;
mod view_model;

pub use address::{AddressSync, MemoryNavigator, Navigator};
pub use effect::Effect;
pub use filter::{FilterPatch, FilterValue, ResetOptions, SortKey, UnknownSortKey};
pub use msg::Msg;
pub use page::{Cursor, Item, ItemDetail, ItemId, Page, Taxon};
pub use state::{FeedState, FetchFailure, FetchKind, Phase, RequestId};
pub use update::update;
pub use view_model::FeedView;
