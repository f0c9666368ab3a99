use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use catalog_core::{
    update, AddressSync, FeedState, FeedView, FilterPatch, Item, MemoryNavigator, Msg, Navigator,
    Phase, ResetOptions, Taxon,
};
use catalog_engine::{ClientSettings, EngineEvent, EngineHandle, ItemRef, Taxonomy};
use catalog_logging::{catalog_debug, catalog_info, catalog_warn};

use super::effects::EffectRunner;
use super::persistence;

pub const DEFAULT_ADDRESS: &str = "/games";

/// What a `browse` run should do once the address is settled.
#[derive(Debug, Clone)]
pub struct BrowsePlan {
    /// Starting address; falls back to the persisted one, then [`DEFAULT_ADDRESS`].
    pub address: Option<String>,
    pub reset: Option<ResetOptions>,
    pub patch: FilterPatch,
    /// Total pages to hold before printing.
    pub pages: usize,
    pub refresh: bool,
    pub retries: u32,
    /// Overall budget; anything still loading afterwards is cancelled.
    pub wait: Duration,
}

/// Drives the fetch state machine against the engine.
pub struct Session {
    state: FeedState,
    runner: EffectRunner,
}

impl Session {
    pub fn new(runner: EffectRunner) -> Self {
        Self {
            state: FeedState::new(),
            runner,
        }
    }

    pub fn view(&self) -> FeedView {
        self.state.view()
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            let view = state.view();
            catalog_debug!(
                "phase={:?} pages={} items={} error={:?}",
                view.phase,
                view.page_count,
                view.items.len(),
                view.last_error
            );
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Steps the session until `plan` is satisfied, the feed settles in a
    /// state it cannot leave on its own, or `deadline` passes.
    pub fn drive(&mut self, plan: &BrowsePlan, deadline: Instant) -> anyhow::Result<FeedView> {
        let mut refresh_pending = plan.refresh;
        let mut retries_left = plan.retries;

        loop {
            let view = self.view();
            match view.phase {
                Phase::Ready if refresh_pending => {
                    refresh_pending = false;
                    self.dispatch(Msg::RefreshRequested);
                }
                Phase::Ready if view.has_more && view.page_count < plan.pages => {
                    self.dispatch(Msg::FetchNextRequested);
                }
                Phase::Error if retries_left > 0 => {
                    retries_left -= 1;
                    catalog_info!("Retrying after failure ({} retries left)", retries_left);
                    self.dispatch(Msg::RetryRequested);
                }
                Phase::Ready | Phase::Error | Phase::Idle => return Ok(view),
                Phase::LoadingInitial | Phase::LoadingMore | Phase::Refreshing => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match self.runner.next_msg(remaining)? {
                        Some(msg) => self.dispatch(msg),
                        None => {
                            catalog_warn!("Gave up waiting after {:?}", plan.wait);
                            self.dispatch(Msg::CancelRequested);
                            return Ok(self.view());
                        }
                    }
                }
            }
        }
    }
}

pub fn run_browse(settings: ClientSettings, plan: BrowsePlan, state_dir: &Path) -> anyhow::Result<()> {
    let start = plan
        .address
        .clone()
        .or_else(|| persistence::load_last_address(state_dir))
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let mut nav = MemoryNavigator::new(start.clone());
    let sync = AddressSync::new(address_path(&start));

    if let Some(options) = plan.reset {
        sync.reset(&mut nav, options);
    }
    if plan.patch != FilterPatch::default() {
        sync.apply(&mut nav, &plan.patch);
    }
    catalog_info!("Browsing {}", nav.location());

    let runner = EffectRunner::new(settings)?;
    let mut session = Session::new(runner);
    session.dispatch(Msg::FilterObserved(sync.current_filter(&nav)));
    let view = session.drive(&plan, Instant::now() + plan.wait)?;

    println!("{}", nav.location());
    print_feed(&view);
    persistence::save_last_address(state_dir, &nav.location());

    match view.last_error {
        Some(failure) if view.phase == Phase::Error => Err(anyhow!(failure)),
        _ => Ok(()),
    }
}

pub fn run_detail(settings: ClientSettings, raw: &str, wait: Duration) -> anyhow::Result<()> {
    let engine = EngineHandle::new(settings)?;
    let item = ItemRef::parse(raw);
    engine.fetch_detail(1, item.clone());

    let detail = match engine.recv_timeout(wait) {
        Some(EngineEvent::DetailFetched { result, .. }) => {
            result.with_context(|| format!("fetching {}", item))?
        }
        Some(other) => bail!("unexpected event for request {}", other.request_id()),
        None => {
            engine.cancel(1);
            bail!("no answer for {} within {:?}", item, wait);
        }
    };

    println!("{}", format_item(&detail.item));
    if !detail.item.genres.is_empty() {
        println!("genres: {}", join_names(&detail.item.genres));
    }
    if !detail.item.platforms.is_empty() {
        println!("platforms: {}", join_names(&detail.item.platforms));
    }
    if let Some(website) = &detail.website {
        println!("website: {}", website);
    }
    if let Some(description) = &detail.description {
        println!();
        println!("{}", description);
    }
    Ok(())
}

pub fn run_taxonomy(
    settings: ClientSettings,
    kind: Taxonomy,
    page_size: Option<u32>,
    wait: Duration,
) -> anyhow::Result<()> {
    let engine = EngineHandle::new(settings)?;
    engine.fetch_taxonomy(1, kind, page_size);

    let taxa = match engine.recv_timeout(wait) {
        Some(EngineEvent::TaxonomyFetched { result, .. }) => {
            result.with_context(|| format!("listing {}", kind))?
        }
        Some(other) => bail!("unexpected event for request {}", other.request_id()),
        None => {
            engine.cancel(1);
            bail!("no answer for {} within {:?}", kind, wait);
        }
    };

    for taxon in &taxa {
        println!("{}\t{}\t{}", taxon.id, taxon.slug, taxon.name);
    }
    Ok(())
}

/// Path portion of an address; the query and fragment are dropped.
fn address_path(address: &str) -> &str {
    let end = address.find(['?', '#']).unwrap_or(address.len());
    match &address[..end] {
        "" => DEFAULT_ADDRESS,
        path => path,
    }
}

fn print_feed(view: &FeedView) {
    for item in &view.items {
        println!("{}", format_item(item));
    }
    match view.total_count {
        Some(total) => println!(
            "-- {} of {} items in {} page(s){}",
            view.items.len(),
            total,
            view.page_count,
            match view.next_cursor {
                Some(cursor) => format!(", next page {}", cursor),
                None => String::new(),
            }
        ),
        None => println!("-- no results loaded"),
    }
    if let Some(failure) = &view.last_error {
        eprintln!("error: {}", failure);
    }
}

fn format_item(item: &Item) -> String {
    let released = item.released.as_deref().unwrap_or("-");
    let rating = item
        .rating
        .map(|rating| format!("{:.2}", rating))
        .unwrap_or_else(|| "-".to_string());
    format!("{}\t{}\t{}\t{}", item.id, item.name, released, rating)
}

fn join_names(taxa: &[Taxon]) -> String {
    taxa.iter()
        .map(|taxon| taxon.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
