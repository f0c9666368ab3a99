use crate::filter;
use crate::state::PendingFetch;
use crate::{Effect, FeedState, FetchKind, FilterValue, Msg, Phase, RequestId};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: FeedState, msg: Msg) -> (FeedState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilterObserved(filter) => observe_key(&mut state, &filter),
        Msg::FetchNextRequested => match state.phase {
            // Nothing held yet (first render or a cancelled initial load).
            Phase::Idle if state.key.is_some() => start_fetch(&mut state, FetchKind::Initial, 1),
            Phase::Ready if state.in_flight.is_none() => {
                let next_cursor = state.pages.last().and_then(|page| page.next_cursor);
                match next_cursor {
                    Some(cursor) => start_fetch(&mut state, FetchKind::More, cursor.page()),
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        },
        Msg::RefreshRequested => {
            if state.phase == Phase::Ready && state.in_flight.is_none() {
                start_fetch(&mut state, FetchKind::Refresh, 1)
            } else {
                Vec::new()
            }
        }
        Msg::RetryRequested => match (state.phase, state.failed.take()) {
            (Phase::Error, Some(failed)) => start_fetch(&mut state, failed.kind, failed.page),
            (_, failed) => {
                state.failed = failed;
                Vec::new()
            }
        },
        Msg::CancelRequested => match state.in_flight.take() {
            Some(pending) => {
                state.phase = state.settled_phase();
                state.mark_dirty();
                vec![Effect::CancelFetch {
                    request_id: pending.request_id,
                }]
            }
            None => Vec::new(),
        },
        Msg::CacheInvalidated => {
            state.cache.clear();
            Vec::new()
        }
        Msg::PageFetched { request_id, result } => {
            let Some(pending) = take_if_current(&mut state, request_id) else {
                return (state, Vec::new());
            };
            match result {
                Ok(page) => {
                    match pending.kind {
                        FetchKind::Initial | FetchKind::Refresh => state.pages = vec![page],
                        FetchKind::More => state.pages.push(page),
                    }
                    state.phase = Phase::Ready;
                    state.last_error = None;
                    state.failed = None;
                }
                Err(failure) => {
                    state.phase = Phase::Error;
                    state.last_error = Some(failure);
                    state.failed = Some(pending);
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::FetchAborted { request_id } => {
            if take_if_current(&mut state, request_id).is_some() {
                state.phase = state.settled_phase();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn observe_key(state: &mut FeedState, observed: &FilterValue) -> Vec<Effect> {
    let normalized = filter::normalize(observed);
    let key_string = filter::encode(&normalized);
    if state.key.is_some() && key_string == state.key_string {
        return Vec::new();
    }

    let mut effects = Vec::new();
    // Outstanding work for the old key is cancelled before anything is issued
    // for the new one.
    if let Some(pending) = state.in_flight.take() {
        effects.push(Effect::CancelFetch {
            request_id: pending.request_id,
        });
    }
    let previous_pages = std::mem::take(&mut state.pages);
    if state.key.is_some() {
        let previous_key = std::mem::take(&mut state.key_string);
        state.cache.store(previous_key, previous_pages);
    }

    state.key = Some(normalized);
    state.last_error = None;
    state.failed = None;
    state.mark_dirty();

    match state.cache.take(&key_string) {
        Some(pages) => {
            state.key_string = key_string;
            state.pages = pages;
            state.phase = Phase::Ready;
        }
        None => {
            state.key_string = key_string;
            state.phase = Phase::Idle;
            effects.extend(start_fetch(state, FetchKind::Initial, 1));
        }
    }
    effects
}

fn start_fetch(state: &mut FeedState, kind: FetchKind, page: u32) -> Vec<Effect> {
    let Some(filter) = state.key.clone() else {
        return Vec::new();
    };
    let request_id = state.allocate_request_id();
    state.in_flight = Some(PendingFetch {
        request_id,
        kind,
        page,
    });
    state.phase = kind.loading_phase();
    state.mark_dirty();
    vec![Effect::FetchPage {
        request_id,
        filter,
        page,
    }]
}

fn take_if_current(state: &mut FeedState, request_id: RequestId) -> Option<PendingFetch> {
    match state.in_flight {
        Some(pending) if pending.request_id == request_id => state.in_flight.take(),
        _ => None,
    }
}
