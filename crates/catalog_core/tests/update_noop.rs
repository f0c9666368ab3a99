use catalog_core::{update, FeedState, Msg};

#[test]
fn update_is_noop() {
    let state = FeedState::new();
    let before = state.view();
    let (mut next, effects) = update(state, Msg::NoOp);

    assert_eq!(next.view(), before);
    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}
