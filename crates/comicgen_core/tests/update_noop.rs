use comicgen_core::{update, AppState, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn unknown_notice_dismissal_is_noop() {
    let mut state = AppState::new();
    let (mut next, effects) = update(state.clone(), Msg::NoticeDismissed(42));

    assert!(effects.is_empty());
    assert_eq!(state.consume_dirty(), next.consume_dirty());
}

#[test]
fn view_does_not_change_when_render_flag_is_consumed() {
    let (mut state, _) = update(AppState::new(), Msg::StoryTextChanged("draft".to_string()));
    let before = state.view();

    assert!(state.consume_dirty());
    assert_eq!(state.view(), before);
}
