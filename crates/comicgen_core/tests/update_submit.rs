use std::sync::Once;

use comicgen_core::{
    update, AppState, Effect, Msg, NoticeKind, Outcome, Phase, Severity, SubmitFailure,
    Submission, TaskId, BUSY_LABEL, DEFAULT_NOTICE_TTL, DEFAULT_STYLE, DEFAULT_VOICE, SUBMIT_LABEL,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(comicgen_logging::initialize_for_tests);
}

fn submit_story(state: AppState, text: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::StoryTextChanged(text.to_string()));
    update(state, Msg::SubmitClicked)
}

#[test]
fn short_story_is_rejected_without_request() {
    init_logging();
    for text in ["", "   ", "too short", "  123456789  "] {
        let (state, effects) = submit_story(AppState::new(), text);
        assert_eq!(
            effects,
            vec![Effect::ExpireNotice {
                id: 1,
                after: DEFAULT_NOTICE_TTL,
            }],
            "no request for {text:?}"
        );

        let view = state.view();
        assert_eq!(view.phase, Phase::Idle);
        assert!(view.submit.enabled);
        assert_eq!(view.progress, None);
        assert_eq!(view.outcome, None);
        assert_eq!(view.notices.len(), 1);
        assert_eq!(view.notices[0].kind, NoticeKind::Validation);
        assert_eq!(view.notices[0].severity, Severity::Danger);
    }
}

#[test]
fn valid_story_issues_exactly_one_creation_request() {
    init_logging();
    let story = "A".repeat(50);
    let (state, effects) = submit_story(AppState::new(), &story);

    assert_eq!(
        effects,
        vec![Effect::CreateTask {
            session: 1,
            submission: Submission {
                story_text: story.clone(),
                style: DEFAULT_STYLE.to_string(),
                voice_id: DEFAULT_VOICE.to_string(),
                use_transitions: false,
                add_background_music: false,
            },
        }]
    );

    let view = state.view();
    assert_eq!(view.phase, Phase::Submitting);
    assert!(!view.submit.enabled);
    assert_eq!(view.submit.label, BUSY_LABEL);
    let progress = view.progress.expect("progress visible");
    assert_eq!(progress.percent, 0.0);
    assert_eq!(progress.text, "Initializing... (0%)");

    // Pressing again while the control is disabled does nothing.
    let (state, effects) = update(state, Msg::SubmitClicked);
    assert!(effects.is_empty());
    assert_eq!(state.view().phase, Phase::Submitting);
}

#[test]
fn form_fields_flow_into_submission() {
    init_logging();
    let mut state = AppState::new();
    for msg in [
        Msg::StyleChanged("anime".to_string()),
        Msg::VoiceChanged("en-US-JennyNeural".to_string()),
        Msg::TransitionsToggled(true),
        Msg::BackgroundMusicToggled(true),
    ] {
        state = update(state, msg).0;
    }
    let (_state, effects) = submit_story(state, "Once upon a time in a far land");

    match effects.as_slice() {
        [Effect::CreateTask { submission, .. }] => {
            assert_eq!(submission.style, "anime");
            assert_eq!(submission.voice_id, "en-US-JennyNeural");
            assert!(submission.use_transitions);
            assert!(submission.add_background_music);
        }
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn creation_failure_surfaces_server_message_and_rearms() {
    init_logging();
    let (state, _) = submit_story(AppState::new(), "a story that is long enough");
    let (state, effects) = update(
        state,
        Msg::TaskCreationFailed {
            session: 1,
            failure: SubmitFailure {
                message: Some("text too long".to_string()),
            },
        },
    );

    assert_eq!(
        effects,
        vec![Effect::ExpireNotice {
            id: 1,
            after: DEFAULT_NOTICE_TTL,
        }]
    );
    let view = state.view();
    assert_eq!(view.phase, Phase::Idle);
    assert!(view.submit.enabled);
    assert_eq!(view.submit.label, SUBMIT_LABEL);
    assert_eq!(view.outcome, Some(Outcome::SubmissionFailed));
    assert_eq!(view.progress, None);
    let notice = view.notices.last().expect("notice");
    assert_eq!(notice.kind, NoticeKind::SubmissionFailure);
    assert_eq!(notice.message, "text too long");
}

#[test]
fn creation_failure_without_message_uses_fallback() {
    init_logging();
    let (state, _) = submit_story(AppState::new(), "a story that is long enough");
    let (state, _) = update(
        state,
        Msg::TaskCreationFailed {
            session: 1,
            failure: SubmitFailure::default(),
        },
    );

    let notice = state.view().notices.last().cloned().expect("notice");
    assert_eq!(notice.message, "Generation request failed");

    // Retry issues a new request under a fresh session id.
    let (_state, effects) = update(state, Msg::SubmitClicked);
    assert!(matches!(
        effects.as_slice(),
        [Effect::CreateTask { session: 2, .. }]
    ));
}

#[test]
fn creation_response_for_other_session_is_ignored() {
    init_logging();
    let (state, _) = submit_story(AppState::new(), "a story that is long enough");
    let before = state.view();

    let (mut state, effects) = update(
        state,
        Msg::TaskCreated {
            session: 99,
            task_id: TaskId::new("ghost"),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
    assert_eq!(state.view().task_id, None);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn counter_tracks_story_length() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::StoryTextChanged("x".repeat(1801)));
    let counter = state.view().counter;
    assert_eq!(counter.length, 1801);
    assert_eq!(counter.max, 2000);
    assert!(counter.warning);
    assert!(counter.danger);
}
