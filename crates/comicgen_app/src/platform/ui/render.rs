use std::io::{self, Write};

use chrono::{DateTime, Local};
use comicgen_core::{AppViewModel, Notice, ProgressView, ResultView, Severity, TaskSummary};

const BAR_WIDTH: usize = 20;
const HISTORY_TEXT_CHARS: usize = 40;

/// Prints the parts of the view model that changed since the last render.
pub struct TerminalRenderer<W: Write> {
    out: W,
    last: Option<AppViewModel>,
    clock: fn() -> String,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: None,
            clock: local_time,
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        let timestamp = (self.clock)();
        for line in render_lines(self.last.as_ref(), view, &timestamp) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        self.last = Some(view.clone());
        Ok(())
    }

    pub fn print(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    pub fn print_voices(&mut self, view: &AppViewModel) -> io::Result<()> {
        for line in voice_lines(view) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

fn local_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn render_lines(prev: Option<&AppViewModel>, view: &AppViewModel, timestamp: &str) -> Vec<String> {
    let mut lines = Vec::new();

    if prev.map(|p| p.counter) != Some(view.counter) {
        lines.push(counter_line(view));
    }

    let options = options_line(view);
    if prev.map(options_line) != Some(options.clone()) {
        lines.push(options);
    }

    if let Some(p) = prev {
        if p.submit != view.submit {
            let state = if view.submit.enabled { "" } else { " (busy)" };
            lines.push(format!("Submit: {}{}", view.submit.label, state));
        }
    }

    if let Some(task_id) = &view.task_id {
        if prev.and_then(|p| p.task_id.as_ref()) != Some(task_id) {
            lines.push(format!("Task {task_id} accepted"));
        }
    }

    if let Some(progress) = &view.progress {
        if prev.and_then(|p| p.progress.as_ref()) != Some(progress) {
            lines.push(progress_line(progress));
        }
    }

    if let Some(result) = &view.result {
        if prev.and_then(|p| p.result.as_ref()) != Some(result) {
            lines.push("---- result ----".to_string());
            lines.extend(result_lines(result));
        }
    }

    // Notice ids only grow, so anything above the last rendered id is new.
    let last_seen = prev
        .and_then(|p| p.notices.iter().map(|n| n.id).max())
        .unwrap_or(0);
    lines.extend(
        view.notices
            .iter()
            .filter(|notice| notice.id > last_seen)
            .map(|notice| notice_line(notice, timestamp)),
    );

    if let Some(history) = &view.history {
        if prev.and_then(|p| p.history.as_ref()) != Some(history) {
            lines.extend(history_lines(history));
        }
    }

    if let Some(voices) = &view.voices {
        if prev.is_some_and(|p| p.voices.is_none()) {
            lines.push(format!("{} voice(s) available; :voices to list", voices.len()));
        }
    }

    lines
}

fn counter_line(view: &AppViewModel) -> String {
    let marker = if view.counter.danger {
        " - almost full"
    } else if view.counter.warning {
        " - getting long"
    } else {
        ""
    };
    format!("Story: {}{}", view.counter.label(), marker)
}

fn options_line(view: &AppViewModel) -> String {
    let style = if view.form.style.trim().is_empty() {
        comicgen_core::DEFAULT_STYLE
    } else {
        view.form.style.trim()
    };
    format!(
        "Options: style={} voice={} transitions={} music={}",
        style,
        view.selected_voice,
        on_off(view.form.use_transitions),
        on_off(view.form.add_background_music)
    )
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn progress_line(progress: &ProgressView) -> String {
    let filled = ((progress.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "[{}{}] {}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        progress.text
    )
}

fn result_lines(result: &ResultView) -> Vec<String> {
    let mut lines = vec![format!("Video: {}", result.video_url)];
    if let Some(poster) = &result.poster_url {
        lines.push(format!("Poster: {poster}"));
    }
    lines.push(format!(
        "Download: {} (:download to save)",
        result.download_filename
    ));
    lines
}

fn notice_line(notice: &Notice, timestamp: &str) -> String {
    let severity = match notice.severity {
        Severity::Info => "INFO",
        Severity::Warning => "WARN",
        Severity::Danger => "ERROR",
    };
    format!(
        "[{timestamp}] {severity} #{}: {}",
        notice.id, notice.message
    )
}

fn history_lines(history: &[TaskSummary]) -> Vec<String> {
    if history.is_empty() {
        return vec!["No tasks yet".to_string()];
    }
    let mut lines = vec!["---- recent tasks ----".to_string()];
    lines.extend(history.iter().map(|entry| {
        let elapsed = entry
            .elapsed_secs()
            .map(|secs| format!("{secs:.0}s"))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}  {:<10} {}  {:<10} {:>5}  {}",
            entry.task_id,
            entry.status,
            started_at(entry.started_at),
            entry.style,
            elapsed,
            preview(&entry.text)
        )
    }));
    lines
}

fn started_at(secs: f64) -> String {
    DateTime::from_timestamp(secs.trunc() as i64, 0)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= HISTORY_TEXT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(HISTORY_TEXT_CHARS).collect();
    format!("{cut}...")
}

fn voice_lines(view: &AppViewModel) -> Vec<String> {
    match &view.voices {
        None => vec!["Voice list is still loading".to_string()],
        Some(voices) => voices
            .iter()
            .map(|voice| {
                let marker = if voice.value == view.selected_voice {
                    '*'
                } else {
                    ' '
                };
                format!("{marker} {}  {}", voice.value, voice.label)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comicgen_core::{
        update, AppState, Msg, SessionId, TaskId, TaskResult, TaskState, TaskStatus, TaskSummary,
    };
    use pretty_assertions::assert_eq;

    fn fixed_clock() -> String {
        "12:00:00".to_string()
    }

    fn renderer() -> TerminalRenderer<Vec<u8>> {
        TerminalRenderer {
            clock: fixed_clock,
            ..TerminalRenderer::new(Vec::new())
        }
    }

    fn output(renderer: TerminalRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn step(state: AppState, msg: Msg) -> AppState {
        update(state, msg).0
    }

    fn submitted(story: &str) -> (AppState, SessionId) {
        let state = step(AppState::new(), Msg::StoryTextChanged(story.to_string()));
        let state = step(state, Msg::SubmitClicked);
        let session = state.current_session().expect("session");
        (state, session)
    }

    #[test]
    fn first_render_shows_counter_and_options() {
        let mut renderer = renderer();
        renderer.render(&AppState::new().view()).unwrap();
        assert_eq!(
            output(renderer),
            "Story: 0/2000 chars\n\
             Options: style=default voice=zh-CN-XiaoxiaoNeural transitions=off music=off\n"
        );
    }

    #[test]
    fn unchanged_view_prints_nothing() {
        let mut renderer = renderer();
        let view = AppState::new().view();
        renderer.render(&view).unwrap();
        let before = renderer.out.len();
        renderer.render(&view).unwrap();
        assert_eq!(renderer.out.len(), before);
    }

    #[test]
    fn submission_flow_prints_progress_and_result() {
        let mut renderer = renderer();
        renderer.render(&AppState::new().view()).unwrap();
        let (state, session) = submitted(&"A".repeat(50));
        renderer.render(&state.view()).unwrap();

        let state = step(
            state,
            Msg::TaskCreated {
                session,
                task_id: TaskId::new("t1"),
            },
        );
        let state = step(
            state,
            Msg::StatusReceived {
                session,
                status: TaskStatus {
                    state: TaskState::Running,
                    progress: 50.0,
                    label: Some("Rendering pages".to_string()),
                    ..TaskStatus::default()
                },
            },
        );
        renderer.render(&state.view()).unwrap();

        let state = step(
            state,
            Msg::StatusReceived {
                session,
                status: TaskStatus {
                    state: TaskState::Completed,
                    progress: 100.0,
                    result: Some(TaskResult {
                        video_url: Some("http://host/outputs/t1/output.mp4".to_string()),
                        thumbnail_url: Some("http://host/outputs/t1/thumb.jpg".to_string()),
                        filename: None,
                    }),
                    ..TaskStatus::default()
                },
            },
        );
        renderer.render(&state.view()).unwrap();

        let text = output(renderer);
        assert!(text.contains("Submit: Processing... (busy)"));
        assert!(text.contains("Task t1 accepted"));
        assert!(text.contains("[##########..........] Rendering pages (50%)"));
        assert!(text.contains("---- result ----"));
        assert!(text.contains("Video: http://host/outputs/t1/output.mp4"));
        assert!(text.contains("Poster: http://host/outputs/t1/thumb.jpg"));
        assert!(text.contains("Download: comic-video.mp4 (:download to save)"));
        assert!(text.contains("Submit: Generate comic video\n"));
    }

    #[test]
    fn notices_print_once_with_timestamp() {
        let mut renderer = renderer();
        let state = step(AppState::new(), Msg::StoryTextChanged("short".to_string()));
        let state = step(state, Msg::SubmitClicked);
        renderer.render(&state.view()).unwrap();
        renderer.render(&state.view()).unwrap();

        let text = output(renderer);
        let notice = "[12:00:00] ERROR #1: Please enter at least 10 characters of story text";
        assert_eq!(text.matches(notice).count(), 1, "{text}");
    }

    #[test]
    fn notice_after_expired_ones_still_prints() {
        let mut renderer = renderer();
        let state = step(AppState::new(), Msg::SubmitClicked);
        renderer.render(&state.view()).unwrap();
        let state = step(state, Msg::NoticeDismissed(1));
        renderer.render(&state.view()).unwrap();
        let state = step(state, Msg::SubmitClicked);
        renderer.render(&state.view()).unwrap();

        let text = output(renderer);
        assert_eq!(text.matches("ERROR #1:").count(), 1, "{text}");
        assert_eq!(text.matches("ERROR #2:").count(), 1, "{text}");
    }

    #[test]
    fn history_prints_when_loaded() {
        let mut renderer = renderer();
        let state = step(AppState::new(), Msg::HistoryRequested);
        renderer.render(&state.view()).unwrap();
        let before = renderer.out.len();

        let state = step(
            state,
            Msg::HistoryLoaded(Ok(vec![
                TaskSummary {
                    task_id: TaskId::new("b2"),
                    text: "A knight\nand a very small dragon who could not breathe fire".to_string(),
                    style: "manga".to_string(),
                    status: "processing".to_string(),
                    started_at: 1714564900.0,
                    completed_at: None,
                },
                TaskSummary {
                    task_id: TaskId::new("a1"),
                    text: "The sea was calm".to_string(),
                    style: "default".to_string(),
                    status: "completed".to_string(),
                    started_at: 1714564800.0,
                    completed_at: Some(1714564842.0),
                },
            ])),
        );
        renderer.render(&state.view()).unwrap();
        renderer.render(&state.view()).unwrap();

        let text = output(renderer);
        assert_eq!(
            &text[before..],
            "---- recent tasks ----\n\
             b2  processing 2024-05-01 12:01:40 UTC  manga          -  \
             A knight and a very small dragon who cou...\n\
             a1  completed  2024-05-01 12:00:00 UTC  default      42s  The sea was calm\n"
        );
    }

    #[test]
    fn empty_history_says_so() {
        let mut renderer = renderer();
        renderer.render(&AppState::new().view()).unwrap();
        let state = step(AppState::new(), Msg::HistoryLoaded(Ok(Vec::new())));
        renderer.render(&state.view()).unwrap();
        assert!(output(renderer).ends_with("No tasks yet\n"));
    }

    #[test]
    fn counter_marks_long_stories() {
        let mut renderer = renderer();
        let state = step(AppState::new(), Msg::StoryTextChanged("x".repeat(1801)));
        renderer.render(&state.view()).unwrap();
        assert!(output(renderer).starts_with("Story: 1801/2000 chars - almost full\n"));
    }

    #[test]
    fn voice_list_marks_selection() {
        let state = step(AppState::new(), Msg::VoicesLoaded(Ok(Vec::new())));
        let mut renderer = renderer();
        renderer.print_voices(&state.view()).unwrap();
        assert_eq!(
            output(renderer),
            "* zh-CN-XiaoxiaoNeural  Xiaoxiao (zh-CN)\n"
        );

        let mut renderer = self::renderer();
        renderer.print_voices(&AppState::new().view()).unwrap();
        assert_eq!(output(renderer), "Voice list is still loading\n");
    }
}
