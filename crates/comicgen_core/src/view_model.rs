use crate::{CharCounter, FormInput, Notice, Outcome, Phase, ResultView, TaskId, TaskSummary};

pub const SUBMIT_LABEL: &str = "Generate comic video";
pub const BUSY_LABEL: &str = "Processing...";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub form: FormInput,
    pub counter: CharCounter,
    pub submit: SubmitControl,
    /// `None` while the progress surface is hidden.
    pub progress: Option<ProgressView>,
    pub task_id: Option<TaskId>,
    /// `None` while the result surface is hidden.
    pub result: Option<ResultView>,
    pub outcome: Option<Outcome>,
    pub notices: Vec<Notice>,
    /// `None` until the voice catalog lookup finishes.
    pub voices: Option<Vec<VoiceOption>>,
    pub selected_voice: String,
    /// `None` until a history lookup finishes; cleared when a new one starts.
    pub history: Option<Vec<TaskSummary>>,
    pub focus: Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: &'static str,
}

impl Default for SubmitControl {
    fn default() -> Self {
        Self {
            enabled: true,
            label: SUBMIT_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    /// Always within `0.0..=100.0`.
    pub percent: f64,
    pub text: String,
}

impl ProgressView {
    pub(crate) fn new(percent: f64, label: Option<&str>) -> Self {
        let rounded = percent.round() as u32;
        let text = match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => format!("{label} ({rounded}%)"),
            None => format!("{rounded}%"),
        };
        Self { percent, text }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceOption {
    pub value: String,
    pub label: String,
}

/// Which area should be brought into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Result,
}
