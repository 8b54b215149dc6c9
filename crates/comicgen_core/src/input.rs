//! Input gate: form values, submission packaging and the character counter.

pub const DEFAULT_STYLE: &str = "default";
pub const DEFAULT_VOICE: &str = "zh-CN-XiaoxiaoNeural";
pub const MIN_STORY_CHARS: usize = 10;
pub const DEFAULT_MAX_STORY_CHARS: usize = 2000;

/// Raw form values as edited by the user. Empty strings mean "not set".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormInput {
    pub story_text: String,
    pub style: String,
    pub voice_id: String,
    pub use_transitions: bool,
    pub add_background_music: bool,
}

/// Validated payload for one creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub story_text: String,
    pub style: String,
    pub voice_id: String,
    pub use_transitions: bool,
    pub add_background_music: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    StoryTooShort { min: usize, actual: usize },
}

impl Submission {
    /// Packages form values, substituting defaults for unset fields.
    pub fn from_form(form: &FormInput) -> Result<Self, ValidationError> {
        let trimmed_len = form.story_text.trim().chars().count();
        if trimmed_len < MIN_STORY_CHARS {
            return Err(ValidationError::StoryTooShort {
                min: MIN_STORY_CHARS,
                actual: trimmed_len,
            });
        }

        Ok(Self {
            story_text: form.story_text.clone(),
            style: or_default(&form.style, DEFAULT_STYLE),
            voice_id: or_default(&form.voice_id, DEFAULT_VOICE),
            use_transitions: form.use_transitions,
            add_background_music: form.add_background_music,
        })
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Live character readout. `warning` and `danger` are independent flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharCounter {
    pub length: usize,
    pub max: usize,
    pub warning: bool,
    pub danger: bool,
}

impl CharCounter {
    pub fn label(&self) -> String {
        format!("{}/{} chars", self.length, self.max)
    }
}

pub fn char_counter(text: &str, max: usize) -> CharCounter {
    let length = text.chars().count();
    // remaining < max * 0.2, kept in integers: remaining * 10 < max * 2
    let remaining = max as i64 - length as i64;
    let max_i = max as i64;
    CharCounter {
        length,
        max,
        warning: remaining * 10 < max_i * 2,
        danger: remaining * 10 < max_i,
    }
}
