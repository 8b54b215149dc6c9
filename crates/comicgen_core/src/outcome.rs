use crate::TaskResult;

pub const DEFAULT_DOWNLOAD_FILENAME: &str = "comic-video.mp4";

/// Presentation bindings for a finished video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub video_url: String,
    pub poster_url: Option<String>,
    pub download_url: String,
    pub download_filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidResult;

/// Maps a terminal result to its bindings; the same input always yields the
/// same view.
pub fn render_outcome(result: Option<&TaskResult>) -> Result<ResultView, InvalidResult> {
    let result = result.ok_or(InvalidResult)?;
    let video_url = non_empty(result.video_url.as_deref()).ok_or(InvalidResult)?;

    Ok(ResultView {
        video_url: video_url.to_string(),
        poster_url: non_empty(result.thumbnail_url.as_deref()).map(str::to_string),
        download_url: video_url.to_string(),
        download_filename: non_empty(result.filename.as_deref())
            .unwrap_or(DEFAULT_DOWNLOAD_FILENAME)
            .to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
