use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use comicgen_core::{ControllerSettings, DEFAULT_MAX_STORY_CHARS, DEFAULT_NOTICE_TTL};
use comicgen_engine::{ApiSettings, EngineConfig};
use comicgen_logging::LogDestination;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "comicgen.ron";
pub const LOG_FILE: &str = "comicgen.log";

#[derive(Debug, Parser, Clone, Default)]
#[command(name = "comicgen")]
#[command(about = "Turn a short story into a narrated comic video")]
pub struct Cli {
    /// RON config file. `./comicgen.ron` is read when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend base URL.
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Status failures in a row before polling gives up.
    #[arg(long)]
    pub max_poll_failures: Option<u32>,

    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Log destination: file, terminal, both or off.
    #[arg(long)]
    pub log: Option<String>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Story text. Submits once and exits instead of reading commands.
    #[arg(long, conflicts_with = "story_file")]
    pub story: Option<String>,

    /// Read the story text from a file.
    #[arg(long)]
    pub story_file: Option<PathBuf>,

    #[arg(long)]
    pub style: Option<String>,

    #[arg(long)]
    pub voice: Option<String>,

    #[arg(long)]
    pub transitions: bool,

    #[arg(long)]
    pub music: bool,

    /// Save the finished video into the download directory.
    #[arg(long)]
    pub download: bool,
}

impl Cli {
    /// Story text for one-shot mode, if one was given.
    pub fn story(&self) -> Result<Option<String>> {
        if let Some(text) = &self.story {
            return Ok(Some(text.clone()));
        }
        match &self.story_file {
            Some(path) => fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("read story file {}", path.display())),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub max_consecutive_poll_failures: u32,
    pub max_story_chars: usize,
    /// How long notices stay up; `0` keeps them until dismissed.
    pub notice_ttl_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_download_bytes: u64,
    pub download_dir: PathBuf,
    pub log: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        let controller = ControllerSettings::default();
        Self {
            base_url: api.base_url,
            poll_interval_ms: controller.poll_interval.as_millis() as u64,
            max_consecutive_poll_failures: controller.max_consecutive_poll_failures,
            max_story_chars: DEFAULT_MAX_STORY_CHARS,
            notice_ttl_ms: DEFAULT_NOTICE_TTL.as_millis() as u64,
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.as_secs(),
            max_download_bytes: api.max_download_bytes,
            download_dir: PathBuf::from("downloads"),
            log: "file".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `explicit`, or the default config file when it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parse config file {}", path.display()))
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(interval) = cli.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if let Some(failures) = cli.max_poll_failures {
            self.max_consecutive_poll_failures = failures;
        }
        if let Some(dir) = &cli.download_dir {
            self.download_dir = dir.clone();
        }
        if let Some(log) = &cli.log {
            self.log = log.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        if self.max_consecutive_poll_failures == 0 {
            bail!("max_consecutive_poll_failures must be at least 1");
        }
        if self.max_story_chars == 0 {
            bail!("max_story_chars must be greater than zero");
        }
        self.log_destination()?;
        Ok(())
    }

    pub fn log_destination(&self) -> Result<LogDestination> {
        match LogDestination::parse(&self.log) {
            Some(destination) => Ok(destination),
            None => bail!(
                "unknown log destination {:?}; expected file, terminal, both or off",
                self.log
            ),
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            max_story_chars: self.max_story_chars,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_consecutive_poll_failures: self.max_consecutive_poll_failures,
            notice_ttl: (self.notice_ttl_ms > 0).then(|| Duration::from_millis(self.notice_ttl_ms)),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            api: ApiSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                max_download_bytes: self.max_download_bytes,
            },
            download_dir: self.download_dir.clone(),
        }
    }
}
