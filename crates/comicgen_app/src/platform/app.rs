use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context, Result};
use clap::Parser;
use comicgen_core::{update, AppState, Msg, Outcome, Phase};
use comicgen_engine::EngineHandle;
use comicgen_logging::{cg_info, cg_warn};
use log::LevelFilter;

use super::config::{AppConfig, Cli, LOG_FILE};
use super::effects::EffectRunner;
use super::ui::commands::{parse_line, Command, HELP};
use super::ui::render::TerminalRenderer;

/// Everything the dispatcher loop reacts to.
pub enum AppInput {
    Msg(Msg),
    Line(String),
    InputClosed,
}

pub fn run_app() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.validate()?;

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    comicgen_logging::initialize(config.log_destination()?, level, Path::new(LOG_FILE));
    cg_info!("comicgen starting against {}", config.base_url);

    let story = cli.story()?;
    let (engine, events) =
        EngineHandle::new(config.engine_config()).context("failed to start engine")?;
    let (input_tx, input_rx) = mpsc::channel();
    let runner = EffectRunner::new(engine, events, input_tx.clone());
    let mut app = App {
        state: AppState::with_settings(config.controller_settings()),
        runner,
        renderer: TerminalRenderer::new(io::stdout()),
    };

    match story {
        Some(story) => {
            drop(input_tx);
            app.run_once(&cli, story, &input_rx)
        }
        None => {
            spawn_stdin_reader(input_tx);
            app.run_interactive(&input_rx)
        }
    }
}

struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer<W>,
}

impl<W: Write> App<W> {
    fn dispatch(&mut self, msg: Msg) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.renderer.render(&state.view())?;
        }
        self.state = state;
        self.runner.enqueue(effects);
        Ok(())
    }

    /// Submits one story and waits for the outcome (and download, if asked).
    fn run_once(
        &mut self,
        cli: &Cli,
        story: String,
        inputs: &mpsc::Receiver<AppInput>,
    ) -> Result<ExitCode> {
        self.renderer.render(&self.state.view())?;
        self.dispatch(Msg::StoryTextChanged(story))?;
        if let Some(style) = &cli.style {
            self.dispatch(Msg::StyleChanged(style.clone()))?;
        }
        if let Some(voice) = &cli.voice {
            self.dispatch(Msg::VoiceChanged(voice.clone()))?;
        }
        self.dispatch(Msg::TransitionsToggled(cli.transitions))?;
        self.dispatch(Msg::BackgroundMusicToggled(cli.music))?;
        self.dispatch(Msg::SubmitClicked)?;

        if self.state.phase() == Phase::Idle {
            // Rejected by validation; nothing was sent.
            return Ok(ExitCode::FAILURE);
        }

        let mut downloading = false;
        while let Ok(input) = inputs.recv() {
            let AppInput::Msg(msg) = input else {
                continue;
            };
            let download_ok = match &msg {
                Msg::DownloadFinished(result) => Some(result.is_ok()),
                _ => None,
            };
            self.dispatch(msg)?;

            if downloading {
                match download_ok {
                    Some(ok) => return Ok(exit_code(ok)),
                    None => continue,
                }
            }
            if self.state.phase() != Phase::Idle {
                continue;
            }

            let success = self.state.outcome().is_some_and(Outcome::is_success);
            if success && cli.download {
                downloading = true;
                self.dispatch(Msg::DownloadClicked)?;
                continue;
            }
            return Ok(exit_code(success));
        }
        bail!("engine stopped before the task finished")
    }

    fn run_interactive(&mut self, inputs: &mpsc::Receiver<AppInput>) -> Result<ExitCode> {
        self.renderer.print(HELP)?;
        self.renderer.render(&self.state.view())?;
        self.dispatch(Msg::Started)?;

        while let Ok(input) = inputs.recv() {
            match input {
                AppInput::Msg(msg) => self.dispatch(msg)?,
                AppInput::Line(line) => match parse_line(&line) {
                    Ok(Command::Dispatch(msg)) => self.dispatch(msg)?,
                    Ok(Command::AppendStory(text)) => {
                        let story = append_line(&self.state.view().form.story_text, &text);
                        self.dispatch(Msg::StoryTextChanged(story))?;
                    }
                    Ok(Command::ListVoices) => self.renderer.print_voices(&self.state.view())?,
                    Ok(Command::Help) => self.renderer.print(HELP)?,
                    Ok(Command::Quit) => break,
                    Err(message) => self.renderer.print(&message)?,
                },
                AppInput::InputClosed => break,
            }
        }

        if self.state.current_session().is_some() {
            cg_warn!("Leaving with a generation still in progress");
            self.dispatch(Msg::ResetClicked)?;
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn spawn_stdin_reader(input_tx: mpsc::Sender<AppInput>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if input_tx.send(AppInput::Line(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(AppInput::InputClosed);
    });
}

fn append_line(story: &str, line: &str) -> String {
    if story.is_empty() {
        line.to_string()
    } else {
        format!("{story}\n{line}")
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
