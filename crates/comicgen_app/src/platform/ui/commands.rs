//! Interactive line input: `:`-prefixed commands, everything else is story text.

use comicgen_core::Msg;

pub const HELP: &str = "\
Type story text; each line is appended.
  :submit               start generation
  :reset                clear the form and any result
  :style NAME           comic style (default, manga, american, watercolor)
  :voice NAME           narration voice id
  :transitions on|off   page transitions
  :music on|off         background music
  :voices               list available voices
  :history              list recent tasks on the backend
  :download             save the finished video
  :dismiss ID           hide a notice
  :help                 show this text
  :quit                 exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch(Msg),
    AppendStory(String),
    ListVoices,
    Help,
    Quit,
}

pub fn parse_line(line: &str) -> Result<Command, String> {
    let Some(rest) = line.trim().strip_prefix(':') else {
        return Ok(Command::AppendStory(line.trim_end_matches(['\r', '\n']).to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "submit" => Command::Dispatch(Msg::SubmitClicked),
        "reset" => Command::Dispatch(Msg::ResetClicked),
        "download" => Command::Dispatch(Msg::DownloadClicked),
        "style" => Command::Dispatch(Msg::StyleChanged(required(name, arg)?)),
        "voice" => Command::Dispatch(Msg::VoiceChanged(required(name, arg)?)),
        "transitions" => Command::Dispatch(Msg::TransitionsToggled(switch(name, arg)?)),
        "music" => Command::Dispatch(Msg::BackgroundMusicToggled(switch(name, arg)?)),
        "dismiss" => {
            let id = arg
                .parse()
                .map_err(|_| format!(":dismiss expects a notice number, got {arg:?}"))?;
            Command::Dispatch(Msg::NoticeDismissed(id))
        }
        "voices" => Command::ListVoices,
        "history" => Command::Dispatch(Msg::HistoryRequested),
        "help" => Command::Help,
        "quit" | "q" => Command::Quit,
        other => return Err(format!("unknown command :{other} (try :help)")),
    };
    Ok(command)
}

fn required(name: &str, arg: &str) -> Result<String, String> {
    if arg.is_empty() {
        Err(format!(":{name} needs a value"))
    } else {
        Ok(arg.to_string())
    }
}

fn switch(name: &str, arg: &str) -> Result<bool, String> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" => Ok(true),
        "off" | "no" | "false" => Ok(false),
        _ => Err(format!(":{name} expects on or off")),
    }
}
