use std::io::BufRead;

use crossbeam_channel::Sender;
use eframe::egui;

/// An action requested over the text command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `c <name>` — switch to a GIF from the catalog directory.
    Change(String),
    /// `q`
    Quit,
    /// `r` — random catalog pick.
    Random,
    /// `s` — print the catalog listing to stdout.
    List,
    /// `full`
    ToggleFullscreen,
    /// `n` — advance the slideshow.
    Next,
}

/// Parse one input line. Unrecognized lines yield `None` and are ignored.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("c ") {
        let name = rest.trim();
        return (!name.is_empty()).then(|| Command::Change(name.to_owned()));
    }
    match line {
        "q" => Some(Command::Quit),
        "r" => Some(Command::Random),
        "s" => Some(Command::List),
        "full" => Some(Command::ToggleFullscreen),
        "n" => Some(Command::Next),
        _ => None,
    }
}

/// Background reader for the line-oriented command channel on stdin.
///
/// Commands are handed to the UI loop over the channel; the thread never
/// touches UI state itself. Ends silently on EOF or when the UI side hangs
/// up, without affecting the window.
pub fn spawn_stdin_listener(tx: Sender<Command>, ctx: egui::Context) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if let Some(cmd) = parse(&line) {
                if tx.send(cmd).is_err() {
                    break;
                }
                // wake the UI loop even if it is idle
                ctx.request_repaint();
            }
        }
    });
}
