// No windows_subsystem = "windows": the stdin command channel needs a console.

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::anyhow;
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::{egui::ViewportBuilder, NativeOptions};

mod anim;
mod catalog;
mod control;
mod fit;
mod gui;
mod load;

use catalog::FileCatalog;
use gui::ViewerApp;

/// Shown when the requested GIF is missing or none was named.
const DEFAULT_GIF: &str = "meow_rave.gif";

#[derive(Parser)]
#[command(name = "gifshow", about = "Full-window animated GIF viewer")]
struct Args {
    /// GIF to show first, by name inside the image directory
    gif: Option<String>,

    /// Directory scanned for .gif files
    #[arg(long, default_value = "images")]
    dir: PathBuf,

    /// Start fullscreen
    #[arg(short, long)]
    fullscreen: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let catalog = FileCatalog::new(args.dir);
    let start = initial_path(args.gif, &catalog);
    let fullscreen = args.fullscreen;

    // Commands arrive from the stdin reader thread and are drained by the
    // UI loop; nothing off the UI thread ever touches viewer state.
    let (cmd_tx, cmd_rx) = bounded(64);

    let mut opts = NativeOptions::default();
    opts.viewport = ViewportBuilder::default()
        .with_inner_size([960.0, 540.0])
        .with_decorations(true);

    eframe::run_native(
        "GIF Viewer",
        opts,
        Box::new(move |cc| {
            control::spawn_stdin_listener(cmd_tx, cc.egui_ctx.clone());
            let mut app = ViewerApp::new(cc.egui_ctx.clone(), catalog, cmd_rx, fullscreen);
            app.request_load(start);
            Box::new(app)
        }),
    )
    .map_err(|err| anyhow!("window system error: {err}"))
}

/// Pick the first file to display: the CLI argument if given, otherwise an
/// interactive prompt; anything missing or blank falls back to the default.
fn initial_path(requested: Option<String>, catalog: &FileCatalog) -> PathBuf {
    let requested = requested.or_else(prompt_for_name);
    if let Some(name) = requested {
        match catalog.resolve_existing(&name) {
            Ok(path) => return path,
            Err(err) => log::error!("{err}; falling back to {DEFAULT_GIF}"),
        }
    }
    catalog.resolve(DEFAULT_GIF)
}

fn prompt_for_name() -> Option<String> {
    print!("gif to show [{DEFAULT_GIF}]: ");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).ok()?;
    let name = line.trim();
    (!name.is_empty()).then(|| name.to_owned())
}
