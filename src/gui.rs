use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use eframe::{
    egui,
    egui::{Color32, ColorImage, Key, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2},
    App,
};

use crate::{
    anim::Animator,
    catalog::FileCatalog,
    control::Command,
    fit,
    load::{self, LoadMsg},
};

/* ───────────────────────── UI tuneables ─────────────────────────── */

/// Automatic advance to the next catalog entry.
const SLIDESHOW_INTERVAL: Duration = Duration::from_secs(20);

/// The picker menu closes itself after this long without pointer motion.
const MENU_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/* ───────────────────────── app state ────────────────────────────── */

/// The whole viewer session: current image set, animator, catalog handle,
/// menu and fullscreen bookkeeping, plus the channels the background decode
/// and stdin threads feed into. All mutation happens on the UI loop.
pub struct ViewerApp {
    catalog: FileCatalog,
    current_path: Option<PathBuf>,

    /// Uploaded textures of the current image set, index-parallel with the
    /// animator's delays. Replaced wholesale on every completed load.
    frames: Vec<TextureHandle>,
    animator: Animator,

    load_tx: Sender<LoadMsg>,
    load_rx: Receiver<LoadMsg>,
    cmd_rx: Receiver<Command>,

    // Bumped on every load request; stale completions are dropped.
    current_gen: Arc<AtomicU64>,

    // We manage *borderless* fullscreen ourselves (not OS fullscreen):
    is_borderless_fs: bool,
    prev_win_pos: Option<egui::Pos2>,
    prev_win_size: Option<egui::Vec2>,
    pending_start_fullscreen: bool,

    menu_open: bool,
    menu_idle_since: Instant,

    last_advance: Instant,

    egui_ctx: egui::Context,
}

impl ViewerApp {
    pub fn new(
        egui_ctx: egui::Context,
        catalog: FileCatalog,
        cmd_rx: Receiver<Command>,
        start_fullscreen: bool,
    ) -> Self {
        let (load_tx, load_rx) = bounded::<LoadMsg>(load::LOAD_CHAN_CAP);
        Self {
            catalog,
            current_path: None,
            frames: Vec::new(),
            animator: Animator::new(),
            load_tx,
            load_rx,
            cmd_rx,
            current_gen: Arc::new(AtomicU64::new(0)),
            is_borderless_fs: false,
            prev_win_pos: None,
            prev_win_size: None,
            pending_start_fullscreen: start_fullscreen,
            menu_open: false,
            menu_idle_since: Instant::now(),
            last_advance: Instant::now(),
            egui_ctx,
        }
    }

    /// Kick off a background decode of `path` and make it the pending
    /// current file. Also restarts the slideshow interval: any image change,
    /// manual or automatic, opens a fresh 20 s window.
    pub fn request_load(&mut self, path: PathBuf) {
        let generation = self.current_gen.fetch_add(1, Ordering::Relaxed) + 1;
        self.current_path = Some(path.clone());
        self.last_advance = Instant::now();
        load::spawn_load(
            path,
            generation,
            self.current_gen.clone(),
            self.load_tx.clone(),
            self.egui_ctx.clone(),
        );
    }

    /// Switch to a catalog entry by name. A missing file is reported on the
    /// console and leaves the current image displayed.
    fn change_file(&mut self, name: &str) {
        match self.catalog.resolve_existing(name) {
            Ok(path) => self.request_load(path),
            Err(err) => log::error!("{err}"),
        }
    }

    fn next_slide(&mut self) {
        match self.catalog.next_after(self.current_path.as_deref()) {
            Some(path) => self.request_load(path),
            None => {
                log::warn!("no gifs in {}", self.catalog.dir().display());
                self.last_advance = Instant::now();
            }
        }
    }

    fn random_slide(&mut self) {
        if let Some(path) = self.catalog.random() {
            self.request_load(path);
        } else {
            log::warn!("no gifs in {}", self.catalog.dir().display());
        }
    }

    fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
        if self.menu_open {
            self.menu_idle_since = Instant::now();
        }
    }

    fn toggle_borderless_fullscreen(&mut self, ctx: &egui::Context) {
        let (cur_pos, cur_size, monitor_size) = ctx.input(|i| {
            let vp = &i.viewport();
            let cur_pos = vp
                .outer_rect
                .unwrap_or(egui::Rect::from_min_size(
                    egui::pos2(0.0, 0.0),
                    i.screen_rect().size(),
                ))
                .min;
            let cur_size = vp.inner_rect.unwrap_or(i.screen_rect()).size();
            let mon_size = vp.monitor_size.unwrap_or(i.screen_rect().size());
            (cur_pos, cur_size, mon_size)
        });

        if !self.is_borderless_fs {
            // Save current window geometry, go borderless and cover the
            // monitor (no OS fullscreen, so no classic frame flash).
            self.prev_win_pos = Some(cur_pos);
            self.prev_win_size = Some(cur_size);

            ctx.send_viewport_cmd(egui::ViewportCommand::Decorations(false));
            ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(egui::pos2(0.0, 0.0)));
            ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(monitor_size));
            self.is_borderless_fs = true;
        } else {
            ctx.send_viewport_cmd(egui::ViewportCommand::Decorations(true));
            if let Some(s) = self.prev_win_size {
                ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(s));
            }
            if let Some(p) = self.prev_win_pos {
                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(p));
            }
            self.is_borderless_fs = false;
        }
        ctx.request_repaint();
    }

    /// Drain the stdin command channel.
    fn drain_commands(&mut self, ctx: &egui::Context) {
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            match cmd {
                Command::Change(name) => self.change_file(&name),
                Command::Quit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
                Command::Random => self.random_slide(),
                Command::List => println!("{}", self.catalog.list().join("  ")),
                Command::ToggleFullscreen => self.toggle_borderless_fullscreen(ctx),
                Command::Next => self.next_slide(),
            }
        }
    }

    /// Drain completed loads: upload textures and restart the animator.
    fn drain_loads(&mut self, ctx: &egui::Context) {
        loop {
            match self.load_rx.try_recv() {
                Ok(msg) => {
                    // A newer request superseded this one while it decoded.
                    if msg.generation != self.current_gen.load(Ordering::Relaxed) {
                        continue;
                    }

                    let name = msg
                        .path
                        .file_name()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| msg.path.display().to_string());

                    let mut frames = Vec::with_capacity(msg.frames.len());
                    let mut delays = Vec::with_capacity(msg.frames.len());
                    for (i, f) in msg.frames.into_iter().enumerate() {
                        let tex = ctx.load_texture(
                            format!("{name}#{i}"),
                            ColorImage::from_rgba_unmultiplied([f.width, f.height], &f.rgba),
                            TextureOptions::LINEAR,
                        );
                        frames.push(tex);
                        delays.push(f.delay);
                    }

                    self.frames = frames;
                    self.animator.start(delays, Instant::now());
                    self.current_path = Some(msg.path);
                    ctx.request_repaint();
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Transient picker overlay. Closes on selection, on its idle timeout,
    /// or when the backdrop is clicked; pointer motion inside it keeps it
    /// alive.
    fn show_menu(&mut self, ctx: &egui::Context, input: &egui::InputState) {
        if !self.menu_open {
            return;
        }
        if self.menu_idle_since.elapsed() >= MENU_IDLE_TIMEOUT {
            self.menu_open = false;
            return;
        }

        let mut picked: Option<String> = None;
        let response = egui::Window::new("gifs")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                let names = self.catalog.list();
                if names.is_empty() {
                    ui.label(format!("no gifs in {}", self.catalog.dir().display()));
                    return;
                }
                egui::ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
                    for name in names {
                        if ui.button(&name).clicked() {
                            picked = Some(name);
                        }
                    }
                });
            });

        if let Some(inner) = response {
            let rect = inner.response.rect;
            let moved = input.pointer.delta() != Vec2::ZERO;
            let inside = input
                .pointer
                .hover_pos()
                .map_or(false, |p| rect.contains(p));
            if moved && inside {
                self.menu_idle_since = Instant::now();
            }
        }

        if let Some(name) = picked {
            self.menu_open = false;
            self.change_file(&name);
        }

        // make sure the idle timeout fires even with no input events
        ctx.request_repaint_after(MENU_IDLE_TIMEOUT.saturating_sub(self.menu_idle_since.elapsed()));
    }
}

/* ─────────────────── eframe integration ───────────────────────── */

impl App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        if self.pending_start_fullscreen {
            self.pending_start_fullscreen = false;
            self.toggle_borderless_fullscreen(ctx);
        }

        self.drain_commands(ctx);
        self.drain_loads(ctx);

        let input = ctx.input(|i| i.clone());

        // Hotkeys
        if input.key_pressed(Key::F11) {
            self.toggle_borderless_fullscreen(ctx);
        }
        if input.key_pressed(Key::Escape) && self.is_borderless_fs {
            self.toggle_borderless_fullscreen(ctx);
        }
        if input.key_pressed(Key::Q) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        if input.key_pressed(Key::M) {
            self.toggle_menu();
        }
        if input.key_pressed(Key::N) {
            self.next_slide();
        }

        // Slideshow: advance in catalog order every interval; request_load
        // resets the clock, so manual advances also restart the window.
        let since_advance = self.last_advance.elapsed();
        if since_advance >= SLIDESHOW_INTERVAL {
            self.next_slide();
        } else {
            ctx.request_repaint_after(SLIDESHOW_INTERVAL - since_advance);
        }

        // Animation: flip frames on their own delays.
        if let Some(until_flip) = self.animator.tick(Instant::now()) {
            ctx.request_repaint_after(until_flip);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                let avail = ui.available_rect_before_wrap();
                let backdrop = ui.allocate_rect(avail, Sense::click());
                if backdrop.clicked() {
                    self.toggle_menu();
                }

                match self.animator.frame() {
                    Some(idx) => {
                        if let Some(tex) = self.frames.get(idx) {
                            let rect = fit::letterbox(avail, tex.size_vec2());
                            ui.painter().image(
                                tex.id(),
                                rect,
                                Rect::from_min_max(Pos2::ZERO, egui::pos2(1.0, 1.0)),
                                Color32::WHITE,
                            );
                        }
                    }
                    None => {
                        ui.put(
                            avail,
                            egui::Label::new(egui::RichText::new("Loading…").color(Color32::GRAY))
                                .selectable(false),
                        );
                    }
                }
            });

        self.show_menu(ctx, &input);
    }
}
