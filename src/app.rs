use eframe::egui;
use egui::{Color32, Pos2, Rect, Stroke};

use crate::error::{RegionRole, Result};
use crate::geometry::ScreenPoint;
use crate::session::{
    ClickState, Overlay, Reaction, RetouchSession, SessionEvent, StatusLevel, StatusMessage,
};
use crate::settings::{BindableAction, KeyBindings};

const WINDOW_TITLE: &str = "Blemish Tool";
/// Room for the brush slider and status bar around the preview.
const CHROME_WIDTH: f32 = 16.0;
const CHROME_HEIGHT: f32 = 72.0;

const TARGET_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
const SOURCE_COLOR: Color32 = Color32::from_rgb(0, 0, 255);
const WARNING_COLOR: Color32 = Color32::from_rgb(220, 120, 0);

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Open the window and run the event loop until the user exits.
pub fn run(session: RetouchSession, keybindings: KeyBindings) -> Result<()> {
    let (w, h) = session.preview().dimensions();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([w as f32 + CHROME_WIDTH, h as f32 + CHROME_HEIGHT])
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |_cc| Box::new(RetouchApp::new(session, keybindings))),
    )?;
    Ok(())
}

// ============================================================================
// APP
// ============================================================================

/// eframe adapter: the only place that knows about egui. Input becomes
/// `SessionEvent`s and every `Reaction` is turned into pixels on screen.
pub struct RetouchApp {
    session: RetouchSession,
    keybindings: KeyBindings,
    /// GPU copy of the session preview; rebuilt when the preview changes.
    texture: Option<egui::TextureHandle>,
    overlays: Vec<Overlay>,
    status: Option<StatusMessage>,
    last_pointer: Option<ScreenPoint>,
}

impl RetouchApp {
    pub fn new(session: RetouchSession, keybindings: KeyBindings) -> Self {
        Self {
            session,
            keybindings,
            texture: None,
            overlays: Vec::new(),
            status: None,
            last_pointer: None,
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context, event: SessionEvent) {
        let reaction = self.session.handle(event);
        self.apply(ctx, reaction);
    }

    fn apply(&mut self, ctx: &egui::Context, reaction: Reaction) {
        if let Some(overlays) = reaction.overlays {
            self.overlays = overlays;
        }
        if reaction.preview_changed {
            self.upload_preview(ctx);
        }
        if let Some(status) = reaction.status {
            match status.level {
                StatusLevel::Info => println!("{}", status.text),
                StatusLevel::Warning => eprintln!("{}", status.text),
            }
            self.status = Some(status);
        }
        if reaction.exit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn upload_preview(&mut self, ctx: &egui::Context) {
        let preview = self.session.preview();
        let size = [preview.width() as usize, preview.height() as usize];
        let image = egui::ColorImage::from_rgb(size, preview.as_raw());
        match &mut self.texture {
            Some(handle) => handle.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("preview", image, egui::TextureOptions::LINEAR));
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let bindings = [
            (BindableAction::Undo, SessionEvent::Undo),
            (BindableAction::Save, SessionEvent::Save),
            (BindableAction::BrushSizeDecrease, SessionEvent::ShrinkBrush),
            (BindableAction::BrushSizeIncrease, SessionEvent::GrowBrush),
            (BindableAction::Exit, SessionEvent::Exit),
        ];
        for (action, event) in bindings {
            if self.keybindings.is_pressed(ctx, action) {
                self.dispatch(ctx, event);
            }
        }
    }

    fn show_controls(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut radius = self.session.brush_radius();
            let max = self.session.max_brush_radius();
            if ui
                .add(egui::Slider::new(&mut radius, 0..=max).text("Brush Size"))
                .changed()
            {
                self.dispatch(ctx, SessionEvent::SetBrushRadius(radius as i64));
            }
            ui.separator();
            let hint = match self.session.click_state() {
                ClickState::AwaitingTarget => "Click the blemish",
                ClickState::AwaitingSource { .. } => "Click a clean area to clone from",
            };
            ui.label(hint);
            ui.separator();
            ui.label(format!("History: {}", self.session.history_len()));
        });
    }

    fn show_status(&self, ui: &mut egui::Ui) {
        match &self.status {
            Some(StatusMessage {
                level: StatusLevel::Warning,
                text,
            }) => {
                ui.colored_label(WARNING_COLOR, text);
            }
            Some(StatusMessage { text, .. }) => {
                ui.label(text);
            }
            None => {
                ui.label(format!("Output: {}", self.session.output_path().display()));
            }
        }
    }

    fn show_canvas(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let (w, h) = self.session.preview().dimensions();
        let (rect, _response) =
            ui.allocate_exact_size(egui::vec2(w as f32, h as f32), egui::Sense::click());

        // Input first, so a clone made by this click is drawn this frame.
        let (hover, pressed) = ui.input(|i| (i.pointer.hover_pos(), i.pointer.primary_pressed()));
        if let Some(pos) = hover.filter(|p| rect.contains(*p)) {
            let local = ScreenPoint::new(pos.x - rect.min.x, pos.y - rect.min.y);
            if pressed {
                self.dispatch(ctx, SessionEvent::PointerPressed(local));
            } else if self.last_pointer != Some(local) {
                self.dispatch(ctx, SessionEvent::PointerMoved(local));
            }
            self.last_pointer = Some(local);
        }

        let painter = ui.painter_at(rect);
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        let to_screen = |p: ScreenPoint| Pos2::new(rect.min.x + p.x, rect.min.y + p.y);
        for overlay in &self.overlays {
            match *overlay {
                Overlay::Circle {
                    center,
                    radius,
                    role,
                } => {
                    let color = match role {
                        RegionRole::Target => TARGET_COLOR,
                        RegionRole::Source => SOURCE_COLOR,
                    };
                    painter.circle_stroke(to_screen(center), radius, Stroke::new(1.0, color));
                }
                Overlay::Line { from, to } => {
                    painter.line_segment(
                        [to_screen(from), to_screen(to)],
                        Stroke::new(1.0, SOURCE_COLOR),
                    );
                }
            }
        }
    }
}

impl eframe::App for RetouchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.texture.is_none() {
            self.upload_preview(ctx);
        }

        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.show_controls(ctx, ui);
        });
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.show_status(ui);
        });
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.show_canvas(ctx, ui);
            });
    }
}
