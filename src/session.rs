// ============================================================================
// RETOUCH SESSION - image, undo history, two-click state and brush
// ============================================================================
//
// The session knows nothing about windows or egui. The GUI turns input into
// `SessionEvent`s, calls `handle`, and draws whatever `Reaction` comes back.

use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::error::{RegionRole, Result};
use crate::geometry::{DisplayScale, ImagePoint, ScreenPoint, connector};
use crate::history::SnapshotHistory;
use crate::io;
use crate::ops::seamless::{PoissonCloner, Region, RegionCloner};
use crate::settings::AppSettings;
use crate::{log_info, log_warn};

/// Where the two-click clone currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickState {
    /// Next click picks the blemish.
    AwaitingTarget,
    /// Blemish picked; next click picks the clean source and clones.
    AwaitingSource { target: ImagePoint },
}

/// Input delivered by the GUI, in preview (screen) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEvent {
    PointerMoved(ScreenPoint),
    PointerPressed(ScreenPoint),
    Undo,
    Save,
    ShrinkBrush,
    GrowBrush,
    /// From the slider. Out-of-range values are clamped.
    SetBrushRadius(i64),
    Exit,
}

/// Shape to draw over the preview, in preview coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Overlay {
    Circle {
        center: ScreenPoint,
        radius: f32,
        role: RegionRole,
    },
    Line {
        from: ScreenPoint,
        to: ScreenPoint,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }
}

/// What the GUI should do after an event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reaction {
    /// `Some` replaces the overlay shapes; `None` leaves them as they are.
    pub overlays: Option<Vec<Overlay>>,
    /// The preview buffer was regenerated and must be re-uploaded.
    pub preview_changed: bool,
    pub status: Option<StatusMessage>,
    /// Close the window.
    pub exit: bool,
}

pub struct RetouchSession {
    history: SnapshotHistory,
    preview: RgbImage,
    scale: DisplayScale,
    click: ClickState,
    brush_radius: u32,
    max_brush_radius: u32,
    output_path: PathBuf,
    cloner: Box<dyn RegionCloner>,
}

impl RetouchSession {
    /// Decode `input` and open a session that saves to `output`.
    pub fn load(input: &Path, output: PathBuf, settings: &AppSettings) -> Result<Self> {
        let image = io::load_image(input)?;
        log_info!(
            "Loaded '{}' ({}x{})",
            input.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_image(image, output, settings))
    }

    pub fn from_image(image: RgbImage, output: PathBuf, settings: &AppSettings) -> Self {
        let (w, h) = image.dimensions();
        let scale = DisplayScale::fit(w, h, settings.max_display_width, settings.max_display_height);
        let preview = io::make_preview(&image, scale);
        if scale.is_downscaled() {
            log_info!(
                "Preview scaled to {:.3}x ({}x{})",
                scale.value(),
                preview.width(),
                preview.height()
            );
        }
        Self {
            history: SnapshotHistory::with_limit(image, settings.max_undo_steps),
            preview,
            scale,
            click: ClickState::AwaitingTarget,
            brush_radius: settings.default_brush_radius.min(settings.max_brush_radius),
            max_brush_radius: settings.max_brush_radius,
            output_path: output,
            cloner: Box::new(PoissonCloner::new(settings.clone)),
        }
    }

    /// Swap the blending implementation.
    pub fn with_cloner(mut self, cloner: Box<dyn RegionCloner>) -> Self {
        self.cloner = cloner;
        self
    }

    // -- Accessors --------------------------------------------------------

    pub fn image(&self) -> &RgbImage {
        self.history.current()
    }

    pub fn preview(&self) -> &RgbImage {
        &self.preview
    }

    pub fn scale(&self) -> DisplayScale {
        self.scale
    }

    pub fn click_state(&self) -> ClickState {
        self.click
    }

    pub fn brush_radius(&self) -> u32 {
        self.brush_radius
    }

    pub fn max_brush_radius(&self) -> u32 {
        self.max_brush_radius
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    // -- Event dispatch ---------------------------------------------------

    pub fn handle(&mut self, event: SessionEvent) -> Reaction {
        match event {
            SessionEvent::PointerMoved(p) => Reaction {
                overlays: Some(self.brush_overlays(self.scale.to_image(p))),
                ..Default::default()
            },
            SessionEvent::PointerPressed(p) => self.pointer_pressed(self.scale.to_image(p)),
            SessionEvent::Undo => self.undo(),
            SessionEvent::Save => self.save(),
            SessionEvent::ShrinkBrush => self.set_brush_radius(self.brush_radius as i64 - 1),
            SessionEvent::GrowBrush => self.set_brush_radius(self.brush_radius as i64 + 1),
            SessionEvent::SetBrushRadius(n) => self.set_brush_radius(n),
            SessionEvent::Exit => Reaction {
                exit: true,
                ..Default::default()
            },
        }
    }

    fn pointer_pressed(&mut self, point: ImagePoint) -> Reaction {
        let (w, h) = self.image().dimensions();
        match self.click {
            ClickState::AwaitingTarget => {
                if let Err(e) = Region::centered(point, self.brush_radius, RegionRole::Target, w, h) {
                    log_warn!("Target rejected: {}", e);
                    return self.rejected(point, e.to_string());
                }
                self.click = ClickState::AwaitingSource { target: point };
                Reaction {
                    overlays: Some(self.brush_overlays(point)),
                    ..Default::default()
                }
            }
            ClickState::AwaitingSource { target } => {
                // The brush may have grown since the target was picked.
                if let Err(e) = Region::centered(target, self.brush_radius, RegionRole::Target, w, h) {
                    log_warn!("Pending target dropped: {}", e);
                    self.click = ClickState::AwaitingTarget;
                    return self.rejected(point, e.to_string());
                }
                let cloned =
                    self.cloner
                        .clone_region(self.history.current(), point, target, self.brush_radius);
                match cloned {
                    Ok(image) => {
                        self.history.push(image);
                        self.refresh_preview();
                        self.click = ClickState::AwaitingTarget;
                        log_info!(
                            "Cloned ({}, {}) -> ({}, {}) radius {}; history {} ({} KiB)",
                            point.x,
                            point.y,
                            target.x,
                            target.y,
                            self.brush_radius,
                            self.history.len(),
                            self.history.memory_usage() / 1024
                        );
                        Reaction {
                            overlays: Some(self.brush_overlays(point)),
                            preview_changed: true,
                            ..Default::default()
                        }
                    }
                    Err(e) => {
                        log_warn!("Clone rejected: {}", e);
                        self.rejected(point, e.to_string())
                    }
                }
            }
        }
    }

    fn rejected(&self, pointer: ImagePoint, message: String) -> Reaction {
        Reaction {
            overlays: Some(self.brush_overlays(pointer)),
            status: Some(StatusMessage::warning(message)),
            ..Default::default()
        }
    }

    fn undo(&mut self) -> Reaction {
        if !self.history.undo() {
            return Reaction::default();
        }
        self.refresh_preview();
        log_info!("Undo; history {}", self.history.len());
        Reaction {
            overlays: Some(Vec::new()),
            preview_changed: true,
            ..Default::default()
        }
    }

    fn save(&self) -> Reaction {
        let status = match io::save_image(self.history.current(), &self.output_path) {
            Ok(()) => {
                log_info!("Saved '{}'", self.output_path.display());
                StatusMessage::info(format!("Saved image as '{}'", self.output_path.display()))
            }
            Err(e) => {
                log_warn!("{}", e);
                StatusMessage::warning(e.to_string())
            }
        };
        Reaction {
            status: Some(status),
            ..Default::default()
        }
    }

    fn set_brush_radius(&mut self, n: i64) -> Reaction {
        self.brush_radius = n.clamp(0, self.max_brush_radius as i64) as u32;
        Reaction::default()
    }

    fn refresh_preview(&mut self) {
        self.preview = io::make_preview(self.history.current(), self.scale);
    }

    /// Brush circles (and the connecting line while a target is pending)
    /// for a pointer at `pointer` in image space.
    fn brush_overlays(&self, pointer: ImagePoint) -> Vec<Overlay> {
        let radius = self.scale.to_screen_len(self.brush_radius);
        let at = self.scale.to_screen(pointer);
        match self.click {
            ClickState::AwaitingTarget => vec![Overlay::Circle {
                center: at,
                radius,
                role: RegionRole::Target,
            }],
            ClickState::AwaitingSource { target } => {
                let target_at = self.scale.to_screen(target);
                let mut shapes = vec![
                    Overlay::Circle {
                        center: target_at,
                        radius,
                        role: RegionRole::Target,
                    },
                    Overlay::Circle {
                        center: at,
                        radius,
                        role: RegionRole::Source,
                    },
                ];
                if let Some((from, to)) = connector(target_at, at, radius) {
                    shapes.push(Overlay::Line { from, to });
                }
                shapes
            }
        }
    }
}
