use eframe::egui;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ops::seamless::CloneParams;

// ============================================================================
// KEY BINDINGS
// ============================================================================

/// Runtime actions that can be bound to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindableAction {
    Undo,
    Save,
    BrushSizeDecrease,
    BrushSizeIncrease,
    Exit,
}

impl BindableAction {
    pub fn all() -> &'static [BindableAction] {
        &[
            BindableAction::Undo,
            BindableAction::Save,
            BindableAction::BrushSizeDecrease,
            BindableAction::BrushSizeIncrease,
            BindableAction::Exit,
        ]
    }

    /// Identifier used in the settings file (`keybind.<name>=...`).
    pub fn config_name(&self) -> &'static str {
        match self {
            Self::Undo => "Undo",
            Self::Save => "Save",
            Self::BrushSizeDecrease => "BrushSizeDecrease",
            Self::BrushSizeIncrease => "BrushSizeIncrease",
            Self::Exit => "Exit",
        }
    }

    pub fn from_config_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|a| a.config_name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Save => "save the image",
            Self::BrushSizeDecrease => "shrink the brush",
            Self::BrushSizeIncrease => "grow the brush",
            Self::Exit => "exit",
        }
    }
}

/// A single key. Printable keys match on the typed text so that
/// layout-dependent characters like `[` work everywhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyCombo {
    Text(String),
    Key(egui::Key),
}

impl KeyCombo {
    pub fn from_config_string(s: &str) -> Option<Self> {
        let s = s.trim();
        let named = match s.to_lowercase().as_str() {
            "esc" | "escape" => Some(egui::Key::Escape),
            "enter" | "return" => Some(egui::Key::Enter),
            "space" => Some(egui::Key::Space),
            "tab" => Some(egui::Key::Tab),
            "backspace" => Some(egui::Key::Backspace),
            "delete" | "del" => Some(egui::Key::Delete),
            _ => None,
        };
        if let Some(key) = named {
            return Some(KeyCombo::Key(key));
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeyCombo::Text(c.to_string())),
            _ => None,
        }
    }

    pub fn to_config_string(&self) -> String {
        match self {
            KeyCombo::Text(t) => t.clone(),
            KeyCombo::Key(egui::Key::Escape) => "Esc".to_string(),
            KeyCombo::Key(egui::Key::Enter) => "Enter".to_string(),
            KeyCombo::Key(egui::Key::Space) => "Space".to_string(),
            KeyCombo::Key(egui::Key::Tab) => "Tab".to_string(),
            KeyCombo::Key(egui::Key::Backspace) => "Backspace".to_string(),
            KeyCombo::Key(egui::Key::Delete) => "Delete".to_string(),
            KeyCombo::Key(k) => format!("{:?}", k),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyBindings {
    bindings: HashMap<BindableAction, KeyCombo>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(BindableAction::Undo, KeyCombo::Text("z".into()));
        bindings.insert(BindableAction::Save, KeyCombo::Text("s".into()));
        bindings.insert(BindableAction::BrushSizeDecrease, KeyCombo::Text("[".into()));
        bindings.insert(BindableAction::BrushSizeIncrease, KeyCombo::Text("]".into()));
        bindings.insert(BindableAction::Exit, KeyCombo::Key(egui::Key::Escape));
        Self { bindings }
    }
}

impl KeyBindings {
    #[cfg(test)]
    fn get(&self, action: BindableAction) -> Option<&KeyCombo> {
        self.bindings.get(&action)
    }

    pub fn to_config_lines(&self) -> Vec<String> {
        BindableAction::all()
            .iter()
            .filter_map(|a| {
                self.bindings
                    .get(a)
                    .map(|c| format!("keybind.{}={}", a.config_name(), c.to_config_string()))
            })
            .collect()
    }

    pub fn load_config_line(&mut self, action_name: &str, combo_str: &str) {
        if let (Some(action), Some(combo)) = (
            BindableAction::from_config_name(action_name),
            KeyCombo::from_config_string(combo_str),
        ) {
            self.bindings.insert(action, combo);
        }
    }

    /// Check if a keybinding was triggered this frame
    pub fn is_pressed(&self, ctx: &egui::Context, action: BindableAction) -> bool {
        let Some(combo) = self.bindings.get(&action) else { return false };
        match combo {
            KeyCombo::Text(text_char) => ctx.input(|i| {
                if i.modifiers.command || i.modifiers.alt {
                    return false;
                }
                i.events
                    .iter()
                    .any(|ev| matches!(ev, egui::Event::Text(t) if t == text_char))
            }),
            KeyCombo::Key(key) => ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, *key)),
        }
    }

    /// One line per action, for the start-up instructions.
    pub fn help_lines(&self) -> Vec<String> {
        BindableAction::all()
            .iter()
            .filter_map(|a| {
                self.bindings
                    .get(a)
                    .map(|c| format!("Press '{}' to {}.", c.to_config_string(), a.description()))
            })
            .collect()
    }
}

// ============================================================================
// APP SETTINGS
// ============================================================================

/// Settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Largest preview the window will show; bigger images are scaled down.
    pub max_display_width: u32,
    pub max_display_height: u32,
    /// Brush radius at start-up.
    pub default_brush_radius: u32,
    /// Upper end of the brush slider.
    pub max_brush_radius: u32,
    /// Snapshots kept for undo, counting the original (0 = unlimited).
    pub max_undo_steps: usize,
    /// Poisson solver stopping rules.
    pub clone: CloneParams,
    pub keybindings: KeyBindings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_display_width: 1200,
            max_display_height: 900,
            default_brush_radius: 20,
            max_brush_radius: 50,
            max_undo_steps: 0,
            clone: CloneParams::default(),
            keybindings: KeyBindings::default(),
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/blemish/blemish_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\Blemish\blemish_settings.cfg
    /// On macOS:   ~/Library/Application Support/Blemish/blemish_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").ok()?;
            return Some(PathBuf::from(appdata).join("Blemish").join("blemish_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("Blemish")
                    .join("blemish_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("blemish").join("blemish_settings.cfg"))
        }
    }

    /// Load from the default location, writing a default file on first run
    /// so there is something to edit.
    pub fn load_or_init() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        if path.exists() {
            return Self::load_from(&path);
        }
        let settings = Self::default();
        if let Err(e) = settings.save_to(&path) {
            crate::log_warn!("Could not write default settings to {}: {}", path.display(), e);
        }
        settings
    }

    /// Load settings from `path` (returns default if file missing or corrupt)
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    pub fn to_config_string(&self) -> String {
        let mut content = format!(
            "max_display_width={}\n\
             max_display_height={}\n\
             default_brush_radius={}\n\
             max_brush_radius={}\n\
             max_undo_steps={}\n\
             solver_max_iterations={}\n\
             solver_tolerance={}\n",
            self.max_display_width,
            self.max_display_height,
            self.default_brush_radius,
            self.max_brush_radius,
            self.max_undo_steps,
            self.clone.max_iterations,
            self.clone.tolerance,
        );
        for line in self.keybindings.to_config_lines() {
            content.push_str(&line);
            content.push('\n');
        }
        content
    }

    /// Parse `key=value` lines. Unknown keys and unparsable values are
    /// skipped, leaving the default in place.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "max_display_width" => {
                    s.max_display_width = val.parse().unwrap_or(s.max_display_width);
                }
                "max_display_height" => {
                    s.max_display_height = val.parse().unwrap_or(s.max_display_height);
                }
                "default_brush_radius" => {
                    s.default_brush_radius = val.parse().unwrap_or(s.default_brush_radius);
                }
                "max_brush_radius" => {
                    s.max_brush_radius = val.parse().unwrap_or(s.max_brush_radius);
                }
                "max_undo_steps" => {
                    s.max_undo_steps = val.parse().unwrap_or(s.max_undo_steps);
                }
                "solver_max_iterations" => {
                    s.clone.max_iterations = val.parse().unwrap_or(s.clone.max_iterations);
                }
                "solver_tolerance" => {
                    s.clone.tolerance = val
                        .parse::<f32>()
                        .ok()
                        .filter(|t| *t > 0.0)
                        .unwrap_or(s.clone.tolerance);
                }
                _ => {
                    if let Some(action_name) = key.strip_prefix("keybind.") {
                        s.keybindings.load_config_line(action_name, val);
                    }
                }
            }
        }
        s.sanitize();
        s
    }

    /// Keep values usable whatever the file or the command line said.
    pub fn sanitize(&mut self) {
        self.max_display_width = self.max_display_width.max(1);
        self.max_display_height = self.max_display_height.max(1);
        self.default_brush_radius = self.default_brush_radius.min(self.max_brush_radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_tool() {
        let s = AppSettings::default();
        assert_eq!((s.max_display_width, s.max_display_height), (1200, 900));
        assert_eq!(s.default_brush_radius, 20);
        assert_eq!(s.max_brush_radius, 50);
        assert_eq!(s.max_undo_steps, 0);
        assert_eq!(s.keybindings.get(BindableAction::Undo), Some(&KeyCombo::Text("z".into())));
        assert_eq!(s.keybindings.get(BindableAction::Exit), Some(&KeyCombo::Key(egui::Key::Escape)));
    }

    #[test]
    fn config_round_trips() {
        let mut s = AppSettings::default();
        s.max_display_width = 800;
        s.max_brush_radius = 80;
        s.clone.max_iterations = 500;
        s.keybindings.load_config_line("Undo", "u");
        assert_eq!(AppSettings::parse(&s.to_config_string()), s);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let s = AppSettings::parse(
            "max_display_width=wide\n\
             # comment\n\
             solver_tolerance=-1\n\
             nonsense\n\
             keybind.Undo=too-long\n\
             keybind.Fly=f\n",
        );
        assert_eq!(s, AppSettings::default());
    }

    #[test]
    fn brush_default_never_exceeds_max() {
        let s = AppSettings::parse("max_brush_radius=10\ndefault_brush_radius=30\n");
        assert_eq!(s.default_brush_radius, 10);
    }

    #[test]
    fn key_combo_parsing() {
        assert_eq!(KeyCombo::from_config_string("ESC"), Some(KeyCombo::Key(egui::Key::Escape)));
        assert_eq!(KeyCombo::from_config_string(" ] "), Some(KeyCombo::Text("]".into())));
        assert_eq!(KeyCombo::from_config_string(""), None);
        assert_eq!(KeyCombo::from_config_string("zz"), None);
    }

    #[test]
    fn save_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("blemish_settings.cfg");
        AppSettings::default().save_to(&path).expect("save");
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
    }
}
