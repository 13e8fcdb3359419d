// ============================================================================
// Blemish CLI - choose the photo to retouch and where to save it
// ============================================================================
//
// Usage examples:
//   blemish                              (reads blemish.png, saves blemish_fix.png)
//   blemish -i portrait.jpg              (saves portrait_fix.jpg)
//   blemish -i scan.tif -o clean.png
//   blemish -i big.jpg --max-width 1600 --max-height 1000 --brush 12

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::settings::AppSettings;

/// Input used when `-i` is not given.
pub const DEFAULT_INPUT: &str = "blemish.png";
/// Appended to the input's file stem to build the default output name.
pub const OUTPUT_SUFFIX: &str = "_fix";

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Interactive blemish removal.
///
/// Click the blemish, then click a clean area to clone from.
#[derive(Parser, Debug)]
#[command(
    name = "blemish",
    version,
    about = "Interactive blemish removal by seamless cloning",
    long_about = "Opens the photo in a window. Click on the blemish you want to remove,\n\
                  then on a clean area to clone from. Keys: z undo, s save,\n\
                  [ and ] change the brush size, Esc exits."
)]
pub struct CliArgs {
    /// Photo to retouch. Defaults to blemish.png.
    #[arg(short, long, value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Where the `save` key writes. Defaults to the input name with `_fix`
    /// added before the extension.
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Largest preview width in pixels (overrides the settings file).
    #[arg(long, value_name = "PX")]
    pub max_width: Option<u32>,

    /// Largest preview height in pixels (overrides the settings file).
    #[arg(long, value_name = "PX")]
    pub max_height: Option<u32>,

    /// Initial brush radius (clamped to the configured maximum).
    #[arg(long, value_name = "RADIUS")]
    pub brush: Option<u32>,

    /// Mirror the session log to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// `(input, output)` with defaults filled in.
    pub fn resolve_paths(&self) -> (PathBuf, PathBuf) {
        let input = self
            .input
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&input));
        (input, output)
    }

    /// Command-line values win over the settings file.
    pub fn apply_overrides(&self, settings: &mut AppSettings) {
        if let Some(w) = self.max_width {
            settings.max_display_width = w;
        }
        if let Some(h) = self.max_height {
            settings.max_display_height = h;
        }
        if let Some(r) = self.brush {
            settings.default_brush_radius = r;
        }
        settings.sanitize();
    }
}

/// `photo.jpg` -> `photo_fix.jpg`, next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, OUTPUT_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, OUTPUT_SUFFIX),
    };
    input.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("blemish").chain(args.iter().copied()))
    }

    #[test]
    fn no_flags_uses_default_files() {
        let args = parse(&[]).expect("parse");
        let (input, output) = args.resolve_paths();
        assert_eq!(input, PathBuf::from("blemish.png"));
        assert_eq!(output, PathBuf::from("blemish_fix.png"));
    }

    #[test]
    fn output_defaults_next_to_input() {
        let args = parse(&["-i", "shots/face.jpg"]).expect("parse");
        assert_eq!(args.resolve_paths().1, PathBuf::from("shots/face_fix.jpg"));
        assert_eq!(default_output_path(Path::new("README")), PathBuf::from("README_fix"));
        assert_eq!(
            default_output_path(Path::new("a.b.tiff")),
            PathBuf::from("a.b_fix.tiff")
        );
    }

    #[test]
    fn explicit_output_wins() {
        let args = parse(&["-o", "done.png"]).expect("parse");
        let (input, output) = args.resolve_paths();
        assert_eq!(input, PathBuf::from("blemish.png"));
        assert_eq!(output, PathBuf::from("done.png"));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = parse(&["-x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn help_is_reported_as_help() {
        let err = parse(&["-h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn overrides_apply_and_stay_sane() {
        let args = parse(&["--max-width", "640", "--brush", "500"]).expect("parse");
        let mut settings = AppSettings::default();
        args.apply_overrides(&mut settings);
        assert_eq!(settings.max_display_width, 640);
        assert_eq!(settings.max_display_height, 900);
        assert_eq!(settings.default_brush_radius, settings.max_brush_radius);
    }
}
