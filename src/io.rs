use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::codecs::tiff::TiffEncoder;
use image::error::{ImageFormatHint, UnsupportedError, UnsupportedErrorKind};
use image::imageops::FilterType;
use image::{ColorType, ImageEncoder, ImageError, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, RetouchError};
use crate::geometry::DisplayScale;

/// Quality used whenever the output is a JPEG.
pub const JPEG_QUALITY: u8 = 95;

// ============================================================================
// OUTPUT FORMATS
// ============================================================================

/// Raster formats the save path can encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Bmp,
    Tga,
    Tiff,
}

impl SaveFormat {
    /// Infer the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            "tif" | "tiff" => Some(SaveFormat::Tiff),
            _ => None,
        }
    }
}

// ============================================================================
// LOAD / SAVE
// ============================================================================

/// Decode any supported raster file into 8-bit RGB.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| RetouchError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

/// Encode `image` to `path`, picking the format from the extension.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    encode_and_write(image, path).map_err(|source| RetouchError::Save {
        path: path.to_path_buf(),
        source,
    })
}

fn encode_and_write(image: &RgbImage, path: &Path) -> std::result::Result<(), ImageError> {
    // Resolve the format before touching the filesystem so an unknown
    // extension never leaves an empty file behind.
    let format = SaveFormat::from_path(path).ok_or_else(|| {
        ImageError::Unsupported(UnsupportedError::from_format_and_kind(
            ImageFormatHint::PathExtension(path.to_path_buf()),
            UnsupportedErrorKind::Format(ImageFormatHint::PathExtension(path.to_path_buf())),
        ))
    })?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let (w, h) = image.dimensions();
    let raw = image.as_raw();

    match format {
        SaveFormat::Png => PngEncoder::new(&mut writer).write_image(raw, w, h, ColorType::Rgb8)?,
        SaveFormat::Jpeg => JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
            .write_image(raw, w, h, ColorType::Rgb8)?,
        SaveFormat::Bmp => BmpEncoder::new(&mut writer).write_image(raw, w, h, ColorType::Rgb8)?,
        SaveFormat::Tga => TgaEncoder::new(&mut writer).write_image(raw, w, h, ColorType::Rgb8)?,
        SaveFormat::Tiff => TiffEncoder::new(&mut writer).write_image(raw, w, h, ColorType::Rgb8)?,
    }

    writer.flush()?;
    Ok(())
}

// ============================================================================
// PREVIEW
// ============================================================================

/// Shrink `image` for on-screen display. Returns a plain copy when `scale`
/// does not reduce the size.
pub fn make_preview(image: &RgbImage, scale: DisplayScale) -> RgbImage {
    if !scale.is_downscaled() {
        return image.clone();
    }
    let (w, h) = scale.display_size(image.width(), image.height());
    image::imageops::resize(image, w, h, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::path::PathBuf;

    fn sample() -> RgbImage {
        RgbImage::from_fn(16, 9, |x, y| Rgb([(x * 10) as u8, (y * 20) as u8, 77]))
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(SaveFormat::from_path(Path::new("a.PNG")), Some(SaveFormat::Png));
        assert_eq!(SaveFormat::from_path(Path::new("a.jpeg")), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_path(Path::new("dir/a.tif")), Some(SaveFormat::Tiff));
        assert_eq!(SaveFormat::from_path(Path::new("a.xyz")), None);
        assert_eq!(SaveFormat::from_path(Path::new("noext")), None);
        // WebP decodes but has no encoder here.
        assert_eq!(SaveFormat::from_path(Path::new("a.webp")), None);
    }

    #[test]
    fn png_save_then_load_is_lossless() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.png");
        save_image(&sample(), &path).expect("save");
        assert_eq!(load_image(&path).expect("load"), sample());
    }

    #[test]
    fn jpeg_save_keeps_dimensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.jpg");
        save_image(&sample(), &path).expect("save");
        assert_eq!(load_image(&path).expect("load").dimensions(), (16, 9));
    }

    #[test]
    fn unknown_extension_is_a_save_error_and_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.xyz");
        let err = save_image(&sample(), &path).unwrap_err();
        assert!(matches!(err, RetouchError::Save { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn webp_output_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.webp");
        let err = save_image(&sample(), &path).unwrap_err();
        assert!(matches!(err, RetouchError::Save { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn missing_input_is_a_load_error() {
        let err = load_image(&PathBuf::from("definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, RetouchError::Load { .. }));
    }

    #[test]
    fn preview_matches_display_size() {
        let img = RgbImage::new(2000, 1500);
        let scale = DisplayScale::fit(2000, 1500, 1200, 900);
        assert_eq!(make_preview(&img, scale).dimensions(), (1200, 900));

        let small = sample();
        assert_eq!(make_preview(&small, DisplayScale::fit(16, 9, 1200, 900)), small);
    }
}
