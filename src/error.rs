// ============================================================================
// ERRORS - everything a retouch session can fail with
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use crate::geometry::ImagePoint;

/// Which of the two clone regions a geometry error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionRole {
    /// The blemish being covered.
    Target,
    /// The clean area being copied.
    Source,
}

impl RegionRole {
    pub fn label(&self) -> &'static str {
        match self {
            RegionRole::Target => "target",
            RegionRole::Source => "source",
        }
    }
}

#[derive(Debug)]
pub enum RetouchError {
    /// Input file missing or undecodable. Fatal at start-up.
    Load {
        path: PathBuf,
        source: image::ImageError,
    },
    /// Encoding or writing the output failed. The session keeps running.
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
    /// A clone square would reach outside the image.
    RegionOutOfBounds {
        role: RegionRole,
        center: ImagePoint,
        radius: u32,
        width: u32,
        height: u32,
    },
    /// Brush radius of zero selects nothing to clone.
    EmptyRegion { radius: u32 },
    /// The native window could not be created.
    Gui(String),
}

impl fmt::Display for RetouchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetouchError::Load { path, source } => {
                write!(f, "Failed to read image '{}': {}", path.display(), source)
            }
            RetouchError::Save { path, source } => {
                write!(f, "Could not save image to '{}': {}", path.display(), source)
            }
            RetouchError::RegionOutOfBounds {
                role,
                center,
                radius,
                width,
                height,
            } => write!(
                f,
                "{} region at ({}, {}) with brush {} falls outside the {}x{} image",
                role.label(),
                center.x,
                center.y,
                radius,
                width,
                height
            ),
            RetouchError::EmptyRegion { radius } => {
                write!(f, "brush size {} selects an empty region", radius)
            }
            RetouchError::Gui(msg) => write!(f, "GUI error: {}", msg),
        }
    }
}

impl std::error::Error for RetouchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetouchError::Load { source, .. } | RetouchError::Save { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<eframe::Error> for RetouchError {
    fn from(err: eframe::Error) -> Self {
        RetouchError::Gui(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RetouchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_message_names_role_and_geometry() {
        let err = RetouchError::RegionOutOfBounds {
            role: RegionRole::Source,
            center: ImagePoint::new(5, 7),
            radius: 20,
            width: 100,
            height: 80,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("source region at (5, 7)"));
        assert!(msg.contains("100x80"));
    }

    #[test]
    fn load_error_exposes_image_source() {
        use std::error::Error;
        let err = RetouchError::Load {
            path: PathBuf::from("missing.png"),
            source: image::ImageError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "gone",
            )),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("missing.png"));
    }
}
