// ============================================================================
// Seamless clone - Poisson "normal clone" of a square brush region
// ============================================================================

use image::{GrayImage, Luma, Rgb, RgbImage};
use rayon::prelude::*;

use crate::error::{RegionRole, Result, RetouchError};
use crate::geometry::ImagePoint;

/// Side length of the Gaussian used to soften the mask edge.
const MASK_KERNEL_SIZE: usize = 5;

// -- Regions ------------------------------------------------------------

/// Axis-aligned square inside the image, in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

impl Region {
    /// The `2 * radius` square whose top-left corner is `center - radius`.
    ///
    /// Fails instead of clipping: a square that does not fit entirely inside
    /// a `width` x `height` image is rejected.
    pub fn centered(
        center: ImagePoint,
        radius: u32,
        role: RegionRole,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        if radius == 0 {
            return Err(RetouchError::EmptyRegion { radius });
        }
        let side = 2 * radius as i64;
        let left = center.x as i64 - radius as i64;
        let top = center.y as i64 - radius as i64;
        if left < 0 || top < 0 || left + side > width as i64 || top + side > height as i64 {
            return Err(RetouchError::RegionOutOfBounds {
                role,
                center,
                radius,
                width,
                height,
            });
        }
        Ok(Self {
            x: left as u32,
            y: top as u32,
            side: side as u32,
        })
    }

    /// Copy one colour channel of this region out of `image`, row-major.
    fn extract_channel(&self, image: &RgbImage, channel: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity((self.side * self.side) as usize);
        for y in self.y..self.y + self.side {
            for x in self.x..self.x + self.side {
                out.push(image.get_pixel(x, y).0[channel] as f32);
            }
        }
        out
    }
}

// -- Collaborator contract ------------------------------------------------

/// Anything that can transplant a brush-sized square from `source` onto
/// `target`, returning a new full-size image.
pub trait RegionCloner {
    fn clone_region(
        &self,
        image: &RgbImage,
        source: ImagePoint,
        target: ImagePoint,
        radius: u32,
    ) -> Result<RgbImage>;
}

/// Stopping rules for the relaxation solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloneParams {
    /// Hard cap on SOR sweeps per channel.
    pub max_iterations: usize,
    /// Stop once no pixel moves by more than this in a sweep.
    pub tolerance: f32,
}

impl Default for CloneParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 0.01,
        }
    }
}

// -- Mask ---------------------------------------------------------------

/// Opaque square of side `side`, blurred with a 5×5 Gaussian against a zero
/// border so that only the rim falls below 255.
pub fn feathered_mask(side: u32) -> GrayImage {
    let n = side as usize;
    let kernel = gaussian_kernel(MASK_KERNEL_SIZE);
    let half = (MASK_KERNEL_SIZE / 2) as i64;

    // Separable blur of an all-ones square: both passes see the same 1-D
    // coverage profile, so the result is the outer product of it with itself.
    let profile: Vec<f32> = (0..n as i64)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .filter(|(k, _)| {
                    let j = i + *k as i64 - half;
                    j >= 0 && j < n as i64
                })
                .map(|(_, w)| *w)
                .sum()
        })
        .collect();

    GrayImage::from_fn(side, side, |x, y| {
        let v = profile[x as usize] * profile[y as usize] * 255.0;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Normalised 1-D Gaussian taps; sigma follows the usual rule for a kernel
/// of this size when none is given.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as f32;
    let mut taps: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - half;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = taps.iter().sum();
    for t in &mut taps {
        *t /= sum;
    }
    taps
}

// -- Poisson solve ------------------------------------------------------

/// Normal-clone blending: keeps the source's gradients, takes its level
/// from the destination rim.
#[derive(Clone, Debug, Default)]
pub struct PoissonCloner {
    pub params: CloneParams,
}

impl PoissonCloner {
    pub fn new(params: CloneParams) -> Self {
        Self { params }
    }
}

impl RegionCloner for PoissonCloner {
    fn clone_region(
        &self,
        image: &RgbImage,
        source: ImagePoint,
        target: ImagePoint,
        radius: u32,
    ) -> Result<RgbImage> {
        let (w, h) = image.dimensions();
        let src_region = Region::centered(source, radius, RegionRole::Source, w, h)?;
        let dst_region = Region::centered(target, radius, RegionRole::Target, w, h)?;
        let side = dst_region.side as usize;
        let mask = feathered_mask(dst_region.side);
        let params = self.params;

        let solved: Vec<(Vec<f32>, Vec<f32>)> = (0..3usize)
            .into_par_iter()
            .map(|c| {
                let guide = src_region.extract_channel(image, c);
                let dest = dst_region.extract_channel(image, c);
                let f = solve_channel(&guide, &dest, side, params);
                (f, dest)
            })
            .collect();

        let mut out = image.clone();
        for j in 0..side {
            for i in 0..side {
                let idx = j * side + i;
                let alpha = mask.get_pixel(i as u32, j as u32).0[0] as f32 / 255.0;
                let mut px = [0u8; 3];
                for (c, (f, dest)) in solved.iter().enumerate() {
                    let v = dest[idx] + (f[idx] - dest[idx]) * alpha;
                    px[c] = v.round().clamp(0.0, 255.0) as u8;
                }
                out.put_pixel(dst_region.x + i as u32, dst_region.y + j as u32, Rgb(px));
            }
        }
        Ok(out)
    }
}

#[inline]
fn is_rim(i: usize, j: usize, side: usize) -> bool {
    i == 0 || j == 0 || i == side - 1 || j == side - 1
}

/// Solve `Δf = Δguide` inside the square with `f = dest` on its outer ring,
/// by successive over-relaxation. Buffers are row-major `side * side`.
fn solve_channel(guide: &[f32], dest: &[f32], side: usize, params: CloneParams) -> Vec<f32> {
    if side < 3 {
        return dest.to_vec();
    }

    // Start from the guide shifted to the rim's mean level; most of the
    // low-frequency error is gone before the first sweep.
    let mut rim_offset = 0.0f32;
    let mut rim_count = 0usize;
    for j in 0..side {
        for i in 0..side {
            if is_rim(i, j, side) {
                let idx = j * side + i;
                rim_offset += dest[idx] - guide[idx];
                rim_count += 1;
            }
        }
    }
    let rim_offset = rim_offset / rim_count.max(1) as f32;

    let mut f: Vec<f32> = (0..side * side)
        .map(|idx| {
            let (i, j) = (idx % side, idx / side);
            if is_rim(i, j, side) {
                dest[idx]
            } else {
                guide[idx] + rim_offset
            }
        })
        .collect();

    // Right-hand side: discrete Laplacian of the guide (4-neighbour).
    let mut rhs = vec![0.0f32; side * side];
    for j in 1..side - 1 {
        for i in 1..side - 1 {
            let idx = j * side + i;
            rhs[idx] = 4.0 * guide[idx]
                - guide[idx - 1]
                - guide[idx + 1]
                - guide[idx - side]
                - guide[idx + side];
        }
    }

    let omega = 2.0 / (1.0 + (std::f32::consts::PI / side as f32).sin());
    for _ in 0..params.max_iterations {
        let mut max_delta = 0.0f32;
        for j in 1..side - 1 {
            for i in 1..side - 1 {
                let idx = j * side + i;
                let neighbours = f[idx - 1] + f[idx + 1] + f[idx - side] + f[idx + side];
                let gs = (rhs[idx] + neighbours) * 0.25;
                let delta = omega * (gs - f[idx]);
                f[idx] += delta;
                max_delta = max_delta.max(delta.abs());
            }
        }
        if max_delta < params.tolerance {
            break;
        }
    }
    f
}
