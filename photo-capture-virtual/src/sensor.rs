//! Synthetic sensor.
//!
//! Renders deterministic test scenes and turns them into the sample layouts
//! a real sensor would produce: Bayer CFA mosaics with a black-level
//! pedestal, or demosaiced linear RGB. Everything here is a pure function
//! of its inputs so captures are reproducible per request id.

use photo_capture_core::models::formats::BayerPattern;

/// Geometry and signal levels of the synthetic sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u8,
    /// Sample value of a fully dark pixel.
    pub black_level: u16,
    /// Sample value of a fully saturated pixel.
    pub white_level: u16,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            bits_per_sample: 12,
            black_level: 64,
            white_level: 4095,
        }
    }
}

fn xorshift(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x
}

/// Render the scene for `seed` as interleaved RGB8, row-major.
///
/// The scene is a color gradient with a seed-derived tint, so two requests
/// photograph visibly different scenes while the same request always
/// renders identical pixels.
pub fn render_scene(width: u32, height: u32, seed: u64) -> Vec<u8> {
    // Keep the generator state odd so it never collapses to zero.
    let mut state = (seed << 1) | 1;
    let tint = (xorshift(&mut state) % 64) as u8;
    let slant = (xorshift(&mut state) % 32) as u8;

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y) * 255 / (width + height).max(1)) as u8;
            pixels.push(r.saturating_add(tint));
            pixels.push(g.saturating_add(slant));
            pixels.push(b.saturating_add(tint / 2));
        }
    }
    pixels
}

/// Sample `pixels` through the color filter array of `pattern`.
///
/// Each output sample is the RGB channel the CFA exposes at that pixel,
/// rescaled from 8-bit into the `[black_level, white_level]` range.
pub fn mosaic_bayer(
    pixels: &[u8],
    width: u32,
    height: u32,
    pattern: BayerPattern,
    black_level: u16,
    white_level: u16,
) -> Vec<u16> {
    let range = white_level.saturating_sub(black_level) as u32;
    let mut samples = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            let channel = pattern.color_at(x, y) as usize;
            let value = pixels[idx + channel] as u32;
            samples.push((black_level as u32 + value * range / 255) as u16);
        }
    }
    samples
}

/// Expand RGB8 into 16-bit linear samples covering the full range.
pub fn render_linear16(pixels: &[u8]) -> Vec<u16> {
    pixels.iter().map(|&v| v as u16 * 257).collect()
}

/// Downscale RGB8 by point sampling so the longest edge fits `max_dim`.
///
/// Returns the pixels with their new dimensions. Images already within
/// `max_dim` come back unchanged.
pub fn downscale_rgb(pixels: &[u8], width: u32, height: u32, max_dim: u32) -> (Vec<u8>, u32, u32) {
    let longest = width.max(height);
    if max_dim == 0 || longest <= max_dim {
        return (pixels.to_vec(), width, height);
    }
    let step = longest.div_ceil(max_dim);
    let out_width = width.div_ceil(step);
    let out_height = height.div_ceil(step);

    let mut out = Vec::with_capacity(out_width as usize * out_height as usize * 3);
    for y in (0..height).step_by(step as usize) {
        for x in (0..width).step_by(step as usize) {
            let idx = ((y * width + x) * 3) as usize;
            out.extend_from_slice(&pixels[idx..idx + 3]);
        }
    }
    (out, out_width, out_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenes_are_deterministic_per_seed() {
        let a = render_scene(16, 12, 7);
        let b = render_scene(16, 12, 7);
        let c = render_scene(16, 12, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16 * 12 * 3);
    }

    #[test]
    fn mosaic_follows_the_cfa_layout() {
        // Every pixel has distinct channel values so the sampled channel is
        // recoverable from the output.
        let width = 4;
        let height = 4;
        let mut pixels = Vec::new();
        for _ in 0..(width * height) {
            pixels.extend_from_slice(&[255, 128, 0]);
        }

        for pattern in [
            BayerPattern::Rggb,
            BayerPattern::Bggr,
            BayerPattern::Grbg,
            BayerPattern::Gbrg,
        ] {
            let samples = mosaic_bayer(&pixels, width, height, pattern, 64, 4095);
            assert_eq!(samples.len(), (width * height) as usize);
            for y in 0..height {
                for x in 0..width {
                    let expected = match pattern.color_at(x, y) {
                        0 => 4095,                      // red saturates
                        1 => 64 + (128 * 4031) / 255,   // green mid-scale
                        _ => 64,                        // blue at black level
                    };
                    assert_eq!(samples[(y * width + x) as usize], expected as u16);
                }
            }
        }
    }

    #[test]
    fn mosaic_stays_within_sensor_levels() {
        let pixels = render_scene(8, 8, 3);
        let samples = mosaic_bayer(&pixels, 8, 8, BayerPattern::Rggb, 64, 4095);
        assert!(samples.iter().all(|&s| (64..=4095).contains(&s)));
    }

    #[test]
    fn linear16_covers_the_full_range() {
        let samples = render_linear16(&[0, 255, 128]);
        assert_eq!(samples, vec![0, 65535, 128 * 257]);
    }

    #[test]
    fn downscale_fits_the_longest_edge() {
        let pixels = render_scene(320, 240, 1);
        let (out, w, h) = downscale_rgb(&pixels, 320, 240, 160);
        assert_eq!((w, h), (160, 120));
        assert_eq!(out.len(), (160 * 120 * 3) as usize);
    }

    #[test]
    fn downscale_leaves_small_images_alone() {
        let pixels = render_scene(64, 48, 1);
        let (out, w, h) = downscale_rgb(&pixels, 64, 48, 160);
        assert_eq!((w, h), (64, 48));
        assert_eq!(out, pixels);
    }
}
