//! Image enhancement strategies tried in order by the orchestrator.
//!
//! Each strategy is a pure transform of the decoded page image; the
//! orchestrator re-encodes the result and hands it to the OCR engine.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};

/// Contrast boost for the standard high-contrast pass.
const HIGH_CONTRAST_BOOST: f32 = 30.0;

/// Contrast boost for the emergency extreme-contrast pass.
const EXTREME_CONTRAST_BOOST: f32 = 80.0;

/// Window sigma for the adaptive local-mean filter.
const ADAPTIVE_SIGMA: f32 = 7.0;

/// Offset subtracted from the local mean before thresholding.
const ADAPTIVE_OFFSET: i16 = 10;

/// Images smaller than this are upscaled 2x before recognition.
pub const MIN_WIDTH: u32 = 800;
pub const MIN_HEIGHT: u32 = 600;

/// An enhancement strategy applied before a recognition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Baseline,
    HighContrast,
    Denoised,
    Sharpened,
    Morphological,
    AdaptiveFilter,
    // Emergency passes, tried only when every standard strategy fails.
    ExtremeContrast,
    EdgeEnhance,
    DilateErode,
    BlurSharpen,
}

/// Standard strategies, most conservative first.
pub const STANDARD_STRATEGIES: &[Strategy] = &[
    Strategy::Baseline,
    Strategy::HighContrast,
    Strategy::Denoised,
    Strategy::Sharpened,
    Strategy::Morphological,
    Strategy::AdaptiveFilter,
];

/// Aggressive last-resort strategies. Results carry reduced confidence.
pub const EMERGENCY_STRATEGIES: &[Strategy] = &[
    Strategy::ExtremeContrast,
    Strategy::EdgeEnhance,
    Strategy::DilateErode,
    Strategy::BlurSharpen,
];

/// Confidence assigned to text recovered by an emergency strategy.
pub const EMERGENCY_CONFIDENCE: f32 = 0.3;

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Baseline => "baseline",
            Strategy::HighContrast => "high_contrast",
            Strategy::Denoised => "denoised",
            Strategy::Sharpened => "sharpened",
            Strategy::Morphological => "morphological",
            Strategy::AdaptiveFilter => "adaptive_filter",
            Strategy::ExtremeContrast => "extreme_contrast",
            Strategy::EdgeEnhance => "edge_enhance",
            Strategy::DilateErode => "dilate_erode",
            Strategy::BlurSharpen => "blur_sharpen",
        }
    }

    /// Apply this strategy to a decoded image.
    pub fn apply(&self, img: &DynamicImage) -> DynamicImage {
        match self {
            Strategy::Baseline => img.grayscale(),
            Strategy::HighContrast => img.grayscale().adjust_contrast(HIGH_CONTRAST_BOOST),
            Strategy::Denoised => {
                DynamicImage::ImageLuma8(median_filter_3x3(&img.to_luma8()))
            }
            Strategy::Sharpened => img.grayscale().unsharpen(1.0, 2),
            Strategy::Morphological => {
                // Opening: erode then dilate. Removes speckle noise while
                // keeping stroke width roughly intact.
                let gray = img.to_luma8();
                DynamicImage::ImageLuma8(dilate_3x3(&erode_3x3(&gray)))
            }
            Strategy::AdaptiveFilter => {
                DynamicImage::ImageLuma8(adaptive_threshold(&img.grayscale()))
            }
            Strategy::ExtremeContrast => img.grayscale().adjust_contrast(EXTREME_CONTRAST_BOOST),
            Strategy::EdgeEnhance => img
                .grayscale()
                .filter3x3(&[0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0]),
            Strategy::DilateErode => {
                // Closing: dilate then erode. Reconnects broken strokes.
                let gray = img.to_luma8();
                DynamicImage::ImageLuma8(erode_3x3(&dilate_3x3(&gray)))
            }
            Strategy::BlurSharpen => img.grayscale().blur(2.0).unsharpen(1.5, 2),
        }
    }
}

/// Upscale small scans 2x; low-resolution input defeats recognition.
pub fn upscale_if_small(img: DynamicImage) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w < MIN_WIDTH || h < MIN_HEIGHT {
        img.resize(w * 2, h * 2, image::imageops::FilterType::Lanczos3)
    } else {
        img
    }
}

/// 3x3 median filter on a grayscale image. Border pixels are copied.
fn median_filter_3x3(src: &GrayImage) -> GrayImage {
    let (w, h) = src.dimensions();
    let mut out = src.clone();
    if w < 3 || h < 3 {
        return out;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut window = [0u8; 9];
            let mut i = 0;
            for dy in 0..3 {
                for dx in 0..3 {
                    window[i] = src.get_pixel(x + dx - 1, y + dy - 1)[0];
                    i += 1;
                }
            }
            window.sort_unstable();
            out.put_pixel(x, y, Luma([window[4]]));
        }
    }
    out
}

fn erode_3x3(src: &GrayImage) -> GrayImage {
    morph_3x3(src, |a, b| a.min(b))
}

fn dilate_3x3(src: &GrayImage) -> GrayImage {
    morph_3x3(src, |a, b| a.max(b))
}

fn morph_3x3(src: &GrayImage, fold: fn(u8, u8) -> u8) -> GrayImage {
    let (w, h) = src.dimensions();
    let mut out = src.clone();
    if w < 3 || h < 3 {
        return out;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = src.get_pixel(x, y)[0];
            for dy in 0..3 {
                for dx in 0..3 {
                    acc = fold(acc, src.get_pixel(x + dx - 1, y + dy - 1)[0]);
                }
            }
            out.put_pixel(x, y, Luma([acc]));
        }
    }
    out
}

/// Local-mean adaptive threshold: a pixel becomes ink when it is darker
/// than its blurred neighborhood by more than ADAPTIVE_OFFSET.
fn adaptive_threshold(gray: &DynamicImage) -> GrayImage {
    let src = gray.to_luma8();
    let local_mean = gray.blur(ADAPTIVE_SIGMA).to_luma8();
    let (w, h) = src.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let px = src.get_pixel(x, y)[0] as i16;
            let mean = local_mean.get_pixel(x, y)[0] as i16;
            let v = if px < mean - ADAPTIVE_OFFSET { 0 } else { 255 };
            out.put_pixel(x, y, Luma([v]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(w: u32, h: u32) -> DynamicImage {
        let mut img = GrayImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = if (x + y) % 2 == 0 { 230 } else { 40 };
                img.put_pixel(x, y, Luma([v]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn all_strategies_preserve_dimensions() {
        let img = checkerboard(16, 12);
        for strategy in STANDARD_STRATEGIES.iter().chain(EMERGENCY_STRATEGIES) {
            let out = strategy.apply(&img);
            assert_eq!(
                (out.width(), out.height()),
                (16, 12),
                "{} changed dimensions",
                strategy.name()
            );
        }
    }

    #[test]
    fn strategy_order_starts_conservative() {
        assert_eq!(STANDARD_STRATEGIES[0], Strategy::Baseline);
        assert!(!STANDARD_STRATEGIES.contains(&Strategy::ExtremeContrast));
        assert!(EMERGENCY_STRATEGIES.contains(&Strategy::ExtremeContrast));
    }

    #[test]
    fn small_image_is_upscaled() {
        let img = checkerboard(100, 80);
        let out = upscale_if_small(img);
        assert_eq!(out.width(), 200);
        assert_eq!(out.height(), 160);
    }

    #[test]
    fn large_image_is_untouched() {
        let img = checkerboard(MIN_WIDTH, MIN_HEIGHT);
        let out = upscale_if_small(img);
        assert_eq!(out.width(), MIN_WIDTH);
        assert_eq!(out.height(), MIN_HEIGHT);
    }

    #[test]
    fn median_filter_removes_speckle() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([200]));
        img.put_pixel(4, 4, Luma([0])); // lone dark pixel
        let out = median_filter_3x3(&img);
        assert_eq!(out.get_pixel(4, 4)[0], 200);
    }

    #[test]
    fn erode_darkens_dilate_brightens() {
        let img = checkerboard(8, 8).to_luma8();
        let eroded = erode_3x3(&img);
        let dilated = dilate_3x3(&img);
        assert_eq!(eroded.get_pixel(3, 3)[0], 40);
        assert_eq!(dilated.get_pixel(3, 3)[0], 230);
    }

    #[test]
    fn adaptive_threshold_binarizes() {
        let out = adaptive_threshold(&checkerboard(16, 16));
        for px in out.pixels() {
            assert!(px[0] == 0 || px[0] == 255);
        }
    }
}
