//! Placement of a video frame inside a drawing region
//!
//! All aspect-ratio math goes through [`Rational`] so the chosen axis and
//! the resulting sizes do not depend on floating-point rounding.

use crate::geometry::{Rational, Rect, VideoFillMode};

fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Rectangle of size `w`x`h` centered within `bounds`
fn center_in(bounds: Rect<u32>, w: u32, h: u32) -> Rect<u32> {
    Rect::new(
        bounds.x + bounds.w.saturating_sub(w) / 2,
        bounds.y + bounds.h.saturating_sub(h) / 2,
        w,
        h,
    )
}

/// Compute the source and destination rectangles for drawing a frame
///
/// # Arguments
///
/// * `frame` - Natural bounds of the decoded frame
/// * `bounds` - Region available to draw in
/// * `sample_aspect_ratio` - Aspect ratio of one pixel; zero means square pixels
/// * `mode` - How to fit the frame into the region
///
/// # Returns
///
/// `(src, dest)`: the part of the frame to draw and where to draw it.
/// An empty frame or region gives empty rectangles at the respective origins.
pub fn fit_video_to_region(
    frame: Rect<u32>,
    bounds: Rect<u32>,
    sample_aspect_ratio: Rational<u32>,
    mode: VideoFillMode,
) -> (Rect<u32>, Rect<u32>) {
    if frame.is_empty() || bounds.is_empty() {
        return (
            Rect::new(frame.x, frame.y, 0, 0),
            Rect::new(bounds.x, bounds.y, 0, 0),
        );
    }

    let pixel_ratio = if sample_aspect_ratio.is_valid() {
        Rational::new(
            u64::from(sample_aspect_ratio.numerator()),
            u64::from(sample_aspect_ratio.denominator()),
        )
    } else {
        Rational::new(1, 1)
    };
    let display_ratio = Rational::new(u64::from(frame.w), u64::from(frame.h)) * pixel_ratio;
    let region_ratio = Rational::new(u64::from(bounds.w), u64::from(bounds.h));
    let wider_than_region = display_ratio > region_ratio;

    match mode {
        VideoFillMode::Stretch => (frame, bounds),

        VideoFillMode::MaintainRatio => {
            let (w, h) = if wider_than_region {
                let h = (u64::from(bounds.w) * display_ratio.inverse()).truncate();
                (bounds.w, to_u32(h))
            } else {
                let w = (u64::from(bounds.h) * display_ratio).truncate();
                (to_u32(w), bounds.h)
            };
            (frame, center_in(bounds, w, h))
        }

        VideoFillMode::Zoom => {
            let src = if wider_than_region {
                // Full height is shown; the sides are cropped.
                let w = to_u32((u64::from(frame.w) * (region_ratio / display_ratio)).truncate());
                Rect::new(frame.x + (frame.w - w) / 2, frame.y, w, frame.h)
            } else {
                let h = to_u32((u64::from(frame.h) * (display_ratio / region_ratio)).truncate());
                Rect::new(frame.x, frame.y + (frame.h - h) / 2, frame.w, h)
            };
            (src, bounds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Rect<u32> = Rect::from_size(1920, 1080);
    const BOUNDS: Rect<u32> = Rect::from_size(640, 480);

    fn square() -> Rational<u32> {
        Rational::new(1, 1)
    }

    #[test]
    fn test_maintain_ratio_letterboxes() {
        let (src, dest) = fit_video_to_region(FRAME, BOUNDS, square(), VideoFillMode::MaintainRatio);

        assert_eq!(src, FRAME);
        assert_eq!(dest, Rect::new(0, 60, 640, 360));
        assert_eq!(Rational::new(dest.w, dest.h), Rational::new(16, 9));
        assert!(BOUNDS.contains(&dest));
        assert_eq!(dest.y * 2 + dest.h, BOUNDS.h);
    }

    #[test]
    fn test_maintain_ratio_pillarboxes() {
        let bounds = Rect::new(100, 50, 1000, 400);
        let (src, dest) = fit_video_to_region(FRAME, bounds, square(), VideoFillMode::MaintainRatio);

        assert_eq!(src, FRAME);
        assert_eq!(dest.h, 400);
        assert_eq!(dest.w, 711);
        assert_eq!(dest.x, 100 + (1000 - 711) / 2);
        assert_eq!(dest.y, 50);
        assert!(bounds.contains(&dest));
    }

    #[test]
    fn test_stretch_fills_bounds() {
        let (src, dest) = fit_video_to_region(FRAME, BOUNDS, square(), VideoFillMode::Stretch);
        assert_eq!(src, FRAME);
        assert_eq!(dest, BOUNDS);
    }

    #[test]
    fn test_zoom_crops_sides_of_wide_video() {
        let (src, dest) = fit_video_to_region(FRAME, BOUNDS, square(), VideoFillMode::Zoom);

        assert_eq!(dest, BOUNDS);
        assert_eq!(src, Rect::new(240, 0, 1440, 1080));
        assert_eq!(src.x * 2 + src.w, FRAME.w);
        assert_eq!(Rational::new(src.w, src.h), Rational::new(4, 3));
    }

    #[test]
    fn test_zoom_crops_top_and_bottom_of_tall_video() {
        let frame = Rect::from_size(1080, 1920);
        let (src, dest) = fit_video_to_region(frame, BOUNDS, square(), VideoFillMode::Zoom);

        assert_eq!(dest, BOUNDS);
        assert_eq!(src, Rect::new(0, 555, 1080, 810));
    }

    #[test]
    fn test_sample_aspect_ratio_is_applied() {
        // 720x480 with 32:27 pixels displays as 16:9.
        let frame = Rect::from_size(720, 480);
        let bounds = Rect::from_size(1920, 1080);
        let (src, dest) =
            fit_video_to_region(frame, bounds, Rational::new(32, 27), VideoFillMode::MaintainRatio);

        assert_eq!(src, frame);
        assert_eq!(dest, bounds);
    }

    #[test]
    fn test_zero_sample_aspect_ratio_means_square() {
        let with_zero = fit_video_to_region(FRAME, BOUNDS, Rational::zero(), VideoFillMode::MaintainRatio);
        let with_square = fit_video_to_region(FRAME, BOUNDS, square(), VideoFillMode::MaintainRatio);
        assert_eq!(with_zero, with_square);
    }

    #[test]
    fn test_empty_inputs() {
        let (src, dest) = fit_video_to_region(
            Rect::from_size(0, 1080),
            BOUNDS,
            square(),
            VideoFillMode::MaintainRatio,
        );
        assert!(src.is_empty());
        assert!(dest.is_empty());

        let (src, dest) = fit_video_to_region(FRAME, Rect::new(5, 5, 640, 0), square(), VideoFillMode::Zoom);
        assert!(src.is_empty());
        assert_eq!(dest, Rect::new(5, 5, 0, 0));
    }
}
