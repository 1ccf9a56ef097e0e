use image::{Rgb, RgbImage};

use crate::bbox::{BOX_EDGES, CENTER_INDEX};

pub const EDGE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const ORIGIN_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const X_AXIS_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const Y_AXIS_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Line widths and marker sizes of the box overlay, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub thickness: u32,
    pub axis_length: f32,
    pub origin_radius: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            thickness: 2,
            axis_length: 50.0,
            origin_radius: 10,
        }
    }
}

#[inline]
fn set_pixel(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < img.width() as i64 && y < img.height() as i64 {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Clips the segment `p0 -> p1` to `[min, max]` on both axes (Liang-Barsky).
/// Returns `None` if nothing of the segment is left.
fn clip_segment(
    p0: glam::DVec2,
    p1: glam::DVec2,
    min: glam::DVec2,
    max: glam::DVec2,
) -> Option<(glam::DVec2, glam::DVec2)> {
    let d = p1 - p0;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-d.x, p0.x - min.x),
        (d.x, max.x - p0.x),
        (-d.y, p0.y - min.y),
        (d.y, max.y - p0.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((p0 + d * t0, p0 + d * t1))
}

/// Draws a line segment with Bresenham's algorithm. Thickness above one is
/// approximated with a square brush `thickness` pixels wide; even widths
/// extend one pixel further right and down. The segment is clipped to the
/// image first, so endpoints far outside the frame cost nothing extra.
pub fn draw_line(
    img: &mut RgbImage,
    p0: glam::Vec2,
    p1: glam::Vec2,
    color: Rgb<u8>,
    thickness: u32,
) {
    if !p0.is_finite() || !p1.is_finite() {
        return;
    }
    // Clip in f64, f32 loses whole pixels for endpoints far off screen.
    let margin = thickness as f64;
    let min = glam::DVec2::splat(-margin);
    let max = glam::DVec2::new(img.width() as f64 + margin, img.height() as f64 + margin);
    let Some((p0, p1)) = clip_segment(p0.as_dvec2(), p1.as_dvec2(), min, max) else {
        return;
    };

    let (mut x0, mut y0) = (p0.x.round() as i64, p0.y.round() as i64);
    let (x1, y1) = (p1.x.round() as i64, p1.y.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;
    let width = thickness.max(1) as i64;
    let (lo, hi) = (-((width - 1) / 2), width / 2);

    loop {
        for i in lo..=hi {
            for j in lo..=hi {
                set_pixel(img, x0 + i, y0 + j, color);
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draws a filled disc. Nothing is drawn when the disc lies fully outside
/// the image.
pub fn draw_disc(img: &mut RgbImage, center: glam::Vec2, radius: u32, color: Rgb<u8>) {
    if !center.is_finite() {
        return;
    }
    let reach = radius as f32 + 1.0;
    if center.x < -reach
        || center.y < -reach
        || center.x > img.width() as f32 + reach
        || center.y > img.height() as f32 + reach
    {
        return;
    }
    let (cx, cy) = (center.x.round() as i64, center.y.round() as i64);
    let r = radius as i64;
    for y in -r..=r {
        for x in -r..=r {
            if x * x + y * y <= r * r {
                set_pixel(img, cx + x, cy + y, color);
            }
        }
    }
}

/// Draws the twelve box edges between projected corners plus an origin
/// marker with short x and y axis segments at the projected center.
///
/// `projected` holds the eight corners in enumeration order and, optionally,
/// the center at index 8. `None` marks a point that could not be projected;
/// edges touching it are skipped. Returns the number of edges drawn.
pub fn draw_box(
    img: &mut RgbImage,
    projected: &[Option<glam::Vec2>],
    style: &OverlayStyle,
) -> usize {
    let mut drawn = 0;
    for (a, b) in BOX_EDGES {
        if let (Some(Some(pa)), Some(Some(pb))) = (projected.get(a), projected.get(b)) {
            draw_line(img, *pa, *pb, EDGE_COLOR, style.thickness);
            drawn += 1;
        }
    }
    if let Some(Some(origin)) = projected.get(CENTER_INDEX) {
        draw_disc(img, *origin, style.origin_radius, ORIGIN_COLOR);
        let x_end = *origin + glam::Vec2::new(style.axis_length, 0.0);
        let y_end = *origin + glam::Vec2::new(0.0, style.axis_length);
        draw_line(img, *origin, x_end, X_AXIS_COLOR, style.thickness);
        draw_line(img, *origin, y_end, Y_AXIS_COLOR, style.thickness);
    }
    drawn
}
