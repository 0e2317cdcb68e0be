//! Badge rendering
//!
//! Draws the notification badge in the bottom-right corner of an 800x800 icon. The
//! badge is a circle for one digit and a rounded pill for longer labels, with a black
//! outline and white digits from a built-in 5x7 bitmap font.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use crate::core::RenderError;

/// Side length of the working icon, in pixels
pub const ICON_SIZE: u32 = 800;

/// Highest count shown verbatim; anything above renders as "9999+"
const MAX_SHOWN: u32 = 9999;

const BADGE_RED: Rgba<u8> = Rgba([0xEF, 0x47, 0x47, 0xFF]);
const OUTLINE: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);
const TEXT: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const OUTLINE_WIDTH: i64 = 10;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// Rows of a 5x7 glyph, most significant of the low five bits on the left
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        _ => return None,
    };
    Some(rows)
}

/// Text drawn on the badge for a ping count
pub fn ping_label(count: u32) -> String {
    if count > MAX_SHOWN {
        format!("{MAX_SHOWN}+")
    } else {
        count.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeShape {
    Circle { cx: i64, cy: i64, r: i64 },
    Pill { x0: i64, y0: i64, x1: i64, y1: i64, radius: i64 },
}

impl BadgeShape {
    fn contains(&self, x: i64, y: i64, grow: i64) -> bool {
        match *self {
            BadgeShape::Circle { cx, cy, r } => {
                let (dx, dy, r) = (x - cx, y - cy, r + grow);
                dx * dx + dy * dy <= r * r
            }
            BadgeShape::Pill { x0, y0, x1, y1, radius } => {
                let (x0, y0, x1, y1, r) = (x0 - grow, y0 - grow, x1 + grow, y1 + grow, radius + grow);
                if x < x0 || x > x1 || y < y0 || y > y1 {
                    return false;
                }
                let dx = (x0 + r - x).max(x - (x1 - r)).max(0);
                let dy = (y0 + r - y).max(y - (y1 - r)).max(0);
                dx * dx + dy * dy <= r * r
            }
        }
    }

    fn center(&self) -> (i64, i64) {
        match *self {
            BadgeShape::Circle { cx, cy, .. } => (cx, cy),
            BadgeShape::Pill { x0, y0, x1, y1, .. } => ((x0 + x1) / 2, (y0 + y1) / 2),
        }
    }

    fn bounds(&self) -> (i64, i64, i64, i64) {
        match *self {
            BadgeShape::Circle { cx, cy, r } => (cx - r, cy - r, cx + r, cy + r),
            BadgeShape::Pill { x0, y0, x1, y1, .. } => (x0, y0, x1, y1),
        }
    }
}

/// Shape and font size for a label; wider labels get a wider pill and smaller digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeLayout {
    pub shape: BadgeShape,
    pub font_size: u32,
}

pub fn layout_for(label: &str) -> BadgeLayout {
    let pill = |x0, y0, x1, y1| BadgeShape::Pill { x0, y0, x1, y1, radius: 80 };
    match label.chars().count() {
        1 => BadgeLayout {
            shape: BadgeShape::Circle { cx: 600, cy: 600, r: 100 },
            font_size: 150,
        },
        2 => BadgeLayout { shape: pill(490, 525, 710, 685), font_size: 125 },
        3 => BadgeLayout { shape: pill(485, 520, 715, 690), font_size: 105 },
        4 => BadgeLayout { shape: pill(440, 520, 730, 690), font_size: 100 },
        _ => BadgeLayout { shape: pill(420, 520, 730, 690), font_size: 95 },
    }
}

fn draw_badge(image: &mut RgbaImage, shape: &BadgeShape) {
    let (x0, y0, x1, y1) = shape.bounds();
    let (width, height) = (image.width() as i64, image.height() as i64);
    for y in (y0 - OUTLINE_WIDTH).max(0)..=(y1 + OUTLINE_WIDTH).min(height - 1) {
        for x in (x0 - OUTLINE_WIDTH).max(0)..=(x1 + OUTLINE_WIDTH).min(width - 1) {
            if shape.contains(x, y, 0) {
                image.put_pixel(x as u32, y as u32, BADGE_RED);
            } else if shape.contains(x, y, OUTLINE_WIDTH) {
                image.put_pixel(x as u32, y as u32, OUTLINE);
            }
        }
    }
}

fn draw_label(image: &mut RgbaImage, label: &str, layout: &BadgeLayout) {
    // Cap height is roughly 70% of the nominal font size.
    let scale = ((layout.font_size * 7 / 10) / GLYPH_HEIGHT).max(1) as i64;
    let advance = (GLYPH_WIDTH as i64 + 1) * scale;
    let glyphs: Vec<[u8; 7]> = label.chars().filter_map(glyph).collect();
    if glyphs.is_empty() {
        return;
    }

    let text_width = advance * glyphs.len() as i64 - scale;
    let text_height = GLYPH_HEIGHT as i64 * scale;
    let (cx, cy) = layout.shape.center();
    let (left, top) = (cx - text_width / 2, cy - text_height / 2);

    for (i, rows) in glyphs.iter().enumerate() {
        let gx = left + i as i64 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let px = gx + col as i64 * scale;
                let py = top + row as i64 * scale;
                for y in py..py + scale {
                    for x in px..px + scale {
                        if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
                            image.put_pixel(x as u32, y as u32, TEXT);
                        }
                    }
                }
            }
        }
    }
}

/// Overlay the ping badge for `count` on a copy of `base`, resized to `ICON_SIZE`.
pub fn render_ping_icon(base: &DynamicImage, count: u32) -> RgbaImage {
    let mut image = if base.width() == ICON_SIZE && base.height() == ICON_SIZE {
        base.to_rgba8()
    } else {
        base.resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Triangle)
            .to_rgba8()
    };

    let label = ping_label(count);
    let layout = layout_for(&label);
    draw_badge(&mut image, &layout.shape);
    draw_label(&mut image, &label, &layout);
    image
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// `data:` URI accepted by the guild icon endpoint
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Rgba<u8> = Rgba([10, 200, 30, 255]);

    fn base() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(ICON_SIZE, ICON_SIZE, BASE))
    }

    #[test]
    fn test_label_caps_at_9999_plus() {
        assert_eq!(ping_label(1), "1");
        assert_eq!(ping_label(9999), "9999");
        assert_eq!(ping_label(10000), "9999+");
    }

    #[test]
    fn test_layout_by_digit_count() {
        assert!(matches!(layout_for("7").shape, BadgeShape::Circle { r: 100, .. }));

        let widths: Vec<i64> = ["42", "420", "4200", "9999+"]
            .iter()
            .map(|label| {
                let (x0, _, x1, _) = layout_for(label).shape.bounds();
                x1 - x0
            })
            .collect();
        assert!(widths.windows(2).all(|w| w[0] <= w[1]), "{widths:?}");

        let sizes: Vec<u32> = ["1", "42", "420", "4200", "9999+"]
            .iter()
            .map(|label| layout_for(label).font_size)
            .collect();
        assert_eq!(sizes, vec![150, 125, 105, 100, 95]);
    }

    #[test]
    fn test_one_digit_badge_pixels() {
        let icon = render_ping_icon(&base(), 1);
        // Inside the circle, left of the digit
        assert_eq!(*icon.get_pixel(505, 600), BADGE_RED);
        // On the outline ring just outside radius 100
        assert_eq!(*icon.get_pixel(600, 495), OUTLINE);
        // Far from the badge the base shows through
        assert_eq!(*icon.get_pixel(100, 100), BASE);
        // The middle column of "1" is lit at the badge centre
        assert_eq!(*icon.get_pixel(600, 600), TEXT);
    }

    #[test]
    fn test_small_base_is_resized() {
        let small = DynamicImage::ImageRgba8(RgbaImage::from_pixel(128, 128, BASE));
        let icon = render_ping_icon(&small, 12);
        assert_eq!(icon.dimensions(), (ICON_SIZE, ICON_SIZE));
    }

    #[test]
    fn test_png_data_uri() {
        let icon = render_ping_icon(&base(), 10001);
        let png = encode_png(&icon).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let uri = png_data_uri(&png);
        assert!(uri.starts_with("data:image/png;base64,iVBOR"));
    }
}
