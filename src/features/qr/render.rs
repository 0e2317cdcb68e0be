//! QR rasterization

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;

use crate::core::{ellipsize, RenderError};

/// Longest title kept before it is cut with `...`
pub const TITLE_LIMIT: usize = 36;

/// Pixels per QR module in the square image
const MODULE_SIZE: u32 = 10;

/// Quiet zone around the code, in modules
const QUIET_ZONE: u32 = 4;

const SLIDE_WIDTH: u32 = 1920;
const SLIDE_HEIGHT: u32 = 1080;

/// Share of the slide height taken by the code
const SLIDE_QR_SHARE: f32 = 0.8;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Caption for a QR image: the custom title if given, else the content, cut to
/// `TITLE_LIMIT` characters.
pub fn qr_title(content: &str, title: Option<&str>) -> String {
    let source = title.filter(|t| !t.trim().is_empty()).unwrap_or(content);
    ellipsize(source, TITLE_LIMIT)
}

/// Square black-on-white code with a quiet zone. Uses the highest error correction
/// level so the code survives being photographed off a projector.
fn render_code(content: &str) -> Result<GrayImage, RenderError> {
    let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::H)?;
    let modules = code.width() as u32;
    let colors: Vec<Color> = code.into_colors();
    let img_size = (modules + QUIET_ZONE * 2) * MODULE_SIZE;

    Ok(ImageBuffer::from_fn(img_size, img_size, |x, y| {
        let (cx, cy) = (x / MODULE_SIZE, y / MODULE_SIZE);
        if cx < QUIET_ZONE || cy < QUIET_ZONE {
            return LIGHT;
        }
        let (mx, my) = (cx - QUIET_ZONE, cy - QUIET_ZONE);
        if mx >= modules || my >= modules {
            return LIGHT;
        }
        match colors[(my * modules + mx) as usize] {
            Color::Dark => DARK,
            Color::Light => LIGHT,
        }
    }))
}

/// The code centred on a white 1920x1080 slide
fn render_slide(content: &str) -> Result<GrayImage, RenderError> {
    let code = render_code(content)?;
    let side = (SLIDE_HEIGHT as f32 * SLIDE_QR_SHARE) as u32;
    let scaled = imageops::resize(&code, side, side, FilterType::Nearest);

    let mut slide = GrayImage::from_pixel(SLIDE_WIDTH, SLIDE_HEIGHT, LIGHT);
    let x = (SLIDE_WIDTH - side) / 2;
    let y = (SLIDE_HEIGHT - side) / 2;
    imageops::overlay(&mut slide, &scaled, x as i64, y as i64);
    Ok(slide)
}

fn encode(image: GrayImage) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image).write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// PNG bytes of a square QR code for `content`
pub fn qr_png(content: &str) -> Result<Vec<u8>, RenderError> {
    encode(render_code(content)?)
}

/// PNG bytes of a 16:9 slide with the QR code for `content` in the middle
pub fn slide_png(content: &str) -> Result<Vec<u8>, RenderError> {
    encode(render_slide(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_prefers_custom() {
        assert_eq!(qr_title("https://acmucsd.com", Some("ACM Home")), "ACM Home");
        assert_eq!(qr_title("https://acmucsd.com", None), "https://acmucsd.com");
        assert_eq!(qr_title("https://acmucsd.com", Some("  ")), "https://acmucsd.com");
    }

    #[test]
    fn test_title_is_cut_at_limit() {
        let long = "a".repeat(50);
        let title = qr_title(&long, None);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), TITLE_LIMIT + 3);

        let exact = "b".repeat(TITLE_LIMIT);
        assert_eq!(qr_title(&exact, None), exact);
    }

    #[test]
    fn test_code_has_quiet_zone_and_finder() {
        let image = render_code("https://members.acmucsd.com/checkin?code=hack").unwrap();
        assert_eq!(image.width(), image.height());
        assert_eq!(image.width() % MODULE_SIZE, 0);
        // Border is light, the top-left finder pattern starts right after it
        assert_eq!(*image.get_pixel(0, 0), LIGHT);
        let edge = QUIET_ZONE * MODULE_SIZE;
        assert_eq!(*image.get_pixel(edge - 1, edge - 1), LIGHT);
        assert_eq!(*image.get_pixel(edge, edge), DARK);
    }

    #[test]
    fn test_slide_is_widescreen_with_centred_code() {
        let slide = render_slide("https://acmucsd.com").unwrap();
        assert_eq!((slide.width(), slide.height()), (SLIDE_WIDTH, SLIDE_HEIGHT));
        assert_eq!(*slide.get_pixel(10, 540), LIGHT);
        assert_eq!(*slide.get_pixel(1900, 540), LIGHT);
    }

    #[test]
    fn test_png_signature() {
        let png = qr_png("hello").unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
