//! Screenshot annotation
//!
//! Draws detection boxes and label banners onto the uploaded screenshot and
//! crops element regions for the report. All coordinates are clamped to the
//! image; a box that degenerates after clamping yields no crop.

use ab_glyph::{FontVec, PxScale};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::config::AnnotateConfig;
use crate::detection::{BoundingBox, DetectedElement};

/// Context padding added around element crops, in pixels.
pub const CROP_PADDING: u32 = 5;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Crop the region of `bbox` out of `image`, grown by [`CROP_PADDING`] for
/// visual context. Returns `None` when the clamped box has no area.
pub fn crop_element(image: &RgbImage, bbox: &BoundingBox) -> Option<RgbImage> {
    let (x_min, y_min, x_max, y_max) = bbox.clamped_corners(image.width(), image.height());

    if x_min >= x_max || y_min >= y_max {
        return None;
    }

    let x_min = x_min.saturating_sub(CROP_PADDING);
    let y_min = y_min.saturating_sub(CROP_PADDING);
    let x_max = (x_max + CROP_PADDING).min(image.width());
    let y_max = (y_max + CROP_PADDING).min(image.height());

    Some(imageops::crop_imm(image, x_min, y_min, x_max - x_min, y_max - y_min).to_image())
}

/// Encode an RGB image as JPEG.
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    image.write_to(
        &mut std::io::Cursor::new(&mut buffer),
        image::ImageFormat::Jpeg,
    )?;
    Ok(buffer)
}

/// Draws detection overlays onto screenshots.
///
/// The label font is loaded once at startup. When none of the configured
/// candidates loads, boxes are still drawn and labels are skipped.
pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    pub fn from_config(config: &AnnotateConfig) -> Self {
        for path in &config.font_paths {
            match std::fs::read(path) {
                Ok(bytes) => match FontVec::try_from_vec(bytes) {
                    Ok(font) => {
                        tracing::info!(path = %path, "Loaded annotation font");
                        return Self { font: Some(font) };
                    }
                    Err(e) => {
                        tracing::debug!(path = %path, "Not a usable font: {}", e);
                    }
                },
                Err(_) => continue,
            }
        }

        tracing::warn!("No annotation font found; boxes will be drawn without labels");
        Self { font: None }
    }

    #[cfg(test)]
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render a copy of `image` with a box and label banner per element.
    pub fn render(&self, image: &RgbImage, elements: &[DetectedElement]) -> RgbImage {
        let mut annotated = image.clone();

        for element in elements {
            let (x_min, y_min, x_max, y_max) =
                element.bbox.clamped_corners(image.width(), image.height());
            let width = x_max.saturating_sub(x_min);
            let height = y_max.saturating_sub(y_min);
            if width == 0 || height == 0 {
                continue;
            }

            draw_hollow_rect_mut(
                &mut annotated,
                Rect::at(x_min as i32, y_min as i32).of_size(width, height),
                BOX_COLOR,
            );
            // Second, inset rectangle for a 2px stroke
            if width > 2 && height > 2 {
                draw_hollow_rect_mut(
                    &mut annotated,
                    Rect::at(x_min as i32 + 1, y_min as i32 + 1).of_size(width - 2, height - 2),
                    BOX_COLOR,
                );
            }

            if let Some(font) = &self.font {
                let label = format!("{} ({:.0}%)", element.id, element.confidence * 100.0);
                let scale = PxScale::from(label_scale(image.width()));
                let (text_w, text_h) = text_size(scale, font, &label);

                // Banner above the box, pushed inside when the box touches
                // the top edge.
                let banner_h = text_h + 4;
                let banner_y = y_min.saturating_sub(banner_h);
                let banner_w = text_w.min(image.width().saturating_sub(x_min));

                if banner_w > 0 {
                    draw_filled_rect_mut(
                        &mut annotated,
                        Rect::at(x_min as i32, banner_y as i32).of_size(banner_w, banner_h),
                        BOX_COLOR,
                    );
                    draw_text_mut(
                        &mut annotated,
                        LABEL_TEXT_COLOR,
                        x_min as i32,
                        banner_y as i32 + 2,
                        scale,
                        font,
                        &label,
                    );
                }
            }
        }

        annotated
    }
}

/// Label size tracks the screenshot width so labels stay legible on large
/// captures without swallowing small ones.
fn label_scale(image_width: u32) -> f32 {
    (image_width as f32 / 64.0).clamp(12.0, 40.0)
}
