//! Static label image sampled by the compositing stage.

use std::fs;

use ab_glyph::{point, Font, FontArc, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use rippleconfig::{Color, LabelConfig};

/// Immutable backdrop image; regenerated wholesale on resize, never edited.
#[derive(Clone, Debug)]
pub struct Backdrop {
    image: RgbaImage,
}

impl Backdrop {
    /// Rasterizes `label` centred on a `width`x`height` canvas.
    ///
    /// The font size is in logical pixels and is scaled by `pixel_density`.
    /// When no font can be resolved the backdrop is the plain background.
    pub fn generate(label: &LabelConfig, width: u32, height: u32, pixel_density: f32) -> Self {
        let mut backdrop = Self::plain(label.background_color, width, height);
        if label.text.trim().is_empty() {
            return backdrop;
        }

        match resolve_font(label) {
            Some(font) => {
                let em_px = label.font_size * pixel_density;
                backdrop.draw_centered_text(&font, &label.text, em_px, label.text_color);
            }
            None => tracing::warn!(
                family = %label.font_family,
                path = ?label.font_path,
                "no usable font found; backdrop will show the background color only"
            ),
        }
        backdrop
    }

    pub fn plain(color: Color, width: u32, height: u32) -> Self {
        let image = RgbaImage::from_pixel(width.max(1), height.max(1), Rgba(color.to_rgba8()));
        Self { image }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Bilinear sample with clamp-to-edge addressing; `v = 0` is the top row.
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        let (width, height) = self.image.dimensions();
        let x = u * width as f32 - 0.5;
        let y = v * height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let fetch = |ix: f32, iy: f32| -> [f32; 4] {
            let cx = (ix.max(0.0) as u32).min(width - 1);
            let cy = (iy.max(0.0) as u32).min(height - 1);
            let Rgba(px) = *self.image.get_pixel(cx, cy);
            px.map(|channel| channel as f32 / 255.0)
        };

        let top_left = fetch(x0, y0);
        let top_right = fetch(x0 + 1.0, y0);
        let bottom_left = fetch(x0, y0 + 1.0);
        let bottom_right = fetch(x0 + 1.0, y0 + 1.0);

        std::array::from_fn(|c| {
            let top = top_left[c] + (top_right[c] - top_left[c]) * fx;
            let bottom = bottom_left[c] + (bottom_right[c] - bottom_left[c]) * fx;
            top + (bottom - top) * fy
        })
    }

    fn draw_centered_text(&mut self, font: &FontArc, text: &str, em_px: f32, color: Color) {
        let scale = em_scale(font, em_px);
        let scaled = font.as_scaled(scale);

        let mut glyphs = Vec::new();
        let mut cursor_x = 0.0_f32;
        let mut previous = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                cursor_x += scaled.kern(prev, id);
            }
            glyphs.push((id, cursor_x));
            cursor_x += scaled.h_advance(id);
            previous = Some(id);
        }

        let (width, height) = self.image.dimensions();
        let origin_x = width as f32 / 2.0 - cursor_x / 2.0;
        // Middle baseline: centre of the ascent/descent box on the canvas centre.
        let baseline = height as f32 / 2.0 + (scaled.ascent() + scaled.descent()) / 2.0;
        let [r, g, b, a] = color.to_rgba8();
        let text_alpha = a as f32 / 255.0;

        for (id, x) in glyphs {
            let glyph = id.with_scale_and_position(scale, point(origin_x + x, baseline));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let image = &mut self.image;
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                    return;
                }
                let alpha = coverage.clamp(0.0, 1.0) * text_alpha;
                let dst = image.get_pixel_mut(px as u32, py as u32);
                blend_over(dst, [r, g, b], alpha);
            });
        }
    }
}

fn blend_over(dst: &mut Rgba<u8>, src: [u8; 3], alpha: f32) {
    let Rgba([dr, dg, db, da]) = *dst;
    let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
    let out_alpha = alpha + (da as f32 / 255.0) * (1.0 - alpha);
    *dst = Rgba([
        mix(src[0], dr),
        mix(src[1], dg),
        mix(src[2], db),
        (out_alpha * 255.0).round() as u8,
    ]);
}

/// `PxScale` whose em square spans `em_px` pixels, matching CSS font sizing.
fn em_scale(font: &FontArc, em_px: f32) -> PxScale {
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(em_px * font.height_unscaled() / units),
        _ => PxScale::from(em_px),
    }
}

fn resolve_font(label: &LabelConfig) -> Option<FontArc> {
    if let Some(path) = &label.font_path {
        match fs::read(path)
            .map_err(|err| err.to_string())
            .and_then(|bytes| FontArc::try_from_vec(bytes).map_err(|err| err.to_string()))
        {
            Ok(font) => return Some(font),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to load font file; trying font families")
            }
        }
    }

    label
        .families()
        .iter()
        .find_map(|family| load_system_font(family, label.bold))
}

fn load_system_font(family: &str, bold: bool) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::handle::Handle;
    use font_kit::properties::{Properties, Weight};
    use font_kit::source::SystemSource;

    let name = match family.to_ascii_lowercase().as_str() {
        "serif" => FamilyName::Serif,
        "sans-serif" => FamilyName::SansSerif,
        "monospace" => FamilyName::Monospace,
        "cursive" => FamilyName::Cursive,
        "fantasy" => FamilyName::Fantasy,
        _ => FamilyName::Title(family.to_string()),
    };
    let mut properties = Properties::new();
    if bold {
        properties.weight = Weight::BOLD;
    }

    let handle = SystemSource::new()
        .select_best_match(&[name], &properties)
        .ok()?;
    let font = match handle {
        Handle::Path { path, font_index } => {
            let bytes = fs::read(&path).ok()?;
            FontVec::try_from_vec_and_index(bytes, font_index).ok()?
        }
        Handle::Memory { bytes, font_index } => {
            FontVec::try_from_vec_and_index(bytes.to_vec(), font_index).ok()?
        }
    };
    tracing::debug!(family, "resolved system font");
    Some(FontArc::new(font))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> LabelConfig {
        LabelConfig {
            text: text.to_string(),
            background_color: Color::rgb(10, 20, 30),
            ..LabelConfig::default()
        }
    }

    #[test]
    fn empty_label_is_plain_background() {
        let backdrop = Backdrop::generate(&label("   "), 64, 32, 2.0);
        assert_eq!(backdrop.dimensions(), (64, 32));
        assert!(backdrop
            .image()
            .pixels()
            .all(|px| px.0 == [10, 20, 30, 255]));
    }

    #[test]
    fn sampling_clamps_to_edges() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        let backdrop = Backdrop::from_image(image);

        assert_eq!(backdrop.sample(-1.0, 0.5), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(backdrop.sample(2.0, 0.5), [1.0, 1.0, 1.0, 1.0]);
        let mid = backdrop.sample(0.5, 0.5);
        assert!((mid[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn blend_over_respects_coverage() {
        let mut px = Rgba([0, 0, 0, 255]);
        blend_over(&mut px, [200, 100, 50], 0.5);
        assert_eq!(px.0, [100, 50, 25, 255]);
    }
}
