//! Refraction and specular shading of the backdrop.
//!
//! Reference implementation of `shaders/composite.wgsl`. Output images are
//! top-down like any raster, while the wave field is y-up, so output row `r`
//! shades simulation row `height - 1 - r`.

use image::{Rgba, RgbaImage};
use rippleconfig::CompositingConfig;

use crate::backdrop::Backdrop;
use crate::field::{Texel, WaveField, GRADIENT_X, GRADIENT_Y};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeParams {
    pub distortion: f32,
    pub specular_gain: f32,
    pub shininess: f32,
    /// Normalized light direction.
    pub light_direction: [f32; 3],
}

impl From<&CompositingConfig> for CompositeParams {
    fn from(config: &CompositingConfig) -> Self {
        Self {
            distortion: config.distortion,
            specular_gain: config.specular_gain,
            shininess: config.shininess,
            light_direction: normalize(config.light_direction),
        }
    }
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self::from(&CompositingConfig::default())
    }
}

/// Shades one pixel at simulation-space `uv` (y up).
pub fn shade(texel: Texel, uv: [f32; 2], backdrop: &Backdrop, params: &CompositeParams) -> [f32; 4] {
    let gradient_x = texel[GRADIENT_X];
    let gradient_y = texel[GRADIENT_Y];

    let sample_u = uv[0] + params.distortion * gradient_x;
    let sample_v = uv[1] + params.distortion * gradient_y;
    // Backdrop rows run top-down.
    let color = backdrop.sample(sample_u, 1.0 - sample_v);

    let normal = normalize([-gradient_x * 2.0, 0.5, -gradient_y * 2.0]);
    let facing = dot(normal, params.light_direction).max(0.0);
    let specular = facing.powf(params.shininess) * params.specular_gain;

    color.map(|channel| channel + specular)
}

/// Composites `field` over `backdrop` into `out`, resizing `out` to match the field.
pub fn composite(field: &WaveField, backdrop: &Backdrop, params: &CompositeParams, out: &mut RgbaImage) {
    let (width, height) = field.dimensions();
    if out.dimensions() != (width, height) {
        *out = RgbaImage::new(width, height);
    }

    for row in 0..height {
        let y = height - 1 - row;
        for x in 0..width {
            let uv = [
                (x as f32 + 0.5) / width as f32,
                (y as f32 + 0.5) / height as f32,
            ];
            let color = shade(field.texel(x, y), uv, backdrop, params);
            out.put_pixel(x, row, Rgba(color.map(to_unorm8)));
        }
    }
}

fn to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let length = dot(v, v).sqrt();
    if length > 0.0 {
        v.map(|component| component / length)
    } else {
        [0.0, 1.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rippleconfig::Color;

    #[test]
    fn flat_field_reproduces_backdrop_plus_ambient_specular() {
        let backdrop = Backdrop::plain(Color::rgb(40, 80, 120), 8, 8);
        let field = WaveField::new(8, 8);
        let params = CompositeParams::default();
        let mut out = RgbaImage::new(1, 1);
        composite(&field, &backdrop, &params, &mut out);

        // Flat normal (0, 1, 0) against the light still yields a small highlight.
        let facing = params.light_direction[1];
        let specular = facing.powf(params.shininess) * params.specular_gain;
        let expected = to_unorm8(40.0 / 255.0 + specular);
        assert_eq!(out.dimensions(), (8, 8));
        assert!(out.pixels().all(|px| px.0[0] == expected));
    }

    #[test]
    fn gradient_shifts_the_sampled_backdrop() {
        // Left half black, right half white.
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        for y in 0..10 {
            for x in 5..10 {
                image.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let backdrop = Backdrop::from_image(image);
        let params = CompositeParams {
            specular_gain: 0.0,
            ..CompositeParams::default()
        };

        let still = shade([0.0; 4], [0.25, 0.5], &backdrop, &params);
        let pushed = shade([0.0, 0.0, 1.0, 0.0], [0.25, 0.5], &backdrop, &params);
        assert_eq!(still[0], 0.0);
        assert!(pushed[0] > 0.9, "{pushed:?}");
    }

    #[test]
    fn output_rows_are_flipped_against_simulation_rows() {
        let backdrop = Backdrop::plain(Color::BLACK, 4, 4);
        let mut field = WaveField::new(4, 4);
        // Bottom simulation row tilted to face the light head-on.
        for x in 0..4 {
            field.set_texel(x, 0, [0.0, 0.0, 0.075, -0.075]);
        }
        let params = CompositeParams {
            distortion: 0.0,
            ..CompositeParams::default()
        };
        let mut out = RgbaImage::new(4, 4);
        composite(&field, &backdrop, &params, &mut out);

        assert_eq!(out.get_pixel(0, 3).0[0], 255);
        assert!(out.get_pixel(0, 0).0[0] < 10);
    }
}
