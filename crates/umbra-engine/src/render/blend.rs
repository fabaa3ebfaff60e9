//! Blend configuration values and their CPU evaluation.

use crate::paint::Color;

use super::backend::CompositeBackend;

/// One multiplier term of the blend equation `out = src * S + dst * D`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

impl BlendFactor {
    /// Factor value for channel `ch` (0..3 color, 3 alpha).
    ///
    /// Color factors used on the alpha channel read alpha, matching fixed-function hardware.
    #[inline]
    fn eval(self, src: &[f32; 4], dst: &[f32; 4], ch: usize) -> f32 {
        match self {
            BlendFactor::Zero => 0.0,
            BlendFactor::One => 1.0,
            BlendFactor::SrcColor => src[ch],
            BlendFactor::OneMinusSrcColor => 1.0 - src[ch],
            BlendFactor::SrcAlpha => src[3],
            BlendFactor::OneMinusSrcAlpha => 1.0 - src[3],
            BlendFactor::DstColor => dst[ch],
            BlendFactor::OneMinusDstColor => 1.0 - dst[ch],
            BlendFactor::DstAlpha => dst[3],
            BlendFactor::OneMinusDstAlpha => 1.0 - dst[3],
        }
    }
}

/// Four-term blend configuration (color and alpha, source and destination).
///
/// A pure value: two functions with equal fields are the same blend state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlendFunction {
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl Default for BlendFunction {
    fn default() -> Self {
        Self::PREMULTIPLIED_SOURCE_OVER
    }
}

impl BlendFunction {
    /// Working format of every render target: `ONE, ONE_MINUS_SRC_ALPHA` on both channels.
    pub const PREMULTIPLIED_SOURCE_OVER: Self = Self::uniform(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);

    /// Source-over for straight-alpha sources.
    pub const SOURCE_OVER: Self = Self {
        src_color: BlendFactor::SrcAlpha,
        dst_color: BlendFactor::OneMinusSrcAlpha,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::OneMinusSrcAlpha,
    };

    /// Screen: brightens the destination by the source color.
    pub const SCREEN: Self = Self {
        src_color: BlendFactor::One,
        dst_color: BlendFactor::OneMinusSrcColor,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::OneMinusSrcAlpha,
    };

    /// Replaces the destination with the source.
    pub const SOURCE_ONLY: Self = Self::uniform(BlendFactor::One, BlendFactor::Zero);

    /// Same source/destination factors for color and alpha.
    pub const fn uniform(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src_color: src, dst_color: dst, src_alpha: src, dst_alpha: dst }
    }

    /// Reads the blend state currently active on `backend`.
    #[inline]
    pub fn current(backend: &impl CompositeBackend) -> Self {
        backend.blend_function()
    }

    /// Makes this the active blend state of `backend`.
    #[inline]
    pub fn apply(self, backend: &mut impl CompositeBackend) {
        backend.set_blend_function(self);
    }

    /// Evaluates the blend equation for one pixel, clamping like a fixed-point target.
    pub fn blend(self, src: Color, dst: Color) -> Color {
        let s = src.to_array();
        let d = dst.to_array();
        let mut out = [0.0f32; 4];
        for ch in 0..4 {
            let (sf, df) = if ch < 3 {
                (self.src_color, self.dst_color)
            } else {
                (self.src_alpha, self.dst_alpha)
            };
            let v = s[ch] * sf.eval(&s, &d, ch) + d[ch] * df.eval(&s, &d, ch);
            out[ch] = v.clamp(0.0, 1.0);
        }
        Color::from_array(out)
    }
}

/// Blends that need to read the accumulated image and therefore run as a shader pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendShader {
    /// Light hue and saturation over the scene's luminosity, weighted by light alpha.
    EnvironmentalLight,
}

impl BlendShader {
    /// CPU reference of the shader: `src` is the layer, `dst` the accumulated scene.
    /// Both are premultiplied; so is the result.
    pub fn shade(self, src: Color, dst: Color) -> Color {
        match self {
            BlendShader::EnvironmentalLight => color_blend(src, dst),
        }
    }
}

#[inline]
fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > 1e-6 {
        for v in &mut out {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 && x - l > 1e-6 {
        for v in &mut out {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

/// Non-separable "color" blend composited source-over (premultiplied in and out).
fn color_blend(src: Color, dst: Color) -> Color {
    if src.a <= 0.0 {
        return dst;
    }
    let (sr, sg, sb, sa) = src.to_straight();
    let (dr, dg, db, da) = dst.to_straight();
    let cs = [sr, sg, sb];
    let cb = [dr, dg, db];
    let mixed = set_lum(cs, lum(cb));

    let mut out = [0.0f32; 4];
    for ch in 0..3 {
        out[ch] = sa * (1.0 - da) * cs[ch] + sa * da * mixed[ch] + (1.0 - sa) * da * cb[ch];
    }
    out[3] = sa + da * (1.0 - sa);
    Color::from_array(out).clamped()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── presets ───────────────────────────────────────────────────────────

    #[test]
    fn premultiplied_over_matches_color_over() {
        let src = Color::from_straight(1.0, 0.0, 0.0, 0.5);
        let dst = Color::from_straight(0.0, 0.0, 1.0, 0.8);
        let blended = BlendFunction::PREMULTIPLIED_SOURCE_OVER.blend(src, dst);
        assert!(blended.approx_eq(src.over(dst), 1e-6));
    }

    #[test]
    fn straight_over_multiplies_source_by_alpha() {
        let src = Color::from_premul(1.0, 1.0, 1.0, 0.25); // straight white at 25%
        let dst = Color::black();
        let out = BlendFunction::SOURCE_OVER.blend(src, dst);
        assert!((out.r - 0.25).abs() < 1e-6);
        assert!((out.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn screen_never_darkens() {
        let src = Color::from_straight(0.2, 0.4, 0.6, 1.0);
        let dst = Color::from_straight(0.5, 0.5, 0.5, 1.0);
        let out = BlendFunction::SCREEN.blend(src, dst);
        assert!(out.r >= dst.r && out.g >= dst.g && out.b >= dst.b);
        assert!((out.r - (0.2 + 0.5 * 0.8)).abs() < 1e-6);
    }

    #[test]
    fn source_only_replaces() {
        let src = Color::transparent();
        let dst = Color::white();
        assert_eq!(BlendFunction::SOURCE_ONLY.blend(src, dst), Color::transparent());
    }

    #[test]
    fn default_is_premultiplied_over() {
        assert_eq!(BlendFunction::default(), BlendFunction::PREMULTIPLIED_SOURCE_OVER);
        assert_ne!(BlendFunction::SOURCE_OVER, BlendFunction::PREMULTIPLIED_SOURCE_OVER);
    }

    // ── environmental light ───────────────────────────────────────────────

    #[test]
    fn opaque_light_keeps_scene_luminosity() {
        let light = Color::from_straight(1.0, 0.0, 0.0, 1.0);
        let scene = Color::from_straight(0.5, 0.5, 0.5, 1.0);
        let out = BlendShader::EnvironmentalLight.shade(light, scene);
        assert!((lum([out.r, out.g, out.b]) - 0.5).abs() < 1e-4);
        assert!(out.r > out.g);
        assert!((out.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn transparent_light_leaves_scene_untouched() {
        let scene = Color::from_straight(0.3, 0.6, 0.9, 1.0);
        let out = BlendShader::EnvironmentalLight.shade(Color::transparent(), scene);
        assert_eq!(out, scene);
    }

    #[test]
    fn light_over_empty_scene_is_plain_source() {
        let light = Color::from_straight(0.2, 0.8, 0.4, 0.5);
        let out = BlendShader::EnvironmentalLight.shade(light, Color::transparent());
        assert!(out.approx_eq(light, 1e-6));
    }
}
