use crate::paint::{opacity_to_f32, Color};

/// How lights are blended into the scene.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum LightingStyle {
    /// Lights are laid over the scene (premultiplied source-over at the light opacity).
    #[default]
    Overtop,
    /// Lights tint the scene while keeping its luminosity (shader blend).
    Environmental,
}

impl LightingStyle {
    pub fn toggled(self) -> Self {
        match self {
            LightingStyle::Overtop => LightingStyle::Environmental,
            LightingStyle::Environmental => LightingStyle::Overtop,
        }
    }
}

/// Renderer preferences, read at the start of the layer that uses them.
///
/// Opacities are 0–255 slider values; widths are screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPrefs {
    pub fog_opacity: u8,
    pub light_overlay_opacity: u8,
    pub lumens_overlay_opacity: u8,
    pub aura_overlay_opacity: u8,
    pub darkness_opacity: u8,

    pub grid_line_weight: f32,
    pub lumens_overlay_border_thickness: f32,
    pub halo_line_width: f32,

    pub lighting_style: LightingStyle,
    pub show_lumens_overlay: bool,

    pub fog_color: Color,
    pub exposed_fog_color: Color,
    pub grid_color: Color,
}

impl Default for RenderPrefs {
    fn default() -> Self {
        Self {
            fog_opacity: 255,
            light_overlay_opacity: 60,
            lumens_overlay_opacity: 120,
            aura_overlay_opacity: 60,
            darkness_opacity: 255,
            grid_line_weight: 1.0,
            lumens_overlay_border_thickness: 5.0,
            halo_line_width: 2.0,
            lighting_style: LightingStyle::Overtop,
            show_lumens_overlay: false,
            fog_color: Color::black(),
            exposed_fog_color: Color::from_straight(0.0, 0.0, 0.0, 0.5),
            grid_color: Color::from_straight(0.0, 0.0, 0.0, 0.6),
        }
    }
}

impl RenderPrefs {
    #[inline]
    pub fn fog(&self) -> f32 {
        opacity_to_f32(self.fog_opacity)
    }

    #[inline]
    pub fn light_overlay(&self) -> f32 {
        opacity_to_f32(self.light_overlay_opacity)
    }

    #[inline]
    pub fn lumens_overlay(&self) -> f32 {
        opacity_to_f32(self.lumens_overlay_opacity)
    }

    #[inline]
    pub fn aura_overlay(&self) -> f32 {
        opacity_to_f32(self.aura_overlay_opacity)
    }

    #[inline]
    pub fn darkness(&self) -> f32 {
        opacity_to_f32(self.darkness_opacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_values_map_to_unit_range() {
        let prefs = RenderPrefs { fog_opacity: 0, aura_overlay_opacity: 255, ..RenderPrefs::default() };
        assert_eq!(prefs.fog(), 0.0);
        assert_eq!(prefs.aura_overlay(), 1.0);
    }

    #[test]
    fn lighting_style_toggles() {
        assert_eq!(LightingStyle::Overtop.toggled(), LightingStyle::Environmental);
        assert_eq!(LightingStyle::Environmental.toggled().toggled(), LightingStyle::Environmental);
    }
}
