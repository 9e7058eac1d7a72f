use crate::constants::*;
use crate::params::{parse_color, ParamSnapshot, ParamValue, Rgba};
use crate::surface::ContextKind;
use glam::Vec2;
use rand::Rng;

/// Available effects
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Dithered pixel field rendered by a fragment shader
    #[default]
    PixelBlast,
    /// Scrolling line grid on a 2D canvas with a pointer glow
    GridField,
}

impl EffectKind {
    pub fn all() -> &'static [EffectKind] {
        &[EffectKind::PixelBlast, EffectKind::GridField]
    }

    pub fn id(&self) -> &'static str {
        match self {
            EffectKind::PixelBlast => "pixel-blast",
            EffectKind::GridField => "grid-field",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_ascii_lowercase().as_str() {
            "pixel-blast" | "pixelblast" => Some(EffectKind::PixelBlast),
            "grid-field" | "grid" => Some(EffectKind::GridField),
            _ => None,
        }
    }

    pub fn context(&self) -> ContextKind {
        match self {
            EffectKind::PixelBlast => ContextKind::Gpu,
            EffectKind::GridField => ContextKind::Canvas2d,
        }
    }

    /// Declared parameters with their defaults. The noise seed is drawn from
    /// `rng` so separate instances do not look identical.
    pub fn parameters(&self, rng: &mut impl Rng) -> Vec<(&'static str, ParamValue)> {
        let pointer = ParamValue::Vec2(Vec2::from_array(DEFAULT_POINTER_UV));
        match self {
            EffectKind::PixelBlast => vec![
                ("pixelSize", ParamValue::Number(PIXEL_BLAST_PIXEL_SIZE)),
                (COLOR_PARAM, ParamValue::Color(hex(PIXEL_BLAST_COLOR_HEX))),
                ("patternScale", ParamValue::Number(PIXEL_BLAST_PATTERN_SCALE)),
                ("patternDensity", ParamValue::Number(PIXEL_BLAST_PATTERN_DENSITY)),
                (SPEED_PARAM, ParamValue::Number(PIXEL_BLAST_SPEED)),
                ("edgeFade", ParamValue::Number(PIXEL_BLAST_EDGE_FADE)),
                ("rippleIntensity", ParamValue::Number(PIXEL_BLAST_RIPPLE_INTENSITY)),
                ("seed", ParamValue::Number(rng.gen_range(0.0..1000.0))),
                (POINTER_PARAM, pointer),
            ],
            EffectKind::GridField => vec![
                ("cellSize", ParamValue::Number(GRID_CELL_SIZE_PX)),
                ("lineWidth", ParamValue::Number(GRID_LINE_WIDTH_PX)),
                (COLOR_PARAM, ParamValue::Color(hex(GRID_COLOR_HEX))),
                ("hoverColor", ParamValue::Color(hex(PIXEL_BLAST_COLOR_HEX))),
                (SPEED_PARAM, ParamValue::Number(GRID_SPEED)),
                ("direction", ParamValue::Vec2(Vec2::from_array(GRID_DIRECTION))),
                ("hoverRadius", ParamValue::Number(GRID_HOVER_RADIUS_PX)),
                (POINTER_PARAM, pointer),
            ],
        }
    }
}

fn hex(s: &str) -> Rgba {
    parse_color(s).unwrap_or(Rgba::BLACK)
}

/// Grid geometry for one frame, in backing-store pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridField {
    pub cell_size: f32,
    pub line_width: f32,
    pub speed: f32,
    pub direction: Vec2,
    pub hover_radius: f32,
    pub color: Rgba,
    pub hover_color: Rgba,
}

impl GridField {
    /// Read and clamp the grid parameters. `scale` is the device pixel ratio
    /// applied to pixel-valued parameters.
    pub fn from_snapshot(params: &ParamSnapshot, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self {
            cell_size: params.finite_or("cellSize", GRID_CELL_SIZE_PX).max(4.0) * scale,
            line_width: params.finite_or("lineWidth", GRID_LINE_WIDTH_PX).max(0.5) * scale,
            speed: params.finite_or(SPEED_PARAM, GRID_SPEED).clamp(-SPEED_MAX, SPEED_MAX),
            direction: params
                .finite_vec2("direction")
                .unwrap_or(Vec2::from_array(GRID_DIRECTION))
                .normalize_or_zero(),
            hover_radius: params.finite_or("hoverRadius", GRID_HOVER_RADIUS_PX).max(0.0) * scale,
            color: params.color(COLOR_PARAM).unwrap_or(Rgba::BLACK),
            hover_color: params.color("hoverColor").unwrap_or(Rgba::BLACK),
        }
    }

    /// Scroll offset at `elapsed` seconds, wrapped into one cell.
    pub fn offset_at(&self, elapsed: f64) -> Vec2 {
        let travel = self.direction * (self.speed * self.cell_size) * elapsed as f32;
        Vec2::new(
            travel.x.rem_euclid(self.cell_size),
            travel.y.rem_euclid(self.cell_size),
        )
    }

    /// Line coordinates covering `0..=extent`, shifted by `offset`.
    pub fn lines(&self, extent: f32, offset: f32) -> impl Iterator<Item = f32> {
        let step = self.cell_size;
        let start = offset.rem_euclid(step) - step;
        let count = ((extent - start) / step).ceil().max(0.0) as usize + 1;
        (0..count)
            .map(move |i| start + i as f32 * step)
            .filter(move |x| *x >= -step && *x <= extent + step)
    }

    /// Highlight strength 0..1 for a cell whose centre is `cell_center`,
    /// falling off linearly to zero at `hover_radius`.
    pub fn highlight(&self, cell_center: Vec2, pointer_px: Vec2) -> f32 {
        if self.hover_radius <= 0.0 {
            return 0.0;
        }
        let d = cell_center.distance(pointer_px);
        (1.0 - d / self.hover_radius).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(speed: f32) -> GridField {
        GridField {
            cell_size: 40.0,
            line_width: 1.0,
            speed,
            direction: Vec2::X,
            hover_radius: 100.0,
            color: Rgba::BLACK,
            hover_color: Rgba::BLACK,
        }
    }

    #[test]
    fn effect_ids_roundtrip() {
        for e in EffectKind::all() {
            assert_eq!(EffectKind::from_id(e.id()), Some(*e));
        }
        assert_eq!(EffectKind::from_id("PixelBlast"), Some(EffectKind::PixelBlast));
        assert_eq!(EffectKind::from_id("plasma"), None);
    }

    #[test]
    fn every_effect_declares_pointer_and_color() {
        let mut rng = StdRng::seed_from_u64(7);
        for e in EffectKind::all() {
            let store = ParameterStore::new(e.parameters(&mut rng));
            assert!(store.is_declared(POINTER_PARAM), "{:?}", e);
            assert!(store.is_declared(COLOR_PARAM), "{:?}", e);
        }
    }

    #[test]
    fn pixel_blast_defaults() {
        let mut rng = StdRng::seed_from_u64(1);
        let store = ParameterStore::new(EffectKind::PixelBlast.parameters(&mut rng));
        let snap = store.snapshot();
        assert_eq!(snap.number("pixelSize"), Some(3.0));
        assert_eq!(snap.color(COLOR_PARAM), Some(parse_color("#B19EEF").unwrap()));
    }

    #[test]
    fn offset_wraps_within_one_cell() {
        let g = grid(0.5);
        assert_eq!(g.offset_at(0.0), Vec2::ZERO);
        assert!((g.offset_at(1.0).x - 20.0).abs() < 1e-4);
        assert!(g.offset_at(2.0).x.abs() < 1e-3);
        let back = grid(-0.5).offset_at(1.0);
        assert!((back.x - 20.0).abs() < 1e-4);
    }

    #[test]
    fn lines_cover_extent() {
        let g = grid(0.0);
        let xs: Vec<f32> = g.lines(100.0, 10.0).collect();
        assert_eq!(xs.first().copied(), Some(-30.0));
        assert!(xs.contains(&10.0));
        assert!(xs.contains(&90.0));
        assert!(*xs.last().unwrap() >= 100.0);
    }

    #[test]
    fn non_finite_grid_values_use_defaults() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut store = ParameterStore::new(EffectKind::GridField.parameters(&mut rng));
        store.set_parameter_str("cellSize", "NaN").unwrap();
        store.set_parameter_str(SPEED_PARAM, "inf").unwrap();
        store.set_parameter_str("direction", "NaN, 1").unwrap();
        let g = GridField::from_snapshot(&store.snapshot(), 1.0);
        assert_eq!(g.cell_size, GRID_CELL_SIZE_PX.max(4.0));
        assert_eq!(g.speed, GRID_SPEED);
        let offset = g.offset_at(2.5);
        assert!(offset.x.is_finite() && offset.y.is_finite());
        assert!(g.lines(200.0, offset.x).count() > 0);
    }

    #[test]
    fn highlight_falls_off_with_distance() {
        let g = grid(0.0);
        let p = Vec2::new(100.0, 100.0);
        assert_eq!(g.highlight(p, p), 1.0);
        assert!((g.highlight(Vec2::new(150.0, 100.0), p) - 0.5).abs() < 1e-6);
        assert_eq!(g.highlight(Vec2::new(300.0, 100.0), p), 0.0);
    }
}
