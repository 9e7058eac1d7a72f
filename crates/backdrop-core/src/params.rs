//! Named effect parameters and the per-frame snapshot.
//!
//! Every parameter is declared up front with a default value, which fixes its
//! shape. Writes are checked against that shape only; range handling is left
//! to whoever consumes the snapshot.

use crate::error::{BackdropError, Result};
use fnv::FnvHashMap;
use glam::Vec2;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// CSS `rgba()` string for 2D canvas fill/stroke styles.
    pub fn to_css(self) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            self.a.clamp(0.0, 1.0)
        )
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
pub fn parse_color(text: &str) -> Result<Rgba> {
    let invalid = || BackdropError::InvalidColor(text.to_string());
    let hex = text.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map(|v| v as f32 / 255.0);
    match hex.len() {
        3 => {
            let mut out = [0.0f32; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16).ok_or_else(invalid)? as f32;
                out[i] = (v * 17.0) / 255.0;
            }
            Ok(Rgba::new(out[0], out[1], out[2], 1.0))
        }
        6 | 8 => {
            let r = channel(&hex[0..2]).map_err(|_| invalid())?;
            let g = channel(&hex[2..4]).map_err(|_| invalid())?;
            let b = channel(&hex[4..6]).map_err(|_| invalid())?;
            let a = if hex.len() == 8 {
                channel(&hex[6..8]).map_err(|_| invalid())?
            } else {
                1.0
            };
            Ok(Rgba::new(r, g, b, a))
        }
        _ => Err(invalid()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Number,
    Color,
    Vec2,
    Flag,
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Number => "number",
            ParamKind::Color => "color",
            ParamKind::Vec2 => "vec2",
            ParamKind::Flag => "flag",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Number(f32),
    Color(Rgba),
    Vec2(Vec2),
    Flag(bool),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Number(_) => ParamKind::Number,
            ParamValue::Color(_) => ParamKind::Color,
            ParamValue::Vec2(_) => ParamKind::Vec2,
            ParamValue::Flag(_) => ParamKind::Flag,
        }
    }
}

/// Host-supplied value before it is checked against the declared shape.
/// Hosts that only have text (HTML attributes, JS strings) use `Text`.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamInput {
    Value(ParamValue),
    Text(String),
}

impl From<ParamValue> for ParamInput {
    fn from(v: ParamValue) -> Self {
        ParamInput::Value(v)
    }
}

impl From<&str> for ParamInput {
    fn from(s: &str) -> Self {
        ParamInput::Text(s.to_string())
    }
}

type ParamMap = FnvHashMap<&'static str, ParamValue>;

/// Immutable view of the parameters taken at the start of a frame.
///
/// Cloning is cheap; the store copies on write while a snapshot is alive, so
/// a snapshot never observes a later write.
#[derive(Clone, Debug)]
pub struct ParamSnapshot {
    values: Rc<ParamMap>,
    revision: u64,
}

impl PartialEq for ParamSnapshot {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.values, &other.values) || *self.values == *other.values
    }
}

impl ParamSnapshot {
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    pub fn number(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ParamValue::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn number_or(&self, name: &str, fallback: f32) -> f32 {
        self.number(name).unwrap_or(fallback)
    }

    /// Like `number_or`, but NaN and infinities also fall back. Text such as
    /// `"NaN"` parses as a valid number, and `clamp` passes NaN straight through.
    pub fn finite_or(&self, name: &str, fallback: f32) -> f32 {
        self.number(name).filter(|v| v.is_finite()).unwrap_or(fallback)
    }

    pub fn finite_vec2(&self, name: &str) -> Option<Vec2> {
        self.vec2(name).filter(|v| v.is_finite())
    }

    pub fn color(&self, name: &str) -> Option<Rgba> {
        match self.get(name)? {
            ParamValue::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<Vec2> {
        match self.get(name)? {
            ParamValue::Vec2(v) => Some(v),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ParamValue::Flag(b) => Some(b),
            _ => None,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct ParameterStore {
    defaults: ParamMap,
    values: Rc<ParamMap>,
    revision: u64,
}

impl ParameterStore {
    pub fn new(declared: impl IntoIterator<Item = (&'static str, ParamValue)>) -> Self {
        let defaults: ParamMap = declared.into_iter().collect();
        let values = Rc::new(defaults.clone());
        Self {
            defaults,
            values,
            revision: 0,
        }
    }

    /// Last write wins. A wrong shape is rejected and the previous value kept.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<()> {
        let (key, default) = self
            .defaults
            .get_key_value(name)
            .ok_or_else(|| BackdropError::UnknownParameter(name.to_string()))?;
        let expected = default.kind();
        if value.kind() != expected {
            return Err(BackdropError::InvalidParameterType {
                name: name.to_string(),
                expected,
                found: value.kind().name().to_string(),
            });
        }
        let key = *key;
        Rc::make_mut(&mut self.values).insert(key, value);
        self.revision += 1;
        Ok(())
    }

    /// Coerce text into the declared shape, then write it.
    pub fn set_parameter_str(&mut self, name: &str, text: &str) -> Result<()> {
        let expected = self
            .kind_of(name)
            .ok_or_else(|| BackdropError::UnknownParameter(name.to_string()))?;
        let mismatch = || BackdropError::InvalidParameterType {
            name: name.to_string(),
            expected,
            found: format!("text `{}`", text),
        };
        let t = text.trim();
        let value = match expected {
            ParamKind::Number => ParamValue::Number(t.parse::<f32>().map_err(|_| mismatch())?),
            ParamKind::Color => ParamValue::Color(parse_color(t).map_err(|_| mismatch())?),
            ParamKind::Flag => match t {
                "true" | "1" => ParamValue::Flag(true),
                "false" | "0" => ParamValue::Flag(false),
                _ => return Err(mismatch()),
            },
            ParamKind::Vec2 => {
                let mut parts = t.split(',').map(|p| p.trim().parse::<f32>());
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(Ok(x)), Some(Ok(y)), None) => ParamValue::Vec2(Vec2::new(x, y)),
                    _ => return Err(mismatch()),
                }
            }
        };
        self.set_parameter(name, value)
    }

    pub fn apply(&mut self, name: &str, input: &ParamInput) -> Result<()> {
        match input {
            ParamInput::Value(v) => self.set_parameter(name, *v),
            ParamInput::Text(t) => self.set_parameter_str(name, t),
        }
    }

    pub fn reset(&mut self, name: &str) -> Result<()> {
        let default = *self
            .defaults
            .get(name)
            .ok_or_else(|| BackdropError::UnknownParameter(name.to_string()))?;
        self.set_parameter(name, default)
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    pub fn kind_of(&self, name: &str) -> Option<ParamKind> {
        self.defaults.get(name).map(ParamValue::kind)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.defaults.contains_key(name)
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            values: Rc::clone(&self.values),
            revision: self.revision,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParameterStore {
        ParameterStore::new([
            ("pixelSize", ParamValue::Number(3.0)),
            ("color", ParamValue::Color(Rgba::BLACK)),
            ("pointer", ParamValue::Vec2(Vec2::splat(0.5))),
            ("enabled", ParamValue::Flag(true)),
        ])
    }

    #[test]
    fn parse_color_accepts_short_long_and_alpha_forms() {
        let c = parse_color("#B19EEF").unwrap();
        assert!((c.r - 177.0 / 255.0).abs() < 1e-6);
        assert!((c.g - 158.0 / 255.0).abs() < 1e-6);
        assert!((c.b - 239.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);

        let short = parse_color("#fff").unwrap();
        assert_eq!(short, Rgba::new(1.0, 1.0, 1.0, 1.0));

        let alpha = parse_color("00000080").unwrap();
        assert!((alpha.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn parse_color_rejects_garbage() {
        assert!(parse_color("#12").is_err());
        assert!(parse_color("#zzzzzz").is_err());
        assert!(parse_color("").is_err());
        assert!(parse_color("#ééé").is_err());
    }

    #[test]
    fn wrong_shape_keeps_previous_value() {
        let mut s = store();
        s.set_parameter("pixelSize", ParamValue::Number(5.0)).unwrap();
        let err = s
            .set_parameter("pixelSize", ParamValue::Flag(true))
            .unwrap_err();
        assert!(matches!(
            err,
            BackdropError::InvalidParameterType {
                expected: ParamKind::Number,
                ..
            }
        ));
        assert_eq!(s.get("pixelSize"), Some(ParamValue::Number(5.0)));
    }

    #[test]
    fn text_that_does_not_fit_the_shape_is_rejected() {
        let mut s = store();
        let err = s.set_parameter_str("pixelSize", "large").unwrap_err();
        assert!(matches!(err, BackdropError::InvalidParameterType { .. }));
        assert_eq!(s.get("pixelSize"), Some(ParamValue::Number(3.0)));
        assert_eq!(s.revision(), 0);
    }

    #[test]
    fn text_is_coerced_to_declared_shape() {
        let mut s = store();
        s.set_parameter_str("pixelSize", " 4.5 ").unwrap();
        s.set_parameter_str("color", "#ff0000").unwrap();
        s.set_parameter_str("pointer", "0.25, 0.75").unwrap();
        s.set_parameter_str("enabled", "false").unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.number("pixelSize"), Some(4.5));
        assert_eq!(snap.color("color"), Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(snap.vec2("pointer"), Some(Vec2::new(0.25, 0.75)));
        assert_eq!(snap.flag("enabled"), Some(false));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut s = store();
        assert!(matches!(
            s.set_parameter("glow", ParamValue::Number(1.0)),
            Err(BackdropError::UnknownParameter(_))
        ));
    }

    #[test]
    fn snapshot_is_not_affected_by_later_writes() {
        let mut s = store();
        let before = s.snapshot();
        s.set_parameter("pixelSize", ParamValue::Number(8.0)).unwrap();
        assert_eq!(before.number("pixelSize"), Some(3.0));
        assert_eq!(s.snapshot().number("pixelSize"), Some(8.0));
        assert!(s.snapshot().revision() > before.revision());
    }

    #[test]
    fn repeated_snapshots_without_writes_are_equal() {
        let s = store();
        assert_eq!(s.snapshot(), s.snapshot());
    }

    #[test]
    fn reset_restores_default() {
        let mut s = store();
        s.set_parameter("pixelSize", ParamValue::Number(9.0)).unwrap();
        s.reset("pixelSize").unwrap();
        assert_eq!(s.get("pixelSize"), Some(ParamValue::Number(3.0)));
    }

    #[test]
    fn out_of_range_numbers_are_stored_unclamped() {
        let mut s = store();
        s.set_parameter("pixelSize", ParamValue::Number(-40.0)).unwrap();
        assert_eq!(s.get("pixelSize"), Some(ParamValue::Number(-40.0)));
    }

    #[test]
    fn css_output_rounds_channels() {
        let c = Rgba::new(1.0, 0.5, 0.0, 0.25);
        assert_eq!(c.to_css(), "rgba(255,128,0,0.250)");
    }
}
