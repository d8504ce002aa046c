use serde::{Deserialize, Serialize};

use crate::error::{RasterError, RasterResult};

/// RGBA pixel
pub type Rgba = [u8; 4];

/// Fully transparent pixel used for cells without observations
pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Built-in colormap names (case-insensitive).
pub const SUPPORTED: &[&str] = &["fire", "hot", "viridis", "blues", "greys"];

/// Ordered color stops, evenly spaced over [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct Colormap {
    stops: Vec<Rgba>,
}

/// How a config names its colormap: a preset or an explicit stop list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColormapSpec {
    Named(String),
    Stops(Vec<String>),
}

impl Default for ColormapSpec {
    fn default() -> Self {
        ColormapSpec::Named("fire".to_string())
    }
}

impl ColormapSpec {
    pub fn resolve(&self) -> RasterResult<Colormap> {
        match self {
            ColormapSpec::Named(name) => Colormap::named(name),
            ColormapSpec::Stops(colors) => Colormap::from_colors(colors),
        }
    }
}

impl Colormap {
    pub fn new(stops: Vec<Rgba>) -> RasterResult<Self> {
        if stops.is_empty() {
            return Err(RasterError::colormap("colormap needs at least one stop"));
        }
        Ok(Self { stops })
    }

    /// Build from `#RRGGBB` / `#RRGGBBAA` strings or CSS color names
    pub fn from_colors<S: AsRef<str>>(colors: &[S]) -> RasterResult<Self> {
        let stops = colors
            .iter()
            .map(|c| parse_color(c.as_ref()))
            .collect::<RasterResult<Vec<_>>>()?;
        Self::new(stops)
    }

    pub fn named(name: &str) -> RasterResult<Self> {
        match name.to_lowercase().as_str() {
            "fire" => Ok(Self::fire()),
            "hot" => Ok(Self::hot()),
            "viridis" => Ok(Self::viridis()),
            "blues" => Ok(Self::blues()),
            "greys" | "grays" => Ok(Self::greys()),
            _ => Err(RasterError::colormap(format!(
                "unknown colormap '{}'. Supported: {}",
                name,
                SUPPORTED.join(", ")
            ))),
        }
    }

    /// Black -> red -> orange -> yellow -> white, a close approximation of
    /// colorcet's `fire`
    pub fn fire() -> Self {
        Self {
            stops: vec![
                [0, 0, 0, 255],
                [59, 0, 0, 255],
                [127, 0, 0, 255],
                [191, 21, 0, 255],
                [230, 70, 0, 255],
                [255, 123, 0, 255],
                [255, 174, 0, 255],
                [255, 220, 59, 255],
                [255, 255, 158, 255],
                [255, 255, 255, 255],
            ],
        }
    }

    /// Same stops as datashader's `Hot`
    pub fn hot() -> Self {
        let names = [
            "black", "maroon", "darkred", "red", "orangered", "darkorange", "orange", "gold",
            "yellow", "white",
        ];
        Self {
            stops: names.iter().filter_map(|n| named_color(n)).collect(),
        }
    }

    /// Perceptually uniform, colorblind-friendly
    pub fn viridis() -> Self {
        let points: [(f64, f64, f64); 5] = [
            (0.267004, 0.004874, 0.329415), // Dark purple
            (0.282623, 0.140926, 0.457517), // Purple-blue
            (0.163625, 0.471133, 0.558148), // Blue-green
            (0.477504, 0.821444, 0.318195), // Yellow-green
            (0.993248, 0.906157, 0.143936), // Yellow
        ];
        Self {
            stops: points
                .iter()
                .map(|&(r, g, b)| [unit_to_u8(r), unit_to_u8(g), unit_to_u8(b), 255])
                .collect(),
        }
    }

    /// lightblue -> darkblue
    pub fn blues() -> Self {
        Self {
            stops: vec![[173, 216, 230, 255], [0, 0, 139, 255]],
        }
    }

    pub fn greys() -> Self {
        Self {
            stops: vec![[255, 255, 255, 255], [0, 0, 0, 255]],
        }
    }

    pub fn stops(&self) -> &[Rgba] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Map a scalar in [0, 1] to a color by linear interpolation between the
    /// two nearest stops. Out-of-range input is clamped; NaN maps to 0.
    pub fn sample(&self, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let n = self.stops.len();
        if n == 1 {
            return self.stops[0];
        }

        let pos = t * (n - 1) as f64;
        let i = (pos.floor() as usize).min(n - 2);
        let f = pos - i as f64;
        let (a, b) = (self.stops[i], self.stops[i + 1]);

        let mut out = [0u8; 4];
        for c in 0..4 {
            let v = a[c] as f64 + f * (b[c] as f64 - a[c] as f64);
            out[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        out
    }
}

#[inline(always)]
fn unit_to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Parse `#RRGGBB`, `#RRGGBBAA` or one of the CSS names the dashboards use
pub fn parse_color(color: &str) -> RasterResult<Rgba> {
    let trimmed = color.trim();
    if let Some(rgba) = named_color(trimmed) {
        return Ok(rgba);
    }

    let hex = trimmed.trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return Err(RasterError::colormap(format!(
            "color must be #RRGGBB, #RRGGBBAA or a known name, got '{trimmed}'"
        )));
    }
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(|| RasterError::colormap(format!("invalid hex color '{trimmed}'")))
    };
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok([channel(0)?, channel(2)?, channel(4)?, alpha])
}

fn named_color(name: &str) -> Option<Rgba> {
    let rgb = match name.to_lowercase().as_str() {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "maroon" => [128, 0, 0],
        "darkred" => [139, 0, 0],
        "red" => [255, 0, 0],
        "orangered" => [255, 69, 0],
        "darkorange" => [255, 140, 0],
        "orange" => [255, 165, 0],
        "gold" => [255, 215, 0],
        "yellow" => [255, 255, 0],
        "lightblue" => [173, 216, 230],
        "blue" => [0, 0, 255],
        "darkblue" => [0, 0, 139],
        "green" => [0, 128, 0],
        "purple" => [128, 0, 128],
        "gray" | "grey" => [128, 128, 128],
        _ => return None,
    };
    Some([rgb[0], rgb[1], rgb[2], 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_and_midpoint() {
        let cmap = Colormap::from_colors(&["#000000", "#ffffff"]).unwrap();
        assert_eq!(cmap.sample(0.0), [0, 0, 0, 255]);
        assert_eq!(cmap.sample(1.0), [255, 255, 255, 255]);
        assert_eq!(cmap.sample(0.5), [128, 128, 128, 255]);
        assert_eq!(cmap.sample(-3.0), [0, 0, 0, 255]);
        assert_eq!(cmap.sample(f64::NAN), [0, 0, 0, 255]);
    }

    #[test]
    fn test_interpolates_between_nearest_stops() {
        let cmap = Colormap::new(vec![[0, 0, 0, 255], [100, 0, 0, 255], [100, 200, 0, 255]]).unwrap();
        assert_eq!(cmap.sample(0.25), [50, 0, 0, 255]);
        assert_eq!(cmap.sample(0.5), [100, 0, 0, 255]);
        assert_eq!(cmap.sample(0.75), [100, 100, 0, 255]);
    }

    #[test]
    fn test_single_stop_is_constant() {
        let cmap = Colormap::from_colors(&["red"]).unwrap();
        assert_eq!(cmap.sample(0.3), [255, 0, 0, 255]);
    }

    #[test]
    fn test_presets_resolve() {
        for name in SUPPORTED {
            let cmap = Colormap::named(name).unwrap();
            assert!(cmap.len() >= 2, "{name}");
        }
        assert_eq!(Colormap::hot().len(), 10);
        assert!(matches!(Colormap::named("rainbow"), Err(RasterError::InvalidColormap(_))));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#1a2B3c").unwrap(), [0x1a, 0x2b, 0x3c, 255]);
        assert_eq!(parse_color("#1a2b3c80").unwrap(), [0x1a, 0x2b, 0x3c, 0x80]);
        assert_eq!(parse_color("LightBlue").unwrap(), [173, 216, 230, 255]);
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gg0000").is_err());
        assert!(Colormap::from_colors::<&str>(&[]).is_err());
    }

    #[test]
    fn test_spec_deserializes_both_forms() {
        let named: ColormapSpec = serde_json::from_str(r#""hot""#).unwrap();
        assert_eq!(named.resolve().unwrap(), Colormap::hot());
        let stops: ColormapSpec = serde_json::from_str(r#"["lightblue", "darkblue"]"#).unwrap();
        assert_eq!(stops.resolve().unwrap(), Colormap::blues());
    }
}
