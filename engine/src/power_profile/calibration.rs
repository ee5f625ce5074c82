use anyhow::Context;

use crate::core::error::StrategySetupError;
use crate::core::unit::Watt;
use crate::device::ColorMode;

const BRIGHTNESS_MAX: f64 = 255.0;
const HUE_MAX: f64 = 65535.0;
const SATURATION_MAX: f64 = 255.0;

/// One measured calibration dataset for a single color mode of a single
/// model. Immutable after decoding, rows sorted by brightness first and the
/// remaining dimensions second.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    mode: ColorMode,
    rows: Vec<CalibrationRow>,
    hue: Option<Extent>,
    saturation: Option<Extent>,
    mired: Option<Extent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CalibrationRow {
    brightness: f64,
    color: ColorKey,
    watt: f64,
}

/// Secondary dimension values of a calibration row or query. The shape
/// always matches the table's color mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorKey {
    None,
    Mired(f64),
    HueSat { hue: f64, saturation: f64 },
}

impl ColorKey {
    fn cmp_key(&self, other: &ColorKey) -> std::cmp::Ordering {
        match (self, other) {
            (ColorKey::Mired(a), ColorKey::Mired(b)) => a.total_cmp(b),
            (
                ColorKey::HueSat { hue: h1, saturation: s1 },
                ColorKey::HueSat { hue: h2, saturation: s2 },
            ) => h1.total_cmp(h2).then_with(|| s1.total_cmp(s2)),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Extent {
    min: f64,
    max: f64,
}

impl Extent {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut extent: Option<Extent> = None;
        for v in values {
            extent = Some(match extent {
                Some(e) => Extent {
                    min: e.min.min(v),
                    max: e.max.max(v),
                },
                None => Extent { min: v, max: v },
            });
        }
        extent
    }

    fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Absolute difference normalized to the extent's span, so dimensions
    /// with different scales contribute equally to the distance.
    fn normalized_delta(&self, a: f64, b: f64) -> f64 {
        let span = self.max - self.min;
        if span <= f64::EPSILON {
            return 0.0;
        }
        (a - b).abs() / span
    }
}

impl CalibrationTable {
    /// Decodes one CSV dataset: a header row followed by measurement rows in
    /// the fixed column order of the color mode. An empty data section is a
    /// failure, out-of-order rows are tolerated and sorted.
    pub fn decode_csv(mode: ColorMode, bytes: &[u8]) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("row {}", i + 2))?;
            let row = parse_row(mode, &record).with_context(|| format!("row {}", i + 2))?;
            rows.push(row);
        }

        if rows.is_empty() {
            anyhow::bail!("dataset contains no measurement rows");
        }

        //Stable sort: duplicate full-key rows keep file order, first one wins
        rows.sort_by(|a, b| a.brightness.total_cmp(&b.brightness).then_with(|| a.color.cmp_key(&b.color)));

        let hue = Extent::of(rows.iter().filter_map(|r| match r.color {
            ColorKey::HueSat { hue, .. } => Some(hue),
            _ => None,
        }));
        let saturation = Extent::of(rows.iter().filter_map(|r| match r.color {
            ColorKey::HueSat { saturation, .. } => Some(saturation),
            _ => None,
        }));
        let mired = Extent::of(rows.iter().filter_map(|r| match r.color {
            ColorKey::Mired(mired) => Some(mired),
            _ => None,
        }));

        Ok(Self {
            mode,
            rows,
            hue,
            saturation,
            mired,
        })
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Nearest-match lookup policy: clamp the query into the table's value
    /// ranges, pick the rows at the nearest measured brightness, then the
    /// row minimizing the sum of normalized absolute differences over the
    /// remaining dimensions. Ties resolve to the first row in table order.
    /// The result is always one measured sample, never interpolated.
    pub fn nearest_watt(&self, brightness: f64, color: ColorKey) -> Watt {
        let brightness = brightness.clamp(0.0, BRIGHTNESS_MAX);
        let color = self.clamp_color(color);

        let candidates = self.rows_at_nearest_brightness(brightness);

        let mut best = &candidates[0];
        let mut best_distance = self.color_distance(&color, &best.color);
        for row in &candidates[1..] {
            let distance = self.color_distance(&color, &row.color);
            if distance < best_distance {
                best = row;
                best_distance = distance;
            }
        }

        Watt(best.watt)
    }

    /// All rows sharing the measured brightness closest to the query. On
    /// equal distance the lower brightness wins (it comes first in table
    /// order).
    fn rows_at_nearest_brightness(&self, brightness: f64) -> &[CalibrationRow] {
        let idx = self.rows.partition_point(|r| r.brightness < brightness);

        let above = self.rows.get(idx).map(|r| r.brightness);
        let below = idx.checked_sub(1).map(|i| self.rows[i].brightness);

        let target = match (below, above) {
            (Some(lo), Some(hi)) => {
                if (brightness - lo).abs() <= (hi - brightness).abs() {
                    lo
                } else {
                    hi
                }
            }
            (Some(lo), None) => lo,
            (None, Some(hi)) => hi,
            (None, None) => unreachable!("calibration table is never empty"),
        };

        let start = self.rows.partition_point(|r| r.brightness < target);
        let end = self.rows.partition_point(|r| r.brightness <= target);
        &self.rows[start..end]
    }

    fn clamp_color(&self, color: ColorKey) -> ColorKey {
        match color {
            ColorKey::None => ColorKey::None,
            //Valid mired range is model-dependent, clamp to the measured one
            ColorKey::Mired(mired) => match &self.mired {
                Some(extent) => ColorKey::Mired(extent.clamp(mired)),
                None => ColorKey::Mired(mired),
            },
            ColorKey::HueSat { hue, saturation } => ColorKey::HueSat {
                hue: hue.clamp(0.0, HUE_MAX),
                saturation: saturation.clamp(0.0, SATURATION_MAX),
            },
        }
    }

    fn color_distance(&self, query: &ColorKey, row: &ColorKey) -> f64 {
        match (query, row) {
            (ColorKey::None, ColorKey::None) => 0.0,
            (ColorKey::Mired(a), ColorKey::Mired(b)) => match &self.mired {
                Some(extent) => extent.normalized_delta(*a, *b),
                None => (a - b).abs(),
            },
            (
                ColorKey::HueSat { hue: h1, saturation: s1 },
                ColorKey::HueSat { hue: h2, saturation: s2 },
            ) => {
                let hue_delta = match &self.hue {
                    Some(extent) => extent.normalized_delta(*h1, *h2),
                    None => (h1 - h2).abs(),
                };
                let sat_delta = match &self.saturation {
                    Some(extent) => extent.normalized_delta(*s1, *s2),
                    None => (s1 - s2).abs(),
                };
                hue_delta + sat_delta
            }
            //Shape mismatch cannot be constructed through the strategy
            _ => f64::INFINITY,
        }
    }
}

fn parse_row(mode: ColorMode, record: &csv::StringRecord) -> anyhow::Result<CalibrationRow> {
    let expected_columns = match mode {
        ColorMode::Hs => 4,
        ColorMode::ColorTemp => 3,
        ColorMode::Brightness => 2,
    };

    if record.len() != expected_columns {
        anyhow::bail!("expected {} columns, got {}", expected_columns, record.len());
    }

    let brightness = parse_field(record, 0)?;
    let (color, watt) = match mode {
        ColorMode::Hs => (
            ColorKey::HueSat {
                hue: parse_field(record, 1)?,
                saturation: parse_field(record, 2)?,
            },
            parse_field(record, 3)?,
        ),
        ColorMode::ColorTemp => (ColorKey::Mired(parse_field(record, 1)?), parse_field(record, 2)?),
        ColorMode::Brightness => (ColorKey::None, parse_field(record, 1)?),
    };

    Ok(CalibrationRow { brightness, color, watt })
}

fn parse_field(record: &csv::StringRecord, idx: usize) -> anyhow::Result<f64> {
    let raw = record
        .get(idx)
        .ok_or_else(|| anyhow::anyhow!("missing column {}", idx + 1))?;
    raw.parse::<f64>()
        .map_err(|_| anyhow::anyhow!("not a number in column {}: '{}'", idx + 1, raw))
}

/// Anchor points for piecewise-linear power estimation, levels strictly
/// increasing. Queries outside the measured range clamp to the boundary
/// point's wattage, there is no extrapolation.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCurve {
    points: Vec<(f64, f64)>,
}

impl CalibrationCurve {
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, StrategySetupError> {
        if points.len() < 2 {
            return Err(StrategySetupError::InsufficientCalibration { points: points.len() });
        }

        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(StrategySetupError::InvalidCalibrationPoint {
                    entry: format!("{} -> {}", pair[1].0, pair[1].1),
                    reason: "levels must be strictly increasing".to_owned(),
                });
            }
        }

        if let Some((level, watt)) = points.iter().find(|(_, w)| *w < 0.0) {
            return Err(StrategySetupError::InvalidCalibrationPoint {
                entry: format!("{} -> {}", level, watt),
                reason: "wattage must be non-negative".to_owned(),
            });
        }

        Ok(Self { points })
    }

    /// Parses the textual `"<level> -> <watt>"` pairs from sensor or model
    /// configuration. Any syntax problem is a setup error, evaluation never
    /// sees an unparsed curve.
    pub fn parse(entries: &[String]) -> Result<Self, StrategySetupError> {
        let mut points = Vec::with_capacity(entries.len());

        for entry in entries {
            let (level, watt) = entry.split_once("->").ok_or_else(|| StrategySetupError::InvalidCalibrationPoint {
                entry: entry.clone(),
                reason: "expected format '<level> -> <watt>'".to_owned(),
            })?;

            let level = parse_curve_number(entry, level)?;
            let watt = parse_curve_number(entry, watt)?;
            points.push((level, watt));
        }

        Self::new(points)
    }

    pub fn interpolate(&self, level: f64) -> Watt {
        let (first_level, first_watt) = self.points[0];
        let (last_level, last_watt) = self.points[self.points.len() - 1];

        if level <= first_level {
            return Watt(first_watt);
        }
        if level >= last_level {
            return Watt(last_watt);
        }

        let idx = self.points.partition_point(|(l, _)| *l <= level);
        let (l0, w0) = self.points[idx - 1];
        let (l1, w1) = self.points[idx];

        let fraction = (level - l0) / (l1 - l0);
        Watt(w0 + (w1 - w0) * fraction)
    }
}

fn parse_curve_number(entry: &str, raw: &str) -> Result<f64, StrategySetupError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| StrategySetupError::InvalidCalibrationPoint {
            entry: entry.to_owned(),
            reason: format!("not a number: '{}'", raw.trim()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brightness_table() -> CalibrationTable {
        let csv = "bri,watt\n0,0.3\n50,1.5\n128,4.2\n255,8.1\n";
        CalibrationTable::decode_csv(ColorMode::Brightness, csv.as_bytes()).unwrap()
    }

    fn color_temp_table() -> CalibrationTable {
        let csv = "bri,mired,watt\n1,153,0.5\n1,500,0.4\n128,153,4.1\n128,500,3.6\n255,153,8.0\n255,500,7.2\n";
        CalibrationTable::decode_csv(ColorMode::ColorTemp, csv.as_bytes()).unwrap()
    }

    fn hs_table() -> CalibrationTable {
        let csv = "bri,hue,sat,watt\n\
                   1,100,50,0.4\n\
                   1,40000,200,0.5\n\
                   128,100,50,3.9\n\
                   128,40000,200,4.4\n\
                   255,100,50,7.8\n\
                   255,40000,200,8.6\n";
        CalibrationTable::decode_csv(ColorMode::Hs, csv.as_bytes()).unwrap()
    }

    #[test]
    fn exact_row_match_returns_measured_value() {
        let table = hs_table();
        assert_eq!(table.nearest_watt(128.0, ColorKey::HueSat { hue: 40000.0, saturation: 200.0 }), Watt(4.4));

        let table = color_temp_table();
        assert_eq!(table.nearest_watt(255.0, ColorKey::Mired(153.0)), Watt(8.0));

        let table = brightness_table();
        assert_eq!(table.nearest_watt(50.0, ColorKey::None), Watt(1.5));
    }

    #[test]
    fn nearest_brightness_is_used_when_no_exact_match() {
        let table = brightness_table();
        assert_eq!(table.nearest_watt(60.0, ColorKey::None), Watt(1.5));
        assert_eq!(table.nearest_watt(120.0, ColorKey::None), Watt(4.2));
    }

    #[test]
    fn equal_brightness_distance_prefers_lower_row() {
        let csv = "bri,watt\n100,2.0\n200,5.0\n";
        let table = CalibrationTable::decode_csv(ColorMode::Brightness, csv.as_bytes()).unwrap();
        assert_eq!(table.nearest_watt(150.0, ColorKey::None), Watt(2.0));
    }

    #[test]
    fn out_of_range_query_values_are_clamped() {
        let table = brightness_table();
        assert_eq!(table.nearest_watt(400.0, ColorKey::None), Watt(8.1));
        assert_eq!(table.nearest_watt(-20.0, ColorKey::None), Watt(0.3));

        let table = color_temp_table();
        //Below the model's minimum mired bound, clamps to 153
        assert_eq!(table.nearest_watt(255.0, ColorKey::Mired(100.0)), Watt(8.0));
        assert_eq!(table.nearest_watt(255.0, ColorKey::Mired(9999.0)), Watt(7.2));

        let table = hs_table();
        assert_eq!(
            table.nearest_watt(255.0, ColorKey::HueSat { hue: 70000.0, saturation: 300.0 }),
            Watt(8.6)
        );
    }

    #[test]
    fn color_distance_is_normalized_per_dimension() {
        //Hue span 39900, saturation span 150. A query close in hue but far
        //in saturation must match the row with the nearer saturation.
        let csv = "bri,hue,sat,watt\n128,100,50,3.9\n128,40000,200,4.4\n";
        let table = CalibrationTable::decode_csv(ColorMode::Hs, csv.as_bytes()).unwrap();

        let watt = table.nearest_watt(128.0, ColorKey::HueSat { hue: 10000.0, saturation: 190.0 });
        assert_eq!(watt, Watt(4.4));
    }

    #[test]
    fn duplicate_rows_first_match_wins() {
        let csv = "bri,watt\n100,2.0\n100,9.9\n";
        let table = CalibrationTable::decode_csv(ColorMode::Brightness, csv.as_bytes()).unwrap();
        assert_eq!(table.nearest_watt(100.0, ColorKey::None), Watt(2.0));
    }

    #[test]
    fn unsorted_dataset_is_sorted_on_decode() {
        let csv = "bri,watt\n255,8.1\n0,0.3\n128,4.2\n";
        let table = CalibrationTable::decode_csv(ColorMode::Brightness, csv.as_bytes()).unwrap();
        assert_eq!(table.nearest_watt(10.0, ColorKey::None), Watt(0.3));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn empty_dataset_fails_to_decode() {
        let result = CalibrationTable::decode_csv(ColorMode::Brightness, "bri,watt\n".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn malformed_dataset_fails_to_decode() {
        let result = CalibrationTable::decode_csv(ColorMode::Brightness, "bri,watt\n12,abc\n".as_bytes());
        assert!(result.is_err());

        let result = CalibrationTable::decode_csv(ColorMode::ColorTemp, "bri,watt\n12,1.0\n".as_bytes());
        assert!(result.is_err(), "wrong column count must fail");
    }

    #[test]
    fn curve_interpolates_between_bracketing_points() {
        let curve = CalibrationCurve::new(vec![(1.0, 0.3), (10.0, 1.25), (50.0, 3.50), (100.0, 6.8), (255.0, 15.3)]).unwrap();

        let watt = curve.interpolate(75.0);
        assert!((watt.0 - 5.15).abs() < 1e-9);
    }

    #[test]
    fn curve_returns_exact_value_at_calibration_points() {
        let points = vec![(1.0, 0.3), (10.0, 1.25), (50.0, 3.50), (100.0, 6.8), (255.0, 15.3)];
        let curve = CalibrationCurve::new(points.clone()).unwrap();

        for (level, watt) in points {
            assert_eq!(curve.interpolate(level), Watt(watt));
        }
    }

    #[test]
    fn curve_clamps_outside_measured_range() {
        let curve = CalibrationCurve::new(vec![(10.0, 1.25), (100.0, 6.8)]).unwrap();
        assert_eq!(curve.interpolate(1.0), Watt(1.25));
        assert_eq!(curve.interpolate(200.0), Watt(6.8));
    }

    #[test]
    fn curve_with_single_point_is_rejected() {
        let result = CalibrationCurve::new(vec![(10.0, 1.25)]);
        assert!(matches!(result, Err(StrategySetupError::InsufficientCalibration { points: 1 })));
    }

    #[test]
    fn curve_parses_textual_pairs() {
        let entries = vec!["1 -> 0.3".to_owned(), "50 -> 3.5".to_owned(), "255->15.3".to_owned()];
        let curve = CalibrationCurve::parse(&entries).unwrap();
        assert_eq!(curve.interpolate(50.0), Watt(3.5));
    }

    #[test]
    fn curve_parse_rejects_bad_syntax() {
        let result = CalibrationCurve::parse(&["abc -> 1".to_owned(), "10 -> 2".to_owned()]);
        assert!(matches!(result, Err(StrategySetupError::InvalidCalibrationPoint { .. })));

        let result = CalibrationCurve::parse(&["10; 2".to_owned()]);
        assert!(matches!(result, Err(StrategySetupError::InvalidCalibrationPoint { .. })));
    }

    #[test]
    fn curve_parse_rejects_non_increasing_levels() {
        let result = CalibrationCurve::parse(&["50 -> 3.5".to_owned(), "50 -> 4.0".to_owned()]);
        assert!(matches!(result, Err(StrategySetupError::InvalidCalibrationPoint { .. })));

        let result = CalibrationCurve::parse(&["50 -> 3.5".to_owned(), "10 -> 1.0".to_owned()]);
        assert!(matches!(result, Err(StrategySetupError::InvalidCalibrationPoint { .. })));
    }
}
