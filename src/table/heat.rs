//! Heat map data: score-weighted points, map center, color gradient and grid binning.

use crate::scoring::ScoreTable;

/// One `lat`/`long`/`opportunity_score` triple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub lat: f64,
    pub long: f64,
    pub weight: f64,
}

pub fn heat_points(table: &ScoreTable) -> Vec<HeatPoint> {
    table
        .rows()
        .iter()
        .map(|row| HeatPoint {
            lat: row.entity.lat,
            long: row.entity.long,
            weight: row.opportunity_score(),
        })
        .collect()
}

/// Mean latitude and longitude, used to center the map. `None` for an empty table.
pub fn centroid(table: &ScoreTable) -> Option<(f64, f64)> {
    if table.is_empty() {
        return None;
    }
    let n = table.len() as f64;
    let lat = table.rows().iter().map(|r| r.entity.lat).sum::<f64>() / n;
    let long = table.rows().iter().map(|r| r.entity.long).sum::<f64>() / n;
    Some((lat, long))
}

/// Linear color ramp over [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct HeatGradient {
    stops: Vec<(f64, (u8, u8, u8))>,
}

impl Default for HeatGradient {
    /// blue → light blue → orange → red
    fn default() -> Self {
        Self {
            stops: vec![
                (0.0, (0, 0, 255)),
                (0.5, (173, 216, 230)),
                (0.7, (255, 165, 0)),
                (1.0, (255, 0, 0)),
            ],
        }
    }
}

impl HeatGradient {
    /// RGB color of `value`, clamped into the gradient's range
    pub fn color(&self, value: f64) -> (u8, u8, u8) {
        let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };

        for pair in self.stops.windows(2) {
            let (lo, lo_rgb) = pair[0];
            let (hi, hi_rgb) = pair[1];
            if value <= hi {
                let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.0 };
                return (
                    lerp(lo_rgb.0, hi_rgb.0, t),
                    lerp(lo_rgb.1, hi_rgb.1, t),
                    lerp(lo_rgb.2, hi_rgb.2, t),
                );
            }
        }
        self.stops.last().map(|(_, rgb)| *rgb).unwrap_or((0, 0, 0))
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

/// Bounding box of a set of points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_long: f64,
    pub max_long: f64,
}

impl Bounds {
    pub fn of(points: &[HeatPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds {
            min_lat: first.lat,
            max_lat: first.lat,
            min_long: first.long,
            max_long: first.long,
        };
        for p in &points[1..] {
            bounds.min_lat = bounds.min_lat.min(p.lat);
            bounds.max_lat = bounds.max_lat.max(p.lat);
            bounds.min_long = bounds.min_long.min(p.long);
            bounds.max_long = bounds.max_long.max(p.long);
        }
        Some(bounds)
    }

    /// Grow the box by `margin` degrees on every side
    pub fn padded(&self, margin: f64) -> Self {
        Bounds {
            min_lat: self.min_lat - margin,
            max_lat: self.max_lat + margin,
            min_long: self.min_long - margin,
            max_long: self.max_long + margin,
        }
    }
}

/// Points binned into a `cols` × `rows` grid, keeping the highest score per cell.
/// Row 0 is the northernmost band.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatGrid {
    pub cols: usize,
    pub rows: usize,
    pub bounds: Bounds,
    cells: Vec<Option<f64>>,
}

impl HeatGrid {
    pub fn from_points(points: &[HeatPoint], cols: usize, rows: usize) -> Option<Self> {
        if cols == 0 || rows == 0 {
            return None;
        }
        let bounds = Bounds::of(points)?;
        let mut cells = vec![None; cols * rows];

        for p in points {
            let col = bin(p.long, bounds.min_long, bounds.max_long, cols);
            let row = rows - 1 - bin(p.lat, bounds.min_lat, bounds.max_lat, rows);
            let cell = &mut cells[row * cols + col];
            *cell = Some(cell.map_or(p.weight, |w: f64| w.max(p.weight)));
        }

        Some(Self {
            cols,
            rows,
            bounds,
            cells,
        })
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells[row * self.cols + col]
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

fn bin(value: f64, min: f64, max: f64, buckets: usize) -> usize {
    let span = max - min;
    if span <= 0.0 {
        return 0;
    }
    let idx = ((value - min) / span * buckets as f64).floor() as usize;
    idx.min(buckets - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Entity;

    fn table() -> ScoreTable {
        let entities = vec![
            Entity::new("NCR", "Metro Manila", "Pasig", 14.0, 121.0),
            Entity::new("NCR", "Metro Manila", "Makati", 16.0, 123.0),
        ];
        ScoreTable::from_precomputed(&entities, &[0.25, 0.75]).unwrap()
    }

    #[test]
    fn test_heat_points_triples() {
        let points = heat_points(&table());
        assert_eq!(
            points[1],
            HeatPoint {
                lat: 16.0,
                long: 123.0,
                weight: 0.75
            }
        );
    }

    #[test]
    fn test_centroid() {
        assert_eq!(centroid(&table()), Some((15.0, 122.0)));
        assert_eq!(centroid(&ScoreTable::default()), None);
    }

    #[test]
    fn test_gradient_stops() {
        let g = HeatGradient::default();
        assert_eq!(g.color(0.0), (0, 0, 255));
        assert_eq!(g.color(0.5), (173, 216, 230));
        assert_eq!(g.color(0.7), (255, 165, 0));
        assert_eq!(g.color(1.0), (255, 0, 0));
        assert_eq!(g.color(2.0), (255, 0, 0));
        assert_eq!(g.color(f64::NAN), (0, 0, 255));
    }

    #[test]
    fn test_gradient_interpolates() {
        let g = HeatGradient::default();
        // A quarter of the way from orange (0.7) to red (1.0)
        assert_eq!(g.color(0.775), (255, 124, 0));
    }

    #[test]
    fn test_grid_binning() {
        let grid = HeatGrid::from_points(&heat_points(&table()), 4, 4).unwrap();
        // Southwest point lands bottom-left, northeast point top-right
        assert_eq!(grid.get(0, 3), Some(0.25));
        assert_eq!(grid.get(3, 0), Some(0.75));
        assert_eq!(grid.occupied(), 2);
        assert_eq!(grid.get(9, 9), None);
    }

    #[test]
    fn test_grid_keeps_max_per_cell() {
        let points = vec![
            HeatPoint { lat: 1.0, long: 1.0, weight: 0.2 },
            HeatPoint { lat: 1.0, long: 1.0, weight: 0.9 },
        ];
        let grid = HeatGrid::from_points(&points, 2, 2).unwrap();
        assert_eq!(grid.get(0, 1), Some(0.9));
        assert!(HeatGrid::from_points(&[], 2, 2).is_none());
        assert!(HeatGrid::from_points(&points, 0, 2).is_none());
    }
}
