use std::path::Path;

use anyhow::Context;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

mod highway;
pub use highway::{HighwayClass, MAJOR};

/// A single road geometry reduced to its endpoints, as handed to the
/// graph builder. Rows are validated here so downstream code only ever
/// sees finite coordinates and a sane optional length.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RoadSegment {
    pub highway: HighwayClass,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub length_km: Option<f64>,
}

impl RoadSegment {
    pub fn new(highway: HighwayClass, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        RoadSegment {
            highway,
            x1,
            y1,
            x2,
            y2,
            length_km: None,
        }
    }

    pub fn with_length(mut self, km: f64) -> Self {
        self.length_km = Some(km);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Great-circle distance between the two endpoints in kilometres.
    pub fn haversine_km(&self) -> f64 {
        haversine_distance(self.y1, self.x1, self.y2, self.x2) / 1000.0
    }
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub allowed: Vec<HighwayClass>,
    /// Fill a missing `length_km` from the endpoint haversine distance.
    pub derive_missing_lengths: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            allowed: MAJOR.to_vec(),
            derive_missing_lengths: false,
        }
    }
}

// Raw CSV row before validation. Coordinates stay optional so a blank
// field surfaces as a dropped row instead of a hard parse failure.
#[derive(Debug, Deserialize)]
struct RawRow {
    highway: String,
    x1: Option<f64>,
    y1: Option<f64>,
    x2: Option<f64>,
    y2: Option<f64>,
    #[serde(default)]
    length_km: Option<f64>,
}

/// Read road segments from a CSV file with columns
/// `highway,x1,y1,x2,y2[,length_km]`.
///
/// Rows outside the allow-list are skipped; rows with missing or
/// non-finite coordinates are dropped; a negative or non-finite
/// `length_km` is normalised to `None`.
pub fn read_segments(path: &Path, opts: &ReaderOptions) -> anyhow::Result<Vec<RoadSegment>> {
    let now = std::time::Instant::now();
    info!("BEGIN reading segments from {}", path.display());

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open segment file {}", path.display()))?;

    let mut segments = Vec::new();
    let mut filtered = 0usize;
    let mut malformed = 0usize;

    for result in reader.deserialize() {
        let row: RawRow = match result {
            Ok(row) => row,
            Err(err) => {
                debug!("Dropping malformed row: {}", err);
                malformed += 1;
                continue;
            }
        };

        let highway = match row.highway.parse::<HighwayClass>() {
            Ok(class) if opts.allowed.contains(&class) => class,
            _ => {
                filtered += 1;
                continue;
            }
        };

        let (x1, y1, x2, y2) = match (row.x1, row.y1, row.x2, row.y2) {
            (Some(x1), Some(y1), Some(x2), Some(y2)) => (x1, y1, x2, y2),
            _ => {
                malformed += 1;
                continue;
            }
        };

        let mut segment = RoadSegment {
            highway,
            x1,
            y1,
            x2,
            y2,
            length_km: row.length_km.filter(|km| km.is_finite() && *km >= 0.0),
        };

        if !segment.is_valid() {
            malformed += 1;
            continue;
        }

        if opts.derive_missing_lengths && segment.length_km.is_none() {
            segment.length_km = Some(segment.haversine_km());
        }

        segments.push(segment);
    }

    if malformed > 0 {
        warn!("Dropped {} malformed rows", malformed);
    }
    info!(
        "FINISHED reading segments. {} kept, {} filtered by class, {} dropped. Took {:?}",
        segments.len(),
        filtered,
        malformed,
        now.elapsed()
    );

    Ok(segments)
}

// Calculates the great-circle distance between two points in metres
fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let r = 6_371_000.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + (d_lon / 2.0).sin().powi(2) * lat1.to_radians().cos() * lat2.to_radians().cos();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    r * c
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use approx::assert_abs_diff_eq;

    use super::*;

    fn write_csv(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_and_filters_rows() {
        let path = write_csv(
            "road_reader_filter_test.csv",
            "highway,x1,y1,x2,y2,length_km\n\
             primary,23.71,37.98,23.72,37.99,1.5\n\
             residential,23.71,37.98,23.72,37.99,1.0\n\
             secondary,23.70,37.97,23.71,37.98,\n",
        );

        let segments = read_segments(&path, &ReaderOptions::default()).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].highway, HighwayClass::Primary);
        assert_eq!(segments[0].length_km, Some(1.5));
        assert_eq!(segments[1].highway, HighwayClass::Secondary);
        assert_eq!(segments[1].length_km, None);
    }

    #[test]
    fn drops_malformed_rows() {
        let path = write_csv(
            "road_reader_malformed_test.csv",
            "highway,x1,y1,x2,y2,length_km\n\
             primary,23.71,37.98,23.72,37.99,\n\
             primary,not_a_number,37.98,23.72,37.99,\n\
             primary,,37.98,23.72,37.99,\n\
             primary,NaN,37.98,23.72,37.99,\n",
        );

        let segments = read_segments(&path, &ReaderOptions::default()).unwrap();

        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn normalises_bad_lengths() {
        let path = write_csv(
            "road_reader_length_test.csv",
            "highway,x1,y1,x2,y2,length_km\n\
             primary,23.71,37.98,23.72,37.99,-2.0\n\
             primary,23.70,37.97,23.71,37.98,inf\n",
        );

        let segments = read_segments(&path, &ReaderOptions::default()).unwrap();

        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.length_km.is_none()));
    }

    #[test]
    fn derives_missing_lengths_on_request() {
        let path = write_csv(
            "road_reader_derive_test.csv",
            "highway,x1,y1,x2,y2,length_km\n\
             primary,23.71,37.98,23.72,37.98,\n",
        );
        let opts = ReaderOptions {
            derive_missing_lengths: true,
            ..Default::default()
        };

        let segments = read_segments(&path, &opts).unwrap();

        // One hundredth of a degree of longitude at ~38N is roughly 0.88 km
        let km = segments[0].length_km.unwrap();
        assert_abs_diff_eq!(km, 0.88, epsilon = 0.05);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Athens centre to Piraeus, ~8.5 km
        let seg = RoadSegment::new(HighwayClass::Primary, 23.7275, 37.9838, 23.6470, 37.9420);
        assert_abs_diff_eq!(seg.haversine_km(), 8.5, epsilon = 0.5);
    }
}
