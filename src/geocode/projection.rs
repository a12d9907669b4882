//! Forward projection between the service CRS and geographic coordinates.
//!
//! The math lives in `proj4rs`; this module only supplies the two fixed
//! definitions and handles the degree/radian convention for geographic systems.

use proj4rs::proj::Proj;
use thiserror::Error;

/// NAD83 / Massachusetts Mainland, the CRS the MassGIS geocoder answers in.
pub const EPSG_26986: &str = "+proj=lcc +lat_1=42.68333333333333 +lat_2=41.71666666666667 \
+lat_0=41 +lon_0=-71.5 +x_0=200000 +y_0=750000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 \
+units=m +no_defs";

/// WGS 84 longitude/latitude.
pub const EPSG_4326: &str = "+proj=longlat +datum=WGS84 +no_defs";

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("invalid {role} CRS definition: {message}")]
    InvalidDefinition { role: &'static str, message: String },
    #[error("cannot transform ({x}, {y}): {message}")]
    Transform { x: f64, y: f64, message: String },
}

/// Transforms a point from a fixed source CRS to a fixed target CRS.
pub trait Projector: Send + Sync {
    fn forward(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError>;
}

pub struct Proj4Projector {
    source: Proj,
    target: Proj,
    source_geographic: bool,
    target_geographic: bool,
}

impl Proj4Projector {
    pub fn new(source_def: &str, target_def: &str) -> Result<Self, ProjectionError> {
        let source = Proj::from_proj_string(source_def).map_err(|e| {
            ProjectionError::InvalidDefinition {
                role: "source",
                message: e.to_string(),
            }
        })?;
        let target = Proj::from_proj_string(target_def).map_err(|e| {
            ProjectionError::InvalidDefinition {
                role: "target",
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            source,
            target,
            source_geographic: is_geographic(source_def),
            target_geographic: is_geographic(target_def),
        })
    }

    /// EPSG:26986 to EPSG:4326.
    pub fn massgis() -> Result<Self, ProjectionError> {
        Self::new(EPSG_26986, EPSG_4326)
    }
}

impl Projector for Proj4Projector {
    fn forward(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let mut point = if self.source_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        proj4rs::transform::transform(&self.source, &self.target, &mut point).map_err(|e| {
            ProjectionError::Transform {
                x,
                y,
                message: e.to_string(),
            }
        })?;
        let (mut out_x, mut out_y) = (point.0, point.1);
        if self.target_geographic {
            out_x = out_x.to_degrees();
            out_y = out_y.to_degrees();
        }
        if !(out_x.is_finite() && out_y.is_finite()) {
            return Err(ProjectionError::Transform {
                x,
                y,
                message: "result is not finite".into(),
            });
        }
        Ok((out_x, out_y))
    }
}

fn is_geographic(def: &str) -> bool {
    def.split_whitespace()
        .any(|p| p == "+proj=longlat" || p == "+proj=latlong" || p == "+proj=lonlat")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_false_origin_maps_to_projection_center() {
        let p = Proj4Projector::massgis().unwrap();
        let (lon, lat) = p.forward(200_000.0, 750_000.0).unwrap();
        assert_abs_diff_eq!(lon, -71.5, epsilon = 1e-6);
        assert_abs_diff_eq!(lat, 41.0, epsilon = 1e-6);
    }

    #[test]
    fn test_beacon_hill_point() {
        let p = Proj4Projector::massgis().unwrap();
        let (lon, lat) = p.forward(236_000.0, 899_000.0).unwrap();
        assert_abs_diff_eq!(lon, -71.06313, epsilon = 1e-4);
        assert_abs_diff_eq!(lat, 42.34066, epsilon = 1e-4);
    }

    #[test]
    fn test_inverse_direction() {
        // Boston City Hall area, the demo's initial map center.
        let p = Proj4Projector::new(EPSG_4326, EPSG_26986).unwrap();
        let (x, y) = p.forward(-71.057083, 42.3601).unwrap();
        assert_abs_diff_eq!(x, 236_487.1, epsilon = 1.0);
        assert_abs_diff_eq!(y, 901_161.4, epsilon = 1.0);
    }

    #[test]
    fn test_invalid_definition() {
        let err = Proj4Projector::new("+proj=nonsense", EPSG_4326).err().unwrap();
        assert!(matches!(err, ProjectionError::InvalidDefinition { role: "source", .. }));
    }

    #[test]
    fn test_is_geographic() {
        assert!(is_geographic(EPSG_4326));
        assert!(!is_geographic(EPSG_26986));
    }
}
