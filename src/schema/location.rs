//! Device location retrieval models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::device::Device;

// =============================================================================
// Request
// =============================================================================

/// Request to retrieve the last known location of a device
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalLocationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    /// Maximum accepted age of the location information, seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    /// Maximum accepted surface of the reported area, square meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_surface: Option<u64>,
}

impl RetrievalLocationRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(device) = &self.device {
            device.validate()?;
        }
        if self.max_surface == Some(0) {
            return Err(Error::InvalidArgument(
                "maxSurface must be at least 1 square meter".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Response
// =============================================================================

/// Geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidArgument(format!(
                "latitude {} out of [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidArgument(format!(
                "longitude {} out of [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Area variant, tagged by `areaType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "areaType")]
pub enum Area {
    #[serde(rename = "CIRCLE")]
    Circle {
        center: Point,
        /// Meters, at least 1
        radius: f64,
    },
    #[serde(rename = "POLYGON")]
    Polygon {
        /// Ordered boundary, 3 to 15 points
        boundary: Vec<Point>,
    },
}

impl Area {
    pub fn validate(&self) -> Result<()> {
        match self {
            Area::Circle { center, radius } => {
                center.validate()?;
                if *radius < 1.0 {
                    return Err(Error::InvalidArgument(
                        "circle radius must be at least 1 meter".into(),
                    ));
                }
            }
            Area::Polygon { boundary } => {
                if !(3..=15).contains(&boundary.len()) {
                    return Err(Error::InvalidArgument(format!(
                        "polygon boundary has {} points, expected 3 to 15",
                        boundary.len()
                    )));
                }
                for point in boundary {
                    point.validate()?;
                }
            }
        }
        Ok(())
    }
}

/// Canonical location result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Last date and time the device was localized
    pub last_location_time: DateTime<Utc>,
    pub area: Area,
}
