//! Coordinate Reference System handling
//!
//! CRS values are exchanged as EPSG authority codes or WKT strings; both are
//! accepted as input. When a WKT carries an EPSG authority identifier it is
//! extracted so code-based operations (reprojection, equivalence) work on
//! WKT-sourced CRS values too.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    /// WKT representation, if supplied
    wkt: Option<String>,
    /// EPSG code, if known
    epsg: Option<u32>,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string.
    ///
    /// If the WKT carries an EPSG authority clause (`AUTHORITY["EPSG","..."]`
    /// or WKT2 `ID["EPSG",...]`), the code is extracted and retained.
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        let wkt = wkt.into();
        let epsg = epsg_from_wkt(&wkt);
        Self {
            wkt: Some(wkt),
            epsg,
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation if supplied
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Check if two CRS are equivalent.
    ///
    /// EPSG codes are compared when both are known; otherwise WKT strings are
    /// compared verbatim (imperfect, but how the source systems behave).
    pub fn is_equivalent(&self, other: &Crs) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        false
    }

    /// Get a short string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            return format!("WKT:{}", &wkt[..wkt.len().min(50)]);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

/// Scan a WKT string for its last EPSG authority code.
///
/// The last occurrence is the authority of the whole CRS; earlier ones belong
/// to nested datum/axis definitions.
fn epsg_from_wkt(wkt: &str) -> Option<u32> {
    let mut code = None;
    let mut rest = wkt;
    while let Some(pos) = rest.find("\"EPSG\"") {
        let tail = &rest[pos + "\"EPSG\"".len()..];
        // Accept `,"4326"` (WKT1) and `,4326` (WKT2)
        let digits: String = tail
            .chars()
            .skip_while(|c| *c == ',' || *c == '"' || c.is_whitespace())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(parsed) = digits.parse::<u32>() {
            code = Some(parsed);
        }
        rest = tail;
    }
    code
}
