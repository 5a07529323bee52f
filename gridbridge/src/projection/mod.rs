//! Map projections understood by the tiling scheme.
//!
//! Two projections are built in: geographic lon/lat degrees (EPSG:4326) and
//! spherical mercator metres (EPSG:3857). Anything else must be supplied as a
//! custom projection with its own [`ProjectionTransform`].

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::coord::{Coordinate, Extent};

/// Sphere radius used by spherical mercator.
pub const MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Half the side length of the spherical mercator square, in metres.
pub const MERCATOR_HALF_SIZE: f64 = PI * MERCATOR_RADIUS;

/// Codes recognised as geographic lon/lat.
const GEOGRAPHIC_CODES: &[&str] = &[
    "EPSG:4326",
    "CRS:84",
    "urn:ogc:def:crs:EPSG::4326",
    "urn:ogc:def:crs:EPSG:6.6:4326",
    "urn:ogc:def:crs:OGC:1.3:CRS84",
    "urn:ogc:def:crs:OGC:2:84",
    "http://www.opengis.net/def/crs/OGC/1.3/CRS84",
    "http://www.opengis.net/def/crs/EPSG/0/4326",
    "http://www.opengis.net/gml/srs/epsg.xml#4326",
    "urn:x-ogc:def:crs:EPSG:4326",
];

/// Codes recognised as spherical mercator.
const WEB_MERCATOR_CODES: &[&str] = &[
    "EPSG:3857",
    "EPSG:102100",
    "EPSG:102113",
    "EPSG:900913",
    "EPSG:3785",
    "OSGEO:41001",
    "urn:ogc:def:crs:EPSG::3857",
    "http://www.opengis.net/def/crs/EPSG/0/3857",
    "http://www.opengis.net/gml/srs/epsg.xml#3857",
];

/// The two projection families a globe renderer can tile natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    Geographic,
    WebMercator,
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionKind::Geographic => write!(f, "geographic"),
            ProjectionKind::WebMercator => write!(f, "web-mercator"),
        }
    }
}

/// Converts between a projection's native units and lon/lat degrees.
pub trait ProjectionTransform: Send + Sync {
    /// Native coordinate to (longitude, latitude) in degrees.
    fn to_lon_lat(&self, native: Coordinate) -> Coordinate;

    /// (longitude, latitude) in degrees to native coordinate.
    fn from_lon_lat(&self, lon_lat: Coordinate) -> Coordinate;
}

#[derive(Clone)]
enum Definition {
    Builtin(ProjectionKind),
    Custom(Arc<dyn ProjectionTransform>),
}

/// A named map projection.
#[derive(Clone)]
pub struct Projection {
    code: String,
    extent: Option<Extent>,
    definition: Definition,
}

impl Projection {
    /// Geographic lon/lat degrees (EPSG:4326).
    pub fn geographic() -> Self {
        Self {
            code: "EPSG:4326".to_string(),
            extent: Some(Extent::new(-180.0, -90.0, 180.0, 90.0)),
            definition: Definition::Builtin(ProjectionKind::Geographic),
        }
    }

    /// Spherical mercator (EPSG:3857).
    pub fn web_mercator() -> Self {
        Self {
            code: "EPSG:3857".to_string(),
            extent: Some(Extent::new(
                -MERCATOR_HALF_SIZE,
                -MERCATOR_HALF_SIZE,
                MERCATOR_HALF_SIZE,
                MERCATOR_HALF_SIZE,
            )),
            definition: Definition::Builtin(ProjectionKind::WebMercator),
        }
    }

    /// Looks up a built-in projection by code or alias.
    ///
    /// The returned projection keeps the code it was requested with.
    pub fn get(code: &str) -> Option<Self> {
        let base = if GEOGRAPHIC_CODES.iter().any(|c| c.eq_ignore_ascii_case(code)) {
            Self::geographic()
        } else if WEB_MERCATOR_CODES
            .iter()
            .any(|c| c.eq_ignore_ascii_case(code))
        {
            Self::web_mercator()
        } else {
            return None;
        };
        Some(Self {
            code: code.to_string(),
            ..base
        })
    }

    /// A projection the renderer does not tile natively.
    pub fn custom(
        code: impl Into<String>,
        extent: Option<Extent>,
        transform: Arc<dyn ProjectionTransform>,
    ) -> Self {
        Self {
            code: code.into(),
            extent,
            definition: Definition::Custom(transform),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Validity extent in native units, if known.
    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    /// The built-in family, or `None` for custom projections.
    pub fn kind(&self) -> Option<ProjectionKind> {
        match self.definition {
            Definition::Builtin(kind) => Some(kind),
            Definition::Custom(_) => None,
        }
    }

    pub fn is_geographic(&self) -> bool {
        self.kind() == Some(ProjectionKind::Geographic)
    }

    pub fn is_web_mercator(&self) -> bool {
        self.kind() == Some(ProjectionKind::WebMercator)
    }

    /// Two projections are equivalent when they share a built-in family or,
    /// for custom projections, the same code.
    pub fn is_equivalent(&self, other: &Projection) -> bool {
        match (self.kind(), other.kind()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.code == other.code,
            _ => false,
        }
    }

    /// Native coordinate to lon/lat degrees.
    pub fn to_lon_lat(&self, native: Coordinate) -> Coordinate {
        match &self.definition {
            Definition::Builtin(ProjectionKind::Geographic) => native,
            Definition::Builtin(ProjectionKind::WebMercator) => mercator_to_lon_lat(native),
            Definition::Custom(transform) => transform.to_lon_lat(native),
        }
    }

    /// Lon/lat degrees to native coordinate.
    pub fn from_lon_lat(&self, lon_lat: Coordinate) -> Coordinate {
        match &self.definition {
            Definition::Builtin(ProjectionKind::Geographic) => lon_lat,
            Definition::Builtin(ProjectionKind::WebMercator) => lon_lat_to_mercator(lon_lat),
            Definition::Custom(transform) => transform.from_lon_lat(lon_lat),
        }
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("code", &self.code)
            .field("kind", &self.kind())
            .field("extent", &self.extent)
            .finish()
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Transforms an extent between projections via lon/lat degrees.
///
/// Each corner is transformed and the bounding box of the results returned.
/// Equivalent projections leave the extent untouched.
pub fn transform_extent(extent: &Extent, from: &Projection, to: &Projection) -> Extent {
    if from.is_equivalent(to) {
        return *extent;
    }
    let corners = extent
        .corners()
        .map(|corner| to.from_lon_lat(from.to_lon_lat(corner)));
    Extent::bounding(&corners)
}

fn lon_lat_to_mercator(lon_lat: Coordinate) -> Coordinate {
    let x = MERCATOR_RADIUS * lon_lat.x * PI / 180.0;
    let y = MERCATOR_RADIUS * (PI * (lon_lat.y + 90.0) / 360.0).tan().ln();
    Coordinate::new(x, y.clamp(-MERCATOR_HALF_SIZE, MERCATOR_HALF_SIZE))
}

fn mercator_to_lon_lat(native: Coordinate) -> Coordinate {
    let lon = 180.0 * native.x / MERCATOR_HALF_SIZE;
    let lat = 360.0 * (native.y / MERCATOR_RADIUS).exp().atan() / PI - 90.0;
    Coordinate::new(lon, lat)
}
