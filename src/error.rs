//! Error types shared by the feed pipeline and GPU setup.

use std::fmt;

/// A geometry payload that could not be turned into a [`GeometryRecord`].
///
/// Always recoverable: the listener logs it and drops the payload.
///
/// [`GeometryRecord`]: crate::model::GeometryRecord
#[derive(Debug)]
pub enum FeedError {
    /// The payload was not valid JSON for any supported description shape.
    Decode(serde_json::Error),
    /// A binary frame did not contain UTF-8 text.
    NotUtf8,
    /// A face or triangle index was negative or beyond the vertex list.
    IndexOutOfRange { index: i64, vertex_count: usize },
    /// An index that is not a whole number, such as `1.5`.
    NonIntegralIndex { value: f64 },
    /// Two arrays that must agree in length did not.
    LengthMismatch { what: &'static str, expected: usize, actual: usize },
    /// A flat array was not a whole number of groups.
    Ragged { what: &'static str, len: usize, group: usize },
    /// A polygon with fewer than three corners.
    DegenerateFace { face: usize, corners: usize },
    /// A polygon with more than three corners while triangulation is disabled.
    NonTriangularFace { face: usize, corners: usize },
    /// The expanded mesh does not fit 16-bit indices.
    TooManyVertices { count: usize },
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "payload decode error: {e}"),
            Self::NotUtf8 => write!(f, "binary payload is not UTF-8"),
            Self::IndexOutOfRange { index, vertex_count } => {
                write!(f, "index {index} out of range for {vertex_count} vertices")
            }
            Self::NonIntegralIndex { value } => write!(f, "index {value} is not a whole number"),
            Self::LengthMismatch { what, expected, actual } => {
                write!(f, "{what}: expected {expected} entries, got {actual}")
            }
            Self::Ragged { what, len, group } => {
                write!(f, "{what}: length {len} is not a multiple of {group}")
            }
            Self::DegenerateFace { face, corners } => {
                write!(f, "face {face} has only {corners} corners")
            }
            Self::NonTriangularFace { face, corners } => {
                write!(f, "face {face} has {corners} corners but triangulation is off")
            }
            Self::TooManyVertices { count } => {
                write!(f, "{count} vertices exceed the 16-bit index range")
            }
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}

/// Fatal failures while bringing up the graphics stack.
#[derive(Debug)]
pub enum GpuError {
    CreateSurface(wgpu::CreateSurfaceError),
    RequestAdapter(wgpu::RequestAdapterError),
    RequestDevice(wgpu::RequestDeviceError),
    /// The surface reports no usable texture format or alpha mode.
    UnsupportedSurface,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateSurface(e) => write!(f, "surface creation failed: {e}"),
            Self::RequestAdapter(e) => write!(f, "no suitable GPU adapter: {e}"),
            Self::RequestDevice(e) => write!(f, "device request failed: {e}"),
            Self::UnsupportedSurface => write!(f, "surface has no supported configuration"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CreateSurface(e) => Some(e),
            Self::RequestAdapter(e) => Some(e),
            Self::RequestDevice(e) => Some(e),
            Self::UnsupportedSurface => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        Self::CreateSurface(e)
    }
}

impl From<wgpu::RequestAdapterError> for GpuError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        Self::RequestAdapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        Self::RequestDevice(e)
    }
}
