use std::future::Future;
use std::pin::Pin;

use foundation::math::LatLng;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Why one lookup call produced no usable data.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The request never completed (connection, timeout, TLS).
    Network(String),
    /// The service answered with a non-OK status.
    Status(String),
    /// The response could not be understood or had the wrong shape.
    Malformed(String),
    /// The call succeeded but the point has no elevation.
    Unresolved,
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::Network(msg) => write!(f, "elevation request failed: {msg}"),
            LookupError::Status(status) => write!(f, "elevation service returned {status}"),
            LookupError::Malformed(msg) => write!(f, "malformed elevation response: {msg}"),
            LookupError::Unresolved => write!(f, "no elevation available for this point"),
        }
    }
}

impl std::error::Error for LookupError {}

/// One batch request against an elevation source.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// On success the result has exactly one entry per input point, in order;
/// `None` marks a point the source has no data for.
pub trait ElevationLookup: Send + Sync {
    fn lookup<'a>(
        &'a self,
        points: &'a [LatLng],
    ) -> BoxFuture<'a, Result<Vec<Option<f64>>, LookupError>>;
}
