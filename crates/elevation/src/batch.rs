use std::time::Duration;

use foundation::math::LatLng;
use tracing::{debug, warn};

use crate::config::{DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE, ElevationConfig};
use crate::lookup::{ElevationLookup, LookupError};

/// Splits large coordinate lists into paced batch lookups.
///
/// A failed batch never aborts the others: its slots come back as `None`,
/// which callers treat as "elevation unknown".
#[derive(Debug)]
pub struct ElevationBatchClient<L> {
    lookup: L,
    batch_size: usize,
    batch_delay: Duration,
}

impl<L: ElevationLookup> ElevationBatchClient<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
        }
    }

    pub fn with_config(lookup: L, config: &ElevationConfig) -> Self {
        Self {
            lookup,
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay,
        }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Elevation for every point, same length and order as `points`.
    ///
    /// Waits `batch_delay` between consecutive batches, not after the last.
    pub async fn fetch_elevations(&self, points: &[LatLng]) -> Vec<Option<f64>> {
        let mut out = vec![None; points.len()];
        let batch_count = points.len().div_ceil(self.batch_size);

        for (index, batch) in points.chunks(self.batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }
            let offset = index * self.batch_size;
            debug!(
                "elevation batch {}/{batch_count}: {} points",
                index + 1,
                batch.len()
            );

            match self.lookup.lookup(batch).await {
                Ok(values) if values.len() == batch.len() => {
                    for (slot, value) in out[offset..offset + batch.len()].iter_mut().zip(values) {
                        *slot = value.filter(|e| e.is_finite());
                    }
                }
                Ok(values) => {
                    warn!(
                        "elevation batch {} returned {} results for {} points; leaving unresolved",
                        index + 1,
                        values.len(),
                        batch.len()
                    );
                }
                Err(err) => {
                    warn!("elevation batch {} failed: {err}", index + 1);
                }
            }
        }

        out
    }

    /// Single-point lookup with the failure reported rather than nulled.
    pub async fn fetch_one(&self, point: LatLng) -> Result<f64, LookupError> {
        let values = self.lookup.lookup(std::slice::from_ref(&point)).await?;
        match values.as_slice() {
            [Some(e)] if e.is_finite() => Ok(*e),
            [_] => Err(LookupError::Unresolved),
            other => Err(LookupError::Malformed(format!(
                "expected 1 result, got {}",
                other.len()
            ))),
        }
    }
}
