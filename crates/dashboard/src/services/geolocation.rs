use std::time::Duration;

use foundation::GeoPoint;

use super::{BoxFuture, GeolocationProvider};
use crate::error::GeolocationError;

/// Answers every position query with the same outcome after `delay`.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation {
    outcome: Result<GeoPoint, GeolocationError>,
    delay: Duration,
}

impl FixedGeolocation {
    pub fn at(point: GeoPoint) -> Self {
        Self {
            outcome: Ok(point),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self {
            outcome: Err(error),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl GeolocationProvider for FixedGeolocation {
    fn current_position(&self) -> BoxFuture<'_, Result<GeoPoint, GeolocationError>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome
        })
    }
}
