use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use foundation::{GeoPoint, SpotId};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use super::{BoxFuture, Geocoder, SpotStore};
use crate::error::{ServiceError, ServiceResult};
use crate::model::{GeocodeResult, NewSpot, SpotRecord};

/// Process-local spot collection with a live change feed.
pub struct MemorySpotStore {
    spots: watch::Sender<Vec<SpotRecord>>,
}

impl MemorySpotStore {
    pub fn new() -> Self {
        Self::with_spots(Vec::new())
    }

    pub fn with_spots(spots: Vec<SpotRecord>) -> Self {
        let (spots, _) = watch::channel(spots);
        Self { spots }
    }

    pub fn len(&self) -> usize {
        self.spots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<SpotRecord> {
        self.spots.borrow().clone()
    }
}

impl Default for MemorySpotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotStore for MemorySpotStore {
    fn add(&self, spot: NewSpot) -> BoxFuture<'_, ServiceResult<SpotId>> {
        Box::pin(async move {
            let id = SpotId::new(Uuid::new_v4().to_string());
            let record = SpotRecord {
                id: id.clone(),
                spot,
            };
            self.spots.send_modify(|spots| spots.push(record));
            debug!("stored spot {id}");
            Ok(id)
        })
    }

    fn get<'a>(&'a self, id: &'a SpotId) -> BoxFuture<'a, ServiceResult<SpotRecord>> {
        Box::pin(async move {
            let found = self.spots.borrow().iter().find(|r| &r.id == id).cloned();
            found.ok_or_else(|| ServiceError::new(format!("spot {id} not found")))
        })
    }

    fn stream_all(&self) -> BoxStream<'static, Vec<SpotRecord>> {
        let rx = self.spots.subscribe();
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let snapshot = rx.borrow_and_update().clone();
            Some((snapshot, (rx, false)))
        })
        .boxed()
    }
}

/// Offline geocoder that formats the coordinate itself as the address.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateGeocoder;

impl Geocoder for CoordinateGeocoder {
    fn search(&self, point: GeoPoint) -> BoxFuture<'_, ServiceResult<Vec<GeocodeResult>>> {
        Box::pin(async move {
            Ok(vec![GeocodeResult {
                formatted_address: format!("{:.6}, {:.6}", point.latitude, point.longitude),
                place_id: String::new(),
            }])
        })
    }
}
