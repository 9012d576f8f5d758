//! Collaborators the engine consumes but does not implement.
//!
//! Each concern is a `Send + Sync` trait so it can be shared with spawned
//! tasks behind an `Arc`. Async methods return boxed futures for
//! dyn-compatibility. Adapters:
//! - [`memory`]: in-process store and offline geocoder
//! - [`google`]: Google reverse-geocoding over HTTP
//! - [`media`]: filesystem-backed uploads
//! - [`device`]: fixed and user-agent based device class
//! - [`geolocation`]: fixed device position

pub mod device;
pub mod geolocation;
pub mod google;
pub mod media;
pub mod memory;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use foundation::{GeoPoint, SpotId};
pub use futures_util::stream::BoxStream;

use crate::error::{GeolocationError, ServiceResult};
use crate::model::{GeocodeResult, MediaFile, NewSpot, SpotRecord};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote data store holding persisted spots.
pub trait SpotStore: Send + Sync {
    fn add(&self, spot: NewSpot) -> BoxFuture<'_, ServiceResult<SpotId>>;

    fn get<'a>(&'a self, id: &'a SpotId) -> BoxFuture<'a, ServiceResult<SpotRecord>>;

    /// Live sequence of the full collection; yields the current contents
    /// first, then again after every change.
    fn stream_all(&self) -> BoxStream<'static, Vec<SpotRecord>>;
}

/// Reverse geocoding. Results are ordered nearest first.
pub trait Geocoder: Send + Sync {
    fn search(&self, point: GeoPoint) -> BoxFuture<'_, ServiceResult<Vec<GeocodeResult>>>;
}

/// Media storage; returns the storage path of the uploaded file.
pub trait MediaUploader: Send + Sync {
    fn file(&self, file: MediaFile) -> BoxFuture<'_, ServiceResult<String>>;
}

/// Device class probe. Polled synchronously whenever the layout is computed.
pub trait DeviceDetector: Send + Sync {
    fn detect_mobile(&self) -> bool;
}

/// One-shot device position query.
pub trait GeolocationProvider: Send + Sync {
    fn current_position(&self) -> BoxFuture<'_, Result<GeoPoint, GeolocationError>>;
}

/// Everything the dashboard needs from the outside world.
///
/// `geolocation` is `None` on platforms without the capability.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn SpotStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub uploader: Arc<dyn MediaUploader>,
    pub device: Arc<dyn DeviceDetector>,
    pub geolocation: Option<Arc<dyn GeolocationProvider>>,
}
