//! Scriptable collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use foundation::{GeoPoint, SpotId};
use parking_lot::Mutex;

use crate::error::{ServiceError, ServiceResult};
use crate::model::{GeocodeResult, MediaFile, NewSpot, SpotRecord};
use crate::services::device::FixedDevice;
use crate::services::memory::MemorySpotStore;
use crate::services::{
    BoxFuture, BoxStream, Geocoder, GeolocationProvider, MediaUploader, Services, SpotStore,
};

struct Scripted {
    delay: Duration,
    outcome: Result<String, String>,
}

/// Records every lookup; answers from a script, then with the coordinate.
#[derive(Default)]
pub struct RecordingGeocoder {
    calls: Mutex<Vec<GeoPoint>>,
    script: Mutex<VecDeque<Scripted>>,
}

impl RecordingGeocoder {
    pub fn respond(&self, address: &str, delay: Duration) -> &Self {
        self.script.lock().push_back(Scripted {
            delay,
            outcome: Ok(address.to_string()),
        });
        self
    }

    pub fn fail(&self, delay: Duration) -> &Self {
        self.script.lock().push_back(Scripted {
            delay,
            outcome: Err("geocoder unavailable".to_string()),
        });
        self
    }

    pub fn calls(&self) -> Vec<GeoPoint> {
        self.calls.lock().clone()
    }
}

pub fn address_of(point: GeoPoint) -> String {
    format!("{:.4} {:.4}", point.latitude, point.longitude)
}

impl Geocoder for RecordingGeocoder {
    fn search(&self, point: GeoPoint) -> BoxFuture<'_, ServiceResult<Vec<GeocodeResult>>> {
        self.calls.lock().push(point);
        let next = self.script.lock().pop_front().unwrap_or(Scripted {
            delay: Duration::ZERO,
            outcome: Ok(address_of(point)),
        });
        Box::pin(async move {
            if !next.delay.is_zero() {
                tokio::time::sleep(next.delay).await;
            }
            match next.outcome {
                Ok(address) => Ok(vec![GeocodeResult {
                    formatted_address: address,
                    place_id: format!("place-{}", point.latitude),
                }]),
                Err(msg) => Err(ServiceError::new(msg)),
            }
        })
    }
}

/// In-memory store that counts `add` calls and can be told to fail them.
#[derive(Default)]
pub struct CountingStore {
    inner: MemorySpotStore,
    adds: AtomicUsize,
    failing: AtomicBool,
}

impl CountingStore {
    pub fn with_spots(spots: Vec<SpotRecord>) -> Self {
        Self {
            inner: MemorySpotStore::with_spots(spots),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemorySpotStore {
        &self.inner
    }
}

impl SpotStore for CountingStore {
    fn add(&self, spot: NewSpot) -> BoxFuture<'_, ServiceResult<SpotId>> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Box::pin(async { Err(ServiceError::new("store offline")) });
        }
        self.inner.add(spot)
    }

    fn get<'a>(&'a self, id: &'a SpotId) -> BoxFuture<'a, ServiceResult<SpotRecord>> {
        self.inner.get(id)
    }

    fn stream_all(&self) -> BoxStream<'static, Vec<SpotRecord>> {
        self.inner.stream_all()
    }
}

/// Uploader returning `media/{name}`; names containing "broken" fail.
#[derive(Default)]
pub struct RecordingUploader {
    uploads: Mutex<Vec<String>>,
}

impl RecordingUploader {
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().clone()
    }
}

impl MediaUploader for RecordingUploader {
    fn file(&self, file: MediaFile) -> BoxFuture<'_, ServiceResult<String>> {
        self.uploads.lock().push(file.name.clone());
        Box::pin(async move {
            if file.name.contains("broken") {
                return Err(ServiceError::new(format!("cannot upload {}", file.name)));
            }
            Ok(format!("media/{}", file.name))
        })
    }
}

/// The fakes behind a [`Services`] bundle, kept for assertions.
pub struct Fakes {
    pub store: Arc<CountingStore>,
    pub geocoder: Arc<RecordingGeocoder>,
    pub uploader: Arc<RecordingUploader>,
    pub device: Arc<FixedDevice>,
}

impl Fakes {
    pub fn new(mobile: bool) -> Self {
        Self::with_spots(mobile, Vec::new())
    }

    pub fn with_spots(mobile: bool, spots: Vec<SpotRecord>) -> Self {
        Self {
            store: Arc::new(CountingStore::with_spots(spots)),
            geocoder: Arc::new(RecordingGeocoder::default()),
            uploader: Arc::new(RecordingUploader::default()),
            device: Arc::new(FixedDevice { mobile }),
        }
    }

    pub fn services(&self, geolocation: Option<Arc<dyn GeolocationProvider>>) -> Services {
        Services {
            store: self.store.clone(),
            geocoder: self.geocoder.clone(),
            uploader: self.uploader.clone(),
            device: self.device.clone(),
            geolocation,
        }
    }
}

pub fn record(id: &str, latitude: f64, longitude: f64) -> SpotRecord {
    use crate::model::{Difficulty, Discipline, Location, SpotType};

    SpotRecord {
        id: SpotId::new(id),
        spot: NewSpot {
            name: format!("spot {id}"),
            description: String::new(),
            indoor: false,
            difficulty: Difficulty::Mid,
            spot_type: SpotType::Park,
            disciplines: [Discipline::Skate].into_iter().collect(),
            location: Location {
                latitude,
                longitude,
                address: format!("{id} street"),
                place_id: String::new(),
            },
            pictures: vec![format!("media/{id}.jpg")],
            videos: Vec::new(),
        },
    }
}
