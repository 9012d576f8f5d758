use std::collections::BTreeSet;
use std::fmt;

use bytes::Bytes;
use foundation::{GeoPoint, SpotId};
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Low,
    Mid,
    Hard,
    Pro,
    Hammer,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Low,
        Difficulty::Mid,
        Difficulty::Hard,
        Difficulty::Pro,
        Difficulty::Hammer,
    ];
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Discipline {
    #[serde(rename = "BMX")]
    Bmx,
    #[serde(rename = "skate")]
    Skate,
    #[serde(rename = "roller")]
    Roller,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotType {
    Street,
    Park,
    Bowl,
    Dirt,
}

impl SpotType {
    pub fn label(self) -> &'static str {
        match self {
            SpotType::Street => "street",
            SpotType::Park => "park",
            SpotType::Bowl => "bowl",
            SpotType::Dirt => "dirt",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Picture,
    Video,
}

/// A file picked by the user, not yet uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftLocation {
    pub address: String,
    pub place_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftMedia {
    pub pictures: Vec<String>,
    pub videos: Vec<String>,
}

/// In-progress form state for a spot that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotDraft {
    pub name: String,
    pub description: String,
    pub indoor: bool,
    pub difficulty: Option<Difficulty>,
    pub spot_type: Option<SpotType>,
    pub disciplines: BTreeSet<Discipline>,
    pub location: DraftLocation,
    pub media: DraftMedia,
}

/// Required draft fields, in form order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DraftField {
    Difficulty,
    SpotType,
    Disciplines,
    Address,
    Latitude,
    Longitude,
    Pictures,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftField::Difficulty => "difficulty",
            DraftField::SpotType => "type",
            DraftField::Disciplines => "disciplines",
            DraftField::Address => "address",
            DraftField::Latitude => "latitude",
            DraftField::Longitude => "longitude",
            DraftField::Pictures => "pictures",
        };
        f.write_str(name)
    }
}

impl SpotDraft {
    pub fn set_point(&mut self, point: GeoPoint) {
        self.location.latitude = Some(point.latitude);
        self.location.longitude = Some(point.longitude);
    }

    pub fn point(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(
            self.location.latitude?,
            self.location.longitude?,
        ))
    }

    pub fn missing_fields(&self) -> Vec<DraftField> {
        let mut missing = Vec::new();
        if self.difficulty.is_none() {
            missing.push(DraftField::Difficulty);
        }
        if self.spot_type.is_none() {
            missing.push(DraftField::SpotType);
        }
        if self.disciplines.is_empty() {
            missing.push(DraftField::Disciplines);
        }
        if self.location.address.trim().is_empty() {
            missing.push(DraftField::Address);
        }
        if self.location.latitude.is_none() {
            missing.push(DraftField::Latitude);
        }
        if self.location.longitude.is_none() {
            missing.push(DraftField::Longitude);
        }
        if self.media.pictures.is_empty() {
            missing.push(DraftField::Pictures);
        }
        missing
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// The "description" step of the form: disciplines, type and difficulty.
    pub fn description_complete(&self) -> bool {
        !self.disciplines.is_empty() && self.spot_type.is_some() && self.difficulty.is_some()
    }

    /// Builds the record to store, or lists what is missing.
    pub fn validate(&self) -> Result<NewSpot, SubmitError> {
        let missing = self.missing_fields();
        let (Some(difficulty), Some(spot_type), Some(point), true) = (
            self.difficulty,
            self.spot_type,
            self.point(),
            missing.is_empty(),
        ) else {
            return Err(SubmitError::Invalid(missing));
        };

        Ok(NewSpot {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            indoor: self.indoor,
            difficulty,
            spot_type,
            disciplines: self.disciplines.clone(),
            location: Location {
                latitude: point.latitude,
                longitude: point.longitude,
                address: self.location.address.trim().to_string(),
                place_id: self.location.place_id.clone(),
            },
            pictures: self.media.pictures.clone(),
            videos: self.media.videos.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    #[serde(default)]
    pub place_id: String,
}

impl Location {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A validated draft, ready for the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub indoor: bool,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub spot_type: SpotType,
    pub disciplines: BTreeSet<Discipline>,
    pub location: Location,
    pub pictures: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
}

/// A spot as the store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotRecord {
    pub id: SpotId,
    #[serde(flatten)]
    pub spot: NewSpot,
}

impl SpotRecord {
    pub fn point(&self) -> GeoPoint {
        self.spot.location.point()
    }
}

/// One reverse-geocoding candidate; the geocoder returns them nearest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub place_id: String,
}
