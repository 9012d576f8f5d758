//! Read-only view of one stored spot.

use foundation::{GeoPoint, SpotId};

use crate::config::DashboardConfig;
use crate::error::ServiceResult;
use crate::model::SpotRecord;
use crate::services::SpotStore;

/// Static, non-interactive map view centred on the spot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DetailView {
    pub center: GeoPoint,
    pub zoom: f64,
    pub interactive: bool,
}

/// Text of the popup opened on the spot marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSummary {
    pub kind: String,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotDetail {
    pub spot: SpotRecord,
    pub view: DetailView,
    pub popup: PopupSummary,
}

impl SpotDetail {
    pub async fn load(
        store: &dyn SpotStore,
        id: &SpotId,
        config: &DashboardConfig,
    ) -> ServiceResult<Self> {
        let record = store.get(id).await?;
        Ok(Self::from_record(record, config))
    }

    pub fn from_record(spot: SpotRecord, config: &DashboardConfig) -> Self {
        let view = DetailView {
            center: spot.point(),
            zoom: config.detail_zoom.min(config.max_zoom),
            interactive: false,
        };
        let popup = PopupSummary {
            kind: spot.spot.spot_type.label().to_uppercase(),
            name: spot.spot.name.to_uppercase(),
            address: spot.spot.location.address.clone(),
        };
        Self { spot, view, popup }
    }
}
