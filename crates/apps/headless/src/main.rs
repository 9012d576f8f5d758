use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dashboard::map::{HeadlessSurface, MapSurface};
use dashboard::services::device::{FixedDevice, UserAgentDevice};
use dashboard::services::geolocation::FixedGeolocation;
use dashboard::services::google::GoogleGeocoder;
use dashboard::services::media::FsMediaUploader;
use dashboard::services::memory::{CoordinateGeocoder, MemorySpotStore};
use dashboard::services::{DeviceDetector, Geocoder, GeolocationProvider, Services};
use dashboard::{
    Dashboard, DashboardConfig, DashboardEvent, Difficulty, Discipline, MediaFile, MediaKind,
    SpotRecord, SpotType,
};
use foundation::{GeoPoint, ScreenPoint};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive the spot dashboard without a browser")]
struct Args {
    /// JSON config file; SPOTTED_* environment variables apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of existing spots to seed the store with
    #[arg(long)]
    spots: Option<PathBuf>,

    /// Directory receiving uploaded media
    #[arg(long, default_value = "data/media")]
    media_root: PathBuf,

    /// Browser user agent used to decide the device class
    #[arg(long)]
    user_agent: Option<String>,

    /// Treat the device as mobile (ignored when --user-agent is set)
    #[arg(long)]
    mobile: bool,

    /// Device position as "lat,lng"; without it geolocation is unavailable
    #[arg(long)]
    position: Option<String>,

    /// Picture attached to the scripted spot
    #[arg(long)]
    picture: Option<PathBuf>,
}

fn parse_position(text: &str) -> Option<GeoPoint> {
    let (lat, lng) = text.split_once(',')?;
    let point = GeoPoint::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    point.is_finite().then_some(point)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DashboardConfig::from_json_str(&tokio::fs::read_to_string(path).await?)?,
        None => DashboardConfig::from_env()?,
    };

    let seeded: Vec<SpotRecord> = match &args.spots {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => Vec::new(),
    };
    let store = Arc::new(MemorySpotStore::with_spots(seeded));

    let geocoder: Arc<dyn Geocoder> = match std::env::var("SPOTTED_GOOGLE_API_KEY") {
        Ok(key) if !key.is_empty() => Arc::new(GoogleGeocoder::new(key)),
        _ => {
            info!("SPOTTED_GOOGLE_API_KEY not set, using coordinate addresses");
            Arc::new(CoordinateGeocoder)
        }
    };

    let device: Arc<dyn DeviceDetector> = match args.user_agent {
        Some(ua) => Arc::new(UserAgentDevice::new(ua)),
        None => Arc::new(FixedDevice {
            mobile: args.mobile,
        }),
    };

    let geolocation = match args.position.as_deref() {
        Some(text) => match parse_position(text) {
            Some(point) => Some(Arc::new(FixedGeolocation::at(point)) as Arc<dyn GeolocationProvider>),
            None => {
                warn!("ignoring malformed --position {text:?}");
                None
            }
        },
        None => None,
    };

    let services = Services {
        store: store.clone(),
        geocoder,
        uploader: Arc::new(FsMediaUploader::new(&args.media_root)),
        device,
        geolocation,
    };

    let surface = HeadlessSurface::new(config.viewport_width, config.viewport_height);
    let settle = config.http_debounce + Duration::from_secs(2);
    let mut dashboard = Dashboard::new(config, services, surface);

    dashboard.mount();
    dashboard.run_for(Duration::from_millis(200)).await;

    // Scripted session: drop a spot at the middle of the map.
    let [width, height] = dashboard.map().surface().size();
    dashboard.map_clicked(ScreenPoint::new(width / 2.0, height / 2.0));
    let Some(point) = dashboard.confirm_point() else {
        return Err("no point confirmed".into());
    };
    info!("confirmed {:.6},{:.6}", point.latitude, point.longitude);
    dashboard.run_for(settle).await;

    let picture = match &args.picture {
        Some(path) => MediaFile::new(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "picture".to_string()),
            tokio::fs::read(path).await?,
        ),
        None => MediaFile::new("placeholder.txt", &b"spotted"[..]),
    };
    dashboard.attach_media(picture, MediaKind::Picture);
    dashboard.edit_draft(|draft| {
        draft.name = "Headless spot".into();
        draft.difficulty = Some(Difficulty::Mid);
        draft.spot_type = Some(SpotType::Street);
        draft.disciplines.insert(Discipline::Skate);
    });
    dashboard.run_for(settle).await;

    match dashboard.submit() {
        Ok(spot) => info!("submitted {:?}", spot.name),
        Err(err) => warn!("submit rejected: {err}"),
    }
    dashboard.run_for(settle).await;

    for event in dashboard.drain_events() {
        match event {
            DashboardEvent::Notification(notice) => info!("notice: {}", notice.key()),
            DashboardEvent::ViewportReady { located } => info!("viewport ready, located={located:?}"),
            other => tracing::debug!("{other:?}"),
        }
    }

    let center = dashboard.map().surface().center();
    info!(
        "store holds {} spot(s); view at {:.5},{:.5} zoom {}",
        store.len(),
        center.latitude,
        center.longitude,
        dashboard.map().surface().zoom()
    );
    info!("metrics: {}", dashboard.metrics());
    dashboard.teardown();
    Ok(())
}
