//! Map–form synchronization engine for the spot dashboard.
//!
//! Three components cooperate under one coordinator:
//! - [`map::MapController`] owns the map surface and its markers.
//! - [`overview::OverviewController`] owns the creation draft and the spot list.
//! - [`dashboard::Dashboard`] routes events between them and owns the layout.
//!
//! Collaborators (store, geocoder, uploads, device, geolocation) are traits in
//! [`services`]; the map widget itself is [`map::MapSurface`].

pub mod config;
pub mod dashboard;
pub mod detail;
pub mod error;
pub mod layout;
pub mod map;
pub mod model;
pub mod overview;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use config::*;
pub use dashboard::*;
pub use error::*;
pub use layout::*;
pub use model::*;
