//! Map pane layout: collapsed/expanded on mobile, full height elsewhere.
//!
//! Interaction signals from both leaves are deduplicated by sequence number
//! and debounced before they move the state machine:
//! - map pan/zoom/click settles → expanded
//! - list scroll settles → collapsed
//!
//! On non-mobile devices signals are dropped before the debouncer.

use std::sync::Arc;
use std::time::Duration;

use runtime::{Debouncer, Distinct};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::services::DeviceDetector;

pub const MOBILE_EXPANDED_HEIGHT: u8 = 80;
pub const MOBILE_COLLAPSED_HEIGHT: u8 = 20;
pub const FULL_HEIGHT: u8 = 100;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InteractionKind {
    Pan,
    Zoom,
    Click,
    Scroll,
}

/// A user-initiated interaction on one of the leaves.
///
/// `seq` increases monotonically per emitting component.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub seq: u64,
    pub kind: InteractionKind,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayoutState {
    pub expanded: bool,
    pub map_height_percent: u8,
}

/// A debounced signal that has settled and should now move the layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayoutSignal {
    MapInteracted,
    ListScrolled,
}

pub fn map_height(mobile: bool, expanded: bool) -> u8 {
    match (mobile, expanded) {
        (false, _) => FULL_HEIGHT,
        (true, true) => MOBILE_EXPANDED_HEIGHT,
        (true, false) => MOBILE_COLLAPSED_HEIGHT,
    }
}

pub struct LayoutMachine {
    device: Arc<dyn DeviceDetector>,
    state: LayoutState,
    map_seen: Distinct<u64>,
    list_seen: Distinct<u64>,
    map_settle: Debouncer<LayoutSignal>,
    list_settle: Debouncer<LayoutSignal>,
    active: bool,
}

impl LayoutMachine {
    /// Settled signals are delivered on `output`.
    pub fn new(
        device: Arc<dyn DeviceDetector>,
        debounce: Duration,
        output: UnboundedSender<LayoutSignal>,
    ) -> Self {
        let state = LayoutState {
            expanded: false,
            map_height_percent: map_height(device.detect_mobile(), false),
        };
        Self {
            device,
            state,
            map_seen: Distinct::new(),
            list_seen: Distinct::new(),
            map_settle: Debouncer::new(debounce, output.clone()),
            list_settle: Debouncer::new(debounce, output),
            active: true,
        }
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    /// `false` after teardown; settled signals still queued must be dropped.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` if the signal was accepted into the debouncer.
    pub fn on_map_interaction(&mut self, interaction: Interaction) -> bool {
        if !self.active || !self.device.detect_mobile() || !self.map_seen.admit(&interaction.seq) {
            return false;
        }
        self.map_settle.push(LayoutSignal::MapInteracted);
        true
    }

    /// Returns `true` if the signal was accepted into the debouncer.
    pub fn on_list_scroll(&mut self, interaction: Interaction) -> bool {
        if !self.active || !self.device.detect_mobile() || !self.list_seen.admit(&interaction.seq) {
            return false;
        }
        self.list_settle.push(LayoutSignal::ListScrolled);
        true
    }

    /// Sets the expanded flag (or flips it when `explicit` is `None`) and
    /// recomputes the map height for the current device class.
    pub fn toggle_expand(&mut self, explicit: Option<bool>) -> LayoutState {
        let expanded = explicit.unwrap_or(!self.state.expanded);
        let mobile = self.device.detect_mobile();
        self.state = LayoutState {
            expanded,
            map_height_percent: map_height(mobile, expanded),
        };
        debug!(
            "layout: expanded={expanded} height={}%",
            self.state.map_height_percent
        );
        self.state
    }

    pub fn teardown(&mut self) {
        self.active = false;
        self.map_settle.cancel();
        self.list_settle.cancel();
    }
}
