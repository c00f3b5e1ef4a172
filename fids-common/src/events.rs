//! Event types for the FIDS event system
//!
//! Provides shared event definitions and EventBus for all FIDS modules.
//! Realtime change events are signals, not row deltas: a consumer that
//! receives `FlightsChanged` re-fetches the full flight list for that
//! airport rather than patching local state.

use crate::types::AnnouncementType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// FIDS event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission to connected dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FidsEvent {
    /// A flight row was inserted, updated, or deleted
    ///
    /// Triggers:
    /// - Scheduler: re-fetch and reconcile the flight snapshot
    /// - SSE: boards refresh their flight list
    FlightsChanged {
        /// Airport whose board is affected
        airport_code: String,
        /// When the change was observed
        timestamp: DateTime<Utc>,
    },

    /// An announcement row was recorded
    ///
    /// Triggers:
    /// - Scheduler: re-seed the played set (another instance may have
    ///   recorded the playback)
    /// - SSE: history view refresh
    AnnouncementsChanged {
        airport_code: String,
        timestamp: DateTime<Utc>,
    },

    /// An announcement playback started on the audio sink
    AnnouncementStarted {
        flight_id: Uuid,
        flight_number: String,
        announcement_type: AnnouncementType,
        /// Resolved clip path relative to the audio root
        clip_path: String,
        /// True when operator-triggered rather than timer-driven
        manual: bool,
        timestamp: DateTime<Utc>,
    },

    /// An announcement could not be played or recorded
    ///
    /// The (flight, type) key is left unplayed so an operator may retry
    /// via manual playback. There is no automatic retry.
    AnnouncementFailed {
        flight_id: Uuid,
        flight_number: String,
        announcement_type: AnnouncementType,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The scheduler switched its active airport
    AirportSelected {
        airport_code: String,
        timestamp: DateTime<Utc>,
    },
}

impl FidsEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_name(&self) -> &'static str {
        match self {
            FidsEvent::FlightsChanged { .. } => "FlightsChanged",
            FidsEvent::AnnouncementsChanged { .. } => "AnnouncementsChanged",
            FidsEvent::AnnouncementStarted { .. } => "AnnouncementStarted",
            FidsEvent::AnnouncementFailed { .. } => "AnnouncementFailed",
            FidsEvent::AirportSelected { .. } => "AirportSelected",
        }
    }
}

/// Central event distribution bus for application-wide events
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FidsEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<FidsEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    pub fn emit(
        &self,
        event: FidsEvent,
    ) -> Result<usize, broadcast::error::SendError<FidsEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    pub fn emit_lossy(&self, event: FidsEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
