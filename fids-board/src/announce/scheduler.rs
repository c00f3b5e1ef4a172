//! Announcement scheduler actor
//!
//! One tokio task owns every piece of mutable scheduler state; commands,
//! data-source change signals, fetch completions, and timer expiry are all
//! serialized through a single run loop, so reconciliations can never
//! interleave. There are no global timer registries: everything lives on
//! the actor, and dropping the handle stops it.
//!
//! **Staleness handling:** an epoch counter guards against completions
//! from a previous airport selection (a fetch that resolves after a switch
//! is discarded), and a fetch sequence number makes snapshot application
//! last-write-wins when change signals arrive faster than fetches finish.
//! A superseded fetch is not an error; it is silently dropped.
//!
//! **Cancellation on removal:** flights absent from a fresh snapshot have
//! their pending timers cancelled. The heap is cleaned lazily: a popped
//! entry whose key is no longer armed (or whose epoch is stale) is
//! discarded without firing.

use crate::audio::{clip_path, AudioSink, ClipRequest};
use crate::db;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use fids_common::events::{EventBus, FidsEvent};
use fids_common::{time, Announcement, AnnouncementType, Flight};
use sqlx::{Pool, Sqlite};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::schedule::{next_announcement, AnnouncementKey, NextAnnouncement, ScheduleEntry};

/// Commands accepted by the scheduler actor
enum Command {
    SelectAirport {
        airport_code: String,
        reply: oneshot::Sender<Result<()>>,
    },
    ManualPlay {
        flight_id: Uuid,
        announcement_type: AnnouncementType,
        operator: Option<Uuid>,
        reply: oneshot::Sender<Result<()>>,
    },
    NextAnnouncements {
        reply: oneshot::Sender<HashMap<Uuid, NextAnnouncement>>,
    },
    Refresh {
        reply: oneshot::Sender<()>,
    },
}

/// Completed flight fetch, tagged for staleness checks
struct FetchResult {
    epoch: u64,
    seq: u64,
    flights: Result<Vec<Flight>>,
}

/// Cloneable handle to the scheduler actor
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Command>,
}

impl SchedulerHandle {
    /// Switch the active airport: cancels every pending timer, clears and
    /// re-seeds the played set, and kicks off a fresh fetch
    pub async fn select_airport(&self, airport_code: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::SelectAirport {
                airport_code: airport_code.to_string(),
                reply,
            })
            .await
            .map_err(|_| Error::Scheduler("Scheduler stopped".into()))?;
        rx.await
            .map_err(|_| Error::Scheduler("Scheduler stopped".into()))?
    }

    /// Operator-triggered immediate playback, bypassing the timers
    pub async fn manual_play(
        &self,
        flight_id: Uuid,
        announcement_type: AnnouncementType,
        operator: Option<Uuid>,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::ManualPlay {
                flight_id,
                announcement_type,
                operator,
                reply,
            })
            .await
            .map_err(|_| Error::Scheduler("Scheduler stopped".into()))?;
        rx.await
            .map_err(|_| Error::Scheduler("Scheduler stopped".into()))?
    }

    /// Next-announcement display info per flight in the current snapshot
    pub async fn next_announcements(&self) -> Result<HashMap<Uuid, NextAnnouncement>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::NextAnnouncements { reply })
            .await
            .map_err(|_| Error::Scheduler("Scheduler stopped".into()))?;
        rx.await
            .map_err(|_| Error::Scheduler("Scheduler stopped".into()))
    }

    /// Request a re-fetch and reconcile of the active airport's flights
    pub async fn refresh(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Refresh { reply })
            .await
            .map_err(|_| Error::Scheduler("Scheduler stopped".into()))?;
        rx.await
            .map_err(|_| Error::Scheduler("Scheduler stopped".into()))
    }
}

/// The scheduler actor state; owned exclusively by the run loop
pub struct AnnouncementScheduler {
    db: Pool<Sqlite>,
    sink: Arc<dyn AudioSink>,
    bus: EventBus,

    cmd_rx: mpsc::Receiver<Command>,
    fetch_tx: mpsc::Sender<FetchResult>,
    fetch_rx: mpsc::Receiver<FetchResult>,

    /// Active airport selection; None until the first select
    airport: Option<String>,
    /// Generation token, bumped on every airport switch
    epoch: u64,
    /// Issue counter for fetches
    fetch_seq: u64,
    /// Highest fetch sequence applied for the current epoch
    applied_seq: u64,

    /// (flight, type) keys already fired or recorded as played
    played: HashSet<AnnouncementKey>,
    /// Armed keys and the epoch they were armed under
    armed: HashMap<AnnouncementKey, u64>,
    /// Armed entries in due order; cleaned lazily against `armed`
    heap: BinaryHeap<Reverse<ScheduleEntry>>,
    /// Latest applied flight snapshot
    flights: HashMap<Uuid, Flight>,
}

impl AnnouncementScheduler {
    /// Create the actor and its handle without spawning the run loop
    pub fn new(db: Pool<Sqlite>, sink: Arc<dyn AudioSink>, bus: EventBus) -> (Self, SchedulerHandle) {
        let (tx, cmd_rx) = mpsc::channel(64);
        let (fetch_tx, fetch_rx) = mpsc::channel(8);
        let scheduler = Self {
            db,
            sink,
            bus,
            cmd_rx,
            fetch_tx,
            fetch_rx,
            airport: None,
            epoch: 0,
            fetch_seq: 0,
            applied_seq: 0,
            played: HashSet::new(),
            armed: HashMap::new(),
            heap: BinaryHeap::new(),
            flights: HashMap::new(),
        };
        (scheduler, SchedulerHandle { tx })
    }

    /// Spawn the run loop and return a handle to it
    pub fn spawn(db: Pool<Sqlite>, sink: Arc<dyn AudioSink>, bus: EventBus) -> SchedulerHandle {
        let (scheduler, handle) = Self::new(db, sink, bus);
        tokio::spawn(scheduler.run());
        handle
    }

    /// Run loop: serializes every state mutation on one task
    pub async fn run(mut self) {
        let mut bus_rx = self.bus.subscribe();
        info!("Announcement scheduler started");

        loop {
            let next_due = self.heap.peek().map(|Reverse(entry)| entry.due);

            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                Some(fetched) = self.fetch_rx.recv() => self.handle_fetch(fetched),
                event = bus_rx.recv() => match event {
                    Ok(event) => self.handle_bus_event(event).await,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        // Missed signals are safe: the next one re-fetches
                        // the full snapshot anyway
                        warn!("Scheduler lagged {} bus events", n);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
                _ = sleep_until_due(next_due) => {
                    self.fire_due(time::now()).await;
                }
            }
        }

        info!("Announcement scheduler stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SelectAirport { airport_code, reply } => {
                let result = self.select_airport(airport_code).await;
                let _ = reply.send(result);
            }
            Command::ManualPlay {
                flight_id,
                announcement_type,
                operator,
                reply,
            } => {
                let result = self.manual_play(flight_id, announcement_type, operator).await;
                let _ = reply.send(result);
            }
            Command::NextAnnouncements { reply } => {
                let _ = reply.send(self.next_announcements(time::now()));
            }
            Command::Refresh { reply } => {
                self.trigger_fetch();
                let _ = reply.send(());
            }
        }
    }

    async fn handle_bus_event(&mut self, event: FidsEvent) {
        match event {
            FidsEvent::FlightsChanged { airport_code, .. } => {
                if self.airport.as_deref() == Some(airport_code.as_str()) {
                    self.trigger_fetch();
                }
            }
            FidsEvent::AnnouncementsChanged { airport_code, .. } => {
                // Another instance may have recorded a playback; fold its
                // keys in so our timers do not replay it
                if self.airport.as_deref() == Some(airport_code.as_str()) {
                    if let Err(e) = self.reseed_played().await {
                        warn!("Failed to re-seed played announcements: {}", e);
                    }
                }
            }
            _ => {}
        }
    }

    /// Switch the active airport
    ///
    /// The epoch bump synchronously invalidates every pending timer and
    /// any in-flight fetch for the previous airport before anything is
    /// fetched for the new one.
    async fn select_airport(&mut self, airport_code: String) -> Result<()> {
        info!("Selecting airport {}", airport_code);
        self.epoch += 1;
        self.applied_seq = 0;
        self.armed.clear();
        self.heap.clear();
        self.played.clear();
        self.flights.clear();
        self.airport = Some(airport_code.clone());

        self.reseed_played().await?;

        self.bus.emit_lossy(FidsEvent::AirportSelected {
            airport_code,
            timestamp: time::now(),
        });
        self.trigger_fetch();
        Ok(())
    }

    /// Seed the played set from persisted announcement history
    async fn reseed_played(&mut self) -> Result<()> {
        let Some(airport) = self.airport.clone() else {
            return Ok(());
        };
        let keys = db::announcements::played_keys(&self.db, &airport).await?;
        self.played.extend(keys);
        Ok(())
    }

    /// Issue an asynchronous flight fetch tagged with epoch and sequence
    fn trigger_fetch(&mut self) {
        let Some(airport) = self.airport.clone() else {
            return;
        };
        self.fetch_seq += 1;
        let epoch = self.epoch;
        let seq = self.fetch_seq;
        let db = self.db.clone();
        let tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            let flights = db::flights::fetch_for_airport(&db, &airport, None).await;
            let _ = tx.send(FetchResult { epoch, seq, flights }).await;
        });
    }

    /// Apply a completed fetch unless it has been superseded
    fn handle_fetch(&mut self, fetched: FetchResult) {
        if fetched.epoch != self.epoch {
            debug!("Discarding fetch from superseded airport selection");
            return;
        }
        if fetched.seq <= self.applied_seq {
            debug!("Discarding superseded flight snapshot");
            return;
        }
        match fetched.flights {
            Ok(flights) => {
                self.applied_seq = fetched.seq;
                self.reconcile(flights, time::now());
            }
            Err(e) => warn!("Flight fetch failed: {}", e),
        }
    }

    /// Recompute pending timers from a fresh flight snapshot
    ///
    /// Arms every (flight, type) whose due-time is strictly in the future
    /// and which is neither played nor already armed. Flights absent from
    /// the snapshot get their pending timers cancelled; a departed or
    /// removed flight must never fire afterwards.
    fn reconcile(&mut self, flights: Vec<Flight>, now: DateTime<Utc>) {
        let snapshot: HashMap<Uuid, Flight> = flights.into_iter().map(|f| (f.id, f)).collect();

        let before = self.armed.len();
        self.armed
            .retain(|(flight_id, _), _| snapshot.contains_key(flight_id));
        let cancelled = before - self.armed.len();
        if cancelled > 0 {
            debug!("Cancelled {} timers for removed flights", cancelled);
        }

        for flight in snapshot.values() {
            for call in AnnouncementType::ALL {
                let key = (flight.id, call);
                let due = call.due_time(flight.scheduled_time);
                if due <= now || self.played.contains(&key) || self.armed.contains_key(&key) {
                    continue;
                }
                self.armed.insert(key, self.epoch);
                self.heap.push(Reverse(ScheduleEntry {
                    flight_id: flight.id,
                    call,
                    due,
                    epoch: self.epoch,
                }));
            }
        }

        self.flights = snapshot;
        debug!(
            "Reconciled: {} flights, {} timers armed",
            self.flights.len(),
            self.armed.len()
        );
    }

    /// Fire every armed entry whose due-time has passed, in due order
    async fn fire_due(&mut self, now: DateTime<Utc>) {
        loop {
            let due_now = matches!(self.heap.peek(), Some(Reverse(entry)) if entry.due <= now);
            if !due_now {
                break;
            }
            let Reverse(entry) = self.heap.pop().expect("peeked entry");

            // Lazy cancellation: stale epoch or disarmed key
            if entry.epoch != self.epoch {
                continue;
            }
            match self.armed.get(&entry.key()) {
                Some(&epoch) if epoch == entry.epoch => {}
                _ => continue,
            }
            self.armed.remove(&entry.key());

            self.fire(entry.flight_id, entry.call).await;
        }
    }

    /// Timer-driven firing of one announcement
    ///
    /// A failure is surfaced as an event and leaves the key unplayed for
    /// manual replay; it never disturbs other pending timers.
    async fn fire(&mut self, flight_id: Uuid, call: AnnouncementType) {
        let key = (flight_id, call);
        // The key may have been recorded by another path between arming
        // and firing
        if self.played.contains(&key) {
            return;
        }
        let Some(flight) = self.flights.get(&flight_id).cloned() else {
            return;
        };

        if let Err(e) = self.play_and_record(&flight, call, None, false).await {
            warn!(
                "Announcement {} for flight {} failed: {}",
                call, flight.flight_number, e
            );
            self.bus.emit_lossy(FidsEvent::AnnouncementFailed {
                flight_id,
                flight_number: flight.flight_number.clone(),
                announcement_type: call,
                reason: e.to_string(),
                timestamp: time::now(),
            });
        }
    }

    /// Operator-triggered playback; only the played-once precondition
    /// applies, the due-time does not
    async fn manual_play(
        &mut self,
        flight_id: Uuid,
        call: AnnouncementType,
        operator: Option<Uuid>,
    ) -> Result<()> {
        let key = (flight_id, call);
        if self.played.contains(&key) {
            return Err(Error::AlreadyPlayed(format!(
                "{} call already played for flight {}",
                call, flight_id
            )));
        }

        let flight = match self.flights.get(&flight_id) {
            Some(flight) => flight.clone(),
            None => db::flights::get(&self.db, flight_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Flight not found: {}", flight_id)))?,
        };

        self.play_and_record(&flight, call, operator, true).await?;
        // Disarm any pending timer for the same key
        self.armed.remove(&key);
        Ok(())
    }

    /// Shared playback path: resolve clip, start the sink, persist the
    /// announcement, then mark the key played
    async fn play_and_record(
        &mut self,
        flight: &Flight,
        call: AnnouncementType,
        operator: Option<Uuid>,
        manual: bool,
    ) -> Result<()> {
        let clip = clip_path(flight, call)?;

        self.sink
            .play(ClipRequest {
                clip_path: clip.clone(),
                flight_id: flight.id,
                announcement_type: call,
            })
            .await?;

        let announcement = Announcement {
            id: Uuid::new_v4(),
            flight_id: flight.id,
            announcement_type: call,
            played_at: time::now(),
            played_by: operator,
            airport_code: flight.airport_code.clone(),
        };
        db::announcements::record(&self.db, &announcement).await?;

        self.played.insert((flight.id, call));
        info!(
            "Played {} call for flight {} ({})",
            call,
            flight.flight_number,
            if manual { "manual" } else { "scheduled" }
        );
        self.bus.emit_lossy(FidsEvent::AnnouncementStarted {
            flight_id: flight.id,
            flight_number: flight.flight_number.clone(),
            announcement_type: call,
            clip_path: clip,
            manual,
            timestamp: time::now(),
        });
        self.bus.emit_lossy(FidsEvent::AnnouncementsChanged {
            airport_code: flight.airport_code.clone(),
            timestamp: time::now(),
        });
        Ok(())
    }

    /// Next-announcement display info per flight in the current snapshot
    fn next_announcements(&self, now: DateTime<Utc>) -> HashMap<Uuid, NextAnnouncement> {
        self.flights
            .values()
            .filter_map(|flight| {
                next_announcement(flight, &self.played, now).map(|next| (flight.id, next))
            })
            .collect()
    }
}

/// Sleep until the earliest due-time, or forever when nothing is armed
async fn sleep_until_due(next_due: Option<DateTime<Utc>>) {
    match next_due {
        Some(due) => {
            let delay = (due - time::now()).to_std().unwrap_or_default();
            tokio::time::sleep(delay).await;
        }
        None => std::future::pending().await,
    }
}
