//! Schedule entries and due-time derivation
//!
//! A schedule entry is scheduler-owned, in-memory state: it exists only
//! between arming and firing (or cancellation) and is never persisted.

use chrono::{DateTime, Utc};
use fids_common::{AnnouncementType, Flight};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use uuid::Uuid;

/// Identity of one announcement firing: (flight, call type)
pub type AnnouncementKey = (Uuid, AnnouncementType);

/// An armed announcement awaiting its due-time
///
/// Ordered by (due time, call type): entries due at the same instant fire
/// in call urgency order (first call before last call).
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub flight_id: Uuid,
    pub call: AnnouncementType,
    pub due: DateTime<Utc>,
    /// Generation the entry was armed under; stale entries are discarded
    /// when popped after an airport switch
    pub epoch: u64,
}

impl ScheduleEntry {
    pub fn key(&self) -> AnnouncementKey {
        (self.flight_id, self.call)
    }
}

impl PartialEq for ScheduleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduleEntry {}

impl PartialOrd for ScheduleEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduleEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then(self.call.cmp(&other.call))
            .then(self.flight_id.cmp(&other.flight_id))
    }
}

/// "Next announcement" display info for a flight row
#[derive(Debug, Clone, Serialize)]
pub struct NextAnnouncement {
    pub announcement_type: AnnouncementType,
    pub due_time: DateTime<Utc>,
}

/// Pick the next announcement for a flight: minimum due-time among
/// not-yet-played, strictly future call types. None when nothing remains.
pub fn next_announcement(
    flight: &Flight,
    played: &HashSet<AnnouncementKey>,
    now: DateTime<Utc>,
) -> Option<NextAnnouncement> {
    AnnouncementType::ALL
        .iter()
        .filter_map(|&call| {
            let due = call.due_time(flight.scheduled_time);
            if due > now && !played.contains(&(flight.id, call)) {
                Some(NextAnnouncement {
                    announcement_type: call,
                    due_time: due,
                })
            } else {
                None
            }
        })
        .min_by_key(|next| (next.due_time, next.announcement_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use fids_common::FlightStatus;
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    fn flight(departure: DateTime<Utc>) -> Flight {
        Flight {
            id: Uuid::new_v4(),
            flight_number: "SK123".into(),
            airline_code: "SK".into(),
            origin_airport: "BEG".into(),
            destination_airport: "JFK".into(),
            scheduled_time: departure,
            actual_time: None,
            status: FlightStatus::Scheduled,
            gate: "14".into(),
            terminal: "2".into(),
            aircraft_type: "A320".into(),
            airport_code: "BEG".into(),
        }
    }

    #[test]
    fn entries_order_by_due_then_call() {
        let due = Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0).unwrap();
        let id = Uuid::new_v4();
        let mut heap = BinaryHeap::new();
        for call in [
            AnnouncementType::LastCall,
            AnnouncementType::FirstCall,
            AnnouncementType::BoardingCall,
        ] {
            heap.push(Reverse(ScheduleEntry {
                flight_id: id,
                call,
                due,
                epoch: 0,
            }));
        }
        // Later due-time sorts after all equal-instant entries
        heap.push(Reverse(ScheduleEntry {
            flight_id: id,
            call: AnnouncementType::FirstCall,
            due: due + Duration::minutes(1),
            epoch: 0,
        }));

        let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|Reverse(e)| (e.due, e.call))).collect();
        assert_eq!(
            order,
            vec![
                (due, AnnouncementType::FirstCall),
                (due, AnnouncementType::BoardingCall),
                (due, AnnouncementType::LastCall),
                (due + Duration::minutes(1), AnnouncementType::FirstCall),
            ]
        );
    }

    #[test]
    fn next_announcement_picks_earliest_unplayed_future_call() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0).unwrap();
        // Departure in 45 minutes: first call (T-60) is already past,
        // second call (T-40) is due in 5 minutes.
        let f = flight(now + Duration::minutes(45));
        let mut played = HashSet::new();

        let next = next_announcement(&f, &played, now).unwrap();
        assert_eq!(next.announcement_type, AnnouncementType::SecondCall);
        assert_eq!(next.due_time, now + Duration::minutes(5));

        played.insert((f.id, AnnouncementType::SecondCall));
        let next = next_announcement(&f, &played, now).unwrap();
        assert_eq!(next.announcement_type, AnnouncementType::BoardingCall);
    }

    #[test]
    fn next_announcement_none_when_all_due_times_past() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0).unwrap();
        let f = flight(now + Duration::minutes(10));
        assert!(next_announcement(&f, &HashSet::new(), now).is_none());
    }

    #[test]
    fn next_announcement_skips_played_calls() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0).unwrap();
        let f = flight(now + Duration::minutes(61));
        let mut played = HashSet::new();
        played.insert((f.id, AnnouncementType::FirstCall));

        let next = next_announcement(&f, &played, now).unwrap();
        assert_eq!(next.announcement_type, AnnouncementType::SecondCall);
    }
}
