//! Scheduler actor integration tests
//!
//! Exercise the spawned scheduler through its handle: airport
//! selection, re-fetch on change signals, and manual playback.

mod helpers;

use std::time::Duration;

use chrono::Duration as ChronoDuration;
use fids_board::db;
use fids_board::error::Error;
use fids_common::events::FidsEvent;
use fids_common::{time, AnnouncementType, Flight, FlightStatus};
use helpers::TestApp;
use uuid::Uuid;

fn flight(airport: &str, minutes_from_now: i64) -> Flight {
    Flight {
        id: Uuid::new_v4(),
        flight_number: "SK123".to_string(),
        airline_code: "SK".to_string(),
        origin_airport: airport.to_string(),
        destination_airport: "JFK".to_string(),
        scheduled_time: time::now() + ChronoDuration::minutes(minutes_from_now),
        actual_time: None,
        status: FlightStatus::Scheduled,
        gate: "14".to_string(),
        terminal: "2".to_string(),
        aircraft_type: "A320".to_string(),
        airport_code: airport.to_string(),
    }
}

/// Poll the handle until the flight shows a pending announcement, or
/// give up after a second
async fn wait_for_armed(app: &TestApp, flight_id: Uuid) -> Option<AnnouncementType> {
    for _ in 0..100 {
        let next = app.scheduler.next_announcements().await.unwrap();
        if let Some(entry) = next.get(&flight_id) {
            return Some(entry.announcement_type);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

#[tokio::test]
async fn airport_select_arms_pending_announcements() {
    let app = TestApp::new().await.unwrap();
    let flight = flight("BEG", 120);
    db::flights::insert(&app.db_pool, &flight).await.unwrap();

    app.scheduler.select_airport("BEG").await.unwrap();

    // All four calls are in the future, so the earliest wins
    let next = wait_for_armed(&app, flight.id).await;
    assert_eq!(next, Some(AnnouncementType::FirstCall));
}

#[tokio::test]
async fn flights_changed_signal_triggers_refetch() {
    let app = TestApp::new().await.unwrap();
    app.scheduler.select_airport("BEG").await.unwrap();

    let next = app.scheduler.next_announcements().await.unwrap();
    assert!(next.is_empty());

    let flight = flight("BEG", 90);
    db::flights::insert(&app.db_pool, &flight).await.unwrap();
    app.bus.emit_lossy(FidsEvent::FlightsChanged {
        airport_code: "BEG".to_string(),
        timestamp: time::now(),
    });

    assert_eq!(
        wait_for_armed(&app, flight.id).await,
        Some(AnnouncementType::FirstCall)
    );
}

#[tokio::test]
async fn manual_play_records_and_rejects_replay() {
    let app = TestApp::new().await.unwrap();
    let flight = flight("BEG", 45);
    db::flights::insert(&app.db_pool, &flight).await.unwrap();
    app.scheduler.select_airport("BEG").await.unwrap();
    wait_for_armed(&app, flight.id).await;

    app.scheduler
        .manual_play(flight.id, AnnouncementType::BoardingCall, Some(app.operator_id))
        .await
        .unwrap();

    let played = app.sink.played();
    assert_eq!(played.len(), 1);
    assert_eq!(
        played[0].clip_path,
        "/mp3/DEP/SK/SK123/SK123JFKDEP_Boarding_Gate14_sr_en.mp3"
    );

    let history = db::announcements::history(&app.db_pool, "BEG")
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].played_by, Some(app.operator_id));

    // Each (flight, type) pair plays at most once
    let replay = app
        .scheduler
        .manual_play(flight.id, AnnouncementType::BoardingCall, Some(app.operator_id))
        .await;
    assert!(matches!(replay, Err(Error::AlreadyPlayed(_))));
    assert_eq!(app.sink.played().len(), 1);
}

#[tokio::test]
async fn airport_switch_drops_previous_schedule() {
    let app = TestApp::new().await.unwrap();
    let flight = flight("BEG", 120);
    db::flights::insert(&app.db_pool, &flight).await.unwrap();

    app.scheduler.select_airport("BEG").await.unwrap();
    assert!(wait_for_armed(&app, flight.id).await.is_some());

    app.scheduler.select_airport("TSR").await.unwrap();
    app.scheduler.refresh().await.unwrap();
    let next = app.scheduler.next_announcements().await.unwrap();
    assert!(next.is_empty());
}
