//! Announcement history queries
//!
//! The played set that seeds the scheduler comes from here: a reloaded
//! dashboard, or a second instance, must see playbacks recorded by others.

use crate::error::{Error, Result};
use fids_common::{time, Announcement, AnnouncementType};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// History entry joined with flight details for the history view
#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub flight_number: String,
    pub destination_airport: String,
    pub announcement_type: AnnouncementType,
    pub played_at: chrono::DateTime<chrono::Utc>,
    pub played_by: Option<Uuid>,
    pub airport_code: String,
}

/// Record a playback
///
/// The UNIQUE index on (flight_id, announcement_type) turns a duplicate
/// insert into an error; callers treat that as "already played".
pub async fn record(pool: &Pool<Sqlite>, announcement: &Announcement) -> Result<()> {
    sqlx::query(
        "INSERT INTO announcements (id, flight_id, announcement_type, played_at, played_by, airport_code)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(announcement.id.to_string())
    .bind(announcement.flight_id.to_string())
    .bind(announcement.announcement_type.code())
    .bind(time::to_db(announcement.played_at))
    .bind(announcement.played_by.map(|id| id.to_string()))
    .bind(&announcement.airport_code)
    .execute(pool)
    .await?;

    Ok(())
}

/// All (flight, type) keys already played for an airport
pub async fn played_keys(
    pool: &Pool<Sqlite>,
    airport_code: &str,
) -> Result<Vec<(Uuid, AnnouncementType)>> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT flight_id, announcement_type FROM announcements WHERE airport_code = ?",
    )
    .bind(airport_code)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(flight_id, call)| {
            let flight_id = Uuid::parse_str(&flight_id)
                .map_err(|e| Error::Internal(format!("Invalid announcement flight UUID: {}", e)))?;
            let call: AnnouncementType = call.parse()?;
            Ok((flight_id, call))
        })
        .collect()
}

/// Announcement history for an airport, newest first
pub async fn history(pool: &Pool<Sqlite>, airport_code: &str) -> Result<Vec<HistoryEntry>> {
    let rows = sqlx::query_as::<_, (String, String, String, String, String, Option<String>, String)>(
        "SELECT a.id, a.flight_id, f.flight_number, f.destination_airport,
                a.announcement_type, a.played_by, a.played_at
         FROM announcements a
         JOIN flights f ON f.id = a.flight_id
         WHERE a.airport_code = ?
         ORDER BY a.played_at DESC",
    )
    .bind(airport_code)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(
            |(id, flight_id, flight_number, destination_airport, call, played_by, played_at)| {
                Ok(HistoryEntry {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| Error::Internal(format!("Invalid announcement UUID: {}", e)))?,
                    flight_id: Uuid::parse_str(&flight_id)
                        .map_err(|e| Error::Internal(format!("Invalid flight UUID: {}", e)))?,
                    flight_number,
                    destination_airport,
                    announcement_type: call.parse()?,
                    played_at: time::from_db(&played_at)?,
                    played_by: played_by
                        .as_deref()
                        .map(Uuid::parse_str)
                        .transpose()
                        .map_err(|e| Error::Internal(format!("Invalid operator UUID: {}", e)))?,
                    airport_code: airport_code.to_string(),
                })
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fids_common::{Flight, FlightStatus};
    use tempfile::TempDir;

    async fn pool(tmp: &TempDir) -> Pool<Sqlite> {
        let pool = crate::db::init::connect(&tmp.path().join("test.db"))
            .await
            .unwrap();
        crate::db::init::init_schema(&pool).await.unwrap();
        pool
    }

    fn flight(number: &str) -> Flight {
        Flight {
            id: Uuid::new_v4(),
            flight_number: number.to_string(),
            airline_code: number.chars().take(2).collect(),
            origin_airport: "BEG".into(),
            destination_airport: "JFK".into(),
            scheduled_time: time::now() + Duration::hours(2),
            actual_time: None,
            status: FlightStatus::Scheduled,
            gate: "14".into(),
            terminal: "2".into(),
            aircraft_type: "A320".into(),
            airport_code: "BEG".into(),
        }
    }

    fn announcement(
        flight: &Flight,
        call: AnnouncementType,
        played_at: chrono::DateTime<chrono::Utc>,
    ) -> Announcement {
        Announcement {
            id: Uuid::new_v4(),
            flight_id: flight.id,
            announcement_type: call,
            played_at,
            played_by: None,
            airport_code: flight.airport_code.clone(),
        }
    }

    #[tokio::test]
    async fn history_is_newest_first_with_flight_details() {
        let tmp = TempDir::new().unwrap();
        let pool = pool(&tmp).await;
        let f = flight("SK123");
        crate::db::flights::insert(&pool, &f).await.unwrap();

        let base = time::now();
        record(
            &pool,
            &announcement(&f, AnnouncementType::FirstCall, base - Duration::minutes(20)),
        )
        .await
        .unwrap();
        record(&pool, &announcement(&f, AnnouncementType::SecondCall, base))
            .await
            .unwrap();

        let entries = history(&pool, "BEG").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].announcement_type, AnnouncementType::SecondCall);
        assert_eq!(entries[1].announcement_type, AnnouncementType::FirstCall);
        assert_eq!(entries[0].flight_number, "SK123");
        assert_eq!(entries[0].destination_airport, "JFK");
    }

    #[tokio::test]
    async fn duplicate_key_insert_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let pool = pool(&tmp).await;
        let f = flight("JU310");
        crate::db::flights::insert(&pool, &f).await.unwrap();

        record(&pool, &announcement(&f, AnnouncementType::BoardingCall, time::now()))
            .await
            .unwrap();
        let dup = announcement(&f, AnnouncementType::BoardingCall, time::now());
        assert!(record(&pool, &dup).await.is_err());

        let keys = played_keys(&pool, "BEG").await.unwrap();
        assert_eq!(keys, vec![(f.id, AnnouncementType::BoardingCall)]);
    }

    #[tokio::test]
    async fn deleting_a_flight_cascades_to_history() {
        let tmp = TempDir::new().unwrap();
        let pool = pool(&tmp).await;
        let f = flight("SK123");
        crate::db::flights::insert(&pool, &f).await.unwrap();
        record(&pool, &announcement(&f, AnnouncementType::LastCall, time::now()))
            .await
            .unwrap();

        crate::db::flights::delete(&pool, f.id).await.unwrap();
        assert!(history(&pool, "BEG").await.unwrap().is_empty());
    }
}
