//! Flight queries
//!
//! The board query filters to a day window `[date 00:00:00, date 23:59:59]`
//! (UTC, see `fids_common::time::day_window`), defaulting to "now through
//! +24h" when no date is given.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use fids_common::{time, Flight, FlightStatus};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Raw flights table row; parsed into the domain model by `into_flight`
#[derive(Debug, sqlx::FromRow)]
struct FlightRow {
    id: String,
    flight_number: String,
    airline_code: String,
    origin_airport: String,
    destination_airport: String,
    scheduled_time: String,
    actual_time: Option<String>,
    status: String,
    gate: String,
    terminal: String,
    aircraft_type: String,
    airport_code: String,
}

impl FlightRow {
    fn into_flight(self) -> Result<Flight> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Internal(format!("Invalid flight UUID: {}", e)))?;
        let scheduled_time = time::from_db(&self.scheduled_time)?;
        let actual_time = self.actual_time.as_deref().map(time::from_db).transpose()?;
        let status: FlightStatus = self.status.parse()?;

        Ok(Flight {
            id,
            flight_number: self.flight_number,
            airline_code: self.airline_code,
            origin_airport: self.origin_airport,
            destination_airport: self.destination_airport,
            scheduled_time,
            actual_time,
            status,
            gate: self.gate,
            terminal: self.terminal,
            aircraft_type: self.aircraft_type,
            airport_code: self.airport_code,
        })
    }
}

/// List flights for an airport within the day window, departure order
pub async fn fetch_for_airport(
    pool: &Pool<Sqlite>,
    airport_code: &str,
    date: Option<NaiveDate>,
) -> Result<Vec<Flight>> {
    let (start, end) = time::day_window(date);

    let rows = sqlx::query_as::<_, FlightRow>(
        "SELECT id, flight_number, airline_code, origin_airport, destination_airport,
                scheduled_time, actual_time, status, gate, terminal, aircraft_type, airport_code
         FROM flights
         WHERE airport_code = ? AND scheduled_time >= ? AND scheduled_time <= ?
         ORDER BY scheduled_time ASC",
    )
    .bind(airport_code)
    .bind(time::to_db(start))
    .bind(time::to_db(end))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(FlightRow::into_flight).collect()
}

/// Fetch a single flight by id
pub async fn get(pool: &Pool<Sqlite>, id: Uuid) -> Result<Option<Flight>> {
    let row = sqlx::query_as::<_, FlightRow>(
        "SELECT id, flight_number, airline_code, origin_airport, destination_airport,
                scheduled_time, actual_time, status, gate, terminal, aircraft_type, airport_code
         FROM flights WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(FlightRow::into_flight).transpose()
}

/// Insert a new flight row
pub async fn insert(pool: &Pool<Sqlite>, flight: &Flight) -> Result<()> {
    sqlx::query(
        "INSERT INTO flights (id, flight_number, airline_code, origin_airport,
                destination_airport, scheduled_time, actual_time, status, gate,
                terminal, aircraft_type, airport_code)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(flight.id.to_string())
    .bind(&flight.flight_number)
    .bind(&flight.airline_code)
    .bind(&flight.origin_airport)
    .bind(&flight.destination_airport)
    .bind(time::to_db(flight.scheduled_time))
    .bind(flight.actual_time.map(time::to_db))
    .bind(flight.status.as_str())
    .bind(&flight.gate)
    .bind(&flight.terminal)
    .bind(&flight.aircraft_type)
    .bind(&flight.airport_code)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace an existing flight row
pub async fn update(pool: &Pool<Sqlite>, flight: &Flight) -> Result<()> {
    let result = sqlx::query(
        "UPDATE flights SET flight_number = ?, airline_code = ?, origin_airport = ?,
                destination_airport = ?, scheduled_time = ?, actual_time = ?, status = ?,
                gate = ?, terminal = ?, aircraft_type = ?, airport_code = ?
         WHERE id = ?",
    )
    .bind(&flight.flight_number)
    .bind(&flight.airline_code)
    .bind(&flight.origin_airport)
    .bind(&flight.destination_airport)
    .bind(time::to_db(flight.scheduled_time))
    .bind(flight.actual_time.map(time::to_db))
    .bind(flight.status.as_str())
    .bind(&flight.gate)
    .bind(&flight.terminal)
    .bind(&flight.aircraft_type)
    .bind(&flight.airport_code)
    .bind(flight.id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Flight not found: {}", flight.id)));
    }
    Ok(())
}

/// Delete a flight row; returns false when the id was unknown
pub async fn delete(pool: &Pool<Sqlite>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM flights WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
