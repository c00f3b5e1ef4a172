//! Announcement clip path resolution
//!
//! Clip naming convention (fixed contract with the recorded clip library):
//!
//! `/mp3/DEP/{airlineCode}/{flightNumber}/{flightNumber}{destinationCode}DEP_{callType}_Gate{gate}_sr_en.mp3`
//!
//! where `airlineCode` is the first two characters of the flight number
//! and `callType` is the call's wire code (1st, 2nd, Boarding, LastCall).

use crate::error::{Error, Result};
use fids_common::{AnnouncementType, Flight};

/// Resolve the clip path for a flight and call type
///
/// Deterministic: depends only on flight number, destination, and gate.
/// Fails when the flight number is too short to carry an airline prefix.
pub fn clip_path(flight: &Flight, call: AnnouncementType) -> Result<String> {
    let airline: String = flight.flight_number.chars().take(2).collect();
    if airline.chars().count() < 2 {
        return Err(Error::Playback(format!(
            "Flight number '{}' too short to derive airline code",
            flight.flight_number
        )));
    }

    Ok(format!(
        "/mp3/DEP/{airline}/{number}/{number}{dest}DEP_{call}_Gate{gate}_sr_en.mp3",
        airline = airline,
        number = flight.flight_number,
        dest = flight.destination_airport,
        call = call.code(),
        gate = flight.gate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fids_common::FlightStatus;
    use uuid::Uuid;

    fn flight(number: &str, dest: &str, gate: &str) -> Flight {
        Flight {
            id: Uuid::new_v4(),
            flight_number: number.to_string(),
            airline_code: number.chars().take(2).collect(),
            origin_airport: "BEG".into(),
            destination_airport: dest.to_string(),
            scheduled_time: Utc::now(),
            actual_time: None,
            status: FlightStatus::Scheduled,
            gate: gate.to_string(),
            terminal: "2".into(),
            aircraft_type: "A320".into(),
            airport_code: "BEG".into(),
        }
    }

    #[test]
    fn resolves_full_clip_path() {
        let path = clip_path(&flight("SK123", "JFK", "14"), AnnouncementType::BoardingCall).unwrap();
        assert_eq!(path, "/mp3/DEP/SK/SK123/SK123JFKDEP_Boarding_Gate14_sr_en.mp3");
    }

    #[test]
    fn airline_code_is_flight_number_prefix() {
        let path = clip_path(&flight("JU310", "CDG", "A4"), AnnouncementType::FirstCall).unwrap();
        assert_eq!(path, "/mp3/DEP/JU/JU310/JU310CDGDEP_1st_GateA4_sr_en.mp3");
    }

    #[test]
    fn each_call_type_uses_its_wire_code() {
        for (call, code) in [
            (AnnouncementType::FirstCall, "1st"),
            (AnnouncementType::SecondCall, "2nd"),
            (AnnouncementType::BoardingCall, "Boarding"),
            (AnnouncementType::LastCall, "LastCall"),
        ] {
            let path = clip_path(&flight("SK123", "JFK", "14"), call).unwrap();
            assert!(path.contains(&format!("DEP_{}_Gate", code)), "path: {}", path);
        }
    }

    #[test]
    fn short_flight_number_is_rejected() {
        assert!(clip_path(&flight("7", "JFK", "14"), AnnouncementType::LastCall).is_err());
    }
}
