//! Domain models shared across FIDS modules
//!
//! Flights and announcements mirror the backing store row shapes; the
//! announcement call types carry the wire codes used by both the database
//! and the audio clip naming convention.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Flight lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    Boarding,
    Departed,
    Delayed,
    Cancelled,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "SCHEDULED",
            FlightStatus::Boarding => "BOARDING",
            FlightStatus::Departed => "DEPARTED",
            FlightStatus::Delayed => "DELAYED",
            FlightStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(FlightStatus::Scheduled),
            "BOARDING" => Ok(FlightStatus::Boarding),
            "DEPARTED" => Ok(FlightStatus::Departed),
            "DELAYED" => Ok(FlightStatus::Delayed),
            "CANCELLED" => Ok(FlightStatus::Cancelled),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown flight status: {}",
                other
            ))),
        }
    }
}

/// Scheduled flight as stored in the flights table
///
/// Created and updated externally (operations staff or upstream feed);
/// the announcement scheduler only reads flights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub airline_code: String,
    pub origin_airport: String,
    pub destination_airport: String,
    pub scheduled_time: DateTime<Utc>,
    pub actual_time: Option<DateTime<Utc>>,
    pub status: FlightStatus,
    pub gate: String,
    pub terminal: String,
    pub aircraft_type: String,
    /// Airport whose board this flight appears on
    pub airport_code: String,
}

/// Gate announcement call type
///
/// Variant order is the real-world urgency order: when two call types for
/// the same flight become due at the same instant, the earlier variant
/// fires first. The wire codes (`1st`, `2nd`, `Boarding`, `LastCall`) are
/// shared by the announcements table and the clip naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnnouncementType {
    #[serde(rename = "1st")]
    FirstCall,
    #[serde(rename = "2nd")]
    SecondCall,
    #[serde(rename = "Boarding")]
    BoardingCall,
    #[serde(rename = "LastCall")]
    LastCall,
}

impl AnnouncementType {
    /// All call types, in firing order
    pub const ALL: [AnnouncementType; 4] = [
        AnnouncementType::FirstCall,
        AnnouncementType::SecondCall,
        AnnouncementType::BoardingCall,
        AnnouncementType::LastCall,
    ];

    /// Wire code used in the database and in clip file names
    pub fn code(&self) -> &'static str {
        match self {
            AnnouncementType::FirstCall => "1st",
            AnnouncementType::SecondCall => "2nd",
            AnnouncementType::BoardingCall => "Boarding",
            AnnouncementType::LastCall => "LastCall",
        }
    }

    /// Minutes before scheduled departure at which this call is due
    pub fn offset_minutes(&self) -> i64 {
        match self {
            AnnouncementType::FirstCall => 60,
            AnnouncementType::SecondCall => 40,
            AnnouncementType::BoardingCall => 30,
            AnnouncementType::LastCall => 15,
        }
    }

    /// Instant at which this call is due for a departure at `scheduled_time`
    pub fn due_time(&self, scheduled_time: DateTime<Utc>) -> DateTime<Utc> {
        scheduled_time - Duration::minutes(self.offset_minutes())
    }
}

impl fmt::Display for AnnouncementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AnnouncementType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1st" => Ok(AnnouncementType::FirstCall),
            "2nd" => Ok(AnnouncementType::SecondCall),
            "Boarding" => Ok(AnnouncementType::BoardingCall),
            "LastCall" => Ok(AnnouncementType::LastCall),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown announcement type: {}",
                other
            ))),
        }
    }
}

/// Recorded announcement playback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub announcement_type: AnnouncementType,
    pub played_at: DateTime<Utc>,
    /// Operator who triggered the playback; None for timer-driven auto-play
    pub played_by: Option<Uuid>,
    pub airport_code: String,
}

/// User role gating the management views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "operator" => Ok(Role::Operator),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown role: {}",
                other
            ))),
        }
    }
}

/// Dashboard user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    /// Airports whose boards this user may select
    pub airport_codes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this user may view the given airport's board
    ///
    /// Admins may view every board regardless of their airport list.
    pub fn may_view(&self, airport_code: &str) -> bool {
        self.role == Role::Admin || self.airport_codes.iter().any(|c| c == airport_code)
    }
}
