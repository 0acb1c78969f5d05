/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
pub struct BookingReference(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
pub struct RideId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
pub struct RoomId(pub String);
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Hash, Ord)]
pub struct TimeStamp(pub DateTime<Utc>);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
pub struct Latitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
pub struct Longitude(pub f64);

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Point {
    pub lat: Latitude,
    pub lon: Longitude,
}

/// Canonical ride lifecycle states. The discriminant is the milestone rank
/// used for monotonic-forward comparison; `CANCELLED` sits outside the
/// milestone ladder and always wins once observed.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    EnumIter,
    EnumString,
    Display,
)]
pub enum RideStatus {
    #[strum(serialize = "BOOKED")]
    #[serde(rename = "BOOKED")]
    Booked = 0,
    #[strum(serialize = "DISPATCHED")]
    #[serde(rename = "DISPATCHED")]
    Dispatched = 1,
    #[strum(serialize = "VEHICLE_ARRIVED")]
    #[serde(rename = "VEHICLE_ARRIVED")]
    VehicleArrived = 2,
    #[strum(serialize = "PASSENGER_ON_BOARD")]
    #[serde(rename = "PASSENGER_ON_BOARD")]
    PassengerOnBoard = 3,
    #[strum(serialize = "COMPLETED")]
    #[serde(rename = "COMPLETED")]
    Completed = 4,
    #[strum(serialize = "CANCELLED")]
    #[serde(rename = "CANCELLED")]
    Cancelled = 5,
}

impl RideStatus {
    pub fn milestone_rank(&self) -> Option<usize> {
        match self {
            RideStatus::Cancelled => None,
            status => Some(*status as usize),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }
}

/// Tag of a single lifecycle event as delivered on the wire. Unrecognized
/// tags are preserved verbatim so they can still be described in the recent
/// events log; they never change the derived status.
#[derive(Debug, Clone, Eq, Hash, PartialEq, EnumString)]
pub enum RideEventType {
    #[strum(serialize = "BOOKED")]
    Booked,
    #[strum(serialize = "DISPATCHED")]
    Dispatched,
    #[strum(serialize = "VEHICLE_ARRIVED")]
    VehicleArrived,
    #[strum(serialize = "PASSENGER_ON_BOARD")]
    PassengerOnBoard,
    #[strum(serialize = "COMPLETED")]
    Completed,
    #[strum(serialize = "CANCELLED")]
    Cancelled,
    #[strum(default)]
    Unknown(String),
}

impl RideEventType {
    pub fn status(&self) -> Option<RideStatus> {
        match self {
            RideEventType::Booked => Some(RideStatus::Booked),
            RideEventType::Dispatched => Some(RideStatus::Dispatched),
            RideEventType::VehicleArrived => Some(RideStatus::VehicleArrived),
            RideEventType::PassengerOnBoard => Some(RideStatus::PassengerOnBoard),
            RideEventType::Completed => Some(RideStatus::Completed),
            RideEventType::Cancelled => Some(RideStatus::Cancelled),
            RideEventType::Unknown(_) => None,
        }
    }

    /// Events that can carry driver identity in their payload.
    pub fn is_dispatch_class(&self) -> bool {
        matches!(
            self,
            RideEventType::Dispatched
                | RideEventType::VehicleArrived
                | RideEventType::PassengerOnBoard
        )
    }
}

impl fmt::Display for RideEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RideEventType::Booked => write!(f, "BOOKED"),
            RideEventType::Dispatched => write!(f, "DISPATCHED"),
            RideEventType::VehicleArrived => write!(f, "VEHICLE_ARRIVED"),
            RideEventType::PassengerOnBoard => write!(f, "PASSENGER_ON_BOARD"),
            RideEventType::Completed => write!(f, "COMPLETED"),
            RideEventType::Cancelled => write!(f, "CANCELLED"),
            RideEventType::Unknown(tag) => write!(f, "{tag}"),
        }
    }
}

/// Structured payload of a dispatch-class event. Every field is optional;
/// absence is never an error.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriverPayload {
    #[serde(alias = "name")]
    pub driver_name: Option<String>,
    #[serde(alias = "phone", alias = "contactNumber")]
    pub driver_phone: Option<String>,
    #[serde(alias = "vehicle")]
    pub vehicle_description: Option<String>,
    #[serde(alias = "licensePlate")]
    pub registration_number: Option<String>,
    #[serde(alias = "photoUrl")]
    pub driver_photo_url: Option<String>,
    #[serde(alias = "eta")]
    pub estimated_arrival: Option<TimeStamp>,
}

impl DriverPayload {
    pub fn has_driver_identity(&self) -> bool {
        self.driver_name.is_some() || self.driver_phone.is_some()
    }
}

/// One normalized lifecycle occurrence. Immutable once constructed; the
/// tracker only derives state from the ordered set.
#[derive(Clone, Debug, PartialEq)]
pub struct RideEvent {
    pub event_type: RideEventType,
    pub timestamp: TimeStamp,
    pub event_data: Option<DriverPayload>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverDetails {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub vehicle_description: Option<String>,
    pub registration_number: Option<String>,
    pub photo_url: Option<String>,
    pub estimated_arrival: Option<TimeStamp>,
}

impl From<&DriverPayload> for DriverDetails {
    fn from(payload: &DriverPayload) -> Self {
        DriverDetails {
            name: payload.driver_name.to_owned(),
            phone: payload.driver_phone.to_owned(),
            vehicle_description: payload.vehicle_description.to_owned(),
            registration_number: payload.registration_number.to_owned(),
            photo_url: payload.driver_photo_url.to_owned(),
            estimated_arrival: payload.estimated_arrival,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, EnumString, Display)]
pub enum MilestoneState {
    DONE,
    CURRENT,
    PENDING,
    ALERT,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub milestone: RideStatus,
    pub state: MilestoneState,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentEvent {
    pub description: String,
    pub happened: String,
    pub timestamp: TimeStamp,
}

/// The tracker's only output. A pure function of the normalized event list,
/// the latest push override and the previous derived state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRideState {
    pub status: RideStatus,
    pub driver_details: Option<DriverDetails>,
    pub timeline: Vec<TimelineEntry>,
    pub recent_events: Vec<RecentEvent>,
    pub last_location: Option<Point>,
    pub last_error: Option<String>,
    pub refreshing: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct APISuccess {
    result: String,
}

impl Default for APISuccess {
    fn default() -> Self {
        Self {
            result: "Success".to_string(),
        }
    }
}
