/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::common::utils::relative_time_text;
use crate::tracker::timeline::build_timeline;

/// Result of one forward scan over the normalized event sequence.
pub struct StatusFold {
    pub progressed: Option<RideStatus>,
    pub cancelled: bool,
    pub driver_details: Option<DriverDetails>,
}

fn milestone_max(left: RideStatus, right: RideStatus) -> RideStatus {
    if left.milestone_rank() >= right.milestone_rank() {
        left
    } else {
        right
    }
}

/// Single scan, monotonic-forward: remember the highest milestone observed,
/// latch cancellation wherever it appears, and keep the newest dispatch-class
/// driver payload. Unknown tags never move the status.
pub fn fold_events(events: &[RideEvent]) -> StatusFold {
    let mut progressed: Option<RideStatus> = None;
    let mut cancelled = false;
    let mut driver_details: Option<DriverDetails> = None;

    for event in events {
        match event.event_type.status() {
            Some(RideStatus::Cancelled) => cancelled = true,
            Some(status) => {
                progressed = Some(match progressed {
                    Some(current) => milestone_max(current, status),
                    None => status,
                });
            }
            None => {}
        }

        if event.event_type.is_dispatch_class() {
            if let Some(payload) = &event.event_data {
                if payload.has_driver_identity() {
                    driver_details = Some(DriverDetails::from(payload));
                }
            }
        }
    }

    StatusFold {
        progressed,
        cancelled,
        driver_details,
    }
}

/// Combines the event-derived status with the out-of-band push override and
/// the previously derived status.
///
/// Cancellation wins unconditionally from any source and is never revoked by
/// a later batch. Otherwise the highest milestone rank wins, so an override
/// survives a poll that derives an "earlier" status, and a stale batch can
/// never regress previously shown progress.
pub fn effective_status(
    fold: &StatusFold,
    override_status: Option<RideStatus>,
    previous_status: Option<RideStatus>,
) -> RideStatus {
    if fold.cancelled
        || override_status == Some(RideStatus::Cancelled)
        || previous_status == Some(RideStatus::Cancelled)
    {
        return RideStatus::Cancelled;
    }

    let mut status = fold.progressed.unwrap_or(RideStatus::Booked);
    if let Some(overridden) = override_status {
        status = milestone_max(status, overridden);
    }
    if let Some(previous) = previous_status {
        status = milestone_max(status, previous);
    }
    status
}

pub fn initial_ride_state() -> DerivedRideState {
    DerivedRideState {
        status: RideStatus::Booked,
        driver_details: None,
        timeline: build_timeline(RideStatus::Booked),
        recent_events: Vec::new(),
        last_location: None,
        last_error: None,
        refreshing: false,
    }
}

/// The pure reducer: previous derived state plus the normalized event list
/// in, next derived state out. Received events are never mutated.
pub fn derive_ride_state(
    previous: Option<&DerivedRideState>,
    events: &[RideEvent],
    override_status: Option<RideStatus>,
    now: TimeStamp,
    recent_events_limit: usize,
) -> DerivedRideState {
    let fold = fold_events(events);
    let status = effective_status(&fold, override_status, previous.map(|state| state.status));

    // Sticky: a batch without driver identity keeps what was shown before.
    let driver_details = fold
        .driver_details
        .or_else(|| previous.and_then(|state| state.driver_details.to_owned()));

    DerivedRideState {
        status,
        driver_details,
        timeline: build_timeline(status),
        recent_events: recent_event_log(events, now, recent_events_limit),
        last_location: previous.and_then(|state| state.last_location.to_owned()),
        last_error: previous.and_then(|state| state.last_error.to_owned()),
        refreshing: previous.map(|state| state.refreshing).unwrap_or(false),
    }
}

/// Newest-first bounded log of rider-readable event descriptions.
pub fn recent_event_log(
    events: &[RideEvent],
    now: TimeStamp,
    limit: usize,
) -> Vec<RecentEvent> {
    events
        .iter()
        .rev()
        .take(limit)
        .map(|event| RecentEvent {
            description: describe_event(event),
            happened: relative_time_text(now, event.timestamp),
            timestamp: event.timestamp,
        })
        .collect()
}

pub fn describe_event(event: &RideEvent) -> String {
    match &event.event_type {
        RideEventType::Booked => "Booking confirmed".to_string(),
        RideEventType::Dispatched => match event
            .event_data
            .as_ref()
            .and_then(|payload| payload.driver_name.to_owned())
        {
            Some(name) => format!("Driver {name} has been assigned"),
            None => "A driver has been assigned".to_string(),
        },
        RideEventType::VehicleArrived => "Your vehicle has arrived".to_string(),
        RideEventType::PassengerOnBoard => "Ride in progress".to_string(),
        RideEventType::Completed => "Ride completed".to_string(),
        RideEventType::Cancelled => "Ride cancelled".to_string(),
        RideEventType::Unknown(tag) => format!("Ride update: {tag}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(seconds: i64) -> TimeStamp {
        TimeStamp(Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap())
    }

    fn event(event_type: RideEventType, seconds: i64) -> RideEvent {
        RideEvent {
            event_type,
            timestamp: ts(seconds),
            event_data: None,
        }
    }

    fn dispatched_with_driver(name: &str, seconds: i64) -> RideEvent {
        RideEvent {
            event_type: RideEventType::Dispatched,
            timestamp: ts(seconds),
            event_data: Some(DriverPayload {
                driver_name: Some(name.to_string()),
                driver_phone: Some("+441632960123".to_string()),
                estimated_arrival: Some(ts(seconds + 420)),
                ..DriverPayload::default()
            }),
        }
    }

    #[test]
    fn full_milestone_order_completes() {
        let events = vec![
            event(RideEventType::Booked, 0),
            event(RideEventType::Dispatched, 60),
            event(RideEventType::VehicleArrived, 120),
            event(RideEventType::PassengerOnBoard, 180),
            event(RideEventType::Completed, 600),
        ];

        let state = derive_ride_state(None, &events, None, ts(700), 5);
        assert_eq!(state.status, RideStatus::Completed);
        assert!(state
            .timeline
            .iter()
            .all(|entry| entry.state == MilestoneState::DONE));
    }

    #[test]
    fn cancellation_overrides_forward_progress() {
        let events = vec![
            event(RideEventType::Booked, 0),
            event(RideEventType::Dispatched, 60),
            event(RideEventType::Cancelled, 90),
            event(RideEventType::VehicleArrived, 120),
        ];

        let state = derive_ride_state(None, &events, None, ts(700), 5);
        assert_eq!(state.status, RideStatus::Cancelled);
    }

    #[test]
    fn stale_early_milestone_does_not_regress() {
        let dispatched = vec![event(RideEventType::Dispatched, 60)];
        let first = derive_ride_state(None, &dispatched, None, ts(700), 5);
        assert_eq!(first.status, RideStatus::Dispatched);

        // A late-arriving BOOKED duplicate with an earlier timestamp.
        let with_stale = vec![
            event(RideEventType::Booked, 0),
            event(RideEventType::Dispatched, 60),
        ];
        let second = derive_ride_state(Some(&first), &with_stale, None, ts(800), 5);
        assert_eq!(second.status, RideStatus::Dispatched);
    }

    #[test]
    fn driver_details_are_sticky_across_payloadless_events() {
        let events = vec![
            dispatched_with_driver("Alex", 60),
            event(RideEventType::VehicleArrived, 120),
        ];

        let state = derive_ride_state(None, &events, None, ts(700), 5);
        assert_eq!(state.status, RideStatus::VehicleArrived);
        assert_eq!(
            state.driver_details.as_ref().and_then(|d| d.name.to_owned()),
            Some("Alex".to_string())
        );
    }

    #[test]
    fn later_driver_payload_overwrites_the_record() {
        let events = vec![
            dispatched_with_driver("Alex", 60),
            dispatched_with_driver("Sam", 90),
        ];

        let state = derive_ride_state(None, &events, None, ts(700), 5);
        assert_eq!(
            state.driver_details.as_ref().and_then(|d| d.name.to_owned()),
            Some("Sam".to_string())
        );
    }

    #[test]
    fn push_override_survives_earlier_poll_derivation() {
        let events = vec![event(RideEventType::Booked, 0)];
        let state = derive_ride_state(None, &events, Some(RideStatus::Dispatched), ts(700), 5);
        assert_eq!(state.status, RideStatus::Dispatched);
    }

    #[test]
    fn event_driven_update_advances_past_override() {
        let events = vec![
            event(RideEventType::Booked, 0),
            event(RideEventType::VehicleArrived, 120),
        ];
        let state = derive_ride_state(None, &events, Some(RideStatus::Dispatched), ts(700), 5);
        assert_eq!(state.status, RideStatus::VehicleArrived);
    }

    #[test]
    fn push_asserted_cancellation_is_not_revoked_by_poll() {
        let cancelled =
            derive_ride_state(None, &[], Some(RideStatus::Cancelled), ts(700), 5);
        assert_eq!(cancelled.status, RideStatus::Cancelled);

        // The follow-up poll carries no cancellation event; the terminal
        // state still holds.
        let events = vec![
            event(RideEventType::Booked, 0),
            event(RideEventType::Dispatched, 60),
        ];
        let after_poll = derive_ride_state(Some(&cancelled), &events, None, ts(800), 5);
        assert_eq!(after_poll.status, RideStatus::Cancelled);
    }

    #[test]
    fn push_override_does_not_erase_driver_details() {
        let events = vec![dispatched_with_driver("Alex", 60)];
        let first = derive_ride_state(None, &events, None, ts(700), 5);

        let second =
            derive_ride_state(Some(&first), &events, Some(RideStatus::VehicleArrived), ts(800), 5);
        assert_eq!(second.status, RideStatus::VehicleArrived);
        assert_eq!(
            second.driver_details.as_ref().and_then(|d| d.name.to_owned()),
            Some("Alex".to_string())
        );
    }

    #[test]
    fn recent_log_is_bounded_and_newest_first() {
        let events: Vec<RideEvent> = (0..8)
            .map(|i| event(RideEventType::Unknown(format!("EVENT_{i}")), i * 10))
            .collect();

        let log = recent_event_log(&events, ts(100), 5);
        assert_eq!(log.len(), 5);
        assert_eq!(log[0].description, "Ride update: EVENT_7");
        assert_eq!(log[4].description, "Ride update: EVENT_3");
        assert_eq!(log[0].happened, "just now");
    }

    #[test]
    fn unknown_tags_do_not_change_status() {
        let events = vec![
            event(RideEventType::Dispatched, 60),
            event(RideEventType::Unknown("SURGE_APPLIED".to_string()), 120),
        ];
        let state = derive_ride_state(None, &events, None, ts(700), 5);
        assert_eq!(state.status, RideStatus::Dispatched);
    }
}
