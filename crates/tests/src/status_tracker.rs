/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::{history, raw_event, raw_event_with_driver, InMemoryPushChannel, StubEventsSource};
use ride_status_tracker::common::types::*;
use ride_status_tracker::push::{LocationUpdatePayload, PushChannel, PushMessage, RideUpdatePayload};
use ride_status_tracker::tools::error::AppError;
use ride_status_tracker::tracker::{spawn_tracker, TrackerConfig, TrackerHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};
use tokio::time::{sleep, timeout};

fn tracker_config() -> TrackerConfig {
    TrackerConfig {
        // Long enough that only the immediate first tick polls during a test.
        poll_interval_seconds: 3600,
        recent_events_limit: 5,
        status_update_topic: "ride-status-updates".to_string(),
    }
}

async fn mount(
    events_source: Arc<StubEventsSource>,
    push_channel: Arc<InMemoryPushChannel>,
) -> (TrackerHandle, oneshot::Receiver<BookingReference>) {
    let (completion_tx, completion_rx) = oneshot::channel();
    let handle = spawn_tracker(
        BookingReference("b-1".to_string()),
        Some(RideId("r-1".to_string())),
        events_source,
        push_channel,
        None,
        tracker_config(),
        completion_tx,
    )
    .await
    .expect("Failed to spawn tracker");
    (handle, completion_rx)
}

async fn settle() {
    sleep(Duration::from_millis(150)).await;
}

#[tokio::test]
async fn full_history_drives_status_to_completed() {
    let events_source = StubEventsSource::new(vec![history(vec![
        raw_event("BOOKED", 0),
        raw_event("DISPATCHED", 60),
        raw_event("VEHICLE_ARRIVED", 120),
        raw_event("PASSENGER_ON_BOARD", 180),
        raw_event("COMPLETED", 600),
    ])]);
    let push_channel = InMemoryPushChannel::new();

    let (handle, _completion_rx) = mount(events_source, push_channel.clone()).await;
    settle().await;

    let state = handle.snapshot().await.expect("Snapshot failed");
    assert_eq!(state.status, RideStatus::Completed);
    assert!(state
        .timeline
        .iter()
        .all(|entry| entry.state == MilestoneState::DONE));
    assert!(!state.recent_events.is_empty());

    handle.stop().await;
}

#[tokio::test]
async fn completion_callback_fires_exactly_once() {
    // Two COMPLETED events in the same batch, then another batch repeating
    // them: the one-shot must fire for the first derivation only.
    let events_source = StubEventsSource::new(vec![
        history(vec![
            raw_event("BOOKED", 0),
            raw_event("COMPLETED", 600),
            raw_event("COMPLETED", 660),
        ]),
        history(vec![raw_event("COMPLETED", 600), raw_event("COMPLETED", 660)]),
    ]);
    let push_channel = InMemoryPushChannel::new();

    let (handle, completion_rx) = mount(events_source.clone(), push_channel.clone()).await;

    let completed = timeout(Duration::from_secs(2), completion_rx)
        .await
        .expect("Completion signal never fired")
        .expect("Completion sender dropped");
    assert_eq!(completed, BookingReference("b-1".to_string()));

    handle.refresh().await.expect("Refresh failed");
    settle().await;

    assert_eq!(events_source.call_count(), 2);
    let state = handle.snapshot().await.expect("Snapshot failed");
    assert_eq!(state.status, RideStatus::Completed);

    handle.stop().await;
}

#[tokio::test]
async fn unmount_discards_late_poll_response() {
    let gate = Arc::new(Semaphore::new(0));
    let events_source = StubEventsSource::gated(
        vec![history(vec![raw_event("DISPATCHED", 60)])],
        gate.clone(),
    );
    let push_channel = InMemoryPushChannel::new();

    let (handle, _completion_rx) = mount(events_source.clone(), push_channel.clone()).await;
    sleep(Duration::from_millis(50)).await;

    // Unmount while the first poll is still blocked in flight.
    handle.stop().await;
    assert_eq!(push_channel.room_count().await, 0);

    // Let the late response arrive; it must find a closed mailbox.
    gate.add_permits(1);
    settle().await;

    assert_eq!(events_source.call_count(), 1);
}

#[tokio::test]
async fn overlapping_poll_requests_are_no_ops() {
    let gate = Arc::new(Semaphore::new(0));
    let events_source = StubEventsSource::gated(Vec::new(), gate.clone());
    let push_channel = InMemoryPushChannel::new();

    let (handle, _completion_rx) = mount(events_source.clone(), push_channel.clone()).await;
    sleep(Duration::from_millis(50)).await;

    // The mount already started a poll; these must not start another.
    handle.refresh().await.expect("Refresh failed");
    handle.refresh().await.expect("Refresh failed");
    handle.refresh().await.expect("Refresh failed");
    sleep(Duration::from_millis(50)).await;
    assert_eq!(events_source.call_count(), 1);

    gate.add_permits(1);
    settle().await;

    // With the previous poll finished a refresh goes through again.
    handle.refresh().await.expect("Refresh failed");
    gate.add_permits(1);
    settle().await;
    assert_eq!(events_source.call_count(), 2);

    handle.stop().await;
}

#[tokio::test]
async fn repeated_mount_unmount_leaves_no_room_membership() {
    let push_channel = InMemoryPushChannel::new();

    for _ in 0..5 {
        let events_source = StubEventsSource::new(Vec::new());
        let (handle, _completion_rx) = mount(events_source, push_channel.clone()).await;
        assert_eq!(push_channel.room_count().await, 1);
        handle.stop().await;
        assert_eq!(push_channel.room_count().await, 0);
    }

    assert_eq!(push_channel.joins.load(std::sync::atomic::Ordering::SeqCst), 5);
    assert_eq!(push_channel.leaves.load(std::sync::atomic::Ordering::SeqCst), 5);
}

#[tokio::test]
async fn push_override_survives_earlier_poll_derivation() {
    let events_source = StubEventsSource::new(vec![
        history(vec![raw_event("BOOKED", 0)]),
        history(vec![raw_event("BOOKED", 0)]),
    ]);
    let push_channel = InMemoryPushChannel::new();

    let (handle, _completion_rx) = mount(events_source.clone(), push_channel.clone()).await;
    settle().await;
    assert_eq!(
        handle.snapshot().await.expect("Snapshot failed").status,
        RideStatus::Booked
    );

    // Explicit status from the push channel, then the triggered poll still
    // reports only BOOKED; the override must hold.
    assert!(
        push_channel
            .send(
                &handle.room,
                PushMessage::RideUpdate(RideUpdatePayload {
                    status: Some("DISPATCHED".to_string()),
                    driver_details: None,
                }),
            )
            .await
    );
    settle().await;

    let state = handle.snapshot().await.expect("Snapshot failed");
    assert_eq!(state.status, RideStatus::Dispatched);
    assert_eq!(events_source.call_count(), 2);

    handle.stop().await;
}

#[tokio::test]
async fn push_asserted_cancellation_is_terminal() {
    let events_source = StubEventsSource::new(vec![
        history(vec![raw_event("BOOKED", 0), raw_event("DISPATCHED", 60)]),
        history(vec![raw_event("BOOKED", 0), raw_event("DISPATCHED", 60)]),
    ]);
    let push_channel = InMemoryPushChannel::new();

    let (handle, _completion_rx) = mount(events_source, push_channel.clone()).await;
    settle().await;

    push_channel
        .send(
            &handle.room,
            PushMessage::RideUpdate(RideUpdatePayload {
                status: Some("CANCELLED".to_string()),
                driver_details: None,
            }),
        )
        .await;
    settle().await;

    // The follow-up poll carries no cancellation event; the terminal state
    // still holds.
    let state = handle.snapshot().await.expect("Snapshot failed");
    assert_eq!(state.status, RideStatus::Cancelled);

    handle.stop().await;
}

#[tokio::test]
async fn driver_details_stick_across_payloadless_events() {
    let events_source = StubEventsSource::new(vec![
        history(vec![
            raw_event("BOOKED", 0),
            raw_event_with_driver("DISPATCHED", 60, "Alex"),
        ]),
        history(vec![
            raw_event("BOOKED", 0),
            raw_event_with_driver("DISPATCHED", 60, "Alex"),
            raw_event("VEHICLE_ARRIVED", 120),
        ]),
    ]);
    let push_channel = InMemoryPushChannel::new();

    let (handle, _completion_rx) = mount(events_source, push_channel.clone()).await;
    settle().await;

    handle.refresh().await.expect("Refresh failed");
    settle().await;

    let state = handle.snapshot().await.expect("Snapshot failed");
    assert_eq!(state.status, RideStatus::VehicleArrived);
    assert_eq!(
        state
            .driver_details
            .as_ref()
            .and_then(|driver| driver.name.to_owned()),
        Some("Alex".to_string())
    );

    handle.stop().await;
}

#[tokio::test]
async fn transient_poll_failure_retains_derived_state() {
    let events_source = StubEventsSource::new(vec![
        history(vec![
            raw_event("BOOKED", 0),
            raw_event_with_driver("DISPATCHED", 60, "Alex"),
        ]),
        Err(AppError::ExternalAPICallError("503".to_string())),
    ]);
    let push_channel = InMemoryPushChannel::new();

    let (handle, _completion_rx) = mount(events_source, push_channel.clone()).await;
    settle().await;

    handle.refresh().await.expect("Refresh failed");
    settle().await;

    let state = handle.snapshot().await.expect("Snapshot failed");
    assert_eq!(state.status, RideStatus::Dispatched);
    assert!(state.driver_details.is_some());
    assert!(state.last_error.is_some());

    // A later successful manual retry clears the inline error.
    handle.refresh().await.expect("Refresh failed");
    settle().await;
    let state = handle.snapshot().await.expect("Snapshot failed");
    assert!(state.last_error.is_none());
    assert_eq!(state.status, RideStatus::Dispatched);

    handle.stop().await;
}

#[tokio::test]
async fn location_updates_only_touch_the_map_position() {
    let events_source = StubEventsSource::new(vec![history(vec![raw_event("DISPATCHED", 60)])]);
    let push_channel = InMemoryPushChannel::new();

    let (handle, _completion_rx) = mount(events_source.clone(), push_channel.clone()).await;
    settle().await;

    push_channel
        .send(
            &handle.room,
            PushMessage::LocationUpdate(LocationUpdatePayload {
                lat: Latitude(12.9716),
                lon: Longitude(77.5946),
                timestamp: None,
            }),
        )
        .await;
    settle().await;

    let state = handle.snapshot().await.expect("Snapshot failed");
    assert!(state.last_location.is_some());
    assert_eq!(state.status, RideStatus::Dispatched);
    // Location pings must not trigger an authoritative poll.
    assert_eq!(events_source.call_count(), 1);

    handle.stop().await;
}
