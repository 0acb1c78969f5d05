/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
pub mod derivation;
pub mod normalizer;
pub mod timeline;

use crate::common::types::*;
use crate::kafka::producers::kafka_stream_status_update;
use crate::outbound::external::EventsSource;
use crate::outbound::types::RideEventsHistoryResponse;
use crate::push::{PushChannel, PushMessage};
use crate::redis::keys::{booking_room_key, ride_room_key};
use crate::tools::error::AppError;
use crate::tools::prometheus::{COMPLETED_RIDES, POLL_FAILURES, TRACKED_RIDES};
use chrono::Utc;
use derivation::{derive_ride_state, initial_ride_state};
use normalizer::{merge_events, normalize_events};
use rdkafka::producer::FutureProducer;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

const TRACKER_MAILBOX_SIZE: usize = 64;
const PUSH_SINK_SIZE: usize = 64;

#[derive(Debug)]
pub enum TrackerCommand {
    Refresh,
    PollCompleted {
        result: Result<RideEventsHistoryResponse, AppError>,
        fetched_at: TimeStamp,
    },
    Push(PushMessage),
    Snapshot(oneshot::Sender<DerivedRideState>),
    Stop,
}

#[derive(Clone)]
pub struct TrackerConfig {
    pub poll_interval_seconds: u64,
    pub recent_events_limit: usize,
    pub status_update_topic: String,
}

/// Mailbox handle owned by the registry. Dropping or stopping it is the
/// "unmount": the loop exits, the room is left, and any in-flight poll
/// result finds a closed mailbox instead of mutable state.
pub struct TrackerHandle {
    pub booking_reference: BookingReference,
    pub room: RoomId,
    cmd_tx: mpsc::Sender<TrackerCommand>,
    join_handle: JoinHandle<()>,
}

impl TrackerHandle {
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.send(TrackerCommand::Refresh).await
    }

    pub async fn snapshot(&self) -> Result<DerivedRideState, AppError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TrackerCommand::Snapshot(reply_tx)).await?;

        let BookingReference(reference) = &self.booking_reference;
        reply_rx
            .await
            .map_err(|_| AppError::TrackerMailboxClosed(reference.to_owned()))
    }

    /// Stops the tracker and waits for its teardown to finish.
    pub async fn stop(self) {
        let _ = self.cmd_tx.send(TrackerCommand::Stop).await;
        let _ = self.join_handle.await;
    }

    async fn send(&self, command: TrackerCommand) -> Result<(), AppError> {
        let BookingReference(reference) = &self.booking_reference;
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| AppError::TrackerMailboxClosed(reference.to_owned()))
    }
}

struct RideStatusTracker {
    booking_reference: BookingReference,
    events_source: Arc<dyn EventsSource>,
    producer: Option<FutureProducer>,
    config: TrackerConfig,
    cmd_tx: mpsc::Sender<TrackerCommand>,
    events: Vec<RideEvent>,
    derived: DerivedRideState,
    override_status: Option<RideStatus>,
    poll_in_flight: bool,
    completion_tx: Option<oneshot::Sender<BookingReference>>,
}

/// Mounts a tracker for one booking reference: joins its push room (keyed by
/// ride id when known, booking reference otherwise), starts the reducer loop
/// and schedules the first authoritative poll.
pub async fn spawn_tracker(
    booking_reference: BookingReference,
    ride_id: Option<RideId>,
    events_source: Arc<dyn EventsSource>,
    push_channel: Arc<dyn PushChannel>,
    producer: Option<FutureProducer>,
    config: TrackerConfig,
    completion_tx: oneshot::Sender<BookingReference>,
) -> Result<TrackerHandle, AppError> {
    let room = RoomId(match &ride_id {
        Some(ride_id) => ride_room_key(ride_id),
        None => booking_room_key(&booking_reference),
    });

    let (cmd_tx, cmd_rx) = mpsc::channel(TRACKER_MAILBOX_SIZE);
    let (push_tx, push_rx) = mpsc::channel(PUSH_SINK_SIZE);

    push_channel.join_room(&room, push_tx).await?;

    let tracker = RideStatusTracker {
        booking_reference: booking_reference.to_owned(),
        events_source,
        producer,
        config,
        cmd_tx: cmd_tx.to_owned(),
        events: Vec::new(),
        derived: initial_ride_state(),
        override_status: None,
        poll_in_flight: false,
        completion_tx: Some(completion_tx),
    };

    TRACKED_RIDES.inc();

    let teardown_room = room.to_owned();
    let join_handle = tokio::spawn(run_tracker(tracker, cmd_rx, push_rx, push_channel, teardown_room));

    Ok(TrackerHandle {
        booking_reference,
        room,
        cmd_tx,
        join_handle,
    })
}

async fn run_tracker(
    mut tracker: RideStatusTracker,
    mut cmd_rx: mpsc::Receiver<TrackerCommand>,
    mut push_rx: mpsc::Receiver<PushMessage>,
    push_channel: Arc<dyn PushChannel>,
    room: RoomId,
) {
    // The first tick fires immediately, so mounting triggers a poll.
    let mut poll_timer = interval(Duration::from_secs(tracker.config.poll_interval_seconds.max(1)));

    loop {
        tokio::select! {
            command = cmd_rx.recv() => match command {
                Some(TrackerCommand::Refresh) => tracker.request_poll(),
                Some(TrackerCommand::PollCompleted { result, fetched_at }) => {
                    tracker.apply_poll(result, fetched_at).await
                }
                Some(TrackerCommand::Push(message)) => tracker.apply_push(message).await,
                Some(TrackerCommand::Snapshot(reply_tx)) => {
                    let mut state = tracker.derived.to_owned();
                    state.refreshing = tracker.poll_in_flight;
                    let _ = reply_tx.send(state);
                }
                Some(TrackerCommand::Stop) | None => break,
            },
            Some(message) = push_rx.recv() => tracker.apply_push(message).await,
            _ = poll_timer.tick() => tracker.request_poll(),
        }
    }

    // Teardown: leave the room so repeated mount/unmount cycles never
    // accumulate members. The mailbox closes with this task, which discards
    // any in-flight poll result.
    if let Err(err) = push_channel.leave_room(&room).await {
        error!(tag = "[PUSH ROOM]", error = %err, "Failed to leave room on teardown");
    }
    TRACKED_RIDES.dec();
}

impl RideStatusTracker {
    /// Requests an authoritative event history fetch. A request while one is
    /// outstanding is a no-op, never queued.
    fn request_poll(&mut self) {
        if self.poll_in_flight {
            let BookingReference(reference) = &self.booking_reference;
            info!(tag = "[POLL]", booking_reference = %reference, "Poll already in flight, skipping");
            return;
        }
        self.poll_in_flight = true;

        let events_source = self.events_source.clone();
        let booking_reference = self.booking_reference.to_owned();
        let cmd_tx = self.cmd_tx.to_owned();
        tokio::spawn(async move {
            let result = events_source.events_history(&booking_reference).await;
            let fetched_at = TimeStamp(Utc::now());
            // Fails when the tracker was unmounted meanwhile; the late
            // result is dropped without touching any state.
            let _ = cmd_tx
                .send(TrackerCommand::PollCompleted { result, fetched_at })
                .await;
        });
    }

    async fn apply_poll(
        &mut self,
        result: Result<RideEventsHistoryResponse, AppError>,
        fetched_at: TimeStamp,
    ) {
        self.poll_in_flight = false;

        match result {
            Ok(response) if response.success => {
                let fresh = normalize_events(&response.events, fetched_at);
                self.events = merge_events(std::mem::take(&mut self.events), fresh);
                self.derived.last_error = None;
                self.rederive().await;
            }
            Ok(_) => self.poll_failed(AppError::ExternalAPICallError(
                "Events history reported failure".to_string(),
            )),
            Err(err) => self.poll_failed(err),
        }
    }

    fn poll_failed(&mut self, err: AppError) {
        POLL_FAILURES.inc();
        let BookingReference(reference) = &self.booking_reference;
        warn!(tag = "[POLL - ERROR]", booking_reference = %reference, error = %err);
        // Previously derived status and timeline stay as they are; only the
        // transient failure is surfaced for the UI to render inline.
        self.derived.last_error = Some(err.message());
    }

    async fn apply_push(&mut self, message: PushMessage) {
        match message {
            PushMessage::RideUpdate(update) => {
                if let Some(status_raw) = update.status.as_deref() {
                    match RideStatus::from_str(status_raw) {
                        // Last explicit signal wins over batch reconciliation.
                        Ok(status) => self.override_status = Some(status),
                        Err(_) => {
                            warn!(tag = "[PUSH]", status = %status_raw, "Ignoring unrecognized status")
                        }
                    }
                }

                if let Some(driver) = update.driver_details.as_ref() {
                    if driver.has_driver_identity() {
                        self.derived.driver_details = Some(DriverDetails::from(driver));
                    }
                }

                self.rederive().await;

                // The push payload is partial; fetch the full history.
                self.request_poll();
            }
            PushMessage::LocationUpdate(location) => {
                self.derived.last_location = Some(Point {
                    lat: location.lat,
                    lon: location.lon,
                });
            }
        }
    }

    async fn rederive(&mut self) {
        let previous_status = self.derived.status;

        self.derived = derive_ride_state(
            Some(&self.derived),
            &self.events,
            self.override_status,
            TimeStamp(Utc::now()),
            self.config.recent_events_limit,
        );

        if self.derived.status != previous_status {
            kafka_stream_status_update(
                &self.producer,
                self.config.status_update_topic.as_str(),
                &self.booking_reference,
                previous_status,
                self.derived.status,
            )
            .await;
        }

        if self.derived.status == RideStatus::Completed {
            // Taking the sender makes the completion signal one-shot per
            // tracker lifetime, however many COMPLETED events arrive.
            if let Some(completion_tx) = self.completion_tx.take() {
                COMPLETED_RIDES.inc();
                let _ = completion_tx.send(self.booking_reference.to_owned());
            }
        }
    }
}
