/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use ride_status_tracker::common::types::*;
use ride_status_tracker::outbound::external::EventsSource;
use ride_status_tracker::outbound::types::{RawRideEvent, RideEventsHistoryResponse};
use ride_status_tracker::push::{PushChannel, PushMessage};
use ride_status_tracker::tools::error::AppError;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::{Mutex, RwLock, Semaphore};

#[cfg(test)]
mod status_tracker;

/// Scripted events-history backend. Responses are served in order; once the
/// script runs out it keeps answering with an empty successful history. An
/// optional gate blocks every call until the test releases a permit.
pub struct StubEventsSource {
    responses: Mutex<VecDeque<Result<RideEventsHistoryResponse, AppError>>>,
    pub calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl StubEventsSource {
    pub fn new(responses: Vec<Result<RideEventsHistoryResponse, AppError>>) -> Arc<Self> {
        Arc::new(StubEventsSource {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    pub fn gated(
        responses: Vec<Result<RideEventsHistoryResponse, AppError>>,
        gate: Arc<Semaphore>,
    ) -> Arc<Self> {
        Arc::new(StubEventsSource {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            gate: Some(gate),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventsSource for StubEventsSource {
    async fn events_history(
        &self,
        _booking_reference: &BookingReference,
    ) -> Result<RideEventsHistoryResponse, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("Gate semaphore closed");
            permit.forget();
        }

        match self.responses.lock().await.pop_front() {
            Some(response) => response,
            None => Ok(RideEventsHistoryResponse {
                success: true,
                events: Vec::new(),
            }),
        }
    }
}

/// Room map without any transport; the test injects messages directly.
pub struct InMemoryPushChannel {
    rooms: RwLock<HashMap<String, Sender<PushMessage>>>,
    pub joins: AtomicUsize,
    pub leaves: AtomicUsize,
}

impl InMemoryPushChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(InMemoryPushChannel {
            rooms: RwLock::new(HashMap::new()),
            joins: AtomicUsize::new(0),
            leaves: AtomicUsize::new(0),
        })
    }

    pub async fn send(&self, RoomId(room): &RoomId, message: PushMessage) -> bool {
        let rooms = self.rooms.read().await;
        match rooms.get(room) {
            Some(sink) => sink.send(message).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl PushChannel for InMemoryPushChannel {
    async fn join_room(&self, RoomId(room): &RoomId, sink: Sender<PushMessage>) -> Result<(), AppError> {
        self.joins.fetch_add(1, Ordering::SeqCst);
        self.rooms.write().await.insert(room.to_owned(), sink);
        Ok(())
    }

    async fn leave_room(&self, RoomId(room): &RoomId) -> Result<(), AppError> {
        self.leaves.fetch_add(1, Ordering::SeqCst);
        self.rooms.write().await.remove(room);
        Ok(())
    }

    async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    async fn is_connected(&self) -> bool {
        true
    }
}

pub fn raw_event(event_type: &str, seconds: i64) -> RawRideEvent {
    RawRideEvent {
        event_type: Some(event_type.to_string()),
        timestamp: Some(
            Utc.timestamp_opt(1_700_000_000 + seconds, 0)
                .unwrap()
                .to_rfc3339(),
        ),
        event_data: None,
    }
}

pub fn raw_event_with_driver(event_type: &str, seconds: i64, name: &str) -> RawRideEvent {
    let mut event = raw_event(event_type, seconds);
    event.event_data = Some(serde_json::json!({
        "driverName": name,
        "driverPhone": "+441632960123",
        "vehicleDescription": "White Toyota Prius",
        "registrationNumber": "KA 01 AB 1234",
    }));
    event
}

pub fn history(events: Vec<RawRideEvent>) -> Result<RideEventsHistoryResponse, AppError> {
    Ok(RideEventsHistoryResponse {
        success: true,
        events,
    })
}
