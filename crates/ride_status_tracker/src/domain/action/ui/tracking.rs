/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::common::types::*;
use crate::domain::types::ui::tracking::*;
use crate::environment::AppState;
use crate::tools::error::AppError;
use crate::tracker::spawn_tracker;
use actix_web::web::Data;
use tokio::sync::oneshot;
use tracing::{debug, info};

#[macros::measure_duration]
pub async fn start_tracking(
    data: Data<AppState>,
    booking_reference: BookingReference,
    request_body: StartTrackingRequest,
) -> Result<StartTrackingResponse, AppError> {
    let mut trackers = data.trackers.write().await;

    // Mounting the same booking twice is a no-op; the existing subscription
    // and poll cadence are kept.
    if let Some(handle) = trackers.get(&booking_reference) {
        return Ok(StartTrackingResponse {
            result: "AlreadyTracking".to_string(),
            room: handle.room.to_owned(),
        });
    }

    let (completion_tx, completion_rx) = oneshot::channel();

    let handle = spawn_tracker(
        booking_reference.to_owned(),
        request_body.ride_id,
        data.events_source.clone(),
        data.push_channel.clone(),
        data.producer.to_owned(),
        data.tracker_cfg.to_owned(),
        completion_tx,
    )
    .await?;

    // One-shot: fires at most once per tracker, gating the post-ride flow.
    tokio::spawn(async move {
        if let Ok(BookingReference(reference)) = completion_rx.await {
            info!(tag = "[RIDE COMPLETED]", booking_reference = %reference);
        }
    });

    let room = handle.room.to_owned();
    trackers.insert(booking_reference, handle);

    Ok(StartTrackingResponse {
        result: "Success".to_string(),
        room,
    })
}

#[macros::measure_duration]
pub async fn stop_tracking(
    data: Data<AppState>,
    booking_reference: BookingReference,
) -> Result<APISuccess, AppError> {
    let handle = data.trackers.write().await.remove(&booking_reference);

    let BookingReference(reference) = booking_reference;
    match handle {
        Some(handle) => {
            handle.stop().await;
            Ok(APISuccess::default())
        }
        None => Err(AppError::TrackerNotFound(reference)),
    }
}

pub async fn tracking_status(
    data: Data<AppState>,
    booking_reference: BookingReference,
) -> Result<DerivedRideState, AppError> {
    let trackers = data.trackers.read().await;

    match trackers.get(&booking_reference) {
        Some(handle) => handle.snapshot().await,
        None => {
            let BookingReference(reference) = booking_reference;
            Err(AppError::TrackerNotFound(reference))
        }
    }
}

pub async fn refresh_tracking(
    data: Data<AppState>,
    booking_reference: BookingReference,
) -> Result<APISuccess, AppError> {
    let trackers = data.trackers.read().await;

    match trackers.get(&booking_reference) {
        Some(handle) => {
            handle.refresh().await?;
            Ok(APISuccess::default())
        }
        None => {
            let BookingReference(reference) = booking_reference;
            Err(AppError::TrackerNotFound(reference))
        }
    }
}
