/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
pub mod redis;

use crate::common::types::*;
use crate::tools::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

/// Out-of-band partial state for a ride: an explicit status string and/or a
/// driver record, neither required.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RideUpdatePayload {
    pub status: Option<String>,
    pub driver_details: Option<DriverPayload>,
}

/// Raw location ping; consumed for map display only, never for status
/// derivation.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdatePayload {
    pub lat: Latitude,
    pub lon: Longitude,
    pub timestamp: Option<TimeStamp>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub enum PushMessage {
    RideUpdate(RideUpdatePayload),
    LocationUpdate(LocationUpdatePayload),
}

/// Room-based push subscription. Trackers join with their own sink and must
/// leave on teardown; a forgotten membership is a listener leak.
#[async_trait]
pub trait PushChannel: Send + Sync + 'static {
    async fn join_room(&self, room: &RoomId, sink: Sender<PushMessage>) -> Result<(), AppError>;

    async fn leave_room(&self, room: &RoomId) -> Result<(), AppError>;

    async fn room_count(&self) -> usize;

    async fn is_connected(&self) -> bool;
}
