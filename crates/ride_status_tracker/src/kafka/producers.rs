/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use crate::common::{kafka::push_to_kafka, types::*};
use chrono::Utc;
use rdkafka::producer::FutureProducer;

/// Streams one derived status transition for downstream analytics. Keyed by
/// booking reference so a ride's transitions stay in one partition.
pub async fn kafka_stream_status_update(
    producer: &Option<FutureProducer>,
    topic: &str,
    booking_reference: &BookingReference,
    prev_status: RideStatus,
    status: RideStatus,
) {
    let BookingReference(key) = booking_reference;

    let message = StatusTransition {
        b_ref: booking_reference.to_owned(),
        prev_status,
        status,
        ts: TimeStamp(Utc::now()),
    };

    push_to_kafka(producer, topic, key.as_str(), message).await;
}
