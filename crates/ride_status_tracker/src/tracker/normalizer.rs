/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::common::utils::parse_event_timestamp;
use crate::outbound::types::RawRideEvent;
use rustc_hash::FxHashSet;
use std::str::FromStr;

/// Decodes one wire record. `None` only when the record has no usable event
/// tag at all; a bad batch never fails, bad records are dropped one by one.
///
/// Policy: a missing or unparseable timestamp counts as "happened at fetch
/// time", which places such events last (fetch time is never earlier than
/// the history it fetched) and in arrival order among themselves, since the
/// sort below is stable.
pub fn decode_event(raw: &RawRideEvent, fetch_time: TimeStamp) -> Option<RideEvent> {
    let tag = raw.event_type.as_deref().map(str::trim)?;
    if tag.is_empty() {
        return None;
    }

    let event_type = RideEventType::from_str(tag)
        .unwrap_or_else(|_| RideEventType::Unknown(tag.to_string()));

    let timestamp = parse_event_timestamp(raw.timestamp.as_deref()).unwrap_or(fetch_time);

    let event_data = raw
        .event_data
        .as_ref()
        .and_then(|value| serde_json::from_value::<DriverPayload>(value.to_owned()).ok());

    Some(RideEvent {
        event_type,
        timestamp,
        event_data,
    })
}

/// Turns one fetched batch into a strictly time-ordered, duplicate-free
/// sequence.
pub fn normalize_events(raw_events: &[RawRideEvent], fetch_time: TimeStamp) -> Vec<RideEvent> {
    sort_and_dedupe(
        raw_events
            .iter()
            .filter_map(|raw| decode_event(raw, fetch_time))
            .collect(),
    )
}

/// Merges a fresh batch into the already-normalized history. The same event
/// routinely arrives twice (poll plus push replay); identical type and
/// timestamp collapse to the first occurrence seen.
pub fn merge_events(existing: Vec<RideEvent>, fresh: Vec<RideEvent>) -> Vec<RideEvent> {
    let mut all = existing;
    all.extend(fresh);
    sort_and_dedupe(all)
}

fn sort_and_dedupe(mut events: Vec<RideEvent>) -> Vec<RideEvent> {
    events.sort_by_key(|event| event.timestamp);

    let mut seen: FxHashSet<(RideEventType, TimeStamp)> = FxHashSet::default();
    events.retain(|event| seen.insert((event.event_type.to_owned(), event.timestamp)));

    events
}
