/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use chrono::{DateTime, Utc};

/// Parses a wire timestamp (RFC 3339 / ISO-8601). `None` when absent or
/// unparseable; the caller decides the fallback policy.
pub fn parse_event_timestamp(timestamp: Option<&str>) -> Option<TimeStamp> {
    timestamp
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| TimeStamp(parsed.with_timezone(&Utc)))
}

/// Whole-minute countdown to an estimated arrival, phrased for the rider.
/// Both instants are injected so the formatting is wall-clock independent.
pub fn estimated_arrival_text(TimeStamp(now): TimeStamp, TimeStamp(eta): TimeStamp) -> String {
    let minutes = eta.signed_duration_since(now).num_minutes();
    if minutes <= 0 {
        "Arriving now".to_string()
    } else {
        format!("Arriving in {minutes} min")
    }
}

/// Coarse "how long ago" phrasing for the recent events log.
///
/// Thresholds: under 60s -> "just now", under 1h -> minutes, under 24h ->
/// hours, otherwise days. Singular unit only when the count is exactly 1.
pub fn relative_time_text(TimeStamp(now): TimeStamp, TimeStamp(timestamp): TimeStamp) -> String {
    let seconds = now.signed_duration_since(timestamp).num_seconds().max(0);

    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3600 {
        pluralized_ago(seconds / 60, "minute")
    } else if seconds < 86400 {
        pluralized_ago(seconds / 3600, "hour")
    } else {
        pluralized_ago(seconds / 86400, "day")
    }
}

fn pluralized_ago(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

pub fn diff_utc(old: DateTime<Utc>, new: DateTime<Utc>) -> chrono::Duration {
    new.signed_duration_since(old)
}
