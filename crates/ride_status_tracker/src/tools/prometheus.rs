/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use prometheus::{
    opts, register_histogram_vec, register_int_counter, register_int_gauge, HistogramVec,
    IntCounter, IntGauge,
};

pub static INCOMING_API: once_cell::sync::Lazy<HistogramVec> = once_cell::sync::Lazy::new(|| {
    register_histogram_vec!(
        opts!("http_request_duration_seconds", "Incoming API requests").into(),
        &["method", "handler", "status_code", "code", "version"]
    )
    .expect("Failed to register incoming API metrics")
});

pub static CALL_EXTERNAL_API: once_cell::sync::Lazy<HistogramVec> =
    once_cell::sync::Lazy::new(|| {
        register_histogram_vec!(
            opts!("external_api_call_duration_seconds", "Outgoing API calls").into(),
            &["method", "host", "path", "status"]
        )
        .expect("Failed to register external API call metrics")
    });

pub static TRACKED_RIDES: once_cell::sync::Lazy<IntGauge> = once_cell::sync::Lazy::new(|| {
    register_int_gauge!("tracked_rides", "Currently mounted ride trackers")
        .expect("Failed to register tracked rides metrics")
});

pub static POLL_FAILURES: once_cell::sync::Lazy<IntCounter> = once_cell::sync::Lazy::new(|| {
    register_int_counter!("poll_failures", "Failed event history polls")
        .expect("Failed to register poll failure metrics")
});

pub static PUSH_MESSAGES: once_cell::sync::Lazy<IntCounter> = once_cell::sync::Lazy::new(|| {
    register_int_counter!("push_messages", "Inbound push channel messages")
        .expect("Failed to register push message metrics")
});

pub static COMPLETED_RIDES: once_cell::sync::Lazy<IntCounter> = once_cell::sync::Lazy::new(|| {
    register_int_counter!("completed_rides", "Rides that reached COMPLETED")
        .expect("Failed to register completed ride metrics")
});

/// Observes one incoming API request in the `INCOMING_API` histogram.
#[macro_export]
macro_rules! incoming_api {
    ($method:expr, $endpoint:expr, $status:expr, $code:expr, $start:expr) => {
        let duration = $start.elapsed().as_secs_f64();
        let version = std::env::var("DEPLOYMENT_VERSION").unwrap_or("DEV".to_string());
        INCOMING_API
            .with_label_values(&[$method, $endpoint, $status, $code, version.as_str()])
            .observe(duration);
    };
}

/// Observes one outgoing API call in the `CALL_EXTERNAL_API` histogram.
#[macro_export]
macro_rules! call_external_api {
    ($method:expr, $host:expr, $path:expr, $status:expr, $start:expr) => {
        let duration = $start.elapsed().as_secs_f64();
        CALL_EXTERNAL_API
            .with_label_values(&[$method, $host, $path, $status])
            .observe(duration);
    };
}

/// Builds the actix middleware exposing `/metrics` and registers every
/// tracker metric with its registry.
pub fn prometheus_metrics() -> PrometheusMetrics {
    let prometheus = PrometheusMetricsBuilder::new("ride_status_tracker")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create prometheus metrics middleware");

    prometheus
        .registry
        .register(Box::new(INCOMING_API.to_owned()))
        .expect("Failed to register incoming API metrics");

    prometheus
        .registry
        .register(Box::new(CALL_EXTERNAL_API.to_owned()))
        .expect("Failed to register external API call metrics");

    prometheus
        .registry
        .register(Box::new(TRACKED_RIDES.to_owned()))
        .expect("Failed to register tracked rides metrics");

    prometheus
        .registry
        .register(Box::new(POLL_FAILURES.to_owned()))
        .expect("Failed to register poll failure metrics");

    prometheus
        .registry
        .register(Box::new(PUSH_MESSAGES.to_owned()))
        .expect("Failed to register push message metrics");

    prometheus
        .registry
        .register(Box::new(COMPLETED_RIDES.to_owned()))
        .expect("Failed to register completed ride metrics");

    prometheus
}
