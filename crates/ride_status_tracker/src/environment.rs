/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use std::sync::Arc;

use crate::common::types::*;
use crate::outbound::external::{BookingApi, EventsSource};
use crate::push::redis::RedisPushChannel;
use crate::push::PushChannel;
use crate::tools::logger::LoggerConfig;
use crate::tracker::{TrackerConfig, TrackerHandle};
use rdkafka::{error::KafkaError, producer::FutureProducer, ClientConfig};
use reqwest::Url;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub workers: usize,
    pub logger_cfg: LoggerConfig,
    pub redis_cfg: RedisConfig,
    pub kafka_cfg: KafkaConfig,
    pub booking_api_base_url: String,
    pub booking_api_key: String,
    pub poll_interval_seconds: u64,
    pub recent_events_limit: usize,
    pub status_update_topic: String,
    pub request_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub kafka_key: String,
    pub kafka_host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_partition: usize,
    pub reconnect_max_attempts: u32,
    pub reconnect_delay: u32,
}

pub type TrackerRegistry = Arc<RwLock<FxHashMap<BookingReference, TrackerHandle>>>;

#[derive(Clone)]
pub struct AppState {
    pub trackers: TrackerRegistry,
    pub events_source: Arc<dyn EventsSource>,
    pub push_channel: Arc<dyn PushChannel>,
    pub producer: Option<FutureProducer>,
    pub tracker_cfg: TrackerConfig,
    pub request_timeout: u64,
}

impl AppState {
    pub async fn new(app_config: AppConfig) -> AppState {
        let push_channel: Arc<dyn PushChannel> = Arc::new(
            RedisPushChannel::new(&app_config.redis_cfg)
                .await
                .expect("Failed to connect push channel subscriber"),
        );

        let booking_api_base_url = Url::parse(app_config.booking_api_base_url.as_str())
            .expect("Failed to parse booking_api_base_url.");

        let producer: Option<FutureProducer>;

        let result: Result<FutureProducer, KafkaError> = ClientConfig::new()
            .set(
                app_config.kafka_cfg.kafka_key,
                app_config.kafka_cfg.kafka_host,
            )
            .set("compression.type", "lz4")
            .create();

        match result {
            Ok(val) => {
                producer = Some(val);
            }
            Err(err) => {
                producer = None;
                info!(
                    tag = "[Kafka Connection]",
                    "Error connecting to kafka config: {err}"
                );
            }
        }

        AppState {
            trackers: Arc::new(RwLock::new(FxHashMap::default())),
            events_source: Arc::new(BookingApi::new(
                booking_api_base_url,
                app_config.booking_api_key,
            )),
            push_channel,
            producer,
            tracker_cfg: TrackerConfig {
                poll_interval_seconds: app_config.poll_interval_seconds,
                recent_events_limit: app_config.recent_events_limit,
                status_update_topic: app_config.status_update_topic,
            },
            request_timeout: app_config.request_timeout,
        }
    }
}
