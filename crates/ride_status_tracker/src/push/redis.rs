/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::{PushChannel, PushMessage};
use crate::common::types::RoomId;
use crate::environment::RedisConfig;
use crate::tools::error::AppError;
use crate::tools::prometheus::PUSH_MESSAGES;
use async_trait::async_trait;
use fred::clients::SubscriberClient;
use fred::interfaces::{ClientLike, EventInterface, PubsubInterface};
use fred::types::{Builder, ReconnectPolicy, RedisConfig as FredRedisConfig, RespVersion, TracingConfig};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::RwLock;
use tracing::{error, warn};

type RoomSinks = Arc<RwLock<FxHashMap<String, Sender<PushMessage>>>>;

/// Push rooms over Redis pub/sub. One subscriber connection carries every
/// room; a background task fans messages out to the sink registered for the
/// message's channel. Subscriptions are re-established by the client itself
/// after a reconnect.
pub struct RedisPushChannel {
    subscriber: SubscriberClient,
    rooms: RoomSinks,
}

impl RedisPushChannel {
    pub async fn new(conf: &RedisConfig) -> Result<Self, AppError> {
        let redis_connection_url = format!(
            "redis://{}:{}/{}",
            conf.redis_host, conf.redis_port, conf.redis_partition
        );

        let mut config = FredRedisConfig::from_url(&redis_connection_url)
            .map_err(|err| AppError::PushConnectionFailed(err.to_string()))?;
        config.version = RespVersion::RESP3;
        config.tracing = TracingConfig::new(true);

        let reconnect_policy =
            ReconnectPolicy::new_constant(conf.reconnect_max_attempts, conf.reconnect_delay);

        let subscriber = Builder::from_config(config)
            .set_policy(reconnect_policy)
            .build_subscriber_client()
            .map_err(|err| AppError::PushConnectionFailed(err.to_string()))?;

        subscriber.connect();
        subscriber
            .wait_for_connect()
            .await
            .map_err(|err| AppError::PushConnectionFailed(err.to_string()))?;
        subscriber.manage_subscriptions();

        let rooms: RoomSinks = Arc::new(RwLock::new(FxHashMap::default()));

        let reader_rooms = rooms.clone();
        let mut message_stream = subscriber.message_rx();
        tokio::spawn(async move {
            loop {
                match message_stream.recv().await {
                    Ok(message) => {
                        PUSH_MESSAGES.inc();

                        let room = message.channel.to_string();
                        let payload = match message.value.as_str() {
                            Some(payload) => payload.to_string(),
                            None => continue,
                        };

                        match serde_json::from_str::<PushMessage>(payload.as_str()) {
                            Ok(push_message) => {
                                let rooms = reader_rooms.read().await;
                                if let Some(sink) = rooms.get(&room) {
                                    if sink.send(push_message).await.is_err() {
                                        warn!(tag = "[PUSH ROOM]", room = %room, "Dropping message, tracker sink closed");
                                    }
                                }
                            }
                            Err(err) => {
                                warn!(tag = "[PUSH DECODE]", room = %room, error = %err, "Undecodable push message")
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        error!(tag = "[PUSH ROOM]", skipped = %skipped, "Push reader lagged, messages dropped");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(RedisPushChannel { subscriber, rooms })
    }
}

#[async_trait]
impl PushChannel for RedisPushChannel {
    async fn join_room(&self, RoomId(room): &RoomId, sink: Sender<PushMessage>) -> Result<(), AppError> {
        {
            let mut rooms = self.rooms.write().await;
            rooms.insert(room.to_owned(), sink);
        }

        self.subscriber
            .subscribe(room.as_str())
            .await
            .map_err(|err| AppError::PushSubscriptionFailed(err.to_string()))?;

        Ok(())
    }

    async fn leave_room(&self, RoomId(room): &RoomId) -> Result<(), AppError> {
        {
            let mut rooms = self.rooms.write().await;
            rooms.remove(room);
        }

        self.subscriber
            .unsubscribe(room.as_str())
            .await
            .map_err(|err| AppError::PushSubscriptionFailed(err.to_string()))?;

        Ok(())
    }

    async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    async fn is_connected(&self) -> bool {
        self.subscriber.state() == fred::types::ClientState::Connected
    }
}
