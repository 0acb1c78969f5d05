/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    error_message: String,
    pub error_code: String,
}

#[macros::add_error]
pub enum AppError {
    InternalError(String),
    InvalidRequest(String),
    PanicOccured(String),
    UnprocessibleRequest(String),
    TrackerNotFound(String),
    TrackerMailboxClosed(String),
    ExternalAPICallError(String),
    SerializationError(String),
    DeserializationError(String),
    PushConnectionFailed(String),
    PushSubscriptionFailed(String),
    KafkaPushFailed(String),
    InvalidConfiguration(String),
    RequestTimeout,
}

impl AppError {
    fn error_message(&self) -> ErrorBody {
        ErrorBody {
            error_message: self.message(),
            error_code: self.code(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::InternalError(err) => err.to_string(),
            AppError::InvalidRequest(err) => err.to_string(),
            AppError::UnprocessibleRequest(err) => err.to_string(),
            AppError::TrackerNotFound(booking_reference) => {
                format!("No active tracker for booking reference : {booking_reference}")
            }
            AppError::TrackerMailboxClosed(booking_reference) => {
                format!("Tracker is no longer running for booking reference : {booking_reference}")
            }
            AppError::ExternalAPICallError(err) => err.to_string(),
            AppError::SerializationError(err) => err.to_string(),
            AppError::DeserializationError(err) => err.to_string(),
            AppError::PushConnectionFailed(err) => {
                format!("Push channel connection failed : {err}")
            }
            AppError::PushSubscriptionFailed(err) => {
                format!("Push channel subscription failed : {err}")
            }
            AppError::KafkaPushFailed(err) => {
                format!("Kafka Push Failed : {err}")
            }
            AppError::InvalidConfiguration(err) => err.to_string(),
            AppError::PanicOccured(reason) => {
                format!("Panic occured : {reason}")
            }
            AppError::RequestTimeout => "Request Timeout".to_string(),
        }
    }

    fn code(&self) -> String {
        match self {
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::PanicOccured(_) => "PANIC_OCCURED",
            AppError::UnprocessibleRequest(_) => "UNPROCESSIBLE_REQUEST",
            AppError::TrackerNotFound(_) => "TRACKER_NOT_FOUND",
            AppError::TrackerMailboxClosed(_) => "TRACKER_MAILBOX_CLOSED",
            AppError::ExternalAPICallError(_) => "EXTERNAL_API_CALL_ERROR",
            AppError::SerializationError(_) => "SERIALIZATION_ERROR",
            AppError::DeserializationError(_) => "DESERIALIZATION_ERROR",
            AppError::PushConnectionFailed(_) => "PUSH_CONNECTION_FAILED",
            AppError::PushSubscriptionFailed(_) => "PUSH_SUBSCRIPTION_FAILED",
            AppError::KafkaPushFailed(_) => "KAFKA_PUSH_FAILED",
            AppError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            AppError::RequestTimeout => "REQUEST_TIMEOUT",
        }
        .to_string()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(self.error_message())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PanicOccured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UnprocessibleRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TrackerNotFound(_) => StatusCode::NOT_FOUND,
            AppError::TrackerMailboxClosed(_) => StatusCode::GONE,
            AppError::ExternalAPICallError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DeserializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PushConnectionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PushSubscriptionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::KafkaPushFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
        }
    }
}
