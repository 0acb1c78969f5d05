/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use crate::common::types::*;
use crate::tools::callapi::call_api;
use crate::tools::error::AppError;
use async_trait::async_trait;
use reqwest::{Method, Url};

/// Source of the authoritative event history for a booking. The HTTP client
/// below is the production implementation; tests substitute their own.
#[async_trait]
pub trait EventsSource: Send + Sync + 'static {
    async fn events_history(
        &self,
        booking_reference: &BookingReference,
    ) -> Result<RideEventsHistoryResponse, AppError>;
}

pub struct BookingApi {
    pub base_url: Url,
    pub api_key: String,
}

impl BookingApi {
    pub fn new(base_url: Url, api_key: String) -> Self {
        BookingApi { base_url, api_key }
    }

    fn events_history_url(
        &self,
        BookingReference(booking_reference): &BookingReference,
    ) -> Result<Url, AppError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(format!("{base}/internal/bookings/{booking_reference}/events").as_str())
            .map_err(|err| AppError::InvalidRequest(err.to_string()))
    }
}

#[async_trait]
impl EventsSource for BookingApi {
    async fn events_history(
        &self,
        booking_reference: &BookingReference,
    ) -> Result<RideEventsHistoryResponse, AppError> {
        let url = self.events_history_url(booking_reference)?;

        call_api::<RideEventsHistoryResponse, String>(
            Method::GET,
            &url,
            vec![
                ("content-type", "application/json"),
                ("api-key", self.api_key.as_str()),
            ],
            None,
        )
        .await
    }
}
