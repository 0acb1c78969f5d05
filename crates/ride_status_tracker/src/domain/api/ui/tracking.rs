/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{
    get, post,
    web::{Data, Json, Path},
};

use crate::{
    common::types::*,
    domain::{action::ui::tracking, types::ui::tracking::*},
    environment::AppState,
    tools::error::AppError,
};

#[post("/ui/tracking/{bookingReference}/start")]
async fn start_tracking(
    data: Data<AppState>,
    param_obj: Json<StartTrackingRequest>,
    path: Path<String>,
) -> Result<Json<StartTrackingResponse>, AppError> {
    let request_body = param_obj.into_inner();
    let booking_reference = BookingReference(path.into_inner());

    Ok(Json(
        tracking::start_tracking(data, booking_reference, request_body).await?,
    ))
}

#[post("/ui/tracking/{bookingReference}/stop")]
async fn stop_tracking(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<APISuccess>, AppError> {
    let booking_reference = BookingReference(path.into_inner());

    Ok(Json(tracking::stop_tracking(data, booking_reference).await?))
}

#[get("/ui/tracking/{bookingReference}/status")]
async fn tracking_status(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<DerivedRideState>, AppError> {
    let booking_reference = BookingReference(path.into_inner());

    Ok(Json(
        tracking::tracking_status(data, booking_reference).await?,
    ))
}

#[post("/ui/tracking/{bookingReference}/refresh")]
async fn refresh_tracking(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<APISuccess>, AppError> {
    let booking_reference = BookingReference(path.into_inner());

    Ok(Json(
        tracking::refresh_tracking(data, booking_reference).await?,
    ))
}
