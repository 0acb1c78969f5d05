/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;

// Push rooms are plain pub/sub channels; one room per tracked ride.
pub fn ride_room_key(RideId(ride_id): &RideId) -> String {
    format!("rst:room:ride:{ride_id}")
}

// Fallback room when the ride id is not known yet at mount time.
pub fn booking_room_key(BookingReference(booking_reference): &BookingReference) -> String {
    format!("rst:room:booking:{booking_reference}")
}
