/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use strum::IntoEnumIterator;

/// The fixed milestone ladder, in rank order.
pub fn milestones() -> impl Iterator<Item = RideStatus> {
    RideStatus::iter().filter(|status| status.milestone_rank().is_some())
}

/// Classifies every milestone against the current status: reached milestones
/// are done, the next expected step is current (the UI spins on it while a
/// refresh is in flight), everything beyond is pending.
///
/// A cancelled ride renders the whole ladder neutral with a single alert
/// entry for the cancellation itself.
pub fn build_timeline(status: RideStatus) -> Vec<TimelineEntry> {
    if status == RideStatus::Cancelled {
        let mut timeline: Vec<TimelineEntry> = milestones()
            .map(|milestone| TimelineEntry {
                milestone,
                state: MilestoneState::PENDING,
            })
            .collect();
        timeline.push(TimelineEntry {
            milestone: RideStatus::Cancelled,
            state: MilestoneState::ALERT,
        });
        return timeline;
    }

    let current_rank = status.milestone_rank().unwrap_or(0);

    milestones()
        .map(|milestone| {
            let rank = milestone.milestone_rank().unwrap_or(0);
            let state = if rank <= current_rank {
                MilestoneState::DONE
            } else if rank == current_rank + 1 {
                MilestoneState::CURRENT
            } else {
                MilestoneState::PENDING
            };
            TimelineEntry { milestone, state }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(status: RideStatus) -> Vec<MilestoneState> {
        build_timeline(status)
            .into_iter()
            .map(|entry| entry.state)
            .collect()
    }

    #[test]
    fn booked_shows_next_step_as_current() {
        assert_eq!(
            states(RideStatus::Booked),
            vec![
                MilestoneState::DONE,
                MilestoneState::CURRENT,
                MilestoneState::PENDING,
                MilestoneState::PENDING,
                MilestoneState::PENDING,
            ]
        );
    }

    #[test]
    fn passenger_on_board_leaves_only_completion_open() {
        assert_eq!(
            states(RideStatus::PassengerOnBoard),
            vec![
                MilestoneState::DONE,
                MilestoneState::DONE,
                MilestoneState::DONE,
                MilestoneState::DONE,
                MilestoneState::CURRENT,
            ]
        );
    }

    #[test]
    fn completed_marks_every_milestone_done() {
        assert!(build_timeline(RideStatus::Completed)
            .iter()
            .all(|entry| entry.state == MilestoneState::DONE));
    }

    #[test]
    fn cancelled_neutralizes_ladder_with_single_alert() {
        let timeline = build_timeline(RideStatus::Cancelled);

        assert_eq!(timeline.len(), 6);
        assert!(timeline[..5]
            .iter()
            .all(|entry| entry.state == MilestoneState::PENDING));
        assert_eq!(timeline[5].milestone, RideStatus::Cancelled);
        assert_eq!(timeline[5].state, MilestoneState::ALERT);
    }
}
