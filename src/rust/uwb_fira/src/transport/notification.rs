// Copyright 2022, The Android Open Source Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::{Display, Formatter};

use crate::params::fira_device::UwbMacAddress;
use crate::params::uci_packets::{
    DeviceState, LineOfSightIndicator, MulticastUpdateStatus, RangingMeasurementType, ReasonCode,
    SessionId, UwbSessionState, UwbStatus,
};

/// The notification sent by the UWB device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UwbNotification {
    DeviceStatus(DeviceState),
    GenericError(UwbStatus),
    SessionStatus {
        session_id: SessionId,
        session_state: UwbSessionState,
        reason_code: Option<ReasonCode>,
    },
    SessionUpdateMulticastListStatus {
        session_id: SessionId,
        statuses: Vec<UwbMulticastListStatus>,
    },
    RangingData(UwbRangingData),
}

impl UwbNotification {
    /// The session the notification belongs to, None for the device-level notifications.
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::DeviceStatus(_) | Self::GenericError(_) => None,
            Self::SessionStatus { session_id, .. }
            | Self::SessionUpdateMulticastListStatus { session_id, .. } => Some(*session_id),
            Self::RangingData(data) => Some(data.session_id),
        }
    }
}

impl Display for UwbNotification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceStatus(state) => write!(f, "Device Status {{ State: {:?} }}", state),
            Self::GenericError(status) => write!(f, "Status {{ {} }}", status),
            Self::SessionStatus { session_id, session_state, reason_code } => {
                write!(
                    f,
                    "Session Status {{ SessionId: {}, State: {:?}, ReasonCode: ",
                    session_id, session_state
                )?;
                match reason_code {
                    Some(reason_code) => write!(f, "{:?} }}", reason_code),
                    None => write!(f, "None }}"),
                }
            }
            Self::SessionUpdateMulticastListStatus { session_id, statuses } => {
                writeln!(f, "Session Multicast List Status {{ SessionId: {}", session_id)?;
                writeln!(f, "Statuses:")?;
                for (index, status) in statuses.iter().enumerate() {
                    writeln!(f, " [{}] {}", index, status)?;
                }
                write!(f, "}}")
            }
            Self::RangingData(data) => write!(f, "Ranging Data {{ {} }}", data),
        }
    }
}

/// The status of one controlee after the multicast list is updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UwbMulticastListStatus {
    pub controlee_mac_address: UwbMacAddress,
    pub sub_session_id: u32,
    pub status: MulticastUpdateStatus,
}

impl Display for UwbMulticastListStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SubSessionId: {}, ControleeMacAddress: {}, Status: {:?}",
            self.sub_session_id, self.controlee_mac_address, self.status
        )
    }
}

/// An angle of arrival, with its figure of merit when the device reports one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UwbRangingMeasurementData {
    pub result: u16,
    pub figure_of_merit: Option<u8>,
}

impl Display for UwbRangingMeasurementData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (FoM={})", self.result, self.figure_of_merit.unwrap_or(0))
    }
}

/// The measurement of one peer in a ranging round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UwbRangingMeasurement {
    pub slot_index: u8,
    /// The distance in centimeters.
    pub distance: u16,
    pub status: UwbStatus,
    pub peer_mac_address: UwbMacAddress,
    pub line_of_sight_indicator: LineOfSightIndicator,
    pub aoa_azimuth: UwbRangingMeasurementData,
    pub aoa_elevation: UwbRangingMeasurementData,
    pub aoa_destination_azimuth: UwbRangingMeasurementData,
    pub aoa_destination_elevation: UwbRangingMeasurementData,
}

impl Display for UwbRangingMeasurement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SlotIndex: {}, Distance: {}, Status: {}, Peer Mac Address: {}, \
             Line Of Sight Indicator: {:?}, Angle of Arrival Azimuth: {}, \
             Angle of Arrival Elevation: {}, Angle of Arrival Destination Azimuth: {}, \
             Angle of Arrival Destination Elevation: {}",
            self.slot_index,
            self.distance,
            self.status,
            self.peer_mac_address,
            self.line_of_sight_indicator,
            self.aoa_azimuth,
            self.aoa_elevation,
            self.aoa_destination_azimuth,
            self.aoa_destination_elevation
        )
    }
}

/// The ranging data of one ranging round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UwbRangingData {
    pub sequence_number: u32,
    pub session_id: SessionId,
    /// The current ranging interval in milliseconds.
    pub current_ranging_interval: u32,
    pub measurement_type: RangingMeasurementType,
    pub measurements: Vec<UwbRangingMeasurement>,
}

impl Display for UwbRangingData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Session Id: {}, Sequence Number: {}, Ranging Interval: {} Measurement Type: {:?}",
            self.session_id,
            self.sequence_number,
            self.current_ranging_interval,
            self.measurement_type
        )?;
        writeln!(f, "Measurements:")?;
        for (index, measurement) in self.measurements.iter().enumerate() {
            writeln!(f, "  [{}] {}", index, measurement)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id() {
        assert_eq!(UwbNotification::DeviceStatus(DeviceState::Ready).session_id(), None);
        let notf = UwbNotification::SessionStatus {
            session_id: 3,
            session_state: UwbSessionState::Idle,
            reason_code: None,
        };
        assert_eq!(notf.session_id(), Some(3));
    }

    #[test]
    fn test_display() {
        let notf = UwbNotification::SessionStatus {
            session_id: 3,
            session_state: UwbSessionState::Deinit,
            reason_code: Some(ReasonCode::MaxRangingRoundRetryCountReached),
        };
        assert_eq!(
            notf.to_string(),
            "Session Status { SessionId: 3, State: Deinit, \
             ReasonCode: MaxRangingRoundRetryCountReached }"
        );

        let notf = UwbNotification::DeviceStatus(DeviceState::Error);
        assert_eq!(notf.to_string(), "Device Status { State: Error }");

        let data = UwbRangingMeasurementData { result: 90, figure_of_merit: Some(100) };
        assert_eq!(data.to_string(), "90 (FoM=100)");
        let data = UwbRangingMeasurementData { result: 90, figure_of_merit: None };
        assert_eq!(data.to_string(), "90 (FoM=0)");
    }

    #[test]
    fn test_ranging_data_display() {
        let data = UwbRangingData {
            sequence_number: 1,
            session_id: 2,
            current_ranging_interval: 200,
            measurement_type: RangingMeasurementType::TwoWay,
            measurements: vec![UwbRangingMeasurement {
                slot_index: 0,
                distance: 150,
                status: UwbStatus::Ok,
                peer_mac_address: UwbMacAddress::Short([0x12, 0x34]),
                line_of_sight_indicator: LineOfSightIndicator::LineOfSight,
                aoa_azimuth: Default::default(),
                aoa_elevation: Default::default(),
                aoa_destination_azimuth: Default::default(),
                aoa_destination_elevation: Default::default(),
            }],
        };
        let text = UwbNotification::RangingData(data).to_string();
        assert!(text.starts_with("Ranging Data { Session Id: 2, Sequence Number: 1"));
        assert!(text.contains("  [0] SlotIndex: 0, Distance: 150, Status: Ok"));
        assert!(text.contains("Peer Mac Address: 12:34"));
    }
}
