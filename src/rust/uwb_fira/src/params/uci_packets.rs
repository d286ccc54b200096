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

//! This module defines the parameters and the responses exchanged with the UwbTransport.

use std::fmt::{Display, Formatter};

use num_derive::{FromPrimitive, ToPrimitive};

use crate::params::app_config_params::UwbApplicationConfigurationParameterType;
use crate::params::fira_device::{
    version_to_string, DeviceRole, MultiNodeMode, RangingConfiguration, RangingMode,
    SchedulingMode, StsConfiguration, StsPacketConfiguration, UwbChannel,
};

/// The type of the session identifier.
pub type SessionId = u32;

/// The status code returned by the transport.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum UwbStatus {
    Ok = 0x00,
    Rejected = 0x01,
    Failed = 0x02,
    InvalidParameter = 0x04,
    /// The command should be retried.
    CommandRetry = 0x0A,
    SessionNotExist = 0x11,
    SessionDuplicate = 0x12,
}

impl UwbStatus {
    pub fn is_ok(&self) -> bool {
        *self == UwbStatus::Ok
    }

    pub fn is_retry(&self) -> bool {
        *self == UwbStatus::CommandRetry
    }
}

impl Display for UwbStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The local state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// The session is created, the transport doesn't know it yet.
    Uninitialized,
    /// The transport initialized the session.
    Initialized,
    /// The application configuration is applied.
    Configured,
    Ranging,
    /// The device stopped ranging on its own.
    Stopped,
    /// Terminal state.
    Deinitialized,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        *self == SessionState::Deinitialized
    }
}

/// The session state reported by the device.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum UwbSessionState {
    Init = 0x00,
    Deinit = 0x01,
    Active = 0x02,
    Idle = 0x03,
}

/// The type of the session.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum SessionType {
    FiraRangingSession = 0x00,
    FiraDataTransfer = 0x01,
    DeviceTestMode = 0xD0,
}

/// The state of the UWB device.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum DeviceState {
    Ready = 0x01,
    Active = 0x02,
    Error = 0xFF,
}

/// The reason of a session state change reported by the device.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum ReasonCode {
    StateChangeWithSessionManagementCommands = 0x00,
    MaxRangingRoundRetryCountReached = 0x01,
    MaxNumberOfMeasurementsReached = 0x02,
    ErrorSlotLengthNotSupported = 0x20,
    ErrorInsufficientSlotsPerRr = 0x21,
    ErrorMacAddressModeNotSupported = 0x22,
    ErrorInvalidRangingInterval = 0x23,
    ErrorInvalidStsConfig = 0x24,
    ErrorInvalidRframeConfig = 0x25,
}

/// The status of one controlee in the multicast list update.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum MulticastUpdateStatus {
    OkMulticastListUpdate = 0x00,
    ErrorMulticastListFull = 0x01,
    ErrorKeyFetchFail = 0x02,
    ErrorSubSessionIdNotFound = 0x03,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum LineOfSightIndicator {
    LineOfSight = 0x00,
    NonLineOfSight = 0x01,
    Indeterminant = 0xFF,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum RangingMeasurementType {
    OneWay = 0x00,
    TwoWay = 0x01,
}

/// The response of the UwbTransport::get_device_information() method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UwbDeviceInformation {
    /// The UCI version.
    pub uci_version: u32,
    /// The UCI test version.
    pub uci_test_version: u32,
    /// The MAC version.
    pub mac_version: u32,
    /// The physical version.
    pub phy_version: u32,
    pub vendor_specific_info: Vec<u8>,
}

impl Display for UwbDeviceInformation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FiRa Uci v{}, FiRa Uci Test v{}, FiRa MAC v{}, FiRa PHY v{}",
            version_to_string(self.uci_version),
            version_to_string(self.uci_test_version),
            version_to_string(self.mac_version),
            version_to_string(self.phy_version)
        )?;
        if !self.vendor_specific_info.is_empty() {
            let bytes: Vec<String> =
                self.vendor_specific_info.iter().map(|b| format!("{:02X}", b)).collect();
            write!(f, "\nVendor Specific Info: {}", bytes.join(" "))?;
        }
        Ok(())
    }
}

/// The response of the UwbTransport::get_capabilities() method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UwbCapability {
    pub fira_phy_lower_bound_version: u32,
    pub fira_phy_upper_bound_version: u32,
    pub fira_mac_lower_bound_version: u32,
    pub fira_mac_upper_bound_version: u32,
    pub extended_mac_address: bool,
    pub uwb_initiation_time: bool,
    pub hopping_mode: bool,
    pub block_striding: bool,
    pub device_roles: Vec<DeviceRole>,
    pub multi_node_modes: Vec<MultiNodeMode>,
    pub ranging_methods: Vec<RangingConfiguration>,
    pub sts_configurations: Vec<StsConfiguration>,
    pub rframe_configs: Vec<StsPacketConfiguration>,
    pub ranging_time_structs: Vec<RangingMode>,
    pub scheduling_modes: Vec<SchedulingMode>,
    pub channels: Vec<UwbChannel>,
}

/// The status of one parameter in the response of the set-application-configuration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfigStatus {
    pub param_type: UwbApplicationConfigurationParameterType,
    pub status: UwbStatus,
}

/// The response of the UwbTransport::set_application_configuration_parameters() method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetAppConfigResponse {
    /// The status code of the response.
    pub status: UwbStatus,
    /// The status of each parameter the device failed to apply.
    pub config_status: Vec<AppConfigStatus>,
}
