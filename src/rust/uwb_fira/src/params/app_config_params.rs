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

//! This module maps the `UWB_CONFIGURATION` onto the UCI application configuration parameters,
//! which are used for the SESSION_SET_APP_CONFIG_CMD.

use std::fmt::{Display, Formatter};

use log::debug;
use num_derive::{FromPrimitive, ToPrimitive};

use crate::params::fira_device::UwbMacAddress;
use crate::params::uwb_configuration::{ParameterTag, ParameterValue, UwbConfiguration};

/// The type of the UCI application configuration parameter.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive, ToPrimitive)]
pub enum UwbApplicationConfigurationParameterType {
    DeviceType = 0x00,
    RangingRoundUsage = 0x01,
    StsConfiguration = 0x02,
    MultiNodeMode = 0x03,
    ChannelNumber = 0x04,
    NumberOfControlees = 0x05,
    DeviceMacAddress = 0x06,
    DestinationMacAddresses = 0x07,
    SlotDuration = 0x08,
    RangingInterval = 0x09,
    StsIndex = 0x0A,
    MacFcsType = 0x0B,
    RangingRoundControl = 0x0C,
    AoaResultRequest = 0x0D,
    RangeDataNotificationConfig = 0x0E,
    RangeDataNotificationProximityNear = 0x0F,
    RangeDataNotificationProximityFar = 0x10,
    DeviceRole = 0x11,
    RFrameConfiguration = 0x12,
    PreambleCodeIndex = 0x14,
    SfdId = 0x15,
    PsduDataRate = 0x16,
    PreambleDuration = 0x17,
    RangingTimeStruct = 0x1A,
    SlotsPerRangingRound = 0x1B,
    TxAdaptivePayloadPower = 0x1C,
    ResponderSlotIndex = 0x1E,
    PrfMode = 0x1F,
    ScheduledMode = 0x22,
    KeyRotation = 0x23,
    KeyRotationRate = 0x24,
    SessionPriority = 0x25,
    MacAddressMode = 0x26,
    VendorId = 0x27,
    StaticStsIv = 0x28,
    NumberOfStsSegments = 0x29,
    MaxRangingRoundRetry = 0x2A,
    UwbInitiationTime = 0x2B,
    HoppingMode = 0x2C,
    BlockStrideLength = 0x2D,
    ResultReportConfig = 0x2E,
    InBandTerminationAttemptCount = 0x2F,
    SubSessionId = 0x30,
    BprfPhrDataRate = 0x31,
    MaxNumberOfMeasurements = 0x32,
    StsLength = 0x35,
}

/// One UCI application configuration parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UwbApplicationConfigurationParameter {
    pub param_type: UwbApplicationConfigurationParameterType,
    pub value: ParameterValue,
}

impl UwbApplicationConfigurationParameter {
    pub fn new(
        param_type: UwbApplicationConfigurationParameterType,
        value: ParameterValue,
    ) -> Self {
        Self { param_type, value }
    }

    /// The destination list pushed to the device when a peer is added.
    pub fn destination_mac_addresses(addresses: Vec<UwbMacAddress>) -> Self {
        Self::new(
            UwbApplicationConfigurationParameterType::DestinationMacAddresses,
            ParameterValue::MacAddresses(addresses),
        )
    }
}

impl Display for UwbApplicationConfigurationParameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.param_type, self.value)
    }
}

type UciGenerator = fn(&UwbConfiguration) -> Option<ParameterValue>;

// The UCI parameters that can be derived from the UWB_CONFIGURATION. A generator returns None
// when the configuration doesn't carry enough information.
const UCI_GENERATORS: &[(UwbApplicationConfigurationParameterType, UciGenerator)] = &[
    (UwbApplicationConfigurationParameterType::DeviceType, |_| {
        debug!("DeviceType requires DeviceType to resolve");
        None
    }),
    (UwbApplicationConfigurationParameterType::RangingRoundUsage, |config| {
        config.value(ParameterTag::RangingMethod).cloned()
    }),
    (UwbApplicationConfigurationParameterType::DeviceRole, |config| {
        config.value(ParameterTag::DeviceRole).cloned()
    }),
    (UwbApplicationConfigurationParameterType::StsConfiguration, |config| {
        config.value(ParameterTag::StsConfig).cloned()
    }),
    (UwbApplicationConfigurationParameterType::MultiNodeMode, |config| {
        config.value(ParameterTag::MultiNodeMode).cloned()
    }),
    (UwbApplicationConfigurationParameterType::ChannelNumber, |config| {
        config.value(ParameterTag::ChannelNumber).cloned()
    }),
    (UwbApplicationConfigurationParameterType::SlotDuration, |config| {
        config.value(ParameterTag::SlotDuration).cloned()
    }),
    // The UCI parameter is 4 octets wide.
    (UwbApplicationConfigurationParameterType::RangingInterval, |config| {
        config.ranging_interval().map(|interval| ParameterValue::U32(interval.into()))
    }),
    (UwbApplicationConfigurationParameterType::MacFcsType, |config| {
        config.value(ParameterTag::MacFcsType).cloned()
    }),
    (UwbApplicationConfigurationParameterType::RFrameConfiguration, |config| {
        config.value(ParameterTag::RFrameConfig).cloned()
    }),
    (UwbApplicationConfigurationParameterType::PreambleCodeIndex, |config| {
        config.value(ParameterTag::PreambleCodeIndex).cloned()
    }),
    (UwbApplicationConfigurationParameterType::RangingTimeStruct, |config| {
        config.value(ParameterTag::RangingTimeStruct).cloned()
    }),
    (UwbApplicationConfigurationParameterType::SlotsPerRangingRound, |config| {
        config.value(ParameterTag::SlotsPerRr).cloned()
    }),
    (UwbApplicationConfigurationParameterType::PrfMode, |config| {
        config.value(ParameterTag::PrfMode).cloned()
    }),
    (UwbApplicationConfigurationParameterType::ScheduledMode, |config| {
        config.value(ParameterTag::ScheduledMode).cloned()
    }),
    (UwbApplicationConfigurationParameterType::KeyRotationRate, |config| {
        config.value(ParameterTag::KeyRotationRate).cloned()
    }),
    (UwbApplicationConfigurationParameterType::MacAddressMode, |config| {
        config.value(ParameterTag::MacAddressMode).cloned()
    }),
    (UwbApplicationConfigurationParameterType::MaxRangingRoundRetry, |config| {
        config.value(ParameterTag::MaxRrRetry).cloned()
    }),
    (UwbApplicationConfigurationParameterType::UwbInitiationTime, |config| {
        config.value(ParameterTag::UwbInitiationTime).cloned()
    }),
    (UwbApplicationConfigurationParameterType::HoppingMode, |config| {
        config.value(ParameterTag::HoppingMode).cloned()
    }),
    (UwbApplicationConfigurationParameterType::ResultReportConfig, |config| {
        config.value(ParameterTag::ResultReportConfig).cloned()
    }),
    // Whether the local device is the controller or a controlee decides which of the MAC
    // addresses is ours, and the UWB_CONFIGURATION doesn't tell.
    (UwbApplicationConfigurationParameterType::DeviceMacAddress, |config| {
        config.mac_address_mode()?;
        config.device_role()?;
        debug!("DeviceMacAddress requires DeviceType to resolve");
        None
    }),
    (UwbApplicationConfigurationParameterType::DestinationMacAddresses, |config| {
        config.mac_address_mode()?;
        config.device_role()?;
        debug!("DestinationMacAddresses requires DeviceType to resolve");
        None
    }),
];

impl UwbConfiguration {
    /// Generate the UCI application configuration parameters. The parameters that can't be
    /// derived from the configuration are omitted.
    pub fn get_uci_config_params(&self) -> Vec<UwbApplicationConfigurationParameter> {
        UCI_GENERATORS
            .iter()
            .filter_map(|(param_type, generator)| {
                let value = generator(self)?;
                Some(UwbApplicationConfigurationParameter::new(*param_type, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::params::fira_device::{DeviceRole, UwbChannel};
    use crate::params::uwb_configuration::UwbConfigurationBuilder;
    use crate::utils::init_test_logging;

    fn find(
        params: &[UwbApplicationConfigurationParameter],
        param_type: UwbApplicationConfigurationParameterType,
    ) -> Option<&ParameterValue> {
        params.iter().find(|param| param.param_type == param_type).map(|param| &param.value)
    }

    #[test]
    fn test_uci_params_of_empty_configuration() {
        init_test_logging();

        assert!(UwbConfiguration::new().get_uci_config_params().is_empty());
    }

    #[test]
    fn test_uci_params_of_defaults() {
        init_test_logging();

        let params = UwbConfiguration::with_defaults().get_uci_config_params();
        assert_eq!(params.len(), 17);
        assert_eq!(
            find(&params, UwbApplicationConfigurationParameterType::DeviceRole),
            Some(&ParameterValue::Enum(DeviceRole::Responder as u8))
        );
        assert_eq!(
            find(&params, UwbApplicationConfigurationParameterType::RangingRoundUsage),
            Some(&ParameterValue::Enum(2))
        );
        assert_eq!(
            find(&params, UwbApplicationConfigurationParameterType::ChannelNumber),
            Some(&ParameterValue::Enum(UwbChannel::Channel9 as u8))
        );
        assert_eq!(
            find(&params, UwbApplicationConfigurationParameterType::ResultReportConfig),
            Some(&ParameterValue::FlagSet(0b0010))
        );

        // These need the device type, which the configuration doesn't carry.
        assert_eq!(find(&params, UwbApplicationConfigurationParameterType::DeviceType), None);
        assert_eq!(find(&params, UwbApplicationConfigurationParameterType::DeviceMacAddress), None);
        assert_eq!(
            find(&params, UwbApplicationConfigurationParameterType::DestinationMacAddresses),
            None
        );
        // No default.
        assert_eq!(find(&params, UwbApplicationConfigurationParameterType::SlotDuration), None);
    }

    #[test]
    fn test_uci_params_of_timing() {
        let params = UwbConfigurationBuilder::new()
            .slot_duration(2400)
            .ranging_interval(200)
            .slots_per_ranging_round(25)
            .build()
            .get_uci_config_params();
        assert_eq!(
            params,
            vec![
                UwbApplicationConfigurationParameter::new(
                    UwbApplicationConfigurationParameterType::SlotDuration,
                    ParameterValue::U16(2400)
                ),
                UwbApplicationConfigurationParameter::new(
                    UwbApplicationConfigurationParameterType::RangingInterval,
                    ParameterValue::U32(200)
                ),
                UwbApplicationConfigurationParameter::new(
                    UwbApplicationConfigurationParameterType::SlotsPerRangingRound,
                    ParameterValue::U8(25)
                ),
            ]
        );
    }

    #[test]
    fn test_display() {
        let param = UwbApplicationConfigurationParameter::destination_mac_addresses(vec![
            UwbMacAddress::Short([0x01, 0x02]),
        ]);
        assert_eq!(param.to_string(), "DestinationMacAddresses: [01:02]");
    }
}
