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

//! This module defines the FiRa `UWB_CONFIGURATION` data object, which is exchanged out-of-band
//! between the controller and the controlees before ranging.
//! Ref: FiRa Consortium UWB Common Service Management Layer, Table 53.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use log::{debug, warn};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::error::{Error, Result};
use crate::params::fira_device::{
    ConvolutionalCodeConstraintLength, DeviceRole, MultiNodeMode, PrfMode, RangingConfiguration,
    RangingMode, ResultReportConfig, SchedulingMode, StsConfiguration, StsPacketConfiguration,
    UwbChannel, UwbMacAddress, UwbMacAddressFcsType, UwbMacAddressType,
};
use crate::params::utils::{
    bytes_to_u16, bytes_to_u32, bytes_to_u8, u16_to_bytes, u32_to_bytes, validate,
};
use crate::tlv::TlvBer;

/// The tag of each parameter inside the `UWB_CONFIGURATION` data object.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive, ToPrimitive)]
pub enum ParameterTag {
    FiraPhyVersion = 0x80,
    FiraMacVersion = 0x81,
    DeviceRole = 0x82,
    RangingMethod = 0x83,
    StsConfig = 0x84,
    MultiNodeMode = 0x85,
    RangingTimeStruct = 0x86,
    ScheduledMode = 0x87,
    HoppingMode = 0x88,
    BlockStriding = 0x89,
    UwbInitiationTime = 0x8A,
    ChannelNumber = 0x8B,
    RFrameConfig = 0x8C,
    CcConstraintLength = 0x8D,
    PrfMode = 0x8E,
    Sp0PhySetNumber = 0x8F,
    Sp1PhySetNumber = 0x90,
    Sp3PhySetNumber = 0x91,
    PreambleCodeIndex = 0x92,
    ResultReportConfig = 0x93,
    MacAddressMode = 0x94,
    ControleeShortMacAddress = 0x95,
    ControllerMacAddress = 0x96,
    SlotsPerRr = 0x97,
    MaxContentionPhaseLength = 0x98,
    SlotDuration = 0x99,
    RangingInterval = 0x9A,
    KeyRotationRate = 0x9B,
    MacFcsType = 0x9C,
    MaxRrRetry = 0x9D,
}

/// The type of the value carried by a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    U8,
    U16,
    U32,
    Bool,
    /// The one-byte ordinal of an enumeration.
    Enum,
    MacAddress,
    MacAddresses,
    /// The bit-packed byte of a set of flags.
    FlagSet,
    ByteArray,
}

impl ParameterTag {
    /// All the tags of the catalog, in ascending order.
    pub const ALL: [ParameterTag; 30] = [
        Self::FiraPhyVersion,
        Self::FiraMacVersion,
        Self::DeviceRole,
        Self::RangingMethod,
        Self::StsConfig,
        Self::MultiNodeMode,
        Self::RangingTimeStruct,
        Self::ScheduledMode,
        Self::HoppingMode,
        Self::BlockStriding,
        Self::UwbInitiationTime,
        Self::ChannelNumber,
        Self::RFrameConfig,
        Self::CcConstraintLength,
        Self::PrfMode,
        Self::Sp0PhySetNumber,
        Self::Sp1PhySetNumber,
        Self::Sp3PhySetNumber,
        Self::PreambleCodeIndex,
        Self::ResultReportConfig,
        Self::MacAddressMode,
        Self::ControleeShortMacAddress,
        Self::ControllerMacAddress,
        Self::SlotsPerRr,
        Self::MaxContentionPhaseLength,
        Self::SlotDuration,
        Self::RangingInterval,
        Self::KeyRotationRate,
        Self::MacFcsType,
        Self::MaxRrRetry,
    ];

    /// The declared kind of the value carried by the parameter.
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::FiraPhyVersion
            | Self::FiraMacVersion
            | Self::SlotDuration
            | Self::RangingInterval
            | Self::MaxRrRetry => ParameterKind::U16,
            Self::UwbInitiationTime => ParameterKind::U32,
            Self::HoppingMode | Self::BlockStriding => ParameterKind::Bool,
            Self::Sp0PhySetNumber
            | Self::Sp1PhySetNumber
            | Self::Sp3PhySetNumber
            | Self::PreambleCodeIndex
            | Self::SlotsPerRr
            | Self::MaxContentionPhaseLength
            | Self::KeyRotationRate => ParameterKind::U8,
            Self::ResultReportConfig => ParameterKind::FlagSet,
            Self::ControleeShortMacAddress | Self::ControllerMacAddress => {
                ParameterKind::MacAddress
            }
            Self::DeviceRole
            | Self::RangingMethod
            | Self::StsConfig
            | Self::MultiNodeMode
            | Self::RangingTimeStruct
            | Self::ScheduledMode
            | Self::ChannelNumber
            | Self::RFrameConfig
            | Self::CcConstraintLength
            | Self::PrfMode
            | Self::MacAddressMode
            | Self::MacFcsType => ParameterKind::Enum,
        }
    }

    /// The value applied when the parameter is absent from a data object. The versions, the MAC
    /// addresses and the slot and interval parameters have no default.
    pub fn default_value(&self) -> Option<ParameterValue> {
        let value = match self {
            Self::DeviceRole => ParameterValue::Enum(DeviceRole::Responder as u8),
            Self::RangingMethod => ParameterValue::Enum(RangingConfiguration::default().to_u8()?),
            Self::StsConfig => ParameterValue::Enum(StsConfiguration::Static as u8),
            Self::MultiNodeMode => ParameterValue::Enum(MultiNodeMode::Unicast as u8),
            Self::RangingTimeStruct => ParameterValue::Enum(RangingMode::Block as u8),
            Self::ScheduledMode => ParameterValue::Enum(SchedulingMode::Time as u8),
            Self::HoppingMode => ParameterValue::Bool(false),
            Self::BlockStriding => ParameterValue::Bool(false),
            Self::UwbInitiationTime => ParameterValue::U32(0),
            Self::ChannelNumber => ParameterValue::Enum(UwbChannel::Channel9 as u8),
            Self::RFrameConfig => ParameterValue::Enum(StsPacketConfiguration::SP3 as u8),
            Self::CcConstraintLength => {
                ParameterValue::Enum(ConvolutionalCodeConstraintLength::K3 as u8)
            }
            Self::PrfMode => ParameterValue::Enum(PrfMode::Bprf as u8),
            Self::Sp0PhySetNumber => ParameterValue::U8(1),
            Self::Sp1PhySetNumber => ParameterValue::U8(1),
            Self::Sp3PhySetNumber => ParameterValue::U8(0),
            Self::PreambleCodeIndex => ParameterValue::U8(0),
            Self::ResultReportConfig => ParameterValue::FlagSet(
                ResultReportConfig { aoa_azimuth: true, ..Default::default() }.as_u8(),
            ),
            Self::MacAddressMode => ParameterValue::Enum(UwbMacAddressType::Short as u8),
            Self::KeyRotationRate => ParameterValue::U8(0),
            Self::MacFcsType => ParameterValue::Enum(UwbMacAddressFcsType::Crc16 as u8),
            Self::MaxRrRetry => ParameterValue::U16(0),
            Self::FiraPhyVersion
            | Self::FiraMacVersion
            | Self::ControleeShortMacAddress
            | Self::ControllerMacAddress
            | Self::SlotsPerRr
            | Self::MaxContentionPhaseLength
            | Self::SlotDuration
            | Self::RangingInterval => return None,
        };
        Some(value)
    }

    /// Check the value has the declared kind and, for enumerations and flag sets, carries a
    /// known ordinal or known flags.
    pub fn is_valid_value(&self, value: &ParameterValue) -> bool {
        self.validate_value(value).is_some()
    }

    fn validate_value(&self, value: &ParameterValue) -> Option<()> {
        validate(
            value.kind() == self.kind(),
            &format!("{:?} expects {:?} but got {:?}", self, self.kind(), value),
        )?;
        match value {
            ParameterValue::Enum(ordinal) => validate(
                self.is_valid_ordinal(*ordinal),
                &format!("{:?} doesn't accept the ordinal {}", self, ordinal),
            ),
            ParameterValue::FlagSet(bits) => validate(
                ResultReportConfig::from_u8(*bits).is_some(),
                &format!("{:?} doesn't accept the flags {:#04x}", self, bits),
            ),
            ParameterValue::MacAddress(address) => validate(
                *self != Self::ControleeShortMacAddress || address.is_short(),
                &format!("{:?} requires a short MAC address", self),
            ),
            _ => Some(()),
        }
    }

    fn is_valid_ordinal(&self, ordinal: u8) -> bool {
        match self {
            Self::DeviceRole => DeviceRole::from_u8(ordinal).is_some(),
            Self::RangingMethod => RangingConfiguration::from_u8(ordinal).is_some(),
            Self::StsConfig => StsConfiguration::from_u8(ordinal).is_some(),
            Self::MultiNodeMode => MultiNodeMode::from_u8(ordinal).is_some(),
            Self::RangingTimeStruct => RangingMode::from_u8(ordinal).is_some(),
            Self::ScheduledMode => SchedulingMode::from_u8(ordinal).is_some(),
            Self::ChannelNumber => UwbChannel::from_u8(ordinal).is_some(),
            Self::RFrameConfig => StsPacketConfiguration::from_u8(ordinal).is_some(),
            Self::CcConstraintLength => {
                ConvolutionalCodeConstraintLength::from_u8(ordinal).is_some()
            }
            Self::PrfMode => PrfMode::from_u8(ordinal).is_some(),
            Self::MacAddressMode => UwbMacAddressType::from_u8(ordinal).is_some(),
            Self::MacFcsType => UwbMacAddressFcsType::from_u8(ordinal).is_some(),
            _ => false,
        }
    }
}

/// The value of a configuration parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    U8(u8),
    U16(u16),
    U32(u32),
    Bool(bool),
    Enum(u8),
    MacAddress(UwbMacAddress),
    MacAddresses(Vec<UwbMacAddress>),
    FlagSet(u8),
    ByteArray(Vec<u8>),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::U8(_) => ParameterKind::U8,
            Self::U16(_) => ParameterKind::U16,
            Self::U32(_) => ParameterKind::U32,
            Self::Bool(_) => ParameterKind::Bool,
            Self::Enum(_) => ParameterKind::Enum,
            Self::MacAddress(_) => ParameterKind::MacAddress,
            Self::MacAddresses(_) => ParameterKind::MacAddresses,
            Self::FlagSet(_) => ParameterKind::FlagSet,
            Self::ByteArray(_) => ParameterKind::ByteArray,
        }
    }

    /// Encode the value: integers in big-endian order, booleans as 0 or 1, MAC addresses as
    /// their raw bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::U8(value) | Self::Enum(value) | Self::FlagSet(value) => vec![*value],
            Self::U16(value) => u16_to_bytes(*value),
            Self::U32(value) => u32_to_bytes(*value),
            Self::Bool(value) => vec![*value as u8],
            Self::MacAddress(address) => address.as_bytes().to_vec(),
            Self::MacAddresses(addresses) => {
                addresses.iter().flat_map(|address| address.as_bytes().to_vec()).collect()
            }
            Self::ByteArray(bytes) => bytes.clone(),
        }
    }

    /// Decode the bytes as a value of |kind|. Returns None when the length doesn't fit the kind.
    ///
    /// A list of MAC addresses can't be decoded without knowing the addressing mode.
    pub fn from_bytes(kind: ParameterKind, bytes: &[u8]) -> Option<Self> {
        let value = match kind {
            ParameterKind::U8 => Self::U8(bytes_to_u8(bytes)?),
            ParameterKind::U16 => Self::U16(bytes_to_u16(bytes)?),
            ParameterKind::U32 => Self::U32(bytes_to_u32(bytes)?),
            ParameterKind::Bool => match bytes_to_u8(bytes)? {
                0 => Self::Bool(false),
                1 => Self::Bool(true),
                _ => return None,
            },
            ParameterKind::Enum => Self::Enum(bytes_to_u8(bytes)?),
            ParameterKind::FlagSet => Self::FlagSet(bytes_to_u8(bytes)?),
            ParameterKind::MacAddress => Self::MacAddress(UwbMacAddress::try_from(bytes).ok()?),
            ParameterKind::MacAddresses => return None,
            ParameterKind::ByteArray => Self::ByteArray(bytes.to_vec()),
        };
        Some(value)
    }
}

impl Display for ParameterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::U8(value) | Self::Enum(value) => write!(f, "{}", value),
            Self::U16(value) => write!(f, "{}", value),
            Self::U32(value) => write!(f, "{}", value),
            Self::Bool(value) => write!(f, "{}", value),
            Self::MacAddress(address) => write!(f, "{}", address),
            Self::MacAddresses(addresses) => {
                let addresses: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
                write!(f, "[{}]", addresses.join(", "))
            }
            Self::FlagSet(bits) => write!(f, "{:#04x}", bits),
            Self::ByteArray(bytes) => {
                let bytes: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                write!(f, "{}", bytes.join(" "))
            }
        }
    }
}

// Generate the getter and the setter of a parameter that stores the value as is.
macro_rules! scalar_parameter {
    ($getter:ident, $setter:ident, $tag:ident, $variant:ident, $ty:ty) => {
        pub fn $getter(&self) -> Option<$ty> {
            match self.values.get(&ParameterTag::$tag) {
                Some(ParameterValue::$variant(value)) => Some(*value),
                _ => None,
            }
        }

        pub fn $setter(&mut self, value: $ty) -> &mut Self {
            self.values.insert(ParameterTag::$tag, ParameterValue::$variant(value));
            self
        }
    };
}

// Generate the getter and the setter of a parameter that stores the ordinal of an enumeration.
macro_rules! enum_parameter {
    ($getter:ident, $setter:ident, $tag:ident, $ty:ty) => {
        pub fn $getter(&self) -> Option<$ty> {
            match self.values.get(&ParameterTag::$tag) {
                Some(ParameterValue::Enum(value)) => <$ty>::from_u8(*value),
                _ => None,
            }
        }

        pub fn $setter(&mut self, value: $ty) -> &mut Self {
            self.values.insert(ParameterTag::$tag, ParameterValue::Enum(value as u8));
            self
        }
    };
}

/// The FiRa `UWB_CONFIGURATION`.
///
/// Each parameter is either set or absent. The getters return None for an absent parameter, the
/// defaults are only applied by `with_defaults()` and `from_data_object()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UwbConfiguration {
    values: BTreeMap<ParameterTag, ParameterValue>,
}

impl UwbConfiguration {
    /// The tag of the data object.
    pub const TAG: u8 = 0xA3;

    /// Create an empty configuration.
    pub fn new() -> Self {
        Default::default()
    }

    /// Create a configuration that contains the default value of every parameter that has one.
    pub fn with_defaults() -> Self {
        let mut config = Self::new();
        config.apply_defaults();
        config
    }

    fn apply_defaults(&mut self) {
        for tag in ParameterTag::ALL {
            if let Some(value) = tag.default_value() {
                self.values.entry(tag).or_insert(value);
            }
        }
    }

    /// The parameters that are set, ordered by tag.
    pub fn values(&self) -> &BTreeMap<ParameterTag, ParameterValue> {
        &self.values
    }

    pub fn value(&self, tag: ParameterTag) -> Option<&ParameterValue> {
        self.values.get(&tag)
    }

    /// Set the value of the parameter. The value must match the declared kind of the tag.
    pub fn set_value(&mut self, tag: ParameterTag, value: ParameterValue) -> Result<&mut Self> {
        if !tag.is_valid_value(&value) {
            return Err(Error::InvalidParameterValue(tag));
        }
        self.values.insert(tag, value);
        Ok(self)
    }

    pub fn remove_value(&mut self, tag: ParameterTag) -> Option<ParameterValue> {
        self.values.remove(&tag)
    }

    scalar_parameter!(fira_phy_version, set_fira_phy_version, FiraPhyVersion, U16, u16);
    scalar_parameter!(fira_mac_version, set_fira_mac_version, FiraMacVersion, U16, u16);
    enum_parameter!(device_role, set_device_role, DeviceRole, DeviceRole);
    enum_parameter!(sts_configuration, set_sts_configuration, StsConfig, StsConfiguration);
    enum_parameter!(multi_node_mode, set_multi_node_mode, MultiNodeMode, MultiNodeMode);
    enum_parameter!(ranging_time_struct, set_ranging_time_struct, RangingTimeStruct, RangingMode);
    enum_parameter!(scheduling_mode, set_scheduling_mode, ScheduledMode, SchedulingMode);
    scalar_parameter!(hopping_mode, set_hopping_mode, HoppingMode, Bool, bool);
    scalar_parameter!(block_striding, set_block_striding, BlockStriding, Bool, bool);
    scalar_parameter!(uwb_initiation_time, set_uwb_initiation_time, UwbInitiationTime, U32, u32);
    enum_parameter!(channel, set_channel, ChannelNumber, UwbChannel);
    enum_parameter!(rframe_config, set_rframe_config, RFrameConfig, StsPacketConfiguration);
    enum_parameter!(
        convolutional_code_constraint_length,
        set_convolutional_code_constraint_length,
        CcConstraintLength,
        ConvolutionalCodeConstraintLength
    );
    enum_parameter!(prf_mode, set_prf_mode, PrfMode, PrfMode);
    scalar_parameter!(sp0_phy_set_number, set_sp0_phy_set_number, Sp0PhySetNumber, U8, u8);
    scalar_parameter!(sp1_phy_set_number, set_sp1_phy_set_number, Sp1PhySetNumber, U8, u8);
    scalar_parameter!(sp3_phy_set_number, set_sp3_phy_set_number, Sp3PhySetNumber, U8, u8);
    scalar_parameter!(preamble_code_index, set_preamble_code_index, PreambleCodeIndex, U8, u8);
    enum_parameter!(mac_address_mode, set_mac_address_mode, MacAddressMode, UwbMacAddressType);
    scalar_parameter!(slots_per_ranging_round, set_slots_per_ranging_round, SlotsPerRr, U8, u8);
    scalar_parameter!(
        max_contention_phase_length,
        set_max_contention_phase_length,
        MaxContentionPhaseLength,
        U8,
        u8
    );
    scalar_parameter!(slot_duration, set_slot_duration, SlotDuration, U16, u16);
    scalar_parameter!(ranging_interval, set_ranging_interval, RangingInterval, U16, u16);
    scalar_parameter!(key_rotation_rate, set_key_rotation_rate, KeyRotationRate, U8, u8);
    enum_parameter!(mac_fcs_type, set_mac_fcs_type, MacFcsType, UwbMacAddressFcsType);
    scalar_parameter!(max_ranging_round_retry, set_max_ranging_round_retry, MaxRrRetry, U16, u16);

    pub fn ranging_configuration(&self) -> Option<RangingConfiguration> {
        match self.values.get(&ParameterTag::RangingMethod) {
            Some(ParameterValue::Enum(value)) => RangingConfiguration::from_u8(*value),
            _ => None,
        }
    }

    /// Set the ranging method. Fails when the combination has no encoding.
    pub fn set_ranging_configuration(
        &mut self,
        value: RangingConfiguration,
    ) -> Result<&mut Self> {
        let ordinal =
            value.to_u8().ok_or(Error::InvalidParameterValue(ParameterTag::RangingMethod))?;
        self.values.insert(ParameterTag::RangingMethod, ParameterValue::Enum(ordinal));
        Ok(self)
    }

    pub fn result_report_config(&self) -> Option<ResultReportConfig> {
        match self.values.get(&ParameterTag::ResultReportConfig) {
            Some(ParameterValue::FlagSet(bits)) => ResultReportConfig::from_u8(*bits),
            _ => None,
        }
    }

    pub fn set_result_report_config(&mut self, value: ResultReportConfig) -> &mut Self {
        self.values
            .insert(ParameterTag::ResultReportConfig, ParameterValue::FlagSet(value.as_u8()));
        self
    }

    pub fn controlee_short_mac_address(&self) -> Option<UwbMacAddress> {
        self.mac_address(ParameterTag::ControleeShortMacAddress)
    }

    pub fn set_controlee_short_mac_address(&mut self, value: [u8; 2]) -> &mut Self {
        self.values.insert(
            ParameterTag::ControleeShortMacAddress,
            ParameterValue::MacAddress(UwbMacAddress::Short(value)),
        );
        self
    }

    pub fn controller_mac_address(&self) -> Option<UwbMacAddress> {
        self.mac_address(ParameterTag::ControllerMacAddress)
    }

    pub fn set_controller_mac_address(&mut self, value: UwbMacAddress) -> &mut Self {
        self.values.insert(ParameterTag::ControllerMacAddress, ParameterValue::MacAddress(value));
        self
    }

    fn mac_address(&self, tag: ParameterTag) -> Option<UwbMacAddress> {
        match self.values.get(&tag) {
            Some(ParameterValue::MacAddress(address)) => Some(*address),
            _ => None,
        }
    }

    /// Encode the configuration into the constructed TLV tagged 0xA3. Each set parameter becomes
    /// a primitive child TLV, ordered by tag.
    pub fn to_data_object(&self) -> Result<TlvBer> {
        let children = self
            .values
            .iter()
            .map(|(tag, value)| TlvBer::new_primitive(*tag as u8, value.to_bytes()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(TlvBer::new_constructed(Self::TAG, children)?)
    }

    /// Decode the configuration from the constructed TLV tagged 0xA3. The absent parameters get
    /// their default value.
    ///
    /// Children with an unknown tag are skipped. A known tag with a malformed value fails the
    /// whole decoding.
    pub fn from_data_object(tlv: &TlvBer) -> Result<Self> {
        if tlv.tag_raw() != [Self::TAG].as_slice() || !tlv.is_constructed() {
            return Err(Error::InvalidDataObject(format!(
                "expect the constructed tag {:#04x}, got {:02X?}",
                Self::TAG,
                tlv.tag_raw()
            )));
        }

        let mut config = Self::new();
        for child in tlv.values() {
            let tag = match child.tag_raw() {
                [byte] => ParameterTag::from_u8(*byte),
                _ => None,
            };
            let tag = match tag {
                Some(tag) => tag,
                None => {
                    warn!("Skip the unknown UWB_CONFIGURATION parameter {:02X?}", child.tag_raw());
                    continue;
                }
            };

            let value = match child.is_primitive() {
                true => ParameterValue::from_bytes(tag.kind(), child.data()),
                false => None,
            }
            .filter(|value| tag.is_valid_value(value))
            .ok_or(Error::InvalidParameterValue(tag))?;
            if config.values.insert(tag, value).is_some() {
                debug!("{:?} appears more than once, the last one is kept", tag);
            }
        }
        config.apply_defaults();
        Ok(config)
    }
}

/// The builder of UwbConfiguration.
#[derive(Debug, Default)]
pub struct UwbConfigurationBuilder {
    config: UwbConfiguration,
}

// Generate the consuming method that forwards to the setter of UwbConfiguration.
macro_rules! forward_setter {
    ($name:ident, $setter:ident, $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.config.$setter(value);
            self
        }
    };
}

impl UwbConfigurationBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Start from the default values instead of an empty configuration.
    pub fn with_defaults() -> Self {
        Self { config: UwbConfiguration::with_defaults() }
    }

    forward_setter!(fira_phy_version, set_fira_phy_version, u16);
    forward_setter!(fira_mac_version, set_fira_mac_version, u16);
    forward_setter!(device_role, set_device_role, DeviceRole);
    forward_setter!(sts_configuration, set_sts_configuration, StsConfiguration);
    forward_setter!(multi_node_mode, set_multi_node_mode, MultiNodeMode);
    forward_setter!(ranging_time_struct, set_ranging_time_struct, RangingMode);
    forward_setter!(scheduling_mode, set_scheduling_mode, SchedulingMode);
    forward_setter!(hopping_mode, set_hopping_mode, bool);
    forward_setter!(block_striding, set_block_striding, bool);
    forward_setter!(uwb_initiation_time, set_uwb_initiation_time, u32);
    forward_setter!(channel, set_channel, UwbChannel);
    forward_setter!(rframe_config, set_rframe_config, StsPacketConfiguration);
    forward_setter!(
        convolutional_code_constraint_length,
        set_convolutional_code_constraint_length,
        ConvolutionalCodeConstraintLength
    );
    forward_setter!(prf_mode, set_prf_mode, PrfMode);
    forward_setter!(sp0_phy_set_number, set_sp0_phy_set_number, u8);
    forward_setter!(sp1_phy_set_number, set_sp1_phy_set_number, u8);
    forward_setter!(sp3_phy_set_number, set_sp3_phy_set_number, u8);
    forward_setter!(preamble_code_index, set_preamble_code_index, u8);
    forward_setter!(result_report_config, set_result_report_config, ResultReportConfig);
    forward_setter!(mac_address_mode, set_mac_address_mode, UwbMacAddressType);
    forward_setter!(controlee_short_mac_address, set_controlee_short_mac_address, [u8; 2]);
    forward_setter!(controller_mac_address, set_controller_mac_address, UwbMacAddress);
    forward_setter!(slots_per_ranging_round, set_slots_per_ranging_round, u8);
    forward_setter!(max_contention_phase_length, set_max_contention_phase_length, u8);
    forward_setter!(slot_duration, set_slot_duration, u16);
    forward_setter!(ranging_interval, set_ranging_interval, u16);
    forward_setter!(key_rotation_rate, set_key_rotation_rate, u8);
    forward_setter!(mac_fcs_type, set_mac_fcs_type, UwbMacAddressFcsType);
    forward_setter!(max_ranging_round_retry, set_max_ranging_round_retry, u16);

    pub fn ranging_configuration(mut self, value: RangingConfiguration) -> Result<Self> {
        self.config.set_ranging_configuration(value)?;
        Ok(self)
    }

    pub fn build(self) -> UwbConfiguration {
        self.config
    }
}
