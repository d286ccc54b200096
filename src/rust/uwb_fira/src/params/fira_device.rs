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

//! This module defines the FiRa device-level enumerations shared by the `UWB_CONFIGURATION`
//! catalog and the UCI application configuration parameters.
//! Ref: FiRa Consortium UWB MAC Technical Requirements and FiRa UCI Generic Specification.

use std::convert::{TryFrom, TryInto};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::warn;
use num_derive::{FromPrimitive, ToPrimitive};

/// The device role.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum DeviceRole {
    /// Responder of the session (default)
    Responder = 0,
    /// Initiator of the session
    Initiator = 1,
}

/// The device type.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum DeviceType {
    /// Controlee
    Controlee = 0,
    /// Controller
    Controller = 1,
}

/// The ranging method.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum RangingMethod {
    OneWay = 0,
    SingleSidedTwoWay = 1,
    DoubleSidedTwoWay = 2,
}

/// When the measurement report is sent within a two-way ranging round.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum MeasurementReportMode {
    None = 0,
    Deferred = 1,
    NonDeferred = 2,
}

/// The effective ranging configuration, a pair of the method and the report mode.
///
/// It is carried as a single octet: 0 for one-way ranging, then 1..=4 for SS-TWR deferred,
/// DS-TWR deferred, SS-TWR non-deferred and DS-TWR non-deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangingConfiguration {
    pub method: RangingMethod,
    pub report_mode: MeasurementReportMode,
}

impl RangingConfiguration {
    pub fn new(method: RangingMethod, report_mode: MeasurementReportMode) -> Self {
        Self { method, report_mode }
    }

    /// Encode the configuration into its octet. Returns None for the combinations without an
    /// encoding, e.g. two-way ranging without a measurement report.
    pub fn to_u8(&self) -> Option<u8> {
        match (self.method, self.report_mode) {
            (RangingMethod::OneWay, MeasurementReportMode::None) => Some(0),
            (RangingMethod::SingleSidedTwoWay, MeasurementReportMode::Deferred) => Some(1),
            (RangingMethod::DoubleSidedTwoWay, MeasurementReportMode::Deferred) => Some(2),
            (RangingMethod::SingleSidedTwoWay, MeasurementReportMode::NonDeferred) => Some(3),
            (RangingMethod::DoubleSidedTwoWay, MeasurementReportMode::NonDeferred) => Some(4),
            _ => None,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        let (method, report_mode) = match value {
            0 => (RangingMethod::OneWay, MeasurementReportMode::None),
            1 => (RangingMethod::SingleSidedTwoWay, MeasurementReportMode::Deferred),
            2 => (RangingMethod::DoubleSidedTwoWay, MeasurementReportMode::Deferred),
            3 => (RangingMethod::SingleSidedTwoWay, MeasurementReportMode::NonDeferred),
            4 => (RangingMethod::DoubleSidedTwoWay, MeasurementReportMode::NonDeferred),
            _ => return None,
        };
        Some(Self { method, report_mode })
    }
}

impl Default for RangingConfiguration {
    fn default() -> Self {
        Self::new(RangingMethod::DoubleSidedTwoWay, MeasurementReportMode::Deferred)
    }
}

/// The STS configuration.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum StsConfiguration {
    /// Static STS (default)
    Static = 0,
    /// Dynamic STS
    Dynamic = 1,
    /// Dynamic STS for controlee individual key
    DynamicWithResponderSubSessionKey = 2,
}

/// The multi-node mode.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum MultiNodeMode {
    /// Single device to single device (default)
    Unicast = 0,
    OneToMany = 1,
    ManyToMany = 2,
}

/// The ranging time structure.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum RangingMode {
    /// Interval based scheduling
    Interval = 0,
    /// Block based scheduling (default)
    Block = 1,
}

/// The scheduling mode.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum SchedulingMode {
    /// Contention-based ranging
    Contention = 0,
    /// Time scheduled ranging (default)
    Time = 1,
}

/// The UWB channel.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum UwbChannel {
    Channel5 = 5,
    Channel6 = 6,
    Channel8 = 8,
    /// Channel 9 (default)
    Channel9 = 9,
    Channel10 = 10,
    Channel12 = 12,
    Channel13 = 13,
    Channel14 = 14,
}

/// The STS packet configuration, i.e. the RFrame config.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum StsPacketConfiguration {
    SP0 = 0,
    SP1 = 1,
    SP2 = 2,
    /// SP3 (default)
    SP3 = 3,
}

/// The constraint length of the convolutional code.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum ConvolutionalCodeConstraintLength {
    /// K = 3 (default)
    K3 = 0,
    /// K = 7
    K7 = 1,
}

/// This parameter is used to configure the mean PRF.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum PrfMode {
    /// 62.4 MHz PRF. BPRF mode (default)
    Bprf = 0,
    /// 124.8 MHz PRF. HPRF mode
    HprfWith124_8MHz = 1,
    /// 249.6 MHz PRF. HPRF mode with data rate 27.2 and 31.2 Mbps
    HprfWith249_6MHz = 2,
}

/// MAC Addressing mode.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum UwbMacAddressType {
    /// MAC address is 2 bytes and 2 bytes to be used in MAC header (default)
    Short = 0,
    /// MAC address is 8 bytes and 2 bytes to be used in MAC header
    ExtendedWithShortHeader = 1,
    /// MAC address is 8 bytes and 8 bytes to be used in MAC header
    Extended = 2,
}

/// CRC type in MAC footer.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum UwbMacAddressFcsType {
    /// CRC 16 (default)
    Crc16 = 0,
    /// CRC 32
    Crc32 = 1,
}

/// The result reports included in the ranging result report message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResultReportConfig {
    /// TOF report (false: Disable, true: Enable)
    pub tof: bool,
    /// AOA azimuth report (false: Disable, true: Enable)
    pub aoa_azimuth: bool,
    /// AOA elevation report (false: Disable, true: Enable)
    pub aoa_elevation: bool,
    /// AOA FOM report (false: Disable, true: Enable)
    pub aoa_fom: bool,
}

impl ResultReportConfig {
    const TOF_BIT_OFFSET: u8 = 0;
    const AOA_AZIMUTH_BIT_OFFSET: u8 = 1;
    const AOA_ELEVATION_BIT_OFFSET: u8 = 2;
    const AOA_FOM_BIT_OFFSET: u8 = 3;
    const VALID_BITS: u8 = 0x0F;

    const NAMES: [&'static str; 4] =
        ["TofReport", "AoAAzimuthReport", "AoAElevationReport", "AoAFoMReport"];

    pub fn as_u8(&self) -> u8 {
        let mut value = 0_u8;
        if self.tof {
            value |= 1 << Self::TOF_BIT_OFFSET;
        }
        if self.aoa_azimuth {
            value |= 1 << Self::AOA_AZIMUTH_BIT_OFFSET;
        }
        if self.aoa_elevation {
            value |= 1 << Self::AOA_ELEVATION_BIT_OFFSET;
        }
        if self.aoa_fom {
            value |= 1 << Self::AOA_FOM_BIT_OFFSET;
        }

        value
    }

    /// Returns None when any bit beyond the four known reports is set.
    pub fn from_u8(value: u8) -> Option<Self> {
        if value & !Self::VALID_BITS != 0 {
            return None;
        }
        Some(Self {
            tof: value & (1 << Self::TOF_BIT_OFFSET) != 0,
            aoa_azimuth: value & (1 << Self::AOA_AZIMUTH_BIT_OFFSET) != 0,
            aoa_elevation: value & (1 << Self::AOA_ELEVATION_BIT_OFFSET) != 0,
            aoa_fom: value & (1 << Self::AOA_FOM_BIT_OFFSET) != 0,
        })
    }

    fn flags(&self) -> [bool; 4] {
        [self.tof, self.aoa_azimuth, self.aoa_elevation, self.aoa_fom]
    }
}

impl Display for ResultReportConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .zip(self.flags().iter())
            .filter_map(|(name, enabled)| enabled.then(|| *name))
            .collect();
        write!(f, "{}", names.join(","))
    }
}

impl FromStr for ResultReportConfig {
    type Err = std::convert::Infallible;

    /// Parse the comma separated report names. Unknown names are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Self::default();
        for token in s.split(',').map(str::trim).filter(|token| !token.is_empty()) {
            match token {
                "TofReport" => config.tof = true,
                "AoAAzimuthReport" => config.aoa_azimuth = true,
                "AoAElevationReport" => config.aoa_elevation = true,
                "AoAFoMReport" => config.aoa_fom = true,
                _ => warn!("Ignore unknown result report configuration: {}", token),
            }
        }
        Ok(config)
    }
}

/// The UWB MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UwbMacAddress {
    /// The short MAC address (2 bytes)
    Short([u8; 2]),
    /// The extended MAC address (8 bytes)
    Extended([u8; 8]),
}

impl UwbMacAddress {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UwbMacAddress::Short(addr) => addr,
            UwbMacAddress::Extended(addr) => addr,
        }
    }

    pub fn is_short(&self) -> bool {
        matches!(self, UwbMacAddress::Short(_))
    }
}

impl From<UwbMacAddress> for Vec<u8> {
    fn from(item: UwbMacAddress) -> Self {
        item.as_bytes().to_vec()
    }
}

impl TryFrom<&[u8]> for UwbMacAddress {
    type Error = &'static str;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        const INVALID_LENGTH: &str = "Invalid address length";
        match value.len() {
            2 => value.try_into().map(UwbMacAddress::Short).map_err(|_| INVALID_LENGTH),
            8 => value.try_into().map(UwbMacAddress::Extended).map_err(|_| INVALID_LENGTH),
            _ => Err(INVALID_LENGTH),
        }
    }
}

impl Display for UwbMacAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let octets: Vec<String> = self.as_bytes().iter().map(|b| format!("{:02X}", b)).collect();
        write!(f, "{}", octets.join(":"))
    }
}

/// Convert the version to the "major.minor" string. The major version is carried in the second
/// least significant byte and the minor version in the least significant byte.
pub fn version_to_string(version: u32) -> String {
    format!("{}.{}", (version >> 8) & 0xFF, version & 0xFF)
}

/// The inverse of `version_to_string()`. Returns None unless the input is exactly two dot
/// separated numbers, each fitting in one byte.
pub fn string_to_version(input: &str) -> Option<u32> {
    let mut tokens = input.split('.');
    let major: u8 = tokens.next()?.trim().parse().ok()?;
    let minor: u8 = tokens.next()?.trim().parse().ok()?;
    if tokens.next().is_some() {
        return None;
    }
    Some(((major as u32) << 8) | minor as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranging_configuration_encoding() {
        for value in 0..=4 {
            let config = RangingConfiguration::from_u8(value).unwrap();
            assert_eq!(config.to_u8(), Some(value));
        }
        assert_eq!(RangingConfiguration::from_u8(5), None);
        assert_eq!(RangingConfiguration::default().to_u8(), Some(2));

        let no_report = RangingConfiguration::new(
            RangingMethod::DoubleSidedTwoWay,
            MeasurementReportMode::None,
        );
        assert_eq!(no_report.to_u8(), None);
    }

    #[test]
    fn test_result_report_config() {
        let config = ResultReportConfig { aoa_azimuth: true, aoa_fom: true, ..Default::default() };
        assert_eq!(config.as_u8(), 0b1010);
        assert_eq!(ResultReportConfig::from_u8(0b1010), Some(config));
        assert_eq!(ResultReportConfig::from_u8(0x10), None);

        assert_eq!(config.to_string(), "AoAAzimuthReport,AoAFoMReport");
        assert_eq!(
            "AoAAzimuthReport, AoAFoMReport,Bogus".parse::<ResultReportConfig>(),
            Ok(config)
        );
        assert_eq!("".parse::<ResultReportConfig>(), Ok(ResultReportConfig::default()));
    }

    #[test]
    fn test_uwb_mac_address() {
        let short = UwbMacAddress::try_from([0x12, 0xAB].as_slice()).unwrap();
        assert_eq!(short, UwbMacAddress::Short([0x12, 0xAB]));
        assert!(short.is_short());
        assert_eq!(short.to_string(), "12:AB");
        assert_eq!(Vec::<u8>::from(short), vec![0x12, 0xAB]);

        let extended = UwbMacAddress::try_from([1, 2, 3, 4, 5, 6, 7, 8].as_slice()).unwrap();
        assert!(!extended.is_short());
        assert_eq!(extended.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);

        assert!(UwbMacAddress::try_from([1, 2, 3].as_slice()).is_err());
    }

    #[test]
    fn test_version_string() {
        assert_eq!(version_to_string(0x0102), "1.2");
        assert_eq!(string_to_version("1.2"), Some(0x0102));
        assert_eq!(string_to_version(&version_to_string(0xFF00)), Some(0xFF00));

        assert_eq!(string_to_version("1"), None);
        assert_eq!(string_to_version("1.2.3"), None);
        assert_eq!(string_to_version("256.0"), None);
        assert_eq!(string_to_version("a.b"), None);
    }
}
