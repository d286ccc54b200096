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

//! uwb_fira is a host-side stack for FiRa UWB ranging.
//!
//! It is made of three parts:
//! - [`tlv`]: the BER-TLV codec used by the FiRa out-of-band data objects.
//! - [`params`]: the FiRa `UWB_CONFIGURATION` catalog and its mapping to the UCI application
//!   configuration parameters.
//! - [`device`] and [`session`]: the device/session state machine running over a
//!   [`transport::UwbTransport`] implementation supplied by the client.

pub mod device;
pub mod error;
pub mod params;
pub mod session;
pub mod tlv;
pub mod transport;

pub(crate) mod utils;

// Re-export the commonly used elements.
pub use device::{default_runtime, UwbDevice, UwbDeviceBuilder, UwbDeviceSync, UwbSessionSync};
pub use error::{Error, Result};
pub use session::UwbSession;
