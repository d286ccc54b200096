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

//! This module provides the FiRa configuration catalog and the types exchanged with the transport.

pub(super) mod utils;

pub mod app_config_params;
pub mod fira_device;
pub mod uci_packets;
pub mod uwb_configuration;

// Re-export params from all of the sub-modules.
pub use app_config_params::*;
pub use fira_device::*;
pub use uci_packets::*;
pub use uwb_configuration::*;
