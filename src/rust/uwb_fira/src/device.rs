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

//! This module implements the UWB device: the session registry, the notification dispatching,
//! and the blocking API.

mod session_registry;
pub(crate) mod uwb_device;
pub mod uwb_device_builder;
pub mod uwb_device_sync;

pub use uwb_device::UwbDevice;
pub use uwb_device_builder::{default_runtime, UwbDeviceBuilder};
pub use uwb_device_sync::{UwbDeviceSync, UwbSessionSync};
