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

//! This module defines the boundary between the session state machine and the UWB device: the
//! UwbTransport trait and the notifications the device sends back.

pub mod notification;
pub mod timeout_transport;
pub mod uwb_transport;

#[cfg(any(test, feature = "mock-utils"))]
pub mod mock_transport;

// Re-export the public elements.
pub use notification::{
    UwbMulticastListStatus, UwbNotification, UwbRangingData, UwbRangingMeasurement,
    UwbRangingMeasurementData,
};
pub use timeout_transport::{TimeoutTransport, DEFAULT_TRANSPORT_TIMEOUT_MS};
pub use uwb_transport::UwbTransport;
