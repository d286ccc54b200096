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

//! This module defines the UwbDeviceBuilder, the builder of the UwbDeviceSync.

use std::time::Duration;

use tokio::runtime::Runtime;

use crate::device::uwb_device_sync::UwbDeviceSync;
use crate::transport::timeout_transport::{TimeoutTransport, DEFAULT_TRANSPORT_TIMEOUT_MS};
use crate::transport::uwb_transport::UwbTransport;
use crate::utils::consuming_builder_field;

/// Create the default runtime for UwbDeviceSync.
pub fn default_runtime() -> Option<Runtime> {
    tokio::runtime::Builder::new_multi_thread().thread_name("UwbDevice").enable_all().build().ok()
}

/// The builder of UwbDeviceSync. Every call of the built device to the transport is bounded by
/// the transport timeout, `DEFAULT_TRANSPORT_TIMEOUT_MS` unless it is set.
pub struct UwbDeviceBuilder<T: UwbTransport> {
    name: Option<String>,
    transport: Option<T>,
    runtime: Option<Runtime>,
    transport_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
}

impl<T: UwbTransport> Default for UwbDeviceBuilder<T> {
    fn default() -> Self {
        Self {
            name: None,
            transport: None,
            runtime: None,
            transport_timeout: None,
            command_timeout: None,
        }
    }
}

impl<T: UwbTransport> UwbDeviceBuilder<T> {
    /// Create a new builder.
    pub fn new() -> Self {
        Default::default()
    }

    consuming_builder_field!(name, String, Some);
    consuming_builder_field!(transport, T, Some);
    consuming_builder_field!(runtime, Runtime, Some);
    consuming_builder_field!(transport_timeout, Duration, Some);
    consuming_builder_field!(command_timeout, Duration, Some);

    /// Build the UwbDeviceSync. Returns None when the transport is not set, or when the
    /// default runtime can't be created.
    pub fn build(mut self) -> Option<UwbDeviceSync<TimeoutTransport<T>>> {
        let runtime = self.runtime.take().or_else(default_runtime)?;
        let transport = TimeoutTransport::new(
            self.transport.take()?,
            self.transport_timeout
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_TRANSPORT_TIMEOUT_MS)),
        );
        let name = self.name.take().unwrap_or_else(|| "UwbDevice".to_owned());
        Some(UwbDeviceSync::new(name, transport, runtime, self.command_timeout))
    }
}
