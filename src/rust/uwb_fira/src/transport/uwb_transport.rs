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

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::params::app_config_params::{
    UwbApplicationConfigurationParameter, UwbApplicationConfigurationParameterType,
};
use crate::params::uci_packets::{
    SessionId, SessionType, SetAppConfigResponse, UwbCapability, UwbDeviceInformation,
    UwbSessionState,
};
use crate::transport::notification::UwbNotification;

/// The UwbTransport carries the commands to the UWB device and completes them with the device's
/// responses. The notifications are delivered through the sender set by
/// set_notification_sender().
///
/// A command that the device completes with a non-Ok status returns `Error::Status`.
#[async_trait]
pub trait UwbTransport: 'static + Send + Sync + Clone {
    // Set the sender of the notifications. It is called once, before any command.
    async fn set_notification_sender(
        &mut self,
        notf_sender: mpsc::UnboundedSender<UwbNotification>,
    );

    // The device commands.
    async fn reset(&self) -> Result<()>;
    async fn get_device_information(&self) -> Result<UwbDeviceInformation>;
    async fn get_capabilities(&self) -> Result<UwbCapability>;
    async fn get_session_count(&self) -> Result<u32>;

    // The session commands.
    async fn session_initialize(
        &self,
        session_id: SessionId,
        session_type: SessionType,
    ) -> Result<()>;
    async fn session_deinitialize(&self, session_id: SessionId) -> Result<()>;
    async fn set_application_configuration_parameters(
        &self,
        session_id: SessionId,
        params: Vec<UwbApplicationConfigurationParameter>,
    ) -> Result<SetAppConfigResponse>;
    /// An empty |param_types| requests all the parameters.
    async fn get_application_configuration_parameters(
        &self,
        session_id: SessionId,
        param_types: Vec<UwbApplicationConfigurationParameterType>,
    ) -> Result<Vec<UwbApplicationConfigurationParameter>>;
    async fn session_ranging_start(&self, session_id: SessionId) -> Result<()>;
    async fn session_ranging_stop(&self, session_id: SessionId) -> Result<()>;
    async fn session_get_state(&self, session_id: SessionId) -> Result<UwbSessionState>;
}
