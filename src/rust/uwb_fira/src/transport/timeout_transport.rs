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

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::params::app_config_params::{
    UwbApplicationConfigurationParameter, UwbApplicationConfigurationParameterType,
};
use crate::params::uci_packets::{
    SessionId, SessionType, SetAppConfigResponse, UwbCapability, UwbDeviceInformation,
    UwbSessionState,
};
use crate::transport::notification::UwbNotification;
use crate::transport::uwb_transport::UwbTransport;

pub const DEFAULT_TRANSPORT_TIMEOUT_MS: u64 = 2000;

/// The UwbTransport decorator that fails every command with `Error::Timeout` when the inner
/// transport doesn't complete it in time. The command is dropped on timeout.
#[derive(Clone)]
pub struct TimeoutTransport<T: UwbTransport> {
    transport: T,
    duration: Duration,
}

impl<T: UwbTransport> TimeoutTransport<T> {
    pub fn new(transport: T, duration: Duration) -> Self {
        Self { transport, duration }
    }

    async fn call_with_timeout<R>(
        future: impl Future<Output = Result<R>>,
        duration: Duration,
        name: &str,
    ) -> Result<R> {
        match timeout(duration, future).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} is not completed in {:?}", name, duration);
                Err(Error::Timeout)
            }
        }
    }
}

#[async_trait]
impl<T: UwbTransport> UwbTransport for TimeoutTransport<T> {
    async fn set_notification_sender(
        &mut self,
        notf_sender: mpsc::UnboundedSender<UwbNotification>,
    ) {
        self.transport.set_notification_sender(notf_sender).await
    }

    async fn reset(&self) -> Result<()> {
        Self::call_with_timeout(self.transport.reset(), self.duration, "reset").await
    }

    async fn get_device_information(&self) -> Result<UwbDeviceInformation> {
        Self::call_with_timeout(
            self.transport.get_device_information(),
            self.duration,
            "get_device_information",
        )
        .await
    }

    async fn get_capabilities(&self) -> Result<UwbCapability> {
        Self::call_with_timeout(
            self.transport.get_capabilities(),
            self.duration,
            "get_capabilities",
        )
        .await
    }

    async fn get_session_count(&self) -> Result<u32> {
        Self::call_with_timeout(
            self.transport.get_session_count(),
            self.duration,
            "get_session_count",
        )
        .await
    }

    async fn session_initialize(
        &self,
        session_id: SessionId,
        session_type: SessionType,
    ) -> Result<()> {
        Self::call_with_timeout(
            self.transport.session_initialize(session_id, session_type),
            self.duration,
            "session_initialize",
        )
        .await
    }

    async fn session_deinitialize(&self, session_id: SessionId) -> Result<()> {
        Self::call_with_timeout(
            self.transport.session_deinitialize(session_id),
            self.duration,
            "session_deinitialize",
        )
        .await
    }

    async fn set_application_configuration_parameters(
        &self,
        session_id: SessionId,
        params: Vec<UwbApplicationConfigurationParameter>,
    ) -> Result<SetAppConfigResponse> {
        Self::call_with_timeout(
            self.transport.set_application_configuration_parameters(session_id, params),
            self.duration,
            "set_application_configuration_parameters",
        )
        .await
    }

    async fn get_application_configuration_parameters(
        &self,
        session_id: SessionId,
        param_types: Vec<UwbApplicationConfigurationParameterType>,
    ) -> Result<Vec<UwbApplicationConfigurationParameter>> {
        Self::call_with_timeout(
            self.transport.get_application_configuration_parameters(session_id, param_types),
            self.duration,
            "get_application_configuration_parameters",
        )
        .await
    }

    async fn session_ranging_start(&self, session_id: SessionId) -> Result<()> {
        Self::call_with_timeout(
            self.transport.session_ranging_start(session_id),
            self.duration,
            "session_ranging_start",
        )
        .await
    }

    async fn session_ranging_stop(&self, session_id: SessionId) -> Result<()> {
        Self::call_with_timeout(
            self.transport.session_ranging_stop(session_id),
            self.duration,
            "session_ranging_stop",
        )
        .await
    }

    async fn session_get_state(&self, session_id: SessionId) -> Result<UwbSessionState> {
        Self::call_with_timeout(
            self.transport.session_get_state(session_id),
            self.duration,
            "session_get_state",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::params::uci_packets::UwbStatus;
    use crate::transport::mock_transport::MockUwbTransport;
    use crate::utils::init_test_logging;

    fn setup_transport(mock: &MockUwbTransport) -> TimeoutTransport<MockUwbTransport> {
        init_test_logging();
        TimeoutTransport::new(mock.clone(), Duration::from_millis(DEFAULT_TRANSPORT_TIMEOUT_MS))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ok() {
        let mut mock = MockUwbTransport::new();
        mock.expect_get_session_count(Ok(2));
        let transport = setup_transport(&mock);

        assert_eq!(transport.get_session_count().await, Ok(2));
        assert!(mock.wait_expected_calls_done().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail() {
        let mut mock = MockUwbTransport::new();
        mock.expect_session_ranging_start(1, vec![], Err(Error::Status(UwbStatus::Rejected)));
        let transport = setup_transport(&mock);

        assert_eq!(
            transport.session_ranging_start(1).await,
            Err(Error::Status(UwbStatus::Rejected))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let mut mock = MockUwbTransport::new();
        mock.expect_reset(Ok(()));
        mock.delay_last_expected_call(Duration::from_millis(DEFAULT_TRANSPORT_TIMEOUT_MS * 2));
        let transport = setup_transport(&mock);

        assert_eq!(transport.reset().await, Err(Error::Timeout));
    }
}
