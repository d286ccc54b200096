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

//! This module defines the blocking API: UwbDeviceSync and UwbSessionSync.

use std::future::Future;
use std::time::Duration;

use log::warn;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::watch;
use tokio::time::timeout;

use crate::device::uwb_device::UwbDevice;
use crate::error::{Error, Result};
use crate::params::app_config_params::{
    UwbApplicationConfigurationParameter, UwbApplicationConfigurationParameterType,
};
use crate::params::fira_device::{DeviceType, UwbMacAddress};
use crate::params::uci_packets::{
    SessionId, SessionState, UwbCapability, UwbDeviceInformation, UwbSessionState,
};
use crate::session::callbacks::{
    SubscriptionHandle, UwbDeviceEventCallbacks, UwbPeer, UwbSessionEventCallbacks,
};
use crate::session::UwbSession;
use crate::transport::uwb_transport::UwbTransport;

// Block on |future|. When |command_timeout| expires first, the future is dropped and
// `Error::Timeout` is returned.
fn block_on_cmd<F, R>(
    handle: &Handle,
    command_timeout: Option<Duration>,
    name: &str,
    future: F,
) -> Result<R>
where
    F: Future<Output = Result<R>>,
{
    handle.block_on(async move {
        let duration = match command_timeout {
            Some(duration) => duration,
            None => return future.await,
        };
        match timeout(duration, future).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} is not completed in {:?}", name, duration);
                Err(Error::Timeout)
            }
        }
    })
}

/// The blocking wrapper of UwbDevice. It owns the runtime executing the device.
///
/// The methods must not be called inside an asynchronous context.
pub struct UwbDeviceSync<T: UwbTransport> {
    // Dropped before the runtime.
    device: UwbDevice<T>,
    runtime: Runtime,
    command_timeout: Option<Duration>,
}

impl<T: UwbTransport> UwbDeviceSync<T> {
    /// Create the device on |runtime|. Each command fails with `Error::Timeout` when it doesn't
    /// complete in |command_timeout|.
    pub fn new<S: Into<String>>(
        name: S,
        transport: T,
        runtime: Runtime,
        command_timeout: Option<Duration>,
    ) -> Self {
        let device = runtime.block_on(UwbDevice::new(name, transport));
        Self { device, runtime, command_timeout }
    }

    pub fn name(&self) -> &str {
        self.device.name()
    }

    pub fn create_session(
        &self,
        session_id: SessionId,
        device_type: DeviceType,
        callbacks: Option<Box<dyn UwbSessionEventCallbacks>>,
    ) -> Result<UwbSessionSync<T>> {
        // The session keeps the runtime to deinitialize itself when dropped.
        let _guard = self.runtime.enter();
        let session = self.device.create_session(session_id, device_type, callbacks)?;
        Ok(self.wrap_session(session))
    }

    pub fn get_session(&self, session_id: SessionId) -> Option<UwbSessionSync<T>> {
        self.device.get_session(session_id).map(|session| self.wrap_session(session))
    }

    pub fn get_session_count(&self) -> usize {
        self.device.get_session_count()
    }

    pub fn subscribe(&self, callbacks: Box<dyn UwbDeviceEventCallbacks>) -> SubscriptionHandle {
        self.device.subscribe(callbacks)
    }

    pub fn reset(&self) -> Result<()> {
        self.block_on_cmd("reset", self.device.reset())
    }

    pub fn get_device_information(&self) -> Result<UwbDeviceInformation> {
        self.block_on_cmd("get_device_information", self.device.get_device_information())
    }

    pub fn get_capabilities(&self) -> Result<UwbCapability> {
        self.block_on_cmd("get_capabilities", self.device.get_capabilities())
    }

    pub fn query_session_count(&self) -> Result<u32> {
        self.block_on_cmd("query_session_count", self.device.query_session_count())
    }

    fn wrap_session(&self, session: UwbSession<T>) -> UwbSessionSync<T> {
        UwbSessionSync {
            session,
            handle: self.runtime.handle().clone(),
            command_timeout: self.command_timeout,
        }
    }

    fn block_on_cmd<R>(&self, name: &str, future: impl Future<Output = Result<R>>) -> Result<R> {
        block_on_cmd(self.runtime.handle(), self.command_timeout, name, future)
    }

    /// Run a future on the runtime. This method is only exposed for the testing.
    #[cfg(test)]
    fn block_on_for_testing<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// The blocking wrapper of UwbSession.
///
/// A command that times out leaves the session state unchanged: the pending command is dropped
/// and its completion is never applied.
pub struct UwbSessionSync<T: UwbTransport> {
    session: UwbSession<T>,
    handle: Handle,
    command_timeout: Option<Duration>,
}

impl<T: UwbTransport> UwbSessionSync<T> {
    pub fn id(&self) -> SessionId {
        self.session.id()
    }

    pub fn device_type(&self) -> DeviceType {
        self.session.device_type()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.session.watch_state()
    }

    pub fn configuration_parameters(&self) -> Vec<UwbApplicationConfigurationParameter> {
        self.session.configuration_parameters()
    }

    pub fn peers(&self) -> Vec<UwbPeer> {
        self.session.peers()
    }

    pub fn subscribe(&self, callbacks: Box<dyn UwbSessionEventCallbacks>) -> SubscriptionHandle {
        self.session.subscribe(callbacks)
    }

    /// The asynchronous session behind this wrapper.
    pub fn as_async(&self) -> &UwbSession<T> {
        &self.session
    }

    pub fn configure(&self, params: Vec<UwbApplicationConfigurationParameter>) -> Result<()> {
        self.block_on_cmd("configure", self.session.configure(params))
    }

    pub fn start_ranging(&self) -> Result<()> {
        self.block_on_cmd("start_ranging", self.session.start_ranging())
    }

    pub fn stop_ranging(&self) -> Result<()> {
        self.block_on_cmd("stop_ranging", self.session.stop_ranging())
    }

    pub fn destroy(&self) -> Result<()> {
        self.block_on_cmd("destroy", self.session.destroy())
    }

    pub fn add_peer(&self, mac_address: UwbMacAddress) -> Result<()> {
        self.block_on_cmd("add_peer", self.session.add_peer(mac_address))
    }

    pub fn get_application_configuration_parameters(
        &self,
        param_types: Vec<UwbApplicationConfigurationParameterType>,
    ) -> Result<Vec<UwbApplicationConfigurationParameter>> {
        self.block_on_cmd(
            "get_application_configuration_parameters",
            self.session.get_application_configuration_parameters(param_types),
        )
    }

    pub fn get_session_state(&self) -> Result<UwbSessionState> {
        self.block_on_cmd("get_session_state", self.session.get_session_state())
    }

    fn block_on_cmd<R>(&self, name: &str, future: impl Future<Output = Result<R>>) -> Result<R> {
        block_on_cmd(&self.handle, self.command_timeout, name, future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::device::uwb_device_builder::default_runtime;
    use crate::params::uci_packets::{SessionType, SetAppConfigResponse, UwbStatus};
    use crate::params::uwb_configuration::ParameterValue;
    use crate::transport::mock_transport::MockUwbTransport;
    use crate::utils::init_test_logging;

    const SESSION_ID: SessionId = 5;
    const COMMAND_TIMEOUT_MS: u64 = 100;

    fn setup_device(transport: &MockUwbTransport) -> UwbDeviceSync<MockUwbTransport> {
        init_test_logging();
        UwbDeviceSync::new(
            "sync",
            transport.clone(),
            default_runtime().unwrap(),
            Some(Duration::from_millis(COMMAND_TIMEOUT_MS)),
        )
    }

    fn generate_params() -> Vec<UwbApplicationConfigurationParameter> {
        vec![UwbApplicationConfigurationParameter::new(
            UwbApplicationConfigurationParameterType::ChannelNumber,
            ParameterValue::Enum(5),
        )]
    }

    #[test]
    fn test_session_commands() {
        let mut transport = MockUwbTransport::new();
        transport.expect_session_initialize(
            SESSION_ID,
            SessionType::FiraRangingSession,
            vec![],
            Ok(()),
        );
        transport.expect_set_application_configuration_parameters(
            SESSION_ID,
            generate_params(),
            vec![],
            Ok(SetAppConfigResponse { status: UwbStatus::Ok, config_status: vec![] }),
        );
        transport.expect_session_ranging_start(SESSION_ID, vec![], Ok(()));
        transport.expect_session_ranging_stop(SESSION_ID, vec![], Ok(()));
        transport.expect_session_deinitialize(SESSION_ID, vec![], Ok(()));
        let device = setup_device(&transport);
        assert_eq!(device.name(), "sync");

        let session = device.create_session(SESSION_ID, DeviceType::Controlee, None).unwrap();
        assert_eq!(device.get_session(SESSION_ID).unwrap().id(), SESSION_ID);
        assert_eq!(session.start_ranging(), Err(Error::WrongState(SessionState::Uninitialized)));
        assert_eq!(session.configure(generate_params()), Ok(()));
        assert_eq!(session.start_ranging(), Ok(()));
        assert_eq!(session.state(), SessionState::Ranging);
        assert_eq!(session.stop_ranging(), Ok(()));
        assert_eq!(session.destroy(), Ok(()));
        assert_eq!(session.state(), SessionState::Deinitialized);
        assert_eq!(device.get_session_count(), 0);

        assert!(device.block_on_for_testing(transport.wait_expected_calls_done()));
    }

    #[test]
    fn test_command_timeout_keeps_state() {
        let mut transport = MockUwbTransport::new();
        transport.expect_session_initialize(
            SESSION_ID,
            SessionType::FiraRangingSession,
            vec![],
            Ok(()),
        );
        transport.delay_last_expected_call(Duration::from_millis(COMMAND_TIMEOUT_MS * 10));
        transport.expect_get_session_count(Ok(1));
        transport.delay_last_expected_call(Duration::from_millis(COMMAND_TIMEOUT_MS * 10));
        let device = setup_device(&transport);
        let session = device.create_session(SESSION_ID, DeviceType::Controller, None).unwrap();

        // The initialization is dropped before it completes, so the session is never moved to
        // Initialized.
        assert_eq!(session.configure(generate_params()), Err(Error::Timeout));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(device.query_session_count(), Err(Error::Timeout));

        assert!(device.block_on_for_testing(transport.wait_expected_calls_done()));
        assert_eq!(session.state(), SessionState::Uninitialized);
    }
}
