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

//! The mock implementation of UwbTransport, for the tests of this crate and of its clients.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio::time::{sleep, timeout};

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

/// The mock UwbTransport. The clones share the expected calls, so a test keeps one clone to
/// set the expectations and to wait for them to be consumed.
///
/// Each expected call may carry the notifications that are sent before the call completes.
#[derive(Clone, Default)]
pub struct MockUwbTransport {
    expected_calls: Arc<Mutex<VecDeque<Expectation>>>,
    expect_call_consumed: Arc<Notify>,
    notf_sender: Arc<Mutex<Option<mpsc::UnboundedSender<UwbNotification>>>>,
}

impl MockUwbTransport {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn expect_reset(&mut self, out: Result<()>) {
        self.push_expected_call(ExpectedCall::Reset { out });
    }

    pub fn expect_get_device_information(&mut self, out: Result<UwbDeviceInformation>) {
        self.push_expected_call(ExpectedCall::GetDeviceInformation { out });
    }

    pub fn expect_get_capabilities(&mut self, out: Result<UwbCapability>) {
        self.push_expected_call(ExpectedCall::GetCapabilities { out });
    }

    pub fn expect_get_session_count(&mut self, out: Result<u32>) {
        self.push_expected_call(ExpectedCall::GetSessionCount { out });
    }

    pub fn expect_session_initialize(
        &mut self,
        expected_session_id: SessionId,
        expected_session_type: SessionType,
        notfs: Vec<UwbNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SessionInitialize {
            expected_session_id,
            expected_session_type,
            notfs,
            out,
        });
    }

    pub fn expect_session_deinitialize(
        &mut self,
        expected_session_id: SessionId,
        notfs: Vec<UwbNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SessionDeinitialize {
            expected_session_id,
            notfs,
            out,
        });
    }

    pub fn expect_set_application_configuration_parameters(
        &mut self,
        expected_session_id: SessionId,
        expected_params: Vec<UwbApplicationConfigurationParameter>,
        notfs: Vec<UwbNotification>,
        out: Result<SetAppConfigResponse>,
    ) {
        self.push_expected_call(ExpectedCall::SetApplicationConfigurationParameters {
            expected_session_id,
            expected_params,
            notfs,
            out,
        });
    }

    pub fn expect_get_application_configuration_parameters(
        &mut self,
        expected_session_id: SessionId,
        expected_param_types: Vec<UwbApplicationConfigurationParameterType>,
        out: Result<Vec<UwbApplicationConfigurationParameter>>,
    ) {
        self.push_expected_call(ExpectedCall::GetApplicationConfigurationParameters {
            expected_session_id,
            expected_param_types,
            out,
        });
    }

    pub fn expect_session_ranging_start(
        &mut self,
        expected_session_id: SessionId,
        notfs: Vec<UwbNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SessionRangingStart {
            expected_session_id,
            notfs,
            out,
        });
    }

    pub fn expect_session_ranging_stop(
        &mut self,
        expected_session_id: SessionId,
        notfs: Vec<UwbNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SessionRangingStop {
            expected_session_id,
            notfs,
            out,
        });
    }

    pub fn expect_session_get_state(
        &mut self,
        expected_session_id: SessionId,
        out: Result<UwbSessionState>,
    ) {
        self.push_expected_call(ExpectedCall::SessionGetState { expected_session_id, out });
    }

    /// Delay the completion of the last expected call.
    pub fn delay_last_expected_call(&mut self, delay: Duration) {
        if let Some(expectation) = self.expected_calls.lock().unwrap().back_mut() {
            expectation.delay.before_notifications = Some(delay);
        }
    }

    /// Delay the response of the last expected call after its notifications are sent, so the
    /// notifications are handled while the call is still in flight.
    pub fn delay_last_expected_response(&mut self, delay: Duration) {
        if let Some(expectation) = self.expected_calls.lock().unwrap().back_mut() {
            expectation.delay.before_response = Some(delay);
        }
    }

    /// Send a notification as if the device sent it spontaneously.
    pub fn send_notification(&self, notf: UwbNotification) -> bool {
        match self.notf_sender.lock().unwrap().as_ref() {
            Some(sender) => sender.send(notf).is_ok(),
            None => false,
        }
    }

    /// Wait until all the expected calls are consumed. Returns false when no call is consumed
    /// for one second.
    pub async fn wait_expected_calls_done(&mut self) -> bool {
        while !self.expected_calls.lock().unwrap().is_empty() {
            if timeout(Duration::from_secs(1), self.expect_call_consumed.notified()).await.is_err()
            {
                return false;
            }
        }
        true
    }

    fn push_expected_call(&mut self, call: ExpectedCall) {
        let expectation = Expectation { call, delay: CallDelay::default() };
        self.expected_calls.lock().unwrap().push_back(expectation);
    }

    fn pop_expected_call(&self) -> Option<Expectation> {
        self.expected_calls.lock().unwrap().pop_front()
    }

    fn restore_expected_call(&self, expectation: Expectation) {
        self.expected_calls.lock().unwrap().push_front(expectation);
    }

    // Wait for the delay, send the notifications, then mark the call as consumed.
    async fn complete_call(&self, delay: CallDelay, notfs: Vec<UwbNotification>) {
        if let Some(delay) = delay.before_notifications {
            sleep(delay).await;
        }
        for notf in notfs.into_iter() {
            self.send_notification(notf);
        }
        if let Some(delay) = delay.before_response {
            sleep(delay).await;
        }
        self.expect_call_consumed.notify_one();
    }
}

#[async_trait]
impl UwbTransport for MockUwbTransport {
    async fn set_notification_sender(
        &mut self,
        notf_sender: mpsc::UnboundedSender<UwbNotification>,
    ) {
        self.notf_sender.lock().unwrap().replace(notf_sender);
    }

    async fn reset(&self) -> Result<()> {
        match self.pop_expected_call() {
            Some(Expectation { call: ExpectedCall::Reset { out }, delay }) => {
                self.complete_call(delay, vec![]).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn get_device_information(&self) -> Result<UwbDeviceInformation> {
        match self.pop_expected_call() {
            Some(Expectation { call: ExpectedCall::GetDeviceInformation { out }, delay }) => {
                self.complete_call(delay, vec![]).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn get_capabilities(&self) -> Result<UwbCapability> {
        match self.pop_expected_call() {
            Some(Expectation { call: ExpectedCall::GetCapabilities { out }, delay }) => {
                self.complete_call(delay, vec![]).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn get_session_count(&self) -> Result<u32> {
        match self.pop_expected_call() {
            Some(Expectation { call: ExpectedCall::GetSessionCount { out }, delay }) => {
                self.complete_call(delay, vec![]).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn session_initialize(
        &self,
        session_id: SessionId,
        session_type: SessionType,
    ) -> Result<()> {
        match self.pop_expected_call() {
            Some(Expectation {
                call:
                    ExpectedCall::SessionInitialize {
                        expected_session_id,
                        expected_session_type,
                        notfs,
                        out,
                    },
                delay,
            }) if expected_session_id == session_id && expected_session_type == session_type => {
                self.complete_call(delay, notfs).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn session_deinitialize(&self, session_id: SessionId) -> Result<()> {
        match self.pop_expected_call() {
            Some(Expectation {
                call: ExpectedCall::SessionDeinitialize { expected_session_id, notfs, out },
                delay,
            }) if expected_session_id == session_id => {
                self.complete_call(delay, notfs).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn set_application_configuration_parameters(
        &self,
        session_id: SessionId,
        params: Vec<UwbApplicationConfigurationParameter>,
    ) -> Result<SetAppConfigResponse> {
        match self.pop_expected_call() {
            Some(Expectation {
                call:
                    ExpectedCall::SetApplicationConfigurationParameters {
                        expected_session_id,
                        expected_params,
                        notfs,
                        out,
                    },
                delay,
            }) if expected_session_id == session_id && params_eq(&expected_params, &params) => {
                self.complete_call(delay, notfs).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn get_application_configuration_parameters(
        &self,
        session_id: SessionId,
        param_types: Vec<UwbApplicationConfigurationParameterType>,
    ) -> Result<Vec<UwbApplicationConfigurationParameter>> {
        match self.pop_expected_call() {
            Some(Expectation {
                call:
                    ExpectedCall::GetApplicationConfigurationParameters {
                        expected_session_id,
                        expected_param_types,
                        out,
                    },
                delay,
            }) if expected_session_id == session_id && expected_param_types == param_types => {
                self.complete_call(delay, vec![]).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn session_ranging_start(&self, session_id: SessionId) -> Result<()> {
        match self.pop_expected_call() {
            Some(Expectation {
                call: ExpectedCall::SessionRangingStart { expected_session_id, notfs, out },
                delay,
            }) if expected_session_id == session_id => {
                self.complete_call(delay, notfs).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn session_ranging_stop(&self, session_id: SessionId) -> Result<()> {
        match self.pop_expected_call() {
            Some(Expectation {
                call: ExpectedCall::SessionRangingStop { expected_session_id, notfs, out },
                delay,
            }) if expected_session_id == session_id => {
                self.complete_call(delay, notfs).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }

    async fn session_get_state(&self, session_id: SessionId) -> Result<UwbSessionState> {
        match self.pop_expected_call() {
            Some(Expectation {
                call: ExpectedCall::SessionGetState { expected_session_id, out },
                delay,
            }) if expected_session_id == session_id => {
                self.complete_call(delay, vec![]).await;
                out
            }
            Some(expectation) => {
                self.restore_expected_call(expectation);
                Err(Error::MockUndefined)
            }
            None => Err(Error::MockUndefined),
        }
    }
}

// The order of the parameters doesn't matter.
fn params_eq(
    a: &[UwbApplicationConfigurationParameter],
    b: &[UwbApplicationConfigurationParameter],
) -> bool {
    a.len() == b.len() && a.iter().all(|param| b.contains(param))
}

struct Expectation {
    call: ExpectedCall,
    delay: CallDelay,
}

#[derive(Default)]
struct CallDelay {
    before_notifications: Option<Duration>,
    before_response: Option<Duration>,
}

enum ExpectedCall {
    Reset {
        out: Result<()>,
    },
    GetDeviceInformation {
        out: Result<UwbDeviceInformation>,
    },
    GetCapabilities {
        out: Result<UwbCapability>,
    },
    GetSessionCount {
        out: Result<u32>,
    },
    SessionInitialize {
        expected_session_id: SessionId,
        expected_session_type: SessionType,
        notfs: Vec<UwbNotification>,
        out: Result<()>,
    },
    SessionDeinitialize {
        expected_session_id: SessionId,
        notfs: Vec<UwbNotification>,
        out: Result<()>,
    },
    SetApplicationConfigurationParameters {
        expected_session_id: SessionId,
        expected_params: Vec<UwbApplicationConfigurationParameter>,
        notfs: Vec<UwbNotification>,
        out: Result<SetAppConfigResponse>,
    },
    GetApplicationConfigurationParameters {
        expected_session_id: SessionId,
        expected_param_types: Vec<UwbApplicationConfigurationParameterType>,
        out: Result<Vec<UwbApplicationConfigurationParameter>>,
    },
    SessionRangingStart {
        expected_session_id: SessionId,
        notfs: Vec<UwbNotification>,
        out: Result<()>,
    },
    SessionRangingStop {
        expected_session_id: SessionId,
        notfs: Vec<UwbNotification>,
        out: Result<()>,
    },
    SessionGetState {
        expected_session_id: SessionId,
        out: Result<UwbSessionState>,
    },
}
