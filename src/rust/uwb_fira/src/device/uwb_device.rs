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

//! This module defines UwbDevice, the entry of the asynchronous API.

use std::sync::{Arc, Weak};

use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};

use crate::device::session_registry::SessionRegistry;
use crate::error::Result;
use crate::params::fira_device::DeviceType;
use crate::params::uci_packets::{
    SessionId, UwbCapability, UwbDeviceInformation, UwbSessionState,
};
use crate::session::callbacks::{SubscriptionHandle, Subscriptions, UwbDeviceEventCallbacks};
use crate::session::{UwbSession, UwbSessionEventCallbacks};
use crate::transport::notification::UwbNotification;
use crate::transport::uwb_transport::UwbTransport;
use crate::utils::clean_mpsc_receiver;

/// The state of the device shared with its sessions and its notification dispatcher. Both of
/// them only hold it weakly.
pub(crate) struct DeviceShared<T: UwbTransport> {
    pub name: String,
    pub transport: T,
    pub registry: SessionRegistry<T>,
    pub subscriptions: Subscriptions<dyn UwbDeviceEventCallbacks>,
}

impl<T: UwbTransport> DeviceShared<T> {
    fn handle_notification(&self, notf: UwbNotification) {
        debug!("Device {} received notification: {}", self.name, notf);
        match notf {
            UwbNotification::DeviceStatus(state) => {
                self.subscriptions.dispatch(|callbacks| callbacks.on_device_status_changed(state));
            }
            UwbNotification::GenericError(status) => {
                self.subscriptions.dispatch(|callbacks| callbacks.on_generic_error(status));
            }
            UwbNotification::SessionStatus {
                session_id,
                session_state: UwbSessionState::Deinit,
                ..
            } if self.registry.take_pending_deinit(session_id) => {
                debug!("The dropped session {} is deinitialized", session_id);
            }
            _ => {
                let session_id = match notf.session_id() {
                    Some(session_id) => session_id,
                    None => return,
                };
                match self.registry.get(session_id) {
                    Some(session) => session.handle_notification(notf),
                    None => {
                        warn!("Received the notification of the unknown session {}", session_id)
                    }
                }
            }
        }
    }
}

/// The UWB device. It creates the ranging sessions and routes the notifications of the
/// transport to them.
///
/// UwbDevice must be created and dropped inside a tokio runtime. The sessions created by the
/// device fail with `Error::DeviceUnavailable` once the device is dropped.
pub struct UwbDevice<T: UwbTransport> {
    shared: Arc<DeviceShared<T>>,
    // The dispatcher stops when the sender is dropped.
    _dispatcher_shutdown: oneshot::Sender<()>,
}

impl<T: UwbTransport> UwbDevice<T> {
    /// Create the device and start dispatching the notifications of |transport|.
    pub async fn new<S: Into<String>>(name: S, mut transport: T) -> Self {
        let (notf_sender, notf_receiver) = mpsc::unbounded_channel();
        transport.set_notification_sender(notf_sender).await;

        let shared = Arc::new(DeviceShared {
            name: name.into(),
            transport,
            registry: SessionRegistry::new(),
            subscriptions: Subscriptions::new(),
        });
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let dispatcher = NotificationDispatcher {
            shared: Arc::downgrade(&shared),
            notf_receiver,
            shutdown_receiver,
        };
        tokio::spawn(async move { dispatcher.run().await });

        Self { shared, _dispatcher_shutdown: shutdown_sender }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Create a session. It fails with `Error::DuplicatedSessionId` when a live session with the
    /// same id exists. |callbacks| are subscribed for the lifetime of the session.
    pub fn create_session(
        &self,
        session_id: SessionId,
        device_type: DeviceType,
        callbacks: Option<Box<dyn UwbSessionEventCallbacks>>,
    ) -> Result<UwbSession<T>> {
        let device = Arc::downgrade(&self.shared);
        let session = self.shared.registry.insert_with(session_id, move || {
            UwbSession::new(session_id, device_type, device, callbacks)
        })?;
        debug!("Device {} created session {}", self.shared.name, session_id);
        Ok(session)
    }

    /// Get the live session with the id.
    pub fn get_session(&self, session_id: SessionId) -> Option<UwbSession<T>> {
        self.shared.registry.get(session_id).map(UwbSession::from_inner)
    }

    /// The number of the live sessions created by this device.
    pub fn get_session_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Subscribe to the device events. The subscription lasts until the handle is dropped.
    pub fn subscribe(&self, callbacks: Box<dyn UwbDeviceEventCallbacks>) -> SubscriptionHandle {
        self.shared.subscriptions.subscribe(callbacks)
    }

    pub async fn reset(&self) -> Result<()> {
        self.shared.transport.reset().await
    }

    pub async fn get_device_information(&self) -> Result<UwbDeviceInformation> {
        self.shared.transport.get_device_information().await
    }

    pub async fn get_capabilities(&self) -> Result<UwbCapability> {
        self.shared.transport.get_capabilities().await
    }

    /// Query the number of the sessions the device knows, including the ones not created by
    /// this instance.
    pub async fn query_session_count(&self) -> Result<u32> {
        self.shared.transport.get_session_count().await
    }
}

struct NotificationDispatcher<T: UwbTransport> {
    shared: Weak<DeviceShared<T>>,
    notf_receiver: mpsc::UnboundedReceiver<UwbNotification>,
    shutdown_receiver: oneshot::Receiver<()>,
}

impl<T: UwbTransport> NotificationDispatcher<T> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = &mut self.shutdown_receiver => {
                    debug!("UwbDevice is about to drop.");
                    break;
                }
                notf = self.notf_receiver.recv() => {
                    let notf = match notf {
                        Some(notf) => notf,
                        None => {
                            debug!("The notification channel is closed.");
                            break;
                        }
                    };
                    match self.shared.upgrade() {
                        Some(shared) => shared.handle_notification(notf),
                        None => break,
                    }
                }
            }
        }
        clean_mpsc_receiver(&mut self.notf_receiver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::error::Error;
    use crate::params::app_config_params::{
        UwbApplicationConfigurationParameter, UwbApplicationConfigurationParameterType,
    };
    use crate::params::uci_packets::{
        DeviceState, ReasonCode, SessionState, SessionType, SetAppConfigResponse, UwbStatus,
    };
    use crate::params::uwb_configuration::ParameterValue;
    use crate::session::mock_callbacks::MockUwbDeviceEventCallbacks;
    use crate::transport::mock_transport::MockUwbTransport;
    use crate::utils::init_test_logging;

    async fn setup_device(transport: &MockUwbTransport) -> UwbDevice<MockUwbTransport> {
        init_test_logging();
        UwbDevice::new("uwb0", transport.clone()).await
    }

    #[tokio::test]
    async fn test_duplicated_session() {
        let mut transport = MockUwbTransport::new();
        let device = setup_device(&transport).await;
        assert_eq!(device.name(), "uwb0");

        let session = device.create_session(7, DeviceType::Controller, None).unwrap();
        let result = device.create_session(7, DeviceType::Controlee, None);
        assert!(matches!(result, Err(Error::DuplicatedSessionId(7))));
        assert_eq!(device.get_session(7).unwrap().device_type(), DeviceType::Controller);

        drop(session);
        let _session = device.create_session(7, DeviceType::Controlee, None).unwrap();
        assert_eq!(device.get_session_count(), 1);
        assert_eq!(device.get_session(7).unwrap().device_type(), DeviceType::Controlee);
        assert!(device.get_session(8).is_none());
        assert!(transport.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_recreate_dropped_session() {
        let mut transport = MockUwbTransport::new();
        let params = vec![UwbApplicationConfigurationParameter::new(
            UwbApplicationConfigurationParameterType::ChannelNumber,
            ParameterValue::Enum(9),
        )];
        let expect_configure = |transport: &mut MockUwbTransport| {
            transport.expect_session_initialize(
                291,
                SessionType::FiraRangingSession,
                vec![],
                Ok(()),
            );
            transport.expect_set_application_configuration_parameters(
                291,
                params.clone(),
                vec![],
                Ok(SetAppConfigResponse { status: UwbStatus::Ok, config_status: vec![] }),
            );
        };
        expect_configure(&mut transport);
        transport.expect_session_deinitialize(
            291,
            vec![UwbNotification::SessionStatus {
                session_id: 291,
                session_state: UwbSessionState::Deinit,
                reason_code: Some(ReasonCode::StateChangeWithSessionManagementCommands),
            }],
            Ok(()),
        );
        transport.delay_last_expected_call(Duration::from_millis(50));
        expect_configure(&mut transport);
        let device = setup_device(&transport).await;

        let session = device.create_session(291, DeviceType::Controller, None).unwrap();
        assert_eq!(session.configure(params.clone()).await, Ok(()));
        drop(session);

        // The new session is initialized only after the dropped one is deinitialized, and the
        // deinitialization of the dropped one doesn't end it.
        let session = device.create_session(291, DeviceType::Controller, None).unwrap();
        assert_eq!(session.configure(params.clone()).await, Ok(()));
        assert!(transport.wait_expected_calls_done().await);
        tokio::task::yield_now().await;
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(device.get_session_count(), 1);
    }

    #[tokio::test]
    async fn test_device_commands() {
        let mut transport = MockUwbTransport::new();
        let device_info = UwbDeviceInformation {
            uci_version: 0x0101,
            mac_version: 0x0102,
            ..Default::default()
        };
        transport.expect_reset(Ok(()));
        transport.expect_get_device_information(Ok(device_info.clone()));
        transport.expect_get_capabilities(Ok(UwbCapability::default()));
        transport.expect_get_session_count(Err(Error::Status(UwbStatus::Failed)));
        let device = setup_device(&transport).await;

        assert_eq!(device.reset().await, Ok(()));
        assert_eq!(device.get_device_information().await, Ok(device_info));
        assert_eq!(device.get_capabilities().await, Ok(UwbCapability::default()));
        assert_eq!(device.query_session_count().await, Err(Error::Status(UwbStatus::Failed)));
        assert!(transport.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_device_notifications() {
        let transport = MockUwbTransport::new();
        let mut callbacks = MockUwbDeviceEventCallbacks::new();
        callbacks.expect_on_device_status_changed(DeviceState::Active);
        callbacks.expect_on_generic_error(UwbStatus::Failed);
        let device = setup_device(&transport).await;
        let handle = device.subscribe(Box::new(callbacks.clone()));

        assert!(transport.send_notification(UwbNotification::DeviceStatus(DeviceState::Active)));
        assert!(transport.send_notification(UwbNotification::GenericError(UwbStatus::Failed)));
        // The notification of an unknown session is dropped.
        assert!(transport.send_notification(UwbNotification::SessionStatus {
            session_id: 9,
            session_state: UwbSessionState::Idle,
            reason_code: None,
        }));
        assert!(callbacks.wait_expected_calls_done().await);

        // The unsubscribed callbacks panic if called.
        handle.unsubscribe();
        assert!(transport.send_notification(UwbNotification::DeviceStatus(DeviceState::Error)));
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn test_dispatcher_stops_with_device() {
        let transport = MockUwbTransport::new();
        let device = setup_device(&transport).await;

        drop(device);
        // Wait for the dispatcher to close the notification channel.
        let mut closed = false;
        for _ in 0..10 {
            tokio::task::yield_now().await;
            if !transport.send_notification(UwbNotification::DeviceStatus(DeviceState::Ready)) {
                closed = true;
                break;
            }
        }
        assert!(closed);
    }
}
