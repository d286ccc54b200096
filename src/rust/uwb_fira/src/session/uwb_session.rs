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

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use log::{debug, error, warn};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::device::uwb_device::DeviceShared;
use crate::error::{status_to_result, Error, Result};
use crate::params::app_config_params::{
    UwbApplicationConfigurationParameter, UwbApplicationConfigurationParameterType,
};
use crate::params::fira_device::{DeviceType, UwbMacAddress};
use crate::params::uci_packets::{
    MulticastUpdateStatus, ReasonCode, SessionId, SessionState, SessionType,
    SetAppConfigResponse, UwbSessionState,
};
use crate::params::uwb_configuration::ParameterValue;
use crate::session::callbacks::{
    SessionEndReason, SubscriptionHandle, Subscriptions, UwbPeer, UwbSessionEventCallbacks,
};
use crate::transport::notification::{UwbMulticastListStatus, UwbNotification, UwbRangingData};
use crate::transport::uwb_transport::UwbTransport;
use crate::utils::lock;

const ACTIVE_STATES: [SessionState; 4] = [
    SessionState::Initialized,
    SessionState::Configured,
    SessionState::Ranging,
    SessionState::Stopped,
];
const NON_TERMINAL_STATES: [SessionState; 5] = [
    SessionState::Uninitialized,
    SessionState::Initialized,
    SessionState::Configured,
    SessionState::Ranging,
    SessionState::Stopped,
];
// How long the deinitialization of a dropped session waits for the device to report it.
const DEINIT_NOTIFICATION_TIMEOUT_MS: u64 = 500;

/// The handle of a FiRa ranging session created by a [`UwbDevice`](crate::UwbDevice).
///
/// The clones of the handle share the same session. The session lives until its last handle is
/// dropped; a session dropped while the device still knows it is deinitialized in the background.
///
/// The commands of one session are executed one at a time. The notifications of the device are
/// applied between the commands, or while a command waits for the transport.
pub struct UwbSession<T: UwbTransport> {
    inner: Arc<SessionInner<T>>,
}

impl<T: UwbTransport> Clone for UwbSession<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T: UwbTransport> UwbSession<T> {
    pub(crate) fn new(
        session_id: SessionId,
        device_type: DeviceType,
        device: Weak<DeviceShared<T>>,
        callbacks: Option<Box<dyn UwbSessionEventCallbacks>>,
    ) -> Self {
        Self { inner: Arc::new(SessionInner::new(session_id, device_type, device, callbacks)) }
    }

    pub(crate) fn from_inner(inner: Arc<SessionInner<T>>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<SessionInner<T>> {
        Arc::downgrade(&self.inner)
    }

    pub fn id(&self) -> SessionId {
        self.inner.session_id
    }

    pub fn device_type(&self) -> DeviceType {
        self.inner.device_type
    }

    pub fn session_type(&self) -> SessionType {
        self.inner.session_type
    }

    /// The current state of the session.
    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    /// A receiver observing the state changes of the session.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state_sender.subscribe()
    }

    /// The application configuration parameters applied successfully so far.
    pub fn configuration_parameters(&self) -> Vec<UwbApplicationConfigurationParameter> {
        lock(&self.inner.configuration_parameters).clone()
    }

    /// The known peers of the session, ordered by the MAC address.
    pub fn peers(&self) -> Vec<UwbPeer> {
        lock(&self.inner.peers).values().copied().collect()
    }

    /// Subscribe to the session events. The subscription lasts until the handle is dropped.
    pub fn subscribe(&self, callbacks: Box<dyn UwbSessionEventCallbacks>) -> SubscriptionHandle {
        self.inner.subscriptions.subscribe(callbacks)
    }

    /// Initialize the session on the device when it is not initialized yet, then set the
    /// application configuration parameters.
    ///
    /// The parameters that the device rejects individually are logged; the command fails only
    /// when the device rejects the whole request.
    pub async fn configure(&self, params: Vec<UwbApplicationConfigurationParameter>) -> Result<()> {
        self.inner.configure(params).await
    }

    pub async fn start_ranging(&self) -> Result<()> {
        self.inner.start_ranging().await
    }

    pub async fn stop_ranging(&self) -> Result<()> {
        self.inner.stop_ranging().await
    }

    /// Deinitialize the session. The session can't be used afterwards.
    pub async fn destroy(&self) -> Result<()> {
        self.inner.destroy().await
    }

    /// Add a peer to the session. Once the session is initialized, the destination address list
    /// of the device is updated with all the known peers.
    pub async fn add_peer(&self, mac_address: UwbMacAddress) -> Result<()> {
        self.inner.add_peer(mac_address).await
    }

    /// Read the application configuration parameters from the device. An empty |param_types|
    /// reads all the parameters set on the device.
    pub async fn get_application_configuration_parameters(
        &self,
        param_types: Vec<UwbApplicationConfigurationParameterType>,
    ) -> Result<Vec<UwbApplicationConfigurationParameter>> {
        self.inner.get_application_configuration_parameters(param_types).await
    }

    /// Query the state of the session reported by the device.
    pub async fn get_session_state(&self) -> Result<UwbSessionState> {
        self.inner.get_session_state().await
    }
}

pub(crate) struct SessionInner<T: UwbTransport> {
    session_id: SessionId,
    device_type: DeviceType,
    session_type: SessionType,
    device: Weak<DeviceShared<T>>,
    runtime: Option<Handle>,
    state_sender: watch::Sender<SessionState>,
    command_lock: tokio::sync::Mutex<()>,
    // Held while the state changes and while their events are dispatched, so the events follow
    // the order of the state changes.
    status_tracker: Mutex<StatusTracker>,
    destroy_requested: AtomicBool,
    configuration_parameters: Mutex<Vec<UwbApplicationConfigurationParameter>>,
    peers: Mutex<BTreeMap<UwbMacAddress, UwbPeer>>,
    subscriptions: Subscriptions<dyn UwbSessionEventCallbacks>,
    _callbacks_handle: Option<SubscriptionHandle>,
}

impl<T: UwbTransport> SessionInner<T> {
    fn new(
        session_id: SessionId,
        device_type: DeviceType,
        device: Weak<DeviceShared<T>>,
        callbacks: Option<Box<dyn UwbSessionEventCallbacks>>,
    ) -> Self {
        let (state_sender, _) = watch::channel(SessionState::Uninitialized);
        let subscriptions = Subscriptions::<dyn UwbSessionEventCallbacks>::new();
        let callbacks_handle = callbacks.map(|callbacks| subscriptions.subscribe(callbacks));
        Self {
            session_id,
            device_type,
            session_type: SessionType::FiraRangingSession,
            device,
            runtime: Handle::try_current().ok(),
            state_sender,
            command_lock: tokio::sync::Mutex::new(()),
            status_tracker: Mutex::new(StatusTracker::default()),
            destroy_requested: AtomicBool::new(false),
            configuration_parameters: Mutex::new(vec![]),
            peers: Mutex::new(BTreeMap::new()),
            subscriptions,
            _callbacks_handle: callbacks_handle,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state_sender.borrow()
    }

    /// Whether the registry of the device should still resolve the session.
    pub fn is_live(&self) -> bool {
        !self.state().is_terminal()
    }

    async fn configure(&self, params: Vec<UwbApplicationConfigurationParameter>) -> Result<()> {
        let _command = self.command_lock.lock().await;
        let state = self.check_state(&[
            SessionState::Uninitialized,
            SessionState::Initialized,
            SessionState::Configured,
            SessionState::Stopped,
        ])?;
        let device = self.device()?;

        if state == SessionState::Uninitialized {
            // A dropped session with the same id may still be known by the device.
            device.registry.wait_deinit(self.session_id).await;

            let _recording = self.record_statuses(UwbSessionState::Init);
            device
                .transport
                .session_initialize(self.session_id, self.session_type)
                .await
                .map_err(|e| {
                    error!("Failed to initialize session {}: {:?}", self.session_id, e);
                    e
                })?;
            let state = self.complete_command(
                &[SessionState::Uninitialized],
                SessionState::Initialized,
                |_| None,
            )?;
            if state != SessionState::Initialized {
                return Err(Error::WrongState(state));
            }
        }

        let _recording = self.record_statuses(UwbSessionState::Idle);
        let response = device
            .transport
            .set_application_configuration_parameters(self.session_id, params.clone())
            .await
            .map_err(|e| {
                error!("Failed to configure session {}: {:?}", self.session_id, e);
                e
            })?;
        self.check_set_app_config_response(&response)?;

        self.complete_command(
            &[SessionState::Initialized, SessionState::Configured, SessionState::Stopped],
            SessionState::Configured,
            |_| None,
        )?;
        self.store_configuration_parameters(params);
        Ok(())
    }

    async fn start_ranging(&self) -> Result<()> {
        let _command = self.command_lock.lock().await;
        self.check_state(&[SessionState::Configured, SessionState::Stopped])?;
        let device = self.device()?;

        let _recording = self.record_statuses(UwbSessionState::Active);
        device.transport.session_ranging_start(self.session_id).await.map_err(|e| {
            error!("Failed to start ranging of session {}: {:?}", self.session_id, e);
            e
        })?;
        // The device may have stopped the ranging again before the command completes. The
        // session is then Stopped.
        self.complete_command(
            &[SessionState::Configured, SessionState::Stopped],
            SessionState::Ranging,
            |_| Some(SessionEvent::RangingStarted),
        )?;
        Ok(())
    }

    async fn stop_ranging(&self) -> Result<()> {
        let _command = self.command_lock.lock().await;
        self.check_state(&[SessionState::Ranging])?;
        let device = self.device()?;

        let _recording = self.record_statuses(UwbSessionState::Idle);
        device.transport.session_ranging_stop(self.session_id).await.map_err(|e| {
            error!("Failed to stop ranging of session {}: {:?}", self.session_id, e);
            e
        })?;
        // The device may report the session idle before the command completes. The event is
        // then already sent.
        self.complete_command(
            &[SessionState::Ranging, SessionState::Stopped],
            SessionState::Configured,
            |origin| (origin == SessionState::Ranging).then(|| SessionEvent::RangingStopped),
        )?;
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        let _command = self.command_lock.lock().await;
        let state = self.check_state(&NON_TERMINAL_STATES)?;

        if state != SessionState::Uninitialized {
            let device = self.device()?;
            self.destroy_requested.store(true, Ordering::SeqCst);
            if let Err(e) = device.transport.session_deinitialize(self.session_id).await {
                error!("Failed to deinitialize session {}: {:?}", self.session_id, e);
                self.destroy_requested.store(false, Ordering::SeqCst);
                return Err(e);
            }
        }

        // The device may report the deinitialization before the command completes. The event is
        // then already sent.
        match self.complete_command(&NON_TERMINAL_STATES, SessionState::Deinitialized, |_| {
            Some(SessionEvent::Ended(SessionEndReason::LocalRequest))
        }) {
            Ok(_) | Err(Error::WrongState(SessionState::Deinitialized)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn add_peer(&self, mac_address: UwbMacAddress) -> Result<()> {
        let _command = self.command_lock.lock().await;
        let state = self.check_state(&NON_TERMINAL_STATES)?;

        let peer = UwbPeer::new(mac_address);
        let is_new_peer = {
            let mut peers = lock(&self.peers);
            let is_new_peer = !peers.contains_key(&mac_address);
            peers.entry(mac_address).or_insert(peer);
            is_new_peer
        };
        if is_new_peer {
            self.subscriptions.dispatch(|callbacks| {
                callbacks.on_session_membership_changed(self.session_id, &[peer], &[])
            });
        }

        // The device doesn't know the session yet.
        if state == SessionState::Uninitialized {
            return Ok(());
        }

        let device = self.device()?;
        let addresses: Vec<UwbMacAddress> = lock(&self.peers).keys().copied().collect();
        let number_of_controlees = u8::try_from(addresses.len()).map_err(|_| {
            error!("Session {} has too many peers: {}", self.session_id, addresses.len());
            Error::BadParameters
        })?;
        let params = vec![
            UwbApplicationConfigurationParameter::new(
                UwbApplicationConfigurationParameterType::NumberOfControlees,
                ParameterValue::U8(number_of_controlees),
            ),
            UwbApplicationConfigurationParameter::destination_mac_addresses(addresses),
        ];
        let response = device
            .transport
            .set_application_configuration_parameters(self.session_id, params.clone())
            .await
            .map_err(|e| {
                error!("Failed to update the peers of session {}: {:?}", self.session_id, e);
                e
            })?;
        self.check_set_app_config_response(&response)?;
        self.store_configuration_parameters(params);
        Ok(())
    }

    async fn get_application_configuration_parameters(
        &self,
        param_types: Vec<UwbApplicationConfigurationParameterType>,
    ) -> Result<Vec<UwbApplicationConfigurationParameter>> {
        let _command = self.command_lock.lock().await;
        self.check_state(&ACTIVE_STATES)?;
        let device = self.device()?;

        device
            .transport
            .get_application_configuration_parameters(self.session_id, param_types)
            .await
    }

    async fn get_session_state(&self) -> Result<UwbSessionState> {
        let _command = self.command_lock.lock().await;
        self.check_state(&ACTIVE_STATES)?;
        let device = self.device()?;

        device.transport.session_get_state(self.session_id).await
    }

    /// Apply a notification of the device. A notification never completes a command: the only
    /// state changes it causes are ending the session and stopping the ranging.
    pub fn handle_notification(&self, notf: UwbNotification) {
        match notf {
            UwbNotification::SessionStatus { session_state, reason_code, .. } => {
                self.handle_session_status(session_state, reason_code);
            }
            UwbNotification::SessionUpdateMulticastListStatus { statuses, .. } => {
                self.handle_multicast_list_statuses(statuses);
            }
            UwbNotification::RangingData(data) => {
                self.handle_ranging_data(data);
            }
            _ => {
                warn!("Session {} ignores the notification: {}", self.session_id, notf);
            }
        }
    }

    fn handle_session_status(
        &self,
        session_state: UwbSessionState,
        reason_code: Option<ReasonCode>,
    ) {
        let mut tracker = lock(&self.status_tracker);
        let awaiting = tracker.awaiting;
        match awaiting {
            Some(awaiting) if awaiting == session_state => tracker.awaiting = None,
            Some(awaiting) if session_state != UwbSessionState::Deinit => {
                debug!(
                    "Session {} ignores {:?} reported before {:?}",
                    self.session_id, session_state, awaiting
                );
                return;
            }
            _ => {}
        }
        if let Some(recorded) = tracker.recorded.as_mut() {
            recorded.push((session_state, reason_code));
        }
        if let Some(event) = self.apply_session_status(session_state, reason_code) {
            self.dispatch_event(event);
        }
    }

    // The only state changes a reported status causes are ending the session and stopping the
    // ranging.
    fn apply_session_status(
        &self,
        session_state: UwbSessionState,
        reason_code: Option<ReasonCode>,
    ) -> Option<SessionEvent> {
        match session_state {
            UwbSessionState::Deinit => {
                let reason = if self.destroy_requested.load(Ordering::SeqCst) {
                    SessionEndReason::LocalRequest
                } else {
                    SessionEndReason::DeviceRequest { reason_code }
                };
                self.try_transit(&ACTIVE_STATES, SessionState::Deinitialized)
                    .map(|_| SessionEvent::Ended(reason))
            }
            UwbSessionState::Idle => self
                .try_transit(&[SessionState::Ranging], SessionState::Stopped)
                .map(|_| SessionEvent::RangingStopped),
            _ => {
                debug!("Session {} is reported {:?}", self.session_id, session_state);
                None
            }
        }
    }

    // Expect the device to report |awaiting| once it executes the command, and record the
    // statuses reported while the command waits for the transport. The recording stops when
    // the returned guard is dropped.
    fn record_statuses(&self, awaiting: UwbSessionState) -> StatusRecording<'_, T> {
        let mut tracker = lock(&self.status_tracker);
        tracker.awaiting = Some(awaiting);
        tracker.recorded = Some(vec![]);
        StatusRecording { session: self }
    }

    // Complete the command with the transition from |from| to |state|. |event| maps the state
    // moved from to the event of the command. The statuses recorded while the command waited
    // for the transport are then applied to the new state. Returns the resulting state.
    fn complete_command(
        &self,
        from: &[SessionState],
        state: SessionState,
        event: impl FnOnce(SessionState) -> Option<SessionEvent>,
    ) -> Result<SessionState> {
        let mut tracker = lock(&self.status_tracker);
        let origin = self.transit(from, state)?;
        if let Some(event) = event(origin) {
            self.dispatch_event(event);
        }

        for (session_state, reason_code) in tracker.recorded.take().unwrap_or_default() {
            if let Some(event) = self.apply_session_status(session_state, reason_code) {
                debug!("Session {} applies the reported {:?}", self.session_id, session_state);
                self.dispatch_event(event);
            }
        }
        Ok(self.state())
    }

    fn dispatch_event(&self, event: SessionEvent) {
        let session_id = self.session_id;
        match event {
            SessionEvent::RangingStarted => {
                self.subscriptions.dispatch(|callbacks| callbacks.on_ranging_started(session_id))
            }
            SessionEvent::RangingStopped => {
                self.subscriptions.dispatch(|callbacks| callbacks.on_ranging_stopped(session_id))
            }
            SessionEvent::Ended(reason) => self
                .subscriptions
                .dispatch(|callbacks| callbacks.on_session_ended(session_id, reason)),
        }
    }

    fn handle_multicast_list_statuses(&self, statuses: Vec<UwbMulticastListStatus>) {
        let mut peers_added = vec![];
        let mut peers_removed = vec![];
        {
            let mut peers = lock(&self.peers);
            for status in statuses.iter() {
                let address = status.controlee_mac_address;
                if status.status == MulticastUpdateStatus::OkMulticastListUpdate {
                    if !peers.contains_key(&address) {
                        let peer = UwbPeer::new(address);
                        peers.insert(address, peer);
                        peers_added.push(peer);
                    }
                } else {
                    warn!(
                        "Session {} failed to update controlee {}: {:?}",
                        self.session_id, address, status.status
                    );
                    if let Some(peer) = peers.remove(&address) {
                        peers_removed.push(peer);
                    }
                }
            }
        }

        if !peers_added.is_empty() || !peers_removed.is_empty() {
            self.subscriptions.dispatch(|callbacks| {
                callbacks.on_session_membership_changed(
                    self.session_id,
                    &peers_added,
                    &peers_removed,
                )
            });
        }
    }

    fn handle_ranging_data(&self, data: UwbRangingData) {
        let peers_changed: Vec<UwbPeer> = data
            .measurements
            .iter()
            .filter(|measurement| measurement.status.is_ok())
            .map(UwbPeer::from)
            .collect();
        if peers_changed.is_empty() {
            debug!("Session {} has no valid measurement: {}", self.session_id, data);
            return;
        }

        {
            let mut peers = lock(&self.peers);
            for peer in peers_changed.iter() {
                peers.insert(peer.address, *peer);
            }
        }
        self.subscriptions.dispatch(|callbacks| {
            callbacks.on_peer_properties_changed(self.session_id, &peers_changed)
        });
    }

    fn device(&self) -> Result<Arc<DeviceShared<T>>> {
        self.device.upgrade().ok_or_else(|| {
            error!("The device of session {} is released", self.session_id);
            Error::DeviceUnavailable
        })
    }

    fn check_state(&self, allowed_states: &[SessionState]) -> Result<SessionState> {
        let state = self.state();
        if !allowed_states.contains(&state) {
            error!("Session {} can't execute the command at {:?}", self.session_id, state);
            return Err(Error::WrongState(state));
        }
        Ok(state)
    }

    // Move to |state| when the current state is one of |from|. Returns the state moved from.
    fn try_transit(&self, from: &[SessionState], state: SessionState) -> Option<SessionState> {
        let mut origin = None;
        self.state_sender.send_if_modified(|current| {
            if !from.contains(current) {
                return false;
            }
            origin = Some(*current);
            *current = state;
            true
        });
        if let Some(origin) = origin {
            debug!("Session {} state: {:?} -> {:?}", self.session_id, origin, state);
        }
        origin
    }

    // A failed transition means a notification changed the state while the command was
    // waiting for the transport.
    fn transit(&self, from: &[SessionState], state: SessionState) -> Result<SessionState> {
        self.try_transit(from, state).ok_or_else(|| {
            let current = self.state();
            warn!("Session {} moved to {:?} during the command", self.session_id, current);
            Error::WrongState(current)
        })
    }

    fn check_set_app_config_response(&self, response: &SetAppConfigResponse) -> Result<()> {
        for config_status in response.config_status.iter() {
            if !config_status.status.is_ok() {
                error!(
                    "Session {} failed to set {:?}: {}",
                    self.session_id, config_status.param_type, config_status.status
                );
            }
        }
        status_to_result(response.status).map_err(|e| {
            error!("Session {} failed to set the parameters: {}", self.session_id, e);
            e
        })
    }

    fn store_configuration_parameters(&self, params: Vec<UwbApplicationConfigurationParameter>) {
        let mut stored = lock(&self.configuration_parameters);
        for param in params.into_iter() {
            match stored.iter_mut().find(|stored| stored.param_type == param.param_type) {
                Some(stored) => *stored = param,
                None => stored.push(param),
            }
        }
    }
}

impl<T: UwbTransport> Drop for SessionInner<T> {
    fn drop(&mut self) {
        if !ACTIVE_STATES.contains(&self.state()) {
            return;
        }
        let device = match self.device.upgrade() {
            Some(device) => device,
            None => return,
        };
        let runtime = match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => runtime,
            None => {
                warn!("Session {} is dropped without a runtime to deinitialize", self.session_id);
                return;
            }
        };

        debug!("Session {} is dropped, deinitialize it", self.session_id);
        let transport = device.transport.clone();
        let session_id = self.session_id;
        let generation = device.registry.begin_deinit(session_id);
        let device = Arc::downgrade(&device);
        runtime.spawn(async move {
            match transport.session_deinitialize(session_id).await {
                // The dispatcher finishes the deinitialization once the device reports it.
                Ok(()) => sleep(Duration::from_millis(DEINIT_NOTIFICATION_TIMEOUT_MS)).await,
                Err(e) => {
                    warn!("Failed to deinitialize the dropped session {}: {:?}", session_id, e)
                }
            }
            if let Some(device) = device.upgrade() {
                device.registry.finish_deinit(session_id, generation);
            }
        });
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionEvent {
    RangingStarted,
    RangingStopped,
    Ended(SessionEndReason),
}

#[derive(Default)]
struct StatusTracker {
    // The status the device reports once it has executed the last command. Until then, the
    // other reported statuses describe the session before the command and are ignored, except
    // the deinitialization.
    awaiting: Option<UwbSessionState>,
    // The statuses reported while the command in flight waits for the transport.
    recorded: Option<Vec<(UwbSessionState, Option<ReasonCode>)>>,
}

struct StatusRecording<'a, T: UwbTransport> {
    session: &'a SessionInner<T>,
}

impl<T: UwbTransport> Drop for StatusRecording<'_, T> {
    fn drop(&mut self) {
        lock(&self.session.status_tracker).recorded = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::device::UwbDevice;
    use crate::params::uci_packets::{
        AppConfigStatus, LineOfSightIndicator, RangingMeasurementType, UwbStatus,
    };
    use crate::session::mock_callbacks::MockUwbSessionEventCallbacks;
    use crate::transport::mock_transport::MockUwbTransport;
    use crate::transport::notification::{UwbRangingMeasurement, UwbRangingMeasurementData};
    use crate::utils::init_test_logging;

    const SESSION_ID: SessionId = 0x123;
    const PEER1: UwbMacAddress = UwbMacAddress::Short([0x01, 0x02]);
    const PEER2: UwbMacAddress = UwbMacAddress::Short([0x03, 0x04]);

    fn generate_params() -> Vec<UwbApplicationConfigurationParameter> {
        vec![
            UwbApplicationConfigurationParameter::new(
                UwbApplicationConfigurationParameterType::ChannelNumber,
                ParameterValue::Enum(9),
            ),
            UwbApplicationConfigurationParameter::new(
                UwbApplicationConfigurationParameterType::SlotDuration,
                ParameterValue::U16(2400),
            ),
        ]
    }

    fn status_notf(session_state: UwbSessionState) -> UwbNotification {
        UwbNotification::SessionStatus {
            session_id: SESSION_ID,
            session_state,
            reason_code: Some(ReasonCode::StateChangeWithSessionManagementCommands),
        }
    }

    fn ok_response() -> Result<SetAppConfigResponse> {
        Ok(SetAppConfigResponse { status: UwbStatus::Ok, config_status: vec![] })
    }

    // Expect the commands of configure() from Uninitialized.
    fn expect_configure(transport: &mut MockUwbTransport) {
        transport.expect_session_initialize(
            SESSION_ID,
            SessionType::FiraRangingSession,
            vec![status_notf(UwbSessionState::Init)],
            Ok(()),
        );
        transport.expect_set_application_configuration_parameters(
            SESSION_ID,
            generate_params(),
            vec![status_notf(UwbSessionState::Idle)],
            ok_response(),
        );
    }

    async fn setup_session(
        transport: &MockUwbTransport,
        callbacks: &MockUwbSessionEventCallbacks,
    ) -> (UwbDevice<MockUwbTransport>, UwbSession<MockUwbTransport>) {
        init_test_logging();
        let device = UwbDevice::new("test", transport.clone()).await;
        let session = device
            .create_session(SESSION_ID, DeviceType::Controller, Some(Box::new(callbacks.clone())))
            .unwrap();
        (device, session)
    }

    #[tokio::test]
    async fn test_start_ranging_before_configure() {
        let mut transport = MockUwbTransport::new();
        let callbacks = MockUwbSessionEventCallbacks::new();
        let (_device, session) = setup_session(&transport, &callbacks).await;

        assert_eq!(
            session.start_ranging().await,
            Err(Error::WrongState(SessionState::Uninitialized))
        );
        assert_eq!(
            session.get_application_configuration_parameters(vec![]).await,
            Err(Error::WrongState(SessionState::Uninitialized))
        );
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(transport.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let mut transport = MockUwbTransport::new();
        let mut callbacks = MockUwbSessionEventCallbacks::new();
        expect_configure(&mut transport);
        transport.expect_session_ranging_start(
            SESSION_ID,
            vec![status_notf(UwbSessionState::Active)],
            Ok(()),
        );
        transport.expect_session_ranging_stop(
            SESSION_ID,
            vec![status_notf(UwbSessionState::Idle)],
            Ok(()),
        );
        transport.expect_session_deinitialize(
            SESSION_ID,
            vec![status_notf(UwbSessionState::Deinit)],
            Ok(()),
        );
        callbacks.expect_on_ranging_started(SESSION_ID);
        callbacks.expect_on_ranging_stopped(SESSION_ID);
        callbacks.expect_on_session_ended(SESSION_ID, SessionEndReason::LocalRequest);
        let (device, session) = setup_session(&transport, &callbacks).await;
        let mut state_receiver = session.watch_state();

        assert_eq!(session.configure(generate_params()).await, Ok(()));
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(session.configuration_parameters(), generate_params());
        assert!(state_receiver.has_changed().unwrap());
        assert_eq!(*state_receiver.borrow_and_update(), SessionState::Configured);

        assert_eq!(session.start_ranging().await, Ok(()));
        assert_eq!(session.state(), SessionState::Ranging);
        assert_eq!(
            session.start_ranging().await,
            Err(Error::WrongState(SessionState::Ranging))
        );

        assert_eq!(session.stop_ranging().await, Ok(()));
        assert_eq!(session.state(), SessionState::Configured);

        assert_eq!(session.destroy().await, Ok(()));
        assert_eq!(session.state(), SessionState::Deinitialized);
        assert_eq!(session.destroy().await, Err(Error::WrongState(SessionState::Deinitialized)));
        assert_eq!(
            session.configure(generate_params()).await,
            Err(Error::WrongState(SessionState::Deinitialized))
        );
        assert!(device.get_session(SESSION_ID).is_none());

        assert!(transport.wait_expected_calls_done().await);
        assert!(callbacks.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_configure_failure_keeps_completed_steps() {
        let mut transport = MockUwbTransport::new();
        let callbacks = MockUwbSessionEventCallbacks::new();
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
            Ok(SetAppConfigResponse { status: UwbStatus::Rejected, config_status: vec![] }),
        );
        // Configuring again doesn't initialize the session again. A rejected parameter doesn't
        // fail the whole command.
        transport.expect_set_application_configuration_parameters(
            SESSION_ID,
            generate_params(),
            vec![],
            Ok(SetAppConfigResponse {
                status: UwbStatus::Ok,
                config_status: vec![AppConfigStatus {
                    param_type: UwbApplicationConfigurationParameterType::SlotDuration,
                    status: UwbStatus::InvalidParameter,
                }],
            }),
        );
        transport.expect_session_deinitialize(SESSION_ID, vec![], Ok(()));
        let (_device, session) = setup_session(&transport, &callbacks).await;

        assert_eq!(
            session.configure(generate_params()).await,
            Err(Error::Status(UwbStatus::Rejected))
        );
        assert_eq!(session.state(), SessionState::Initialized);
        assert!(session.configuration_parameters().is_empty());

        assert_eq!(session.configure(generate_params()).await, Ok(()));
        assert_eq!(session.state(), SessionState::Configured);

        // The dropped session is deinitialized in the background.
        drop(session);
        assert!(transport.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_start_ranging_failure() {
        let mut transport = MockUwbTransport::new();
        let mut callbacks = MockUwbSessionEventCallbacks::new();
        expect_configure(&mut transport);
        transport.expect_session_ranging_start(
            SESSION_ID,
            vec![],
            Err(Error::Status(UwbStatus::Rejected)),
        );
        transport.expect_session_deinitialize(SESSION_ID, vec![], Ok(()));
        callbacks.expect_on_session_ended(SESSION_ID, SessionEndReason::LocalRequest);
        let (_device, session) = setup_session(&transport, &callbacks).await;

        assert_eq!(session.configure(generate_params()).await, Ok(()));
        assert_eq!(session.start_ranging().await, Err(Error::Status(UwbStatus::Rejected)));
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(session.destroy().await, Ok(()));

        assert!(transport.wait_expected_calls_done().await);
        assert!(callbacks.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_session_ended_by_device() {
        let mut transport = MockUwbTransport::new();
        let mut callbacks = MockUwbSessionEventCallbacks::new();
        expect_configure(&mut transport);
        let reason_code = Some(ReasonCode::MaxRangingRoundRetryCountReached);
        callbacks.expect_on_session_ended(
            SESSION_ID,
            SessionEndReason::DeviceRequest { reason_code },
        );
        let (device, session) = setup_session(&transport, &callbacks).await;

        assert_eq!(session.configure(generate_params()).await, Ok(()));
        assert!(transport.send_notification(UwbNotification::SessionStatus {
            session_id: SESSION_ID,
            session_state: UwbSessionState::Deinit,
            reason_code,
        }));
        assert!(callbacks.wait_expected_calls_done().await);

        assert_eq!(session.state(), SessionState::Deinitialized);
        assert_eq!(
            session.start_ranging().await,
            Err(Error::WrongState(SessionState::Deinitialized))
        );
        assert!(device.get_session(SESSION_ID).is_none());
        assert_eq!(device.get_session_count(), 0);
        assert!(transport.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_ranging_stopped_by_device() {
        let mut transport = MockUwbTransport::new();
        let mut callbacks = MockUwbSessionEventCallbacks::new();
        expect_configure(&mut transport);
        for _ in 0..2 {
            transport.expect_session_ranging_start(
                SESSION_ID,
                vec![status_notf(UwbSessionState::Active)],
                Ok(()),
            );
        }
        transport.expect_session_deinitialize(SESSION_ID, vec![], Ok(()));
        callbacks.expect_on_ranging_started(SESSION_ID);
        callbacks.expect_on_ranging_stopped(SESSION_ID);
        callbacks.expect_on_ranging_started(SESSION_ID);
        callbacks.expect_on_session_ended(SESSION_ID, SessionEndReason::LocalRequest);
        let (_device, session) = setup_session(&transport, &callbacks).await;

        assert_eq!(session.configure(generate_params()).await, Ok(()));
        assert_eq!(session.start_ranging().await, Ok(()));
        assert!(transport.send_notification(status_notf(UwbSessionState::Idle)));
        let mut state_receiver = session.watch_state();
        while *state_receiver.borrow_and_update() != SessionState::Stopped {
            state_receiver.changed().await.unwrap();
        }

        assert_eq!(session.stop_ranging().await, Err(Error::WrongState(SessionState::Stopped)));
        assert_eq!(session.start_ranging().await, Ok(()));
        assert_eq!(session.state(), SessionState::Ranging);
        assert_eq!(session.destroy().await, Ok(()));

        assert!(transport.wait_expected_calls_done().await);
        assert!(callbacks.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_ranging_stopped_before_start_response() {
        let mut transport = MockUwbTransport::new();
        let mut callbacks = MockUwbSessionEventCallbacks::new();
        expect_configure(&mut transport);
        transport.expect_session_ranging_start(
            SESSION_ID,
            vec![status_notf(UwbSessionState::Active), status_notf(UwbSessionState::Idle)],
            Ok(()),
        );
        transport.delay_last_expected_response(Duration::from_millis(50));
        transport.expect_session_deinitialize(SESSION_ID, vec![], Ok(()));
        callbacks.expect_on_ranging_started(SESSION_ID);
        callbacks.expect_on_ranging_stopped(SESSION_ID);
        callbacks.expect_on_session_ended(SESSION_ID, SessionEndReason::LocalRequest);
        let (_device, session) = setup_session(&transport, &callbacks).await;

        assert_eq!(session.configure(generate_params()).await, Ok(()));
        assert_eq!(session.start_ranging().await, Ok(()));
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(session.stop_ranging().await, Err(Error::WrongState(SessionState::Stopped)));
        assert_eq!(session.destroy().await, Ok(()));

        assert!(transport.wait_expected_calls_done().await);
        assert!(callbacks.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_idle_before_stop_response() {
        let mut transport = MockUwbTransport::new();
        let mut callbacks = MockUwbSessionEventCallbacks::new();
        expect_configure(&mut transport);
        transport.expect_session_ranging_start(
            SESSION_ID,
            vec![status_notf(UwbSessionState::Active)],
            Ok(()),
        );
        transport.expect_session_ranging_stop(
            SESSION_ID,
            vec![status_notf(UwbSessionState::Idle)],
            Ok(()),
        );
        transport.delay_last_expected_response(Duration::from_millis(50));
        transport.expect_session_deinitialize(SESSION_ID, vec![], Ok(()));
        // The ranging is reported stopped once.
        callbacks.expect_on_ranging_started(SESSION_ID);
        callbacks.expect_on_ranging_stopped(SESSION_ID);
        callbacks.expect_on_session_ended(SESSION_ID, SessionEndReason::LocalRequest);
        let (_device, session) = setup_session(&transport, &callbacks).await;

        // Let the statuses of each command be handled before the next one.
        assert_eq!(session.configure(generate_params()).await, Ok(()));
        tokio::task::yield_now().await;
        assert_eq!(session.start_ranging().await, Ok(()));
        tokio::task::yield_now().await;
        assert_eq!(session.stop_ranging().await, Ok(()));
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(session.destroy().await, Ok(()));

        assert!(transport.wait_expected_calls_done().await);
        assert!(callbacks.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_session_ended_before_initialize_response() {
        let mut transport = MockUwbTransport::new();
        let mut callbacks = MockUwbSessionEventCallbacks::new();
        transport.expect_session_initialize(
            SESSION_ID,
            SessionType::FiraRangingSession,
            vec![status_notf(UwbSessionState::Init), status_notf(UwbSessionState::Deinit)],
            Ok(()),
        );
        transport.delay_last_expected_response(Duration::from_millis(50));
        callbacks.expect_on_session_ended(
            SESSION_ID,
            SessionEndReason::DeviceRequest {
                reason_code: Some(ReasonCode::StateChangeWithSessionManagementCommands),
            },
        );
        let (device, session) = setup_session(&transport, &callbacks).await;

        assert_eq!(
            session.configure(generate_params()).await,
            Err(Error::WrongState(SessionState::Deinitialized))
        );
        assert_eq!(session.state(), SessionState::Deinitialized);
        assert!(device.get_session(SESSION_ID).is_none());

        assert!(transport.wait_expected_calls_done().await);
        assert!(callbacks.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_add_peer() {
        let mut transport = MockUwbTransport::new();
        let mut callbacks = MockUwbSessionEventCallbacks::new();
        expect_configure(&mut transport);
        let peer_params = vec![
            UwbApplicationConfigurationParameter::new(
                UwbApplicationConfigurationParameterType::NumberOfControlees,
                ParameterValue::U8(2),
            ),
            UwbApplicationConfigurationParameter::destination_mac_addresses(vec![PEER1, PEER2]),
        ];
        transport.expect_set_application_configuration_parameters(
            SESSION_ID,
            peer_params.clone(),
            vec![],
            ok_response(),
        );
        transport.expect_session_deinitialize(SESSION_ID, vec![], Ok(()));
        callbacks.expect_on_session_membership_changed(
            SESSION_ID,
            vec![UwbPeer::new(PEER2)],
            vec![],
        );
        callbacks.expect_on_session_membership_changed(
            SESSION_ID,
            vec![UwbPeer::new(PEER1)],
            vec![],
        );
        callbacks.expect_on_session_ended(SESSION_ID, SessionEndReason::LocalRequest);
        let (_device, session) = setup_session(&transport, &callbacks).await;

        // The uninitialized session only records the peer.
        assert_eq!(session.add_peer(PEER2).await, Ok(()));
        assert_eq!(session.add_peer(PEER2).await, Ok(()));
        assert_eq!(session.configure(generate_params()).await, Ok(()));
        assert_eq!(session.add_peer(PEER1).await, Ok(()));

        assert_eq!(session.peers(), vec![UwbPeer::new(PEER1), UwbPeer::new(PEER2)]);
        let mut expected_params = generate_params();
        expected_params.extend(peer_params);
        assert_eq!(session.configuration_parameters(), expected_params);
        assert_eq!(session.destroy().await, Ok(()));

        assert!(transport.wait_expected_calls_done().await);
        assert!(callbacks.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_peer_notifications() {
        let mut transport = MockUwbTransport::new();
        let mut callbacks = MockUwbSessionEventCallbacks::new();
        expect_configure(&mut transport);
        transport.expect_session_deinitialize(SESSION_ID, vec![], Ok(()));
        let measurement = UwbRangingMeasurement {
            slot_index: 1,
            distance: 250,
            status: UwbStatus::Ok,
            peer_mac_address: PEER1,
            line_of_sight_indicator: LineOfSightIndicator::LineOfSight,
            aoa_azimuth: UwbRangingMeasurementData { result: 30, figure_of_merit: Some(100) },
            aoa_elevation: UwbRangingMeasurementData { result: 5, figure_of_merit: None },
            aoa_destination_azimuth: UwbRangingMeasurementData::default(),
            aoa_destination_elevation: UwbRangingMeasurementData::default(),
        };
        let failed_measurement = UwbRangingMeasurement {
            status: UwbStatus::Failed,
            peer_mac_address: PEER2,
            ..measurement.clone()
        };
        callbacks.expect_on_session_membership_changed(
            SESSION_ID,
            vec![UwbPeer::new(PEER1), UwbPeer::new(PEER2)],
            vec![],
        );
        callbacks.expect_on_session_membership_changed(
            SESSION_ID,
            vec![],
            vec![UwbPeer::new(PEER2)],
        );
        callbacks.expect_on_peer_properties_changed(
            SESSION_ID,
            vec![UwbPeer::from(&measurement)],
        );
        callbacks.expect_on_session_ended(SESSION_ID, SessionEndReason::LocalRequest);
        let (_device, session) = setup_session(&transport, &callbacks).await;
        assert_eq!(session.configure(generate_params()).await, Ok(()));

        let multicast_notf = |address: UwbMacAddress, status: MulticastUpdateStatus| {
            UwbNotification::SessionUpdateMulticastListStatus {
                session_id: SESSION_ID,
                statuses: vec![UwbMulticastListStatus {
                    controlee_mac_address: address,
                    sub_session_id: 0,
                    status,
                }],
            }
        };
        assert!(transport.send_notification(UwbNotification::SessionUpdateMulticastListStatus {
            session_id: SESSION_ID,
            statuses: vec![
                UwbMulticastListStatus {
                    controlee_mac_address: PEER1,
                    sub_session_id: 0,
                    status: MulticastUpdateStatus::OkMulticastListUpdate,
                },
                UwbMulticastListStatus {
                    controlee_mac_address: PEER2,
                    sub_session_id: 0,
                    status: MulticastUpdateStatus::OkMulticastListUpdate,
                },
            ],
        }));
        // Already known.
        let notf = multicast_notf(PEER1, MulticastUpdateStatus::OkMulticastListUpdate);
        assert!(transport.send_notification(notf));
        let notf = multicast_notf(PEER2, MulticastUpdateStatus::ErrorKeyFetchFail);
        assert!(transport.send_notification(notf));
        assert!(transport.send_notification(UwbNotification::RangingData(UwbRangingData {
            sequence_number: 1,
            session_id: SESSION_ID,
            current_ranging_interval: 200,
            measurement_type: RangingMeasurementType::TwoWay,
            measurements: vec![measurement.clone(), failed_measurement],
        })));
        assert!(callbacks.wait_expected_calls_done().await);
        assert_eq!(session.peers(), vec![UwbPeer::from(&measurement)]);

        assert_eq!(session.destroy().await, Ok(()));
        assert!(transport.wait_expected_calls_done().await);
        assert!(callbacks.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_device_unavailable() {
        let mut transport = MockUwbTransport::new();
        let callbacks = MockUwbSessionEventCallbacks::new();
        let (device, session) = setup_session(&transport, &callbacks).await;

        drop(device);
        assert_eq!(session.configure(generate_params()).await, Err(Error::DeviceUnavailable));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(transport.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_query_device() {
        let mut transport = MockUwbTransport::new();
        let callbacks = MockUwbSessionEventCallbacks::new();
        expect_configure(&mut transport);
        transport.expect_get_application_configuration_parameters(
            SESSION_ID,
            vec![],
            Ok(generate_params()),
        );
        transport.expect_session_get_state(SESSION_ID, Ok(UwbSessionState::Idle));
        transport.expect_session_deinitialize(SESSION_ID, vec![], Ok(()));
        let (_device, session) = setup_session(&transport, &callbacks).await;

        assert_eq!(session.configure(generate_params()).await, Ok(()));
        assert_eq!(
            session.get_application_configuration_parameters(vec![]).await,
            Ok(generate_params())
        );
        assert_eq!(session.get_session_state().await, Ok(UwbSessionState::Idle));

        drop(session);
        assert!(transport.wait_expected_calls_done().await);
    }
}
