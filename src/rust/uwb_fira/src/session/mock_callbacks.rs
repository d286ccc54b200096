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

//! The mock implementations of the event callbacks.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::time::{timeout, Duration};

use crate::params::uci_packets::{DeviceState, SessionId, UwbStatus};
use crate::session::callbacks::{
    CallbackStatus, SessionEndReason, UwbDeviceEventCallbacks, UwbPeer, UwbSessionEventCallbacks,
};

/// The mock of UwbSessionEventCallbacks. An unexpected callback panics.
#[derive(Clone, Default)]
pub struct MockUwbSessionEventCallbacks {
    expected_calls: Arc<Mutex<VecDeque<ExpectedSessionCall>>>,
    expect_call_consumed: Arc<Notify>,
}

impl MockUwbSessionEventCallbacks {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn expect_on_session_ended(&mut self, session_id: SessionId, reason: SessionEndReason) {
        self.push_expected_call(ExpectedSessionCall::SessionEnded { session_id, reason });
    }

    pub fn expect_on_ranging_started(&mut self, session_id: SessionId) {
        self.push_expected_call(ExpectedSessionCall::RangingStarted { session_id });
    }

    pub fn expect_on_ranging_stopped(&mut self, session_id: SessionId) {
        self.push_expected_call(ExpectedSessionCall::RangingStopped { session_id });
    }

    pub fn expect_on_peer_properties_changed(
        &mut self,
        session_id: SessionId,
        peers: Vec<UwbPeer>,
    ) {
        self.push_expected_call(ExpectedSessionCall::PeerPropertiesChanged { session_id, peers });
    }

    pub fn expect_on_session_membership_changed(
        &mut self,
        session_id: SessionId,
        peers_added: Vec<UwbPeer>,
        peers_removed: Vec<UwbPeer>,
    ) {
        self.push_expected_call(ExpectedSessionCall::SessionMembershipChanged {
            session_id,
            peers_added,
            peers_removed,
        });
    }

    pub async fn wait_expected_calls_done(&mut self) -> bool {
        while !self.expected_calls.lock().unwrap().is_empty() {
            if timeout(Duration::from_secs(1), self.expect_call_consumed.notified()).await.is_err()
            {
                return false;
            }
        }
        true
    }

    fn push_expected_call(&mut self, call: ExpectedSessionCall) {
        self.expected_calls.lock().unwrap().push_back(call);
    }

    fn pop_expected_call(&mut self) -> ExpectedSessionCall {
        let call = self.expected_calls.lock().unwrap().pop_front().unwrap();
        self.expect_call_consumed.notify_one();
        call
    }
}

impl UwbSessionEventCallbacks for MockUwbSessionEventCallbacks {
    fn on_session_ended(
        &mut self,
        session_id: SessionId,
        reason: SessionEndReason,
    ) -> CallbackStatus {
        assert_eq!(
            self.pop_expected_call(),
            ExpectedSessionCall::SessionEnded { session_id, reason }
        );
        CallbackStatus::Continue
    }

    fn on_ranging_started(&mut self, session_id: SessionId) -> CallbackStatus {
        assert_eq!(self.pop_expected_call(), ExpectedSessionCall::RangingStarted { session_id });
        CallbackStatus::Continue
    }

    fn on_ranging_stopped(&mut self, session_id: SessionId) -> CallbackStatus {
        assert_eq!(self.pop_expected_call(), ExpectedSessionCall::RangingStopped { session_id });
        CallbackStatus::Continue
    }

    fn on_peer_properties_changed(
        &mut self,
        session_id: SessionId,
        peers: &[UwbPeer],
    ) -> CallbackStatus {
        assert_eq!(
            self.pop_expected_call(),
            ExpectedSessionCall::PeerPropertiesChanged { session_id, peers: peers.to_vec() }
        );
        CallbackStatus::Continue
    }

    fn on_session_membership_changed(
        &mut self,
        session_id: SessionId,
        peers_added: &[UwbPeer],
        peers_removed: &[UwbPeer],
    ) -> CallbackStatus {
        assert_eq!(
            self.pop_expected_call(),
            ExpectedSessionCall::SessionMembershipChanged {
                session_id,
                peers_added: peers_added.to_vec(),
                peers_removed: peers_removed.to_vec(),
            }
        );
        CallbackStatus::Continue
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ExpectedSessionCall {
    SessionEnded { session_id: SessionId, reason: SessionEndReason },
    RangingStarted { session_id: SessionId },
    RangingStopped { session_id: SessionId },
    PeerPropertiesChanged { session_id: SessionId, peers: Vec<UwbPeer> },
    SessionMembershipChanged {
        session_id: SessionId,
        peers_added: Vec<UwbPeer>,
        peers_removed: Vec<UwbPeer>,
    },
}

/// The mock of UwbDeviceEventCallbacks. An unexpected callback panics.
#[derive(Clone, Default)]
pub struct MockUwbDeviceEventCallbacks {
    expected_calls: Arc<Mutex<VecDeque<ExpectedDeviceCall>>>,
    expect_call_consumed: Arc<Notify>,
}

impl MockUwbDeviceEventCallbacks {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn expect_on_device_status_changed(&mut self, state: DeviceState) {
        self.push_expected_call(ExpectedDeviceCall::DeviceStatusChanged { state });
    }

    pub fn expect_on_generic_error(&mut self, status: UwbStatus) {
        self.push_expected_call(ExpectedDeviceCall::GenericError { status });
    }

    pub async fn wait_expected_calls_done(&mut self) -> bool {
        while !self.expected_calls.lock().unwrap().is_empty() {
            if timeout(Duration::from_secs(1), self.expect_call_consumed.notified()).await.is_err()
            {
                return false;
            }
        }
        true
    }

    fn push_expected_call(&mut self, call: ExpectedDeviceCall) {
        self.expected_calls.lock().unwrap().push_back(call);
    }

    fn pop_expected_call(&mut self) -> ExpectedDeviceCall {
        let call = self.expected_calls.lock().unwrap().pop_front().unwrap();
        self.expect_call_consumed.notify_one();
        call
    }
}

impl UwbDeviceEventCallbacks for MockUwbDeviceEventCallbacks {
    fn on_device_status_changed(&mut self, state: DeviceState) -> CallbackStatus {
        assert_eq!(self.pop_expected_call(), ExpectedDeviceCall::DeviceStatusChanged { state });
        CallbackStatus::Continue
    }

    fn on_generic_error(&mut self, status: UwbStatus) -> CallbackStatus {
        assert_eq!(self.pop_expected_call(), ExpectedDeviceCall::GenericError { status });
        CallbackStatus::Continue
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ExpectedDeviceCall {
    DeviceStatusChanged { state: DeviceState },
    GenericError { status: UwbStatus },
}
