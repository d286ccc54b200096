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

//! The event callbacks of the sessions and of the device, and the subscriptions holding them.

use std::any::Any;
use std::sync::{Arc, Mutex, Weak};

use crate::params::fira_device::UwbMacAddress;
use crate::params::uci_packets::{
    DeviceState, LineOfSightIndicator, ReasonCode, SessionId, UwbStatus,
};
use crate::transport::notification::{UwbRangingMeasurement, UwbRangingMeasurementData};
use crate::utils::lock;

/// Returned by a callback to keep or to cancel its subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Continue,
    Unsubscribe,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The session was destroyed by the client.
    LocalRequest,
    /// The device deinitialized the session on its own.
    DeviceRequest { reason_code: Option<ReasonCode> },
}

/// The spatial properties of a peer, as measured in the last ranging round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UwbPeerSpatialProperties {
    /// The distance in centimeters.
    pub distance: u16,
    pub line_of_sight: LineOfSightIndicator,
    pub aoa_azimuth: UwbRangingMeasurementData,
    pub aoa_elevation: UwbRangingMeasurementData,
}

/// A peer of a ranging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UwbPeer {
    pub address: UwbMacAddress,
    pub spatial_properties: Option<UwbPeerSpatialProperties>,
}

impl UwbPeer {
    pub fn new(address: UwbMacAddress) -> Self {
        Self { address, spatial_properties: None }
    }
}

impl From<&UwbRangingMeasurement> for UwbPeer {
    fn from(measurement: &UwbRangingMeasurement) -> Self {
        Self {
            address: measurement.peer_mac_address,
            spatial_properties: Some(UwbPeerSpatialProperties {
                distance: measurement.distance,
                line_of_sight: measurement.line_of_sight_indicator,
                aoa_azimuth: measurement.aoa_azimuth,
                aoa_elevation: measurement.aoa_elevation,
            }),
        }
    }
}

/// The callbacks of the session events. Every method returns whether the subscription is kept.
pub trait UwbSessionEventCallbacks: 'static + Send {
    fn on_session_ended(
        &mut self,
        _session_id: SessionId,
        _reason: SessionEndReason,
    ) -> CallbackStatus {
        CallbackStatus::Continue
    }

    fn on_ranging_started(&mut self, _session_id: SessionId) -> CallbackStatus {
        CallbackStatus::Continue
    }

    fn on_ranging_stopped(&mut self, _session_id: SessionId) -> CallbackStatus {
        CallbackStatus::Continue
    }

    fn on_peer_properties_changed(
        &mut self,
        _session_id: SessionId,
        _peers: &[UwbPeer],
    ) -> CallbackStatus {
        CallbackStatus::Continue
    }

    fn on_session_membership_changed(
        &mut self,
        _session_id: SessionId,
        _peers_added: &[UwbPeer],
        _peers_removed: &[UwbPeer],
    ) -> CallbackStatus {
        CallbackStatus::Continue
    }
}

/// The callbacks of the device events.
pub trait UwbDeviceEventCallbacks: 'static + Send {
    fn on_device_status_changed(&mut self, _state: DeviceState) -> CallbackStatus {
        CallbackStatus::Continue
    }

    fn on_generic_error(&mut self, _status: UwbStatus) -> CallbackStatus {
        CallbackStatus::Continue
    }
}

/// Keeps a subscription alive. Dropping the handle cancels the subscription.
#[must_use = "the subscription is cancelled when the handle is dropped"]
pub struct SubscriptionHandle {
    _subscriber: Arc<dyn Any + Send + Sync>,
}

impl SubscriptionHandle {
    /// Cancel the subscription.
    pub fn unsubscribe(self) {}
}

type Subscriber<C> = Mutex<Box<C>>;

/// The set of subscribed callbacks. The set holds the callbacks weakly, the subscription
/// handles hold them strongly.
pub(crate) struct Subscriptions<C: ?Sized> {
    subscribers: Mutex<Vec<Weak<Subscriber<C>>>>,
}

impl<C: ?Sized + Send + 'static> Subscriptions<C> {
    pub fn new() -> Self {
        Self { subscribers: Mutex::new(vec![]) }
    }

    pub fn subscribe(&self, callbacks: Box<C>) -> SubscriptionHandle {
        let subscriber = Arc::new(Mutex::new(callbacks));
        lock(&self.subscribers).push(Arc::downgrade(&subscriber));
        SubscriptionHandle { _subscriber: subscriber }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|subscriber| subscriber.strong_count() > 0);
        subscribers.len()
    }

    /// Invoke |f| on every live subscriber. The expired subscribers and the ones returning
    /// `CallbackStatus::Unsubscribe` are removed from the set.
    pub fn dispatch<F>(&self, mut f: F)
    where
        F: FnMut(&mut C) -> CallbackStatus,
    {
        // The set is not locked while the callbacks run, so they may subscribe.
        let live_subscribers: Vec<Arc<Subscriber<C>>> = {
            let mut subscribers = lock(&self.subscribers);
            subscribers.retain(|subscriber| subscriber.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        let mut unsubscribed = vec![];
        for subscriber in live_subscribers.iter() {
            let mut callbacks = lock(subscriber);
            if f(&mut **callbacks) == CallbackStatus::Unsubscribe {
                unsubscribed.push(Arc::downgrade(subscriber));
            }
        }

        if !unsubscribed.is_empty() {
            lock(&self.subscribers).retain(|subscriber| {
                !unsubscribed.iter().any(|removed| Weak::ptr_eq(removed, subscriber))
            });
        }
    }
}
