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
use std::sync::{Arc, Mutex, Weak};

use log::debug;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::params::uci_packets::SessionId;
use crate::session::uwb_session::SessionInner;
use crate::session::UwbSession;
use crate::transport::uwb_transport::UwbTransport;
use crate::utils::lock;

/// The sessions created by a device, keyed by the session id. The registry doesn't own the
/// sessions: an entry expires when all the handles of its session are dropped, or when the
/// session is deinitialized. The expired entries are pruned lazily.
///
/// The registry also tracks the dropped sessions whose deinitialization is still in progress on
/// the device. A new session with the same id waits for it before initializing.
pub(crate) struct SessionRegistry<T: UwbTransport> {
    sessions: Mutex<BTreeMap<SessionId, Weak<SessionInner<T>>>>,
    pending_deinits: Mutex<PendingDeinits>,
}

#[derive(Default)]
struct PendingDeinits {
    next_generation: u64,
    // The waiters are released when the sender is dropped.
    entries: BTreeMap<SessionId, (u64, watch::Sender<()>)>,
}

impl<T: UwbTransport> SessionRegistry<T> {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(BTreeMap::new()),
            pending_deinits: Mutex::new(PendingDeinits::default()),
        }
    }

    /// Register the session built by |create_session|. The session is built and inserted under
    /// the registry lock, so a concurrent lookup never sees a partial insertion.
    pub fn insert_with<F>(&self, session_id: SessionId, create_session: F) -> Result<UwbSession<T>>
    where
        F: FnOnce() -> UwbSession<T>,
    {
        let mut sessions = lock(&self.sessions);
        if sessions.get(&session_id).and_then(upgrade_live).is_some() {
            return Err(Error::DuplicatedSessionId(session_id));
        }

        let session = create_session();
        sessions.insert(session_id, session.downgrade());
        Ok(session)
    }

    /// Resolve the live session. The expired entry is pruned.
    pub fn get(&self, session_id: SessionId) -> Option<Arc<SessionInner<T>>> {
        let mut sessions = lock(&self.sessions);
        let session = sessions.get(&session_id).and_then(upgrade_live);
        if session.is_none() && sessions.remove(&session_id).is_some() {
            debug!("Session {} is expired", session_id);
        }
        session
    }

    /// The number of the live sessions. The expired entries are pruned.
    pub fn len(&self) -> usize {
        let mut sessions = lock(&self.sessions);
        sessions.retain(|_, session| upgrade_live(session).is_some());
        sessions.len()
    }

    /// Mark the deinitialization of a dropped session as pending. Returns the generation that
    /// identifies this deinitialization in |finish_deinit|.
    pub fn begin_deinit(&self, session_id: SessionId) -> u64 {
        let mut pending_deinits = lock(&self.pending_deinits);
        let generation = pending_deinits.next_generation;
        pending_deinits.next_generation += 1;
        let (sender, _) = watch::channel(());
        pending_deinits.entries.insert(session_id, (generation, sender));
        generation
    }

    /// Finish the pending deinitialization of |session_id| when it is still the one identified
    /// by |generation|.
    pub fn finish_deinit(&self, session_id: SessionId, generation: u64) {
        let mut pending_deinits = lock(&self.pending_deinits);
        if matches!(pending_deinits.entries.get(&session_id), Some((g, _)) if *g == generation) {
            pending_deinits.entries.remove(&session_id);
        }
    }

    /// Finish the pending deinitialization of |session_id| after the device reported it.
    /// Returns false when no deinitialization is pending.
    pub fn take_pending_deinit(&self, session_id: SessionId) -> bool {
        lock(&self.pending_deinits).entries.remove(&session_id).is_some()
    }

    /// Wait until the pending deinitialization of |session_id|, if any, is finished.
    pub async fn wait_deinit(&self, session_id: SessionId) {
        let receiver = lock(&self.pending_deinits)
            .entries
            .get(&session_id)
            .map(|(_, sender)| sender.subscribe());
        if let Some(mut receiver) = receiver {
            debug!("Session {} waits for the deinitialization of the dropped one", session_id);
            // Nothing is sent, so this returns when the sender is dropped.
            let _ = receiver.changed().await;
        }
    }
}

fn upgrade_live<T: UwbTransport>(session: &Weak<SessionInner<T>>) -> Option<Arc<SessionInner<T>>> {
    session.upgrade().filter(|session| session.is_live())
}
