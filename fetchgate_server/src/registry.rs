use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use fetchgate_core::event::ProgressEvent;

// ---------------------------------------------------------------------------
// Outbound messages
// ---------------------------------------------------------------------------

/// Everything the server pushes to a client: per-request progress events
/// and registry-wide online counts.
///
/// Untagged, so events keep their `{"status": ..., "text": ...}` shape and
/// the count goes out as `{"online": "<n>"}` with the count as a string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Event(ProgressEvent),
    Online { online: String },
}

/// Handle for pushing messages onto one session's send path. Unbounded, so
/// neither broadcasts nor worker callbacks ever block on a slow client.
pub type Outbox = mpsc::UnboundedSender<Outbound>;

// ---------------------------------------------------------------------------
// Session registry
// ---------------------------------------------------------------------------

/// The only state shared across channels: the set of live sessions.
///
/// All mutation happens under one lock, and each broadcast walks the
/// membership as it stood at that moment. A send failure to one session is
/// logged and never stops delivery to the rest.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Outbox>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Register a session and broadcast the new count to every live
    /// session, the new one included. No-op if the id is already present.
    pub async fn add(&self, id: Uuid, outbox: Outbox) {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&id) {
            return;
        }
        sessions.insert(id, outbox);
        log::info!("[registry] session {} joined, {} online", id, sessions.len());
        Self::broadcast_online(&sessions);
    }

    /// Drop a session and broadcast the new count to the remaining ones.
    /// No-op if the id is absent.
    pub async fn remove(&self, id: &Uuid) {
        let mut sessions = self.sessions.lock().await;
        if sessions.remove(id).is_none() {
            return;
        }
        log::info!("[registry] session {} left, {} online", id, sessions.len());
        Self::broadcast_online(&sessions);
    }

    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn broadcast_online(sessions: &HashMap<Uuid, Outbox>) {
        let message = Outbound::Online {
            online: sessions.len().to_string(),
        };
        for (id, outbox) in sessions.iter() {
            if outbox.send(message.clone()).is_err() {
                log::warn!("[registry] failed to deliver online count to session {}", id);
            }
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn online(count: &str) -> Outbound {
        Outbound::Online {
            online: count.to_string(),
        }
    }

    #[tokio::test]
    async fn every_membership_change_broadcasts_to_all_live_sessions() {
        let registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let id1 = Uuid::new_v4();
        let id2 = Uuid::new_v4();

        registry.add(id1, tx1).await;
        assert_eq!(drain(&mut rx1), vec![online("1")]);

        registry.add(id2, tx2).await;
        assert_eq!(drain(&mut rx1), vec![online("2")]);
        assert_eq!(drain(&mut rx2), vec![online("2")]);

        registry.remove(&id1).await;
        assert_eq!(drain(&mut rx1), vec![], "removed session hears nothing");
        assert_eq!(drain(&mut rx2), vec![online("1")]);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_add_and_absent_remove_are_silent() {
        let registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let id1 = Uuid::new_v4();

        registry.add(id1, tx1.clone()).await;
        drain(&mut rx1);

        registry.add(id1, tx1).await;
        assert_eq!(drain(&mut rx1), vec![], "re-adding must not broadcast");

        registry.remove(&Uuid::new_v4()).await;
        assert_eq!(drain(&mut rx1), vec![], "removing a stranger must not broadcast");
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn dead_outbox_does_not_block_delivery_to_others() {
        let registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        let (tx3, mut rx3) = mpsc::unbounded_channel();

        registry.add(Uuid::new_v4(), tx1).await;
        registry.add(Uuid::new_v4(), tx2).await;
        drop(rx2);
        drain(&mut rx1);

        registry.add(Uuid::new_v4(), tx3).await;
        assert_eq!(drain(&mut rx1), vec![online("3")]);
        assert_eq!(drain(&mut rx3), vec![online("3")]);
    }
}
