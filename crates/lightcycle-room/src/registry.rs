//! Room registry: creates rooms and resolves room ids to handles.
//!
//! The map from id to room lives inside a single actor task, so creation,
//! lookup and removal are serialized without a lock. Callers hold a cheap
//! cloneable [`Registry`] handle.

use std::collections::HashMap;

use lightcycle_protocol::{Phase, Player, RoomId};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::room::spawn_room;
use crate::{RegistryConfig, RoomConfig, RoomError, RoomHandle};

enum RegistryCommand {
    Create {
        admin: Player,
        reply: oneshot::Sender<RoomHandle>,
    },
    Lookup {
        room_id: RoomId,
        reply: oneshot::Sender<Option<RoomHandle>>,
    },
    Remove {
        room_id: RoomId,
        reply: oneshot::Sender<bool>,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

struct RoomEntry {
    handle: RoomHandle,
    /// Last time the room was created or looked up.
    last_seen: Instant,
}

/// Handle to the registry actor.
#[derive(Clone)]
pub struct Registry {
    sender: mpsc::Sender<RegistryCommand>,
}

impl Registry {
    /// Spawns the registry actor. Must be called inside a Tokio runtime.
    pub fn spawn(config: RegistryConfig, room_config: RoomConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_size.max(1));
        let actor = RegistryActor {
            rooms: HashMap::new(),
            config,
            room_config,
            receiver: rx,
        };
        tokio::spawn(actor.run());
        Self { sender: tx }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::RegistryClosed)?;
        reply_rx.await.map_err(|_| RoomError::RegistryClosed)
    }

    /// Creates a room with a fresh id. `admin` is its first member.
    pub async fn create_room(&self, admin: Player) -> Result<RoomHandle, RoomError> {
        self.request(|reply| RegistryCommand::Create { admin, reply })
            .await
    }

    /// Resolves a room id to its handle.
    pub async fn get_room(&self, room_id: RoomId) -> Result<RoomHandle, RoomError> {
        self.request(|reply| RegistryCommand::Lookup { room_id, reply })
            .await?
            .ok_or(RoomError::RoomUnknown(room_id))
    }

    /// Forgets a room and shuts its actor down. Returns whether it was
    /// registered.
    pub async fn remove_room(&self, room_id: RoomId) -> Result<bool, RoomError> {
        self.request(|reply| RegistryCommand::Remove { room_id, reply })
            .await
    }

    /// Number of registered rooms.
    pub async fn room_count(&self) -> Result<usize, RoomError> {
        self.request(|reply| RegistryCommand::Count { reply }).await
    }

    /// Stops the registry and every room it still holds.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RegistryCommand::Shutdown)
            .await
            .map_err(|_| RoomError::RegistryClosed)
    }
}

struct RegistryActor {
    rooms: HashMap<RoomId, RoomEntry>,
    config: RegistryConfig,
    room_config: RoomConfig,
    receiver: mpsc::Receiver<RegistryCommand>,
}

impl RegistryActor {
    async fn run(mut self) {
        let mut sweep = time::interval(self.config.sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        sweep.tick().await;

        tracing::info!(
            idle_ttl_secs = self.config.idle_ttl_secs,
            "room registry started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RegistryCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                _ = sweep.tick() => self.sweep(),
            }
        }

        for (room_id, entry) in self.rooms.drain() {
            close_room(entry.handle);
            tracing::debug!(%room_id, "room closed with registry");
        }
        tracing::info!("room registry stopped");
    }

    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Create { admin, reply } => {
                let _ = reply.send(self.create(admin));
            }
            RegistryCommand::Lookup { room_id, reply } => {
                let handle = self.rooms.get_mut(&room_id).map(|entry| {
                    entry.last_seen = Instant::now();
                    entry.handle.clone()
                });
                let _ = reply.send(handle);
            }
            RegistryCommand::Remove { room_id, reply } => {
                let removed = match self.rooms.remove(&room_id) {
                    Some(entry) => {
                        close_room(entry.handle);
                        tracing::info!(%room_id, "room removed");
                        true
                    }
                    None => false,
                };
                let _ = reply.send(removed);
            }
            RegistryCommand::Count { reply } => {
                let _ = reply.send(self.rooms.len());
            }
            RegistryCommand::Shutdown => {}
        }
    }

    fn create(&mut self, admin: Player) -> RoomHandle {
        let mut room_id = RoomId::random();
        while self.rooms.contains_key(&room_id) {
            room_id = RoomId::random();
        }
        let handle = spawn_room(room_id, admin, self.room_config.clone());
        self.rooms.insert(
            room_id,
            RoomEntry {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(%room_id, rooms = self.rooms.len(), "room created");
        handle
    }

    /// Forgets rooms whose actor has stopped, and rooms idle past the TTL
    /// that aren't in the middle of a match.
    fn sweep(&mut self) {
        let ttl = self.config.idle_ttl();
        let now = Instant::now();
        let expired: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|(_, entry)| {
                entry.handle.is_closed()
                    || ttl.is_some_and(|ttl| {
                        entry.handle.phase() != Phase::Started
                            && now.saturating_duration_since(entry.last_seen) >= ttl
                    })
            })
            .map(|(room_id, _)| *room_id)
            .collect();

        for room_id in expired {
            if let Some(entry) = self.rooms.remove(&room_id) {
                close_room(entry.handle);
                tracing::info!(%room_id, "idle room expired");
            }
        }
    }
}

/// Asks a room to stop without blocking the registry on its mailbox. A
/// room with a full mailbox gets the shutdown from a detached task.
fn close_room(handle: RoomHandle) {
    if handle.try_shutdown() {
        return;
    }
    tracing::warn!(room_id = %handle.room_id(), "room mailbox full, shutdown deferred");
    tokio::spawn(async move {
        let _ = handle.shutdown().await;
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lightcycle_protocol::{Direction, DirectionUpdate, PlayerIndex};

    use super::*;
    use crate::room::RoomCommand;

    fn actor_with(handle: RoomHandle) -> RegistryActor {
        let (_, receiver) = mpsc::channel(1);
        let mut actor = RegistryActor {
            rooms: HashMap::new(),
            config: RegistryConfig::default(),
            room_config: RoomConfig::default(),
            receiver,
        };
        actor.rooms.insert(
            handle.room_id(),
            RoomEntry {
                handle,
                last_seen: Instant::now(),
            },
        );
        actor
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_does_not_wait_on_a_full_room_mailbox() {
        let room_id = RoomId::random();
        let (handle, mut mailbox) = RoomHandle::detached(room_id, 1);
        // Nobody reads the mailbox yet, so this fills it.
        handle
            .steer(DirectionUpdate {
                player: PlayerIndex(1),
                direction: Direction::Up,
            })
            .await
            .unwrap();
        let mut actor = actor_with(handle);

        let (reply, removed) = oneshot::channel();
        actor.handle_command(RegistryCommand::Remove { room_id, reply });
        assert!(removed.await.unwrap());
        assert_eq!(actor.rooms.len(), 0);

        // The deferred shutdown lands once the mailbox drains.
        assert!(matches!(mailbox.recv().await, Some(RoomCommand::Steer { .. })));
        let next = time::timeout(Duration::from_secs(1), mailbox.recv()).await;
        assert!(matches!(next, Ok(Some(RoomCommand::Shutdown))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_does_not_wait_on_a_full_room_mailbox() {
        let room_id = RoomId::random();
        let (handle, mut mailbox) = RoomHandle::detached(room_id, 1);
        handle
            .steer(DirectionUpdate {
                player: PlayerIndex(1),
                direction: Direction::Down,
            })
            .await
            .unwrap();
        let mut actor = actor_with(handle);

        time::advance(actor.config.idle_ttl().unwrap() + Duration::from_secs(1)).await;
        actor.sweep();
        assert_eq!(actor.rooms.len(), 0);

        assert!(matches!(mailbox.recv().await, Some(RoomCommand::Steer { .. })));
        let next = time::timeout(Duration::from_secs(1), mailbox.recv()).await;
        assert!(matches!(next, Ok(Some(RoomCommand::Shutdown))));
    }

    #[tokio::test]
    async fn test_remove_of_a_stopped_room_still_reports_removed() {
        let room_id = RoomId::random();
        let (handle, mailbox) = RoomHandle::detached(room_id, 1);
        drop(mailbox);
        assert!(handle.try_shutdown());
        let mut actor = actor_with(handle);

        let (reply, removed) = oneshot::channel();
        actor.handle_command(RegistryCommand::Remove { room_id, reply });
        assert!(removed.await.unwrap());
    }
}
