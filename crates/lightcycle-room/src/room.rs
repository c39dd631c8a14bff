//! Room actor: an isolated Tokio task that owns one match.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Placement commands are applied one at a time
//! by the actor, so concurrent callers never race on the board. When a
//! match starts the board moves into its own task; the room then relays
//! the board's updates to subscribers and enforces the `Board::life`
//! deadline.

use std::pin::Pin;

use lightcycle_board::{Board, BoardConfig, BoardSnapshot};
use lightcycle_protocol::{
    DirectionUpdate, Phase, Player, PlayerId, PlayerIndex, RoomId, Update,
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, Sleep};

use crate::{RoomConfig, RoomError};

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in most variants is the reply channel: the
/// caller sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    Join {
        player: Player,
        reply: oneshot::Sender<()>,
    },
    Exit {
        player: PlayerId,
        reply: oneshot::Sender<bool>,
    },
    SetBoard {
        config: BoardConfig,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Participate {
        player: PlayerId,
        x: i32,
        y: i32,
        color: String,
        reply: oneshot::Sender<Result<PlayerIndex, RoomError>>,
    },
    Reposition {
        player: PlayerId,
        x: i32,
        y: i32,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Start {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// Forwarded to the running board, fire-and-forget.
    Steer { update: DirectionUpdate },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Snapshot {
        reply: oneshot::Sender<Result<BoardSnapshot, RoomError>>,
    },
    Shutdown,
}

/// A snapshot of room metadata (not the board itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    /// The player who created the room.
    pub admin: Player,
    /// Roster in join order.
    pub players: Vec<Player>,
    pub phase: Phase,
    /// Players placed on the current board. 0 while a match is running
    /// (the board lives in its own task then) or when there is no board.
    pub participants: usize,
    /// When the room last received a command.
    pub last_activity: Instant,
}

/// Handle to a running room actor.
///
/// Cheap to clone: the registry keeps one, and so can every connection
/// handler that joined the room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    admin: Player,
    sender: mpsc::Sender<RoomCommand>,
    events: broadcast::Sender<Update>,
    phase: watch::Receiver<Phase>,
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("room_id", &self.room_id)
            .field("phase", &self.phase())
            .finish()
    }
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn admin(&self) -> &Player {
        &self.admin
    }

    /// Latest phase published by the actor. Doesn't wait on the mailbox.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Subscribes to match updates (`Crashed`/`Winner`).
    ///
    /// Only updates sent after this call are received. A subscriber that
    /// falls behind gets `RecvError::Lagged` instead of stalling the room.
    pub fn subscribe(&self) -> broadcast::Receiver<Update> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Appends a player to the roster.
    pub async fn join(&self, player: Player) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join { player, reply }).await
    }

    /// Removes the first roster entry for `player`. Returns whether one
    /// was found; absent players are not an error.
    pub async fn exit(&self, player: PlayerId) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::Exit { player, reply }).await
    }

    /// Installs a fresh board and returns the room to `Waiting`.
    ///
    /// Refused with `InvalidPhase` while a match is running.
    pub async fn set_board(&self, config: BoardConfig) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SetBoard { config, reply })
            .await?
    }

    /// Places a player on the board at `(x, y)`.
    pub async fn participate(
        &self,
        player: PlayerId,
        x: i32,
        y: i32,
        color: impl Into<String>,
    ) -> Result<PlayerIndex, RoomError> {
        let color = color.into();
        self.request(|reply| RoomCommand::Participate {
            player,
            x,
            y,
            color,
            reply,
        })
        .await?
    }

    /// Moves an already placed player to a different starting cell.
    pub async fn reposition(&self, player: PlayerId, x: i32, y: i32) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Reposition { player, x, y, reply })
            .await?
    }

    /// Starts the match. Returns once the board task is running; follow
    /// the match through [`subscribe`](Self::subscribe).
    ///
    /// Only one match runs at a time: a second call gets `InvalidPhase`.
    pub async fn start_game(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { reply }).await?
    }

    /// Steers a player in the running match.
    pub async fn steer(&self, update: DirectionUpdate) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Steer { update })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Serializable view of the board's starting layout. Unavailable while
    /// a match is running.
    pub async fn snapshot(&self) -> Result<BoardSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await?
    }

    /// Tells the room to shut down. A running match is cancelled.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Queues a shutdown without waiting for mailbox capacity. Returns
    /// `false` if the mailbox is full; a room that already stopped counts
    /// as shut down.
    pub(crate) fn try_shutdown(&self) -> bool {
        !matches!(
            self.sender.try_send(RoomCommand::Shutdown),
            Err(TrySendError::Full(_))
        )
    }

    /// A handle with no actor behind it; the caller reads the mailbox.
    #[cfg(test)]
    pub(crate) fn detached(
        room_id: RoomId,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<RoomCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        let (events, _) = broadcast::channel(1);
        let (_, phase) = watch::channel(Phase::Waiting);
        let handle = Self {
            room_id,
            admin: Player::new("admin"),
            sender: tx,
            events,
            phase,
        };
        (handle, rx)
    }
}

// ---------------------------------------------------------------------------
// Running match
// ---------------------------------------------------------------------------

/// What the room observes from a running board.
enum MatchEvent {
    Update(Update),
    Expired,
    Finished(Result<Board, JoinError>),
}

/// Wiring to a board that is running in its own task.
struct LiveMatch {
    steering: mpsc::Sender<DirectionUpdate>,
    events: mpsc::Receiver<Update>,
    cancel: Option<oneshot::Sender<()>>,
    deadline: Pin<Box<Sleep>>,
    task: JoinHandle<Board>,
}

impl LiveMatch {
    /// Next thing that happened. Updates already queued are always
    /// relayed before the deadline or the task's exit is reported.
    async fn next(&mut self) -> MatchEvent {
        tokio::select! {
            biased;

            Some(update) = self.events.recv() => MatchEvent::Update(update),
            _ = &mut self.deadline => MatchEvent::Expired,
            result = &mut self.task => MatchEvent::Finished(result),
        }
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Stops the board (a no-op once it has already returned) and waits
    /// for it to hand the board back.
    async fn stop(mut self) -> Result<Board, JoinError> {
        self.cancel();
        self.task.await
    }
}

async fn next_match_event(live: &mut Option<LiveMatch>) -> MatchEvent {
    match live {
        Some(live) => live.next().await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    admin: Player,
    players: Vec<Player>,
    phase: Phase,
    board: Option<Board>,
    last_activity: Instant,
    config: RoomConfig,
    receiver: mpsc::Receiver<RoomCommand>,
    events: broadcast::Sender<Update>,
    phase_tx: watch::Sender<Phase>,
    live: Option<LiveMatch>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, admin = %self.admin.id, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Shutdown) | None => break,
                    Some(cmd) => {
                        self.last_activity = Instant::now();
                        self.handle_command(cmd);
                    }
                },
                event = next_match_event(&mut self.live) => self.handle_match_event(event).await,
            }
        }

        if let Some(mut live) = self.live.take() {
            live.cancel();
        }
        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { player, reply } => {
                self.handle_join(player);
                let _ = reply.send(());
            }
            RoomCommand::Exit { player, reply } => {
                let _ = reply.send(self.handle_exit(player));
            }
            RoomCommand::SetBoard { config, reply } => {
                let _ = reply.send(self.handle_set_board(config));
            }
            RoomCommand::Participate {
                player,
                x,
                y,
                color,
                reply,
            } => {
                let _ = reply.send(self.handle_participate(player, x, y, color));
            }
            RoomCommand::Reposition { player, x, y, reply } => {
                let _ = reply.send(self.handle_reposition(player, x, y));
            }
            RoomCommand::Start { reply } => {
                let _ = reply.send(self.handle_start());
            }
            RoomCommand::Steer { update } => self.handle_steer(update),
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            // Intercepted by `run`.
            RoomCommand::Shutdown => {}
        }
    }

    fn handle_join(&mut self, player: Player) {
        tracing::info!(
            room_id = %self.room_id,
            player = %player.id,
            name = %player.name,
            players = self.players.len() + 1,
            "player joined"
        );
        self.players.push(player);
    }

    fn handle_exit(&mut self, player: PlayerId) -> bool {
        let Some(at) = self.players.iter().position(|p| p.id == player) else {
            return false;
        };
        self.players.remove(at);
        tracing::info!(
            room_id = %self.room_id,
            %player,
            players = self.players.len(),
            "player left"
        );
        true
    }

    fn handle_set_board(&mut self, config: BoardConfig) -> Result<(), RoomError> {
        if self.phase == Phase::Started {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        let board = Board::new(config);
        tracing::info!(
            room_id = %self.room_id,
            size = board.size(),
            ticks_per_second = board.ticks_per_second(),
            "board set"
        );
        self.board = Some(board);
        self.set_phase(Phase::Waiting);
        Ok(())
    }

    fn waiting_board(&mut self) -> Result<&mut Board, RoomError> {
        if self.phase != Phase::Waiting {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        self.board.as_mut().ok_or(RoomError::NoBoard(self.room_id))
    }

    fn handle_participate(
        &mut self,
        player: PlayerId,
        x: i32,
        y: i32,
        color: String,
    ) -> Result<PlayerIndex, RoomError> {
        Ok(self.waiting_board()?.add(player, x, y, color)?)
    }

    fn handle_reposition(&mut self, player: PlayerId, x: i32, y: i32) -> Result<(), RoomError> {
        Ok(self.waiting_board()?.update_position(player, x, y)?)
    }

    fn handle_start(&mut self) -> Result<(), RoomError> {
        if self.phase != Phase::Waiting {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        let board = self.board.take().ok_or(RoomError::NoBoard(self.room_id))?;
        let participants = board.player_count();
        if participants == 0 {
            self.board = Some(board);
            return Err(RoomError::NotEnoughPlayers(self.room_id));
        }

        let life = board.life();
        let (steer_tx, steer_rx) = mpsc::channel(self.config.steer_channel_size.max(1));
        // Room for every crash plus the winner, so the board never drops one.
        let (events_tx, events_rx) = mpsc::channel(participants + 1);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(board.run(steer_rx, events_tx, cancel_rx));

        self.live = Some(LiveMatch {
            steering: steer_tx,
            events: events_rx,
            cancel: Some(cancel_tx),
            deadline: Box::pin(time::sleep(life)),
            task,
        });
        self.set_phase(Phase::Started);
        tracing::info!(
            room_id = %self.room_id,
            participants,
            deadline_secs = life.as_secs_f64(),
            "game started"
        );
        Ok(())
    }

    fn handle_steer(&mut self, update: DirectionUpdate) {
        let Some(live) = self.live.as_ref() else {
            tracing::debug!(room_id = %self.room_id, player = %update.player, "no match running, steering ignored");
            return;
        };
        match live.steering.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(room_id = %self.room_id, player = %update.player, "steering channel full, update dropped");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(room_id = %self.room_id, "board stopped, steering ignored");
            }
        }
    }

    async fn handle_match_event(&mut self, event: MatchEvent) {
        match event {
            MatchEvent::Update(update) => {
                self.relay(update);
                if update.is_winner() {
                    tracing::info!(room_id = %self.room_id, winner = %update.player, "game finished");
                    self.settle().await;
                }
            }
            MatchEvent::Expired => {
                tracing::warn!(room_id = %self.room_id, "match exceeded its lifetime, abandoned");
                self.settle().await;
            }
            MatchEvent::Finished(result) => {
                self.live = None;
                self.restore(result);
            }
        }
    }

    /// Ends the running match: the board is stopped, handed back and the
    /// room moves to `Ended` before the next command is looked at.
    async fn settle(&mut self) {
        if let Some(live) = self.live.take() {
            let result = live.stop().await;
            self.restore(result);
        }
    }

    fn restore(&mut self, result: Result<Board, JoinError>) {
        match result {
            Ok(board) => self.board = Some(board),
            Err(e) => {
                tracing::error!(room_id = %self.room_id, error = %e, "board task failed");
            }
        }
        self.set_phase(Phase::Ended);
    }

    /// Forwards a board update to subscribers.
    fn relay(&self, update: Update) {
        if !update.is_winner() {
            tracing::debug!(room_id = %self.room_id, player = %update.player, "player crashed");
        }
        // No subscribers is fine; the update is simply not observed.
        let _ = self.events.send(update);
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.phase_tx.send_replace(phase);
    }

    fn snapshot(&self) -> Result<BoardSnapshot, RoomError> {
        if self.phase == Phase::Started {
            return Err(RoomError::InvalidPhase(self.phase));
        }
        self.board
            .as_ref()
            .map(Board::snapshot)
            .ok_or(RoomError::NoBoard(self.room_id))
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            admin: self.admin.clone(),
            players: self.players.clone(),
            phase: self.phase,
            participants: self.board.as_ref().map_or(0, Board::player_count),
            last_activity: self.last_activity,
        }
    }
}

/// Spawns a new room actor with `admin` as its only member and returns
/// a handle to it.
pub(crate) fn spawn_room(room_id: RoomId, admin: Player, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_channel_size.max(1));
    let (events, _) = broadcast::channel(config.event_channel_size.max(1));
    let (phase_tx, phase_rx) = watch::channel(Phase::Waiting);

    let actor = RoomActor {
        room_id,
        admin: admin.clone(),
        players: vec![admin.clone()],
        phase: Phase::Waiting,
        board: None,
        last_activity: Instant::now(),
        config,
        receiver: rx,
        events: events.clone(),
        phase_tx,
        live: None,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        admin,
        sender: tx,
        events,
        phase: phase_rx,
    }
}
