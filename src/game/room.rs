//! Room task and the handle used to talk to it

use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::{countdown_duration, tick_duration};
use crate::ws::protocol::{MoveInput, ServerEvent};

use super::registry::RoomRegistry;
use super::snapshot;
use super::state::{RoomPhase, RoomState, TickOutcome};

/// Buffered events per subscriber before it starts lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Commands accepted by a room task
#[derive(Debug, Clone)]
pub enum RoomCommand {
    /// Seat a connection in the given slot
    AddPlayer { connection_id: Uuid, player_number: u8 },
    /// A player signalled readiness
    Join { connection_id: Uuid },
    /// Paddle input
    Move(MoveInput),
    /// Every participant is gone; stop without a winner
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} is closed")]
    Closed(Uuid),
}

/// Handle to a running room
#[derive(Clone, Debug)]
pub struct RoomHandle {
    pub id: Uuid,
    commands: mpsc::UnboundedSender<RoomCommand>,
    events: broadcast::Sender<ServerEvent>,
}

impl RoomHandle {
    /// Receive every event the room publishes from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    pub fn add_player(&self, connection_id: Uuid, player_number: u8) -> Result<(), RoomError> {
        self.send(RoomCommand::AddPlayer {
            connection_id,
            player_number,
        })
    }

    pub fn join(&self, connection_id: Uuid) -> Result<(), RoomError> {
        self.send(RoomCommand::Join { connection_id })
    }

    pub fn move_paddle(&self, input: MoveInput) -> Result<(), RoomError> {
        self.send(RoomCommand::Move(input))
    }

    pub fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown)
    }

    /// True once the room task has stopped
    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.commands
            .send(command)
            .map_err(|_| RoomError::Closed(self.id))
    }
}

/// What the run loop should do after a command
enum Flow {
    Continue,
    CountdownStarted,
    Stop,
}

/// The authoritative room
pub struct GameRoom {
    state: RoomState,
    commands: mpsc::UnboundedReceiver<RoomCommand>,
    events: broadcast::Sender<ServerEvent>,
    registry: RoomRegistry,
}

impl GameRoom {
    /// Create a new room with `creator` in slot 1
    pub fn new(id: Uuid, seed: u64, creator: Uuid, registry: RoomRegistry) -> (Self, RoomHandle) {
        Self::from_state(RoomState::new(id, seed, creator), registry)
    }

    /// Wrap existing state in a room task
    pub fn from_state(state: RoomState, registry: RoomRegistry) -> (Self, RoomHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let handle = RoomHandle {
            id: state.id,
            commands: commands_tx,
            events: events.clone(),
        };

        let room = Self {
            state,
            commands,
            events,
            registry,
        };

        (room, handle)
    }

    /// Run until the room finishes or is abandoned
    pub async fn run(mut self) {
        let room_id = self.state.id;
        debug!(room_id = %room_id, "Room task started");

        let mut ticker = interval(tick_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let countdown = sleep(Duration::ZERO);
        tokio::pin!(countdown);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!(room_id = %room_id, "All room handles dropped");
                        break;
                    };
                    match self.handle_command(command) {
                        Flow::Continue => {}
                        Flow::CountdownStarted => {
                            countdown.as_mut().reset(Instant::now() + countdown_duration());
                        }
                        Flow::Stop => break,
                    }
                }
                () = &mut countdown, if self.state.phase == RoomPhase::Starting => {
                    if self.state.begin_play() {
                        self.broadcast(snapshot::started_game(&self.state));
                        ticker.reset();
                        info!(room_id = %room_id, "Game started");
                    }
                }
                _ = ticker.tick(), if self.state.phase == RoomPhase::Running => {
                    if self.run_tick() {
                        break;
                    }
                }
            }
        }

        // Already gone on the normal paths; covers handles dropped without a shutdown
        self.registry.remove_room(room_id);
        debug!(room_id = %room_id, ticks = self.state.tick, "Room task stopped");
    }

    fn handle_command(&mut self, command: RoomCommand) -> Flow {
        let room_id = self.state.id;

        match command {
            RoomCommand::AddPlayer {
                connection_id,
                player_number,
            } => {
                if !self.state.seat_player(connection_id, player_number) {
                    warn!(
                        room_id = %room_id,
                        connection_id = %connection_id,
                        player_number,
                        "Could not seat player"
                    );
                    return Flow::Continue;
                }

                info!(
                    room_id = %room_id,
                    connection_id = %connection_id,
                    player_number,
                    "Player seated"
                );

                if self.state.is_full() {
                    self.broadcast(ServerEvent::AllReady);
                }
                Flow::Continue
            }
            RoomCommand::Join { connection_id } => {
                if !self.state.begin_countdown() {
                    debug!(
                        room_id = %room_id,
                        connection_id = %connection_id,
                        phase = ?self.state.phase,
                        players = self.state.players.len(),
                        "Join ignored"
                    );
                    return Flow::Continue;
                }

                info!(room_id = %room_id, connection_id = %connection_id, "Game starting");
                self.broadcast(ServerEvent::StartingGame);
                Flow::CountdownStarted
            }
            RoomCommand::Move(input) => {
                if input.room_id != room_id {
                    debug!(room_id = %room_id, target = %input.room_id, "Move for another room");
                    return Flow::Continue;
                }

                if self.state.apply_move(input.player_number, input.direction) {
                    self.broadcast(snapshot::update_game(&self.state));
                } else {
                    debug!(
                        room_id = %room_id,
                        player_number = input.player_number,
                        "Move ignored"
                    );
                }
                Flow::Continue
            }
            RoomCommand::Shutdown => {
                self.state.abandon();
                info!(room_id = %room_id, "Room abandoned");
                Flow::Stop
            }
        }
    }

    /// One simulation tick. Returns true once the room has finished.
    fn run_tick(&mut self) -> bool {
        match self.state.step() {
            TickOutcome::Continue => {
                self.broadcast(snapshot::update_game(&self.state));
                false
            }
            TickOutcome::Won(winner) => {
                // Out of the registry before anyone can see the result
                self.registry.remove_room(self.state.id);

                info!(
                    room_id = %self.state.id,
                    winner,
                    score_1 = self.state.score(1),
                    score_2 = self.state.score(2),
                    ticks = self.state.tick,
                    "Game over"
                );

                self.broadcast(snapshot::end_game(&self.state));
                true
            }
        }
    }

    /// Publish to every subscribed session, the triggering one included
    fn broadcast(&self, event: ServerEvent) {
        if self.events.send(event).is_err() {
            debug!(room_id = %self.state.id, "No subscribers for room event");
        }
    }
}
