//! Table actor: an isolated Tokio task that owns one game.
//!
//! The actor is the only code that touches its [`GameMachine`]. Human
//! commands arrive over an mpsc channel; deadlines and AI turns come
//! from the [`PhaseTimer`]. Both are applied one at a time from a single
//! `select!` loop, so there is exactly one writer per game.

use nightwatch_engine::{EngineError, GameConfig, GameMachine, GameRng, GameState};
use nightwatch_protocol::{Codec, GameCommand, GameId, NightActionKind, Phase, PlayerId};
use nightwatch_timer::{PhaseTimer, TimerEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{TableConfig, TableError, TableUpdate};

/// Channel sender for delivering updates to one subscriber.
pub type UpdateSender = mpsc::UnboundedSender<TableUpdate>;

/// Commands sent to a table actor through its channel.
///
/// Variants with a `reply` are request/response: the caller waits on the
/// oneshot for the engine's verdict.
pub(crate) enum TableCommand {
    /// Deal roles and begin the first night.
    Start {
        config: GameConfig,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Apply a command from the event API.
    Apply {
        command: GameCommand,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Move a non-interactive phase along now.
    Advance {
        reply: oneshot::Sender<Result<Phase, EngineError>>,
    },

    /// Let the policy act for one seat.
    ActFor {
        actor: PlayerId,
        reply: oneshot::Sender<Result<bool, EngineError>>,
    },

    /// Request a copy of the game state.
    Snapshot {
        reply: oneshot::Sender<GameState>,
    },

    /// Register a subscriber for narration and phase updates.
    Subscribe { sender: UpdateSender },

    /// Turn the human autopilot on or off.
    SetAutopilot { enabled: bool },

    /// Stop the actor.
    Shutdown,
}

/// Handle to a running table actor.
///
/// Cheap to clone; it is an `mpsc::Sender` plus the game id. The
/// [`TableManager`](crate::TableManager) holds one per table.
#[derive(Debug, Clone)]
pub struct GameHandle {
    game_id: GameId,
    sender: mpsc::Sender<TableCommand>,
}

impl std::fmt::Debug for TableCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start { .. } => "Start",
            Self::Apply { .. } => "Apply",
            Self::Advance { .. } => "Advance",
            Self::ActFor { .. } => "ActFor",
            Self::Snapshot { .. } => "Snapshot",
            Self::Subscribe { .. } => "Subscribe",
            Self::SetAutopilot { .. } => "SetAutopilot",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

impl GameHandle {
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, command: TableCommand) -> Result<(), TableError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| TableError::Unavailable(self.game_id))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> TableCommand,
    ) -> Result<T, TableError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| TableError::Unavailable(self.game_id))
    }

    /// Starts the game with a full config (human name included).
    pub async fn start(&self, config: GameConfig) -> Result<(), TableError> {
        self.request(|reply| TableCommand::Start { config, reply })
            .await?
            .map_err(TableError::from)
    }

    /// Applies one event-API command.
    pub async fn apply(&self, command: GameCommand) -> Result<(), TableError> {
        self.request(|reply| TableCommand::Apply { command, reply })
            .await?
            .map_err(TableError::from)
    }

    /// Decodes a wire command with `codec` and applies it.
    pub async fn send_encoded<C: Codec>(&self, codec: &C, data: &[u8]) -> Result<(), TableError> {
        let command: GameCommand = codec.decode(data)?;
        self.apply(command).await
    }

    pub async fn submit_vote(&self, voter: PlayerId, target: PlayerId) -> Result<(), TableError> {
        self.apply(GameCommand::SubmitVote {
            voter_id: voter,
            target_id: target,
        })
        .await
    }

    pub async fn submit_night_action(
        &self,
        actor: PlayerId,
        target: PlayerId,
        kind: NightActionKind,
    ) -> Result<(), TableError> {
        self.apply(GameCommand::SubmitNightAction {
            actor_id: actor,
            target_id: target,
            action_type: kind,
        })
        .await
    }

    /// Moves a non-interactive phase along without waiting for its timer.
    pub async fn advance_phase(&self) -> Result<Phase, TableError> {
        self.request(|reply| TableCommand::Advance { reply })
            .await?
            .map_err(TableError::from)
    }

    /// Asks the AI policy to act for `actor` right now.
    pub async fn act_for(&self, actor: PlayerId) -> Result<bool, TableError> {
        self.request(|reply| TableCommand::ActFor { actor, reply })
            .await?
            .map_err(TableError::from)
    }

    pub async fn snapshot(&self) -> Result<GameState, TableError> {
        self.request(|reply| TableCommand::Snapshot { reply }).await
    }

    /// The snapshot encoded with `codec`.
    pub async fn snapshot_encoded<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, TableError> {
        let state = self.snapshot().await?;
        Ok(codec.encode(&state)?)
    }

    /// Subscribes to narration and phase updates from now on.
    ///
    /// Narration already in the log is not replayed; read it from a
    /// snapshot first if needed.
    pub async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<TableUpdate>, TableError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.send(TableCommand::Subscribe { sender: tx }).await?;
        Ok(rx)
    }

    /// With autopilot on, the human seat is played by the AI policy.
    pub async fn set_autopilot(&self, enabled: bool) -> Result<(), TableError> {
        self.send(TableCommand::SetAutopilot { enabled }).await
    }

    /// Tells the table to shut down.
    pub async fn shutdown(&self) -> Result<(), TableError> {
        self.send(TableCommand::Shutdown).await
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct TableActor {
    game_id: GameId,
    machine: GameMachine,
    timer: PhaseTimer,
    autopilot: bool,
    subscribers: Vec<UpdateSender>,
    /// Log entries before this index have been published.
    published: usize,
    receiver: mpsc::Receiver<TableCommand>,
}

impl TableActor {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        info!(game_id = %self.game_id, seed = self.machine.seed(), "table actor started");

        loop {
            tokio::select! {
                command = self.receiver.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle_command(command) {
                        break;
                    }
                }
                event = self.timer.wait() => self.handle_timer(event),
            }
            self.sync();
        }

        info!(game_id = %self.game_id, "table actor stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, command: TableCommand) -> bool {
        debug!(game_id = %self.game_id, ?command, "command received");
        match command {
            TableCommand::Start { config, reply } => {
                let result = self.machine.start_game(config);
                self.reply(reply, result);
            }
            TableCommand::Apply { command, reply } => {
                let result = self.machine.apply(command);
                self.reply(reply, result);
            }
            TableCommand::Advance { reply } => {
                let result = self.machine.advance_phase();
                self.reply(reply, result);
            }
            TableCommand::ActFor { actor, reply } => {
                let result = self.machine.act_for(actor);
                self.reply(reply, result);
            }
            TableCommand::Snapshot { reply } => {
                let _ = reply.send(self.machine.snapshot());
            }
            TableCommand::Subscribe { sender } => {
                self.subscribers.push(sender);
            }
            TableCommand::SetAutopilot { enabled } => {
                self.set_autopilot(enabled);
            }
            TableCommand::Shutdown => {
                info!(game_id = %self.game_id, "table shutting down");
                return false;
            }
        }
        true
    }

    fn reply<T>(&self, reply: oneshot::Sender<Result<T, EngineError>>, result: Result<T, EngineError>) {
        if let Err(err) = &result {
            debug!(game_id = %self.game_id, %err, "command rejected");
        }
        let _ = reply.send(result);
    }

    fn handle_timer(&mut self, event: TimerEvent) {
        if event.epoch() != self.machine.epoch() {
            debug!(
                game_id = %self.game_id,
                epoch = event.epoch(),
                current = self.machine.epoch(),
                "stale timer event"
            );
            return;
        }
        match event {
            TimerEvent::Deadline { epoch } => {
                self.machine.on_deadline(epoch);
            }
            TimerEvent::AiTurn { actor, .. } => {
                if actor == self.machine.state().human_player_id && !self.autopilot {
                    return;
                }
                if let Err(err) = self.machine.act_for(actor) {
                    warn!(game_id = %self.game_id, %actor, %err, "ai turn failed");
                }
            }
        }
    }

    fn set_autopilot(&mut self, enabled: bool) {
        if self.autopilot == enabled {
            return;
        }
        self.autopilot = enabled;
        info!(game_id = %self.game_id, enabled, "autopilot changed");
        let human = self.machine.state().human_player_id;
        if enabled && self.machine.state().owes_action(human) {
            self.timer.push_turn(human);
        }
    }

    /// Seats the timer should act for in the current phase.
    fn turn_order(&self) -> Vec<PlayerId> {
        let mut actors = self.machine.pending_ai_actors();
        let state = self.machine.state();
        if self.autopilot && state.owes_action(state.human_player_id) {
            actors.insert(0, state.human_player_id);
        }
        actors
    }

    /// Publish new narration, and re-arm the timer if the phase changed.
    fn sync(&mut self) {
        let fresh: Vec<TableUpdate> = self
            .machine
            .state()
            .log
            .since(self.published)
            .iter()
            .cloned()
            .map(TableUpdate::Narration)
            .collect();
        self.published += fresh.len();
        for update in fresh {
            self.publish(update);
        }

        let epoch = self.machine.epoch();
        if epoch == self.timer.epoch() {
            return;
        }

        let state = self.machine.state();
        let phase = state.current_phase;
        let day = state.current_day;
        let verdict = state.winner.zip(state.game_end_reason.clone());
        self.publish(TableUpdate::PhaseChanged { phase, day });

        if let Some((winner, reason)) = verdict {
            self.publish(TableUpdate::GameOver { winner, reason });
        }
        let actors = self.turn_order();
        self.timer.arm(epoch, phase, &actors);
    }

    fn publish(&mut self, update: TableUpdate) {
        self.subscribers
            .retain(|subscriber| subscriber.send(update.clone()).is_ok());
    }
}

/// Spawns a table actor and returns a handle to it.
///
/// The game sits in `gameStart` until [`GameHandle::start`] is called.
pub(crate) fn spawn_table(game_id: GameId, config: TableConfig) -> GameHandle {
    let config = config.validated();
    let seed = config
        .seed
        .unwrap_or_else(|| GameRng::from_entropy().seed());
    let (tx, rx) = mpsc::channel(config.channel_size);

    let actor = TableActor {
        game_id,
        machine: GameMachine::new(game_id, seed),
        timer: PhaseTimer::new(config.timings),
        autopilot: config.autopilot,
        subscribers: Vec::new(),
        published: 0,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    GameHandle { game_id, sender: tx }
}
