use super::broadcast::BroadcastConfig;
use super::broadcast::Broadcaster;
use super::message::TableMsg;
use super::protocol::Ack;
use super::protocol::ClientCommand;
use super::protocol::LoggedAction;
use super::protocol::ServerMessage;
use super::reconnect::ReconnectStore;
use super::runout::Runout;
use super::runout::RunoutConfig;
use super::runout::RunoutFire;
use super::sinks::BroadcastSink;
use super::sinks::Entropy;
use super::timer::TimeBanks;
use super::timer::TimerConfig;
use super::timer::TurnClock;
use pit_core::Millis;
use pit_core::Position;
use pit_core::Chips;
use pit_engine::Engine;
use pit_engine::EngineError;
use pit_engine::Player;
use pit_engine::PlayerAction;
use pit_engine::PlayerId;
use pit_engine::Progress;
use pit_engine::Stage;
use pit_engine::TableConfig;
use pit_engine::TableId;
use pit_records::PersistenceSink;
use pit_records::RitOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Everything a table task needs besides its engine config.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableTiming {
    pub timer: TimerConfig,
    pub runout: RunoutConfig,
    pub broadcast: BroadcastConfig,
}

/// The single-writer loop around one table's engine.
///
/// All mutation happens here, one mailbox message or timer fire at a time:
/// client actions, turn expiry, time-bank replenishment, runout reveals,
/// disconnect deadlines, shutdown. Read-only snapshots leave through the
/// broadcaster; nothing else sees the engine.
pub struct TableActor {
    table: TableId,
    engine: Engine,
    rx: UnboundedReceiver<TableMsg>,
    broadcaster: Broadcaster,
    clock: TurnClock,
    banks: TimeBanks,
    runout: Runout,
    timing: TableTiming,
    reconnect: Arc<ReconnectStore>,
    persistence: Arc<dyn PersistenceSink>,
    entropy: Arc<dyn Entropy>,
}

impl TableActor {
    /// Spawns the table task and hands back its mailbox.
    pub fn spawn(
        table: TableId,
        config: TableConfig,
        timing: TableTiming,
        broadcast: Arc<dyn BroadcastSink>,
        persistence: Arc<dyn PersistenceSink>,
        entropy: Arc<dyn Entropy>,
        reconnect: Arc<ReconnectStore>,
    ) -> (UnboundedSender<TableMsg>, JoinHandle<()>) {
        let (tx, rx) = unbounded_channel();
        let actor = Self {
            table,
            engine: Engine::new(table, config),
            rx,
            broadcaster: Broadcaster::new(broadcast, table, timing.broadcast),
            clock: TurnClock::new(timing.timer),
            banks: TimeBanks::new(timing.timer),
            runout: Runout::new(),
            timing,
            reconnect,
            persistence,
            entropy,
        };
        let handle = tokio::spawn(actor.run());
        (tx, handle)
    }

    async fn run(mut self) {
        log::info!("[table {}] task started", self.table);
        loop {
            let wake = self
                .next_wake()
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(60));
            tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    None | Some(TableMsg::Shutdown) => break,
                    Some(msg) => self.handle(msg).await,
                },
                _ = tokio::time::sleep_until(wake) => {
                    self.on_tick(Instant::now()).await;
                }
            }
        }
        self.shutdown().await;
    }

    async fn handle(&mut self, msg: TableMsg) {
        match msg {
            TableMsg::Command { player, command, reply } => {
                let ack = self.apply_command(player, command).await;
                let _ = reply.send(ack);
            }
            TableMsg::Disconnect { player, reply } => {
                let _ = reply.send(self.on_disconnect(player));
            }
            TableMsg::Reconnect { player, token, reply } => {
                let ack = self.on_reconnect(player, token).await;
                let _ = reply.send(ack);
            }
            TableMsg::Timer => self.on_tick(Instant::now()).await,
            TableMsg::Shutdown => unreachable!("handled by the loop"),
        }
    }

    /// Earliest deadline of any of the table's clocks.
    fn next_wake(&self) -> Option<Instant> {
        [
            self.clock.next_wake(),
            self.banks.next_wake(),
            self.runout.next_wake(),
            self.reconnect.next_wake(self.table),
        ]
        .into_iter()
        .flatten()
        .min()
    }
}

/// Command handling.
impl TableActor {
    async fn apply_command(&mut self, player: PlayerId, command: ClientCommand) -> Ack {
        let now = Instant::now();
        let ack: Ack = match command {
            ClientCommand::JoinTable { name, seat, stack } => {
                self.join(player, name, seat, stack, now).into()
            }
            ClientCommand::LeaveTable => match self.engine.stand(player) {
                Ok(_) => {
                    self.banks.remove(player);
                    Ack::ok()
                }
                Err(e) => e.into(),
            },
            ClientCommand::StartHand => self.start_hand(now).await.into(),
            ClientCommand::PlayerAction { action } => {
                return self.submit(player, action, false, now).await;
            }
            ClientCommand::EnableRunItTwice { runs } => self.enable_rit(player, runs, now).await,
            ClientCommand::DeclineRunItTwice => match self.engine.decline_rit(player) {
                Ok(()) => {
                    // the single board runs out as scheduled
                    self.runout.schedule_reveal(now, self.timing.runout);
                    Ack::ok()
                }
                Err(e) => e.into(),
            },
            // these leave the table view untouched: no state push
            ClientCommand::ConsentRunItTwice => return self.engine.consent_rit(player).into(),
            ClientCommand::UseTimebank => return self.use_timebank(player, now).await,
            ClientCommand::RabbitHuntPreview { street } => {
                return self.rabbit(player, street).await;
            }
        };
        if ack.is_ok() {
            self.push_state(now).await;
        }
        ack
    }

    fn join(
        &mut self,
        player: PlayerId,
        name: String,
        seat: Position,
        stack: Chips,
        now: Instant,
    ) -> Result<(), EngineError> {
        self.engine.sit(Player::new(player, name, seat, stack))?;
        self.engine.set_time_bank(player, self.banks.initial_ms())?;
        self.banks.register(player, now);
        Ok(())
    }

    async fn start_hand(&mut self, now: Instant) -> Result<(), EngineError> {
        let context = format!("{}:hand-{}", self.table, self.engine.state().hand_no() + 1);
        self.engine
            .start_hand(self.entropy.shuffle_seed(), self.entropy.public_seed(&context))?;
        self.runout.cancel();
        if self.engine.is_locked() {
            // blinds alone can lock a short-stacked table
            self.engage_runout(now).await;
        }
        self.sync_turn_clock(now).await;
        self.persist();
        Ok(())
    }

    /// Validates and applies an action, then drives whatever it triggered:
    /// the next turn, the runout schedule, or settlement. Auto actions that
    /// lost their race (the player reconnected or the state moved on) are
    /// discarded silently.
    async fn submit(
        &mut self,
        player: PlayerId,
        action: PlayerAction,
        auto: bool,
        now: Instant,
    ) -> Ack {
        let progress = match self.engine.submit(player, action) {
            Ok(progress) => progress,
            Err(e) => {
                if auto {
                    log::debug!("[table {}] stale auto action: {}", self.table, e);
                }
                return e.into();
            }
        };
        let sequence = self.push_state(now).await;
        self.reconnect.record_action(
            self.table,
            LoggedAction {
                sequence: sequence.unwrap_or_else(|| self.engine.state().sequence()),
                player,
                action,
                auto,
            },
        );
        self.broadcaster
            .announce(ServerMessage::PlayerAction {
                table: self.table,
                player,
                action,
                auto,
            })
            .await;
        match progress {
            Progress::Acting => self.sync_turn_clock(now).await,
            Progress::Locked => {
                self.clock.stop_turn();
                self.engage_runout(now).await;
            }
            Progress::HandOver => self.conclude(now).await,
        }
        self.persist();
        Ack::ok()
    }

    async fn enable_rit(&mut self, player: PlayerId, runs: usize, now: Instant) -> Ack {
        match self.engine.enable_rit(player, runs) {
            Ok(rit) => {
                self.broadcaster
                    .announce(ServerMessage::RitEnabled {
                        table: self.table,
                        runs: rit.runs,
                        rit,
                    })
                    .await;
                if self.engine.is_locked() {
                    // no single-board reveals: each run deals its own
                    // remaining streets from the frozen baseline
                    self.runout.schedule_settle(now, self.timing.runout);
                }
                Ack::ok()
            }
            Err(e) => e.into(),
        }
    }

    async fn use_timebank(&mut self, player: PlayerId, now: Instant) -> Ack {
        let balance = match self.engine.state().player(player) {
            Ok(p) => p.time_bank_ms(),
            Err(e) => return e.into(),
        };
        if !self.clock.use_time_bank(player, balance, now) {
            return EngineError::IllegalAction("no time bank available".into()).into();
        }
        self.engine.set_time_bank(player, 0).expect("player exists");
        self.broadcaster
            .unicast(
                player,
                ServerMessage::TimebankUpdate {
                    table: self.table,
                    player,
                    amount_ms: 0,
                },
            )
            .await;
        self.emit_timer(player, now, false).await;
        Ack::ok()
    }

    async fn rabbit(&mut self, player: PlayerId, street: Stage) -> Ack {
        // previews only once the hand is resolved
        if self.engine.state().stage().is_betting() {
            return EngineError::IllegalAction("hand still in progress".into()).into();
        }
        match self.engine.rabbit_preview(street) {
            Ok((cards, _)) => {
                self.broadcaster
                    .unicast(
                        player,
                        ServerMessage::RabbitPreview {
                            table: self.table,
                            street,
                            cards,
                        },
                    )
                    .await;
                Ack::ok()
            }
            Err(e) => e.into(),
        }
    }
}

/// Disconnects and reconnects.
impl TableActor {
    fn on_disconnect(&mut self, player: PlayerId) -> Result<String, EngineError> {
        let state = self.engine.state();
        let their_turn = state.to_act() == Some(player);
        let bank = state.player(player)?.time_bank_ms();
        let token = self.reconnect.disconnect(
            self.table,
            player,
            their_turn,
            bank,
            state.sequence(),
            Instant::now(),
        );
        if their_turn {
            // the disconnect deadline (at least 5 s, at most their bank)
            // supersedes the regular turn clock
            self.clock.stop_turn();
        }
        Ok(token)
    }

    async fn on_reconnect(&mut self, player: PlayerId, token: String) -> Ack {
        let now = Instant::now();
        match self.reconnect.reconnect(self.table, player, &token, now) {
            Ok(grant) => {
                self.broadcaster.reconcile(&self.engine, player, &grant).await;
                if self.engine.state().to_act() == Some(player) {
                    self.sync_turn_clock(now).await;
                }
                Ack::ok()
            }
            Err(e) => e.into(),
        }
    }
}

/// Timer-driven work.
impl TableActor {
    async fn on_tick(&mut self, now: Instant) {
        if let Some((player, remaining)) = self.clock.warning_due(now) {
            self.broadcaster
                .unicast(
                    player,
                    ServerMessage::TimerUpdate {
                        table: self.table,
                        player,
                        remaining_ms: remaining.as_millis() as Millis,
                        warning: true,
                    },
                )
                .await;
        }
        if let Some(player) = self.clock.expired(now) {
            self.clock.stop_turn();
            if let Ok(action) = self.engine.passive_action(player) {
                log::debug!("[table {}] turn expired, auto {}", self.table, action);
                let _ = self.submit(player, action, true, now).await;
            }
        }
        let updates = self.banks.tick_replenish(now, |p| {
            self.engine
                .state()
                .player(p)
                .map(|p| p.time_bank_ms())
                .unwrap_or(0)
        });
        for (player, balance) in updates {
            let _ = self.engine.set_time_bank(player, balance);
            self.broadcaster
                .unicast(
                    player,
                    ServerMessage::TimebankUpdate {
                        table: self.table,
                        player,
                        amount_ms: balance,
                    },
                )
                .await;
        }
        match self.runout.due(now) {
            Some(RunoutFire::Reveal) => self.reveal(now).await,
            Some(RunoutFire::Settle) => self.settle(now).await,
            None => {}
        }
        for player in self.reconnect.auto_actions_due(self.table, now) {
            self.commit_absent(player, now).await;
        }
        for player in self.reconnect.timeouts_for(self.table, now) {
            log::debug!("[table {}] grace elapsed for {}", self.table, player);
            self.commit_absent(player, now).await;
        }
    }

    /// Folds or checks for a player who is not coming back in time.
    async fn commit_absent(&mut self, player: PlayerId, now: Instant) {
        if self.engine.state().to_act() != Some(player) {
            return;
        }
        if let Ok(action) = self.engine.passive_action(player) {
            let _ = self.submit(player, action, true, now).await;
        }
    }

    /// The all-in lock engaged: offer run-it-twice first, otherwise start
    /// the reveal cadence.
    async fn engage_runout(&mut self, now: Instant) {
        if let Some(prompt) = self.engine.issue_rit_prompt() {
            self.runout.awaiting_rit();
            self.broadcaster
                .announce(ServerMessage::RitPrompt {
                    table: self.table,
                    prompt,
                })
                .await;
        } else {
            self.runout.schedule_reveal(now, self.timing.runout);
        }
    }

    async fn reveal(&mut self, now: Instant) {
        match self.engine.reveal_next() {
            Ok((street, cards)) => {
                log::debug!("[table {}] runout reveals {}: {:?}", self.table, street, cards);
                if self.engine.state().board_complete() {
                    self.runout.schedule_settle(now, self.timing.runout);
                } else {
                    self.runout.schedule_reveal(now, self.timing.runout);
                }
                self.push_state(now).await;
            }
            Err(e) => {
                // the lock no longer holds; stop revealing
                log::debug!("[table {}] runout cancelled: {}", self.table, e);
                self.runout.cancel();
            }
        }
    }

    async fn settle(&mut self, now: Instant) {
        self.runout.cancel();
        let rit_enabled = self
            .engine
            .state()
            .rit()
            .map(|r| r.enabled)
            .unwrap_or(false);
        let result = if rit_enabled {
            self.engine.run_it().map(|runs| {
                let hand_no = self.engine.state().hand_no();
                for run in &runs {
                    let outcome = RitOutcome::from_run(self.table, hand_no, run);
                    let sink = self.persistence.clone();
                    tokio::spawn(async move { sink.record_rit_outcome(&outcome).await });
                }
            })
        } else {
            self.engine.finish_showdown().map(|_| ())
        };
        match result {
            Ok(()) => {
                self.conclude(now).await;
                self.push_state(now).await;
                self.persist();
            }
            Err(e) => log::error!("[table {}] settlement failed: {}", self.table, e),
        }
    }

    async fn conclude(&mut self, _now: Instant) {
        self.clock.stop_turn();
        self.runout.cancel();
        if let Some(settlement) = self.engine.settlement() {
            self.broadcaster
                .announce(ServerMessage::HandEnd {
                    table: self.table,
                    payouts: settlement.payouts.clone(),
                })
                .await;
        }
    }
}

/// Plumbing.
impl TableActor {
    /// (Re)arms the turn clock for whoever acts next. Always restarts: the
    /// same player acting on consecutive streets gets a fresh clock.
    async fn sync_turn_clock(&mut self, now: Instant) {
        match self.engine.state().to_act() {
            Some(player) => {
                self.clock.start_turn(player, now);
                self.emit_timer(player, now, false).await;
            }
            None => self.clock.stop_turn(),
        }
    }

    async fn emit_timer(&mut self, player: PlayerId, now: Instant, warning: bool) {
        let remaining = self
            .clock
            .remaining(now)
            .unwrap_or(Duration::ZERO)
            .as_millis() as Millis;
        self.broadcaster
            .unicast(
                player,
                ServerMessage::TimerUpdate {
                    table: self.table,
                    player,
                    remaining_ms: remaining,
                    warning,
                },
            )
            .await;
    }

    /// Emits the versioned state fan-out; a rate-limited emission is
    /// dropped here and healed later by reconciliation.
    async fn push_state(&mut self, now: Instant) -> Option<pit_core::Seq> {
        match self.broadcaster.state_update(&mut self.engine, now).await {
            Ok(sequence) => Some(sequence),
            Err(e) => {
                log::debug!("[table {}] update dropped: {}", self.table, e);
                None
            }
        }
    }

    /// Snapshot writes are best-effort and never block the loop.
    fn persist(&self) {
        let sink = self.persistence.clone();
        let table = self.table;
        let snapshot = self.engine.snapshot();
        tokio::spawn(async move { sink.save_snapshot(table, &snapshot).await });
    }

    /// Final snapshot, cancelled timers, and refusals for the stragglers.
    async fn shutdown(&mut self) {
        self.clock.stop_turn();
        self.runout.cancel();
        self.persistence
            .save_snapshot(self.table, &self.engine.snapshot())
            .await;
        self.rx.close();
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                TableMsg::Command { reply, .. } => {
                    let _ = reply.send(EngineError::Unavailable.into());
                }
                TableMsg::Disconnect { reply, .. } => {
                    let _ = reply.send(Err(EngineError::Unavailable));
                }
                TableMsg::Reconnect { reply, .. } => {
                    let _ = reply.send(EngineError::Unavailable.into());
                }
                TableMsg::Timer | TableMsg::Shutdown => {}
            }
        }
        log::info!("[table {}] task stopped", self.table);
    }
}
