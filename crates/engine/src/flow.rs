use super::action::PlayerAction;
use super::error::EngineError;
use super::player::Player;
use super::player::PlayerId;
use super::pots::Contribution;
use super::pots::side_pots;
use super::showdown;
use super::showdown::Payout;
use super::showdown::Settlement;
use super::stage::Stage;
use super::table::TableConfig;
use super::table::TableId;
use super::table::TableState;
use pit_core::Chips;
use pit_core::Millis;
use pit_core::Seq;
use pit_cards::Card;
use pit_cards::Deck;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// What a successfully applied action led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The hand continues; `to_act` names the next player.
    Acting,
    /// All-in lock: no further voluntary actions, the runout scheduler
    /// takes over.
    Locked,
    /// The hand is over; a settlement is available.
    HandOver,
}

/// The authoritative engine for one table.
///
/// Owns the [`TableState`], the deck, and the run-it-twice bookkeeping, and
/// is the only writer of any of them. All methods are synchronous and
/// deterministic given their inputs: randomness enters exclusively through
/// the shuffle seeds handed to [`start_hand`](Self::start_hand) and the
/// audited run-it-twice seed chain.
#[derive(Debug, Clone)]
pub struct Engine {
    state: TableState,
    deck: Deck,
    removed: Vec<PlayerId>,
    rabbit_previewed: bool,
    rit_consents: BTreeSet<PlayerId>,
    pub(crate) rit_baseline: Option<Deck>,
    poisoned: bool,
    settlement: Option<Settlement>,
}

impl Engine {
    pub fn new(table: TableId, config: TableConfig) -> Self {
        Self {
            state: TableState::new(table, config),
            deck: Deck::from(Vec::new()),
            removed: Vec::new(),
            rabbit_previewed: false,
            rit_consents: BTreeSet::new(),
            rit_baseline: None,
            poisoned: false,
            settlement: None,
        }
    }
    pub fn state(&self) -> &TableState {
        &self.state
    }
    pub fn deck(&self) -> &Deck {
        &self.deck
    }
    pub fn removed(&self) -> &[PlayerId] {
        &self.removed
    }
    pub fn rabbit_previewed(&self) -> bool {
        self.rabbit_previewed
    }
    pub fn rit_consents(&self) -> &BTreeSet<PlayerId> {
        &self.rit_consents
    }
    /// Settlement of the most recently completed hand.
    pub fn settlement(&self) -> Option<&Settlement> {
        self.settlement.as_ref()
    }
    /// An internal invariant failed; the table refuses everything until
    /// rehydrated.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
    pub fn bump_sequence(&mut self) -> Seq {
        self.state.bump_sequence()
    }
    pub fn set_time_bank(&mut self, id: PlayerId, ms: Millis) -> Result<(), EngineError> {
        let index = self.state.index_of(id)?;
        self.state.player_mut(index).set_time_bank(ms);
        Ok(())
    }
}

/// Seating.
impl Engine {
    pub fn sit(&mut self, player: Player) -> Result<(), EngineError> {
        self.guard()?;
        self.state.sit(player)
    }
    /// Removes a player between hands; their stack goes back to the caller
    /// and the departure is recorded for the snapshot.
    pub fn stand(&mut self, id: PlayerId) -> Result<Chips, EngineError> {
        self.guard()?;
        let stack = self.state.stand(id)?;
        self.removed.push(id);
        self.rit_consents.remove(&id);
        Ok(stack)
    }
    pub(crate) fn guard(&self) -> Result<(), EngineError> {
        if self.poisoned {
            Err(EngineError::Unavailable)
        } else {
            Ok(())
        }
    }
}

/// Crate-internal access for the run-it-twice and rabbit modules.
impl Engine {
    pub(crate) fn state_mut(&mut self) -> &mut TableState {
        &mut self.state
    }
    pub(crate) fn consents_mut(&mut self) -> &mut BTreeSet<PlayerId> {
        &mut self.rit_consents
    }
    pub(crate) fn store_settlement(&mut self, settlement: Settlement) {
        self.settlement = Some(settlement);
    }
    pub(crate) fn mark_rabbit_previewed(&mut self) {
        self.rabbit_previewed = true;
    }
    pub(crate) fn restore_parts(
        state: TableState,
        deck: Deck,
        removed: Vec<PlayerId>,
        rabbit_previewed: bool,
        rit_consents: BTreeSet<PlayerId>,
    ) -> Self {
        Self {
            state,
            deck,
            removed,
            rabbit_previewed,
            rit_consents,
            rit_baseline: None,
            poisoned: false,
            settlement: None,
        }
    }
}

/// Hand lifecycle.
impl Engine {
    /// Starts a new hand: rotates the dealer, shuffles with the given seed,
    /// deals, posts the forced bets, and opens the first betting round.
    ///
    /// `public_seed` is the audited seed context for this hand (entropy
    /// mixed with room/hand identity by the caller); run-it-twice seeds
    /// derive from it.
    pub fn start_hand(
        &mut self,
        shuffle_seed: [u8; 32],
        public_seed: String,
    ) -> Result<(), EngineError> {
        self.guard()?;
        if self.state.stage().is_betting() {
            return Err(EngineError::IllegalAction("hand in progress".into()));
        }
        let funded = self
            .state
            .players()
            .iter()
            .filter(|p| p.stack() > 0)
            .count();
        if funded < 2 {
            return Err(EngineError::IllegalAction("not enough funded players".into()));
        }
        self.state.begin_hand(public_seed);
        self.rabbit_previewed = false;
        self.rit_consents.clear();
        self.rit_baseline = None;
        self.settlement = None;
        if self.state.hand_no() > 1 {
            let next = (self.state.dealer() + 1) % self.state.seats();
            self.state.set_dealer(next);
        }
        // broke players sit the hand out
        for i in 0..self.state.seats() {
            if self.state.players()[i].stack() == 0 {
                self.state.player_mut(i).fold();
            }
        }
        self.deck = Deck::shuffled(shuffle_seed);
        let policy = self.state.variant().policy();
        for i in 0..self.state.seats() {
            if !self.state.players()[i].in_hand() {
                continue;
            }
            let down = self.deck.draw_n(policy.down);
            self.state.player_mut(i).deal_hole(down);
            if policy.up > 0 {
                let up = self.deck.draw_n(policy.up);
                self.state.player_mut(i).deal_shown(up);
            }
        }
        let opener = if policy.community {
            let (_, bb) = self.state.post_blinds();
            bb
        } else {
            self.state.post_bring_in()
        };
        self.state.set_stage(self.state.variant().first_street());
        let first = self.state.find_next_actor(opener);
        self.state
            .set_to_act(first.map(|i| self.state.players()[i].id()));
        log::debug!(
            "[engine {}] hand {} started, dealer P{}",
            self.state.table(),
            self.state.hand_no(),
            self.state.dealer(),
        );
        Ok(())
    }

    /// Validates and applies one player action, advancing streets and
    /// settling the hand as far as the action allows.
    pub fn submit(&mut self, id: PlayerId, action: PlayerAction) -> Result<Progress, EngineError> {
        self.guard()?;
        let index = self.state.index_of(id)?;
        if self.state.rit_prompt().is_some() {
            return Err(EngineError::WaitingOnRit);
        }
        if self.is_locked() {
            return Err(EngineError::HandLocked);
        }
        if !self.state.stage().is_betting() {
            return Err(EngineError::IllegalAction("no hand in progress".into()));
        }
        if self.state.to_act() != Some(id) {
            return Err(EngineError::NotYourTurn);
        }
        self.state.validate_action(id, action)?;
        self.state.apply_betting(index, action);
        log::debug!("[engine {}] P{} {}", self.state.table(), index, action);
        self.advance(index)
    }

    /// The forced action when a player's clock runs out or they are gone:
    /// check when checking is free, fold when facing a bet.
    pub fn passive_action(&self, id: PlayerId) -> Result<PlayerAction, EngineError> {
        let player = self.state.player(id)?;
        if self.state.round_bet_high() == player.round_bet() {
            Ok(PlayerAction::Check)
        } else {
            Ok(PlayerAction::Fold)
        }
    }

    /// All-in lock: at least two players contest the pot, nobody can make
    /// further decisions, and cards remain to be dealt.
    pub fn is_locked(&self) -> bool {
        self.state.stage().is_betting()
            && self.state.to_act().is_none()
            && self.state.in_hand_count() >= 2
    }

    /// The undealt-street census behind the lock: any all-in, at most one
    /// live actor, at least two contenders, board incomplete.
    pub fn is_auto_runout_eligible(&self) -> bool {
        self.state.any_all_in()
            && self.state.can_act_count() <= 1
            && self.state.in_hand_count() >= 2
            && !self.state.board_complete()
            && self.state.stage().is_betting()
    }

    fn advance(&mut self, actor: usize) -> Result<Progress, EngineError> {
        loop {
            if self.state.in_hand_count() == 1 {
                return self.win_by_fold();
            }
            if !self.state.is_round_complete() {
                let next = self
                    .state
                    .find_next_actor(actor)
                    .map(|i| self.state.players()[i].id());
                self.state.set_to_act(next);
                return Ok(Progress::Acting);
            }
            self.sweep_round();
            if self.is_auto_runout_eligible() {
                self.state.set_to_act(None);
                return Ok(Progress::Locked);
            }
            let next_street = self.state.variant().next_street(self.state.stage());
            if next_street == Stage::Showdown {
                self.finish_showdown()?;
                return Ok(Progress::HandOver);
            }
            self.deal_street(next_street);
            let lead = self.street_leader(next_street);
            match lead {
                Some(i) => {
                    self.state.set_to_act(Some(self.state.players()[i].id()));
                    return Ok(Progress::Acting);
                }
                // nobody can act on the fresh street; loop into the next one
                None => self.state.set_to_act(None),
            }
        }
    }

    /// Sweeps round bets into the pot and resets per-round state.
    fn sweep_round(&mut self) {
        let committed = self.state.committed();
        self.state.add_to_pot(committed);
        for i in 0..self.state.seats() {
            self.state.player_mut(i).reset_round();
        }
        self.state.set_round_bet_high(0);
        let big_blind = self.state.config().big_blind;
        self.state.set_min_raise(big_blind);
        self.state.set_last_raise(0);
    }

    /// Deals the cards `street` calls for and enters it.
    pub(crate) fn deal_street(&mut self, street: Stage) {
        let variant = self.state.variant();
        if variant.policy().community {
            let need = street.board_target().saturating_sub(self.state.board().len());
            let cards = self.deck.draw_n(need);
            log::debug!("[engine {}] dealing {}: {:?}", self.state.table(), street, cards);
            self.state.board_mut().extend(cards);
        } else {
            let (down, up) = variant.stud_deal(street);
            for i in 0..self.state.seats() {
                if !self.state.players()[i].in_hand() {
                    continue;
                }
                let hole = self.deck.draw_n(down);
                let shown = self.deck.draw_n(up);
                self.state.player_mut(i).deal_hole(hole);
                self.state.player_mut(i).deal_shown(shown);
            }
        }
        self.state.set_stage(street);
    }

    /// First to act on a fresh street, or `None` when nobody can.
    pub(crate) fn street_leader(&self, street: Stage) -> Option<usize> {
        if self.state.variant().is_stud() {
            // highest showing up-hand leads from fourth street on
            let lead = self
                .state
                .players()
                .iter()
                .enumerate()
                .filter(|(_, p)| p.in_hand())
                .max_by(|(i, a), (j, b)| {
                    let sa = pit_cards::Strength::from(pit_cards::CardSet::from(a.shown()));
                    let sb = pit_cards::Strength::from(pit_cards::CardSet::from(b.shown()));
                    sa.cmp(&sb).then(j.cmp(i))
                })
                .map(|(i, _)| i)?;
            if self.state.players()[lead].can_act() && !self.state.is_round_complete() {
                Some(lead)
            } else {
                self.state.find_next_actor(lead)
            }
        } else {
            let _ = street;
            self.state.find_next_actor(self.state.dealer())
        }
    }

    fn win_by_fold(&mut self) -> Result<Progress, EngineError> {
        self.sweep_round();
        let pot = self.state.take_pot();
        let index = self
            .state
            .players()
            .iter()
            .position(|p| p.in_hand())
            .expect("one survivor");
        self.state.player_mut(index).win(pot);
        let winner = self.state.players()[index].id();
        self.state.set_to_act(None);
        self.state.set_stage(Stage::Complete);
        self.settlement = Some(Settlement {
            payouts: vec![Payout { player: winner, chips: pot }],
            pots: Vec::new(),
            descriptions: BTreeMap::new(),
        });
        log::debug!("[engine {}] win by fold: P{} takes {}", self.state.table(), index, pot);
        Ok(Progress::HandOver)
    }

    /// Scores the board, distributes every pot, and completes the hand.
    /// Called internally when the river round closes and by the runout
    /// scheduler once reveals are done.
    pub fn finish_showdown(&mut self) -> Result<Settlement, EngineError> {
        self.guard()?;
        if self.state.rit().map(|r| r.enabled).unwrap_or(false) {
            return Err(EngineError::IllegalAction(
                "run-it-twice execution settles this hand".into(),
            ));
        }
        if !self.state.board_complete() {
            return Err(EngineError::IllegalAction("board incomplete".into()));
        }
        self.state.set_stage(Stage::Showdown);
        let contributions: Vec<Contribution> =
            self.state.players().iter().map(Contribution::from).collect();
        let pots = side_pots(&contributions, 0);
        let expected = self.state.pot();
        let total: Chips = pots.iter().map(|p| p.amount).sum();
        if total != expected {
            return self.poison(format!("side pots {} != pot {}", total, expected));
        }
        let board = self.state.board().to_vec();
        let scored = showdown::score(&self.state, &board);
        let shares = showdown::distribute(&self.state, &pots, &scored);
        let distributed: Chips = shares.iter().map(|(_, c)| c).sum();
        if distributed != expected {
            return self.poison(format!("distributed {} != pot {}", distributed, expected));
        }
        for (id, chips) in &shares {
            let index = self.state.index_of(*id)?;
            self.state.player_mut(index).win(*chips);
        }
        self.state.take_pot();
        self.state.set_to_act(None);
        let descriptions = scored
            .iter()
            .map(|s| (s.id, s.hi.to_string()))
            .collect::<BTreeMap<_, _>>();
        let settlement = Settlement {
            payouts: shares
                .into_iter()
                .map(|(player, chips)| Payout { player, chips })
                .collect(),
            pots,
            descriptions,
        };
        self.state.set_stage(Stage::Complete);
        self.settlement = Some(settlement.clone());
        Ok(settlement)
    }

    /// Deals the next undealt street during an all-in runout. The engine's
    /// own deck cursor serves the cards, so later rabbit previews stay
    /// consistent.
    pub fn reveal_next(&mut self) -> Result<(Stage, Vec<Card>), EngineError> {
        self.guard()?;
        if !self.is_locked() {
            return Err(EngineError::IllegalAction("no runout in progress".into()));
        }
        if self.state.rit_prompt().is_some() {
            return Err(EngineError::WaitingOnRit);
        }
        if self.state.board_complete() {
            return Err(EngineError::IllegalAction("board already complete".into()));
        }
        let street = self.state.variant().next_street(self.state.stage());
        let before = self.state.board().len();
        self.deal_street(street);
        let dealt = self.state.board()[before..].to_vec();
        Ok((street, dealt))
    }

    pub(crate) fn poison<T>(&mut self, reason: String) -> Result<T, EngineError> {
        log::error!("[engine {}] poisoned: {}", self.state.table(), reason);
        self.poisoned = true;
        Err(EngineError::Corrupt(reason))
    }
}
