use super::action::PlayerAction;
use super::error::EngineError;
use super::player::PlayerId;
use super::table::TableState;
use super::variant::BettingMode;
use pit_core::Chips;
use pit_core::Position;

/// Betting legality and effects.
///
/// Amount conventions follow the wire: `Bet` and `Raise` carry the player's
/// total for the round. A wager that consumes the whole stack is always
/// admissible even under the minimum sizes; a short all-in raise does not
/// re-open the action for players who have already matched.
impl TableState {
    /// Chips this player needs to match the current high bet.
    pub fn to_call(&self, id: PlayerId) -> Result<Chips, EngineError> {
        let player = self.player(id)?;
        Ok((self.round_bet_high() - player.round_bet()).max(0))
    }
    /// Pot-limit ceiling on the round total after a bet or raise. The
    /// canonical rule: the raise increment may be at most the pot as it
    /// would stand after calling, so the cap on the total is
    /// `round_bet_high + (pot + committed bets + call)`.
    pub fn pot_limit_cap(&self, id: PlayerId) -> Result<Chips, EngineError> {
        let to_call = self.to_call(id)?;
        Ok(self.round_bet_high() + self.pot() + self.committed() + to_call)
    }
    /// Whether `action` is legal for `id` right now, assuming it is their
    /// turn. Turn ownership and hand liveness are the engine's checks.
    pub fn validate_action(&self, id: PlayerId, action: PlayerAction) -> Result<(), EngineError> {
        let player = self.player(id)?;
        let high = self.round_bet_high();
        let all_in_total = player.round_bet() + player.stack();
        match action {
            PlayerAction::Fold => Ok(()),
            PlayerAction::Check => {
                if high == player.round_bet() {
                    Ok(())
                } else {
                    Err(EngineError::IllegalAction("cannot check facing a bet".into()))
                }
            }
            PlayerAction::Call => {
                if high > player.round_bet() {
                    Ok(())
                } else {
                    Err(EngineError::IllegalAction("nothing to call".into()))
                }
            }
            PlayerAction::Bet { amount } => {
                if high != 0 {
                    return Err(EngineError::IllegalAction("facing a bet; raise instead".into()));
                }
                if amount <= 0 || amount > all_in_total {
                    return Err(EngineError::IllegalAction("bet exceeds stack".into()));
                }
                if amount < self.config().big_blind && amount != all_in_total {
                    return Err(EngineError::IllegalAction("bet below the minimum".into()));
                }
                self.check_pot_limit(id, amount)
            }
            PlayerAction::Raise { amount } => {
                if high == 0 {
                    return Err(EngineError::IllegalAction("nothing to raise; bet instead".into()));
                }
                // only a full raise re-opens the action: a player whose turn
                // came back after a short all-in may call or fold, not raise
                if player.has_acted() {
                    return Err(EngineError::IllegalAction("action not re-opened".into()));
                }
                if amount > all_in_total {
                    return Err(EngineError::IllegalAction("raise exceeds stack".into()));
                }
                if amount <= high {
                    return Err(EngineError::IllegalAction("raise must exceed the bet".into()));
                }
                if amount < high + self.min_raise() && amount != all_in_total {
                    return Err(EngineError::IllegalAction("raise below the minimum".into()));
                }
                self.check_pot_limit(id, amount)
            }
        }
    }
    fn check_pot_limit(&self, id: PlayerId, amount: Chips) -> Result<(), EngineError> {
        match self.config().betting {
            BettingMode::NoLimit => Ok(()),
            BettingMode::PotLimit => {
                if amount <= self.pot_limit_cap(id)? {
                    Ok(())
                } else {
                    Err(EngineError::IllegalAction("raise exceeds the pot limit".into()))
                }
            }
        }
    }

    /// Applies a validated action's chip effects and bookkeeping.
    pub(crate) fn apply_betting(&mut self, index: usize, action: PlayerAction) {
        let high = self.round_bet_high();
        let big_blind = self.config().big_blind;
        let min_raise = self.min_raise();
        let player = self.player_mut(index);
        match action {
            PlayerAction::Fold => player.fold(),
            PlayerAction::Check => player.mark_acted(),
            PlayerAction::Call => {
                let to_call = high - player.round_bet();
                player.commit(to_call);
                player.mark_acted();
            }
            PlayerAction::Bet { amount } | PlayerAction::Raise { amount } => {
                let pay = amount - player.round_bet();
                player.commit(pay);
                player.mark_acted();
                let new_high = player.round_bet();
                if new_high > high {
                    let raise = new_high - high;
                    // a full raise resets the minimum and re-opens the
                    // action; an all-in short raise does neither
                    if raise >= min_raise || (high == 0 && raise >= big_blind) {
                        self.set_min_raise(raise);
                        self.set_last_raise(raise);
                        self.reopen_action(index);
                    }
                    self.set_round_bet_high(new_high);
                }
            }
        }
    }
    fn reopen_action(&mut self, raiser: usize) {
        for i in 0..self.players().len() {
            if i != raiser {
                self.player_mut(i).unmark_acted();
            }
        }
    }

    /// Posts the blinds for a community-game hand. Heads-up: the dealer is
    /// the small blind. Short stacks post all-in; the amount owed stays
    /// nominal.
    pub(crate) fn post_blinds(&mut self) -> (Position, Position) {
        let n = self.players().len();
        let dealer = self.dealer();
        let (sb, bb) = if n == 2 {
            (dealer, (dealer + 1) % n)
        } else {
            ((dealer + 1) % n, (dealer + 2) % n)
        };
        let small = self.config().small_blind;
        let big = self.config().big_blind;
        self.player_mut(sb).commit(small);
        self.player_mut(bb).commit(big);
        self.set_round_bet_high(big);
        self.set_min_raise(big);
        self.set_last_raise(big);
        (sb, bb)
    }

    /// Posts the stud bring-in: the lowest up-card opens, forced. Rank
    /// breaks first, then the fixed suit order, so the choice is
    /// deterministic.
    pub(crate) fn post_bring_in(&mut self) -> Position {
        let index = self
            .players()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.in_hand())
            .min_by_key(|(_, p)| p.shown().first().copied())
            .map(|(i, _)| i)
            .expect("bring-in needs a live player");
        let bring_in = self.config().bring_in;
        let big = self.config().big_blind;
        self.player_mut(index).commit(bring_in);
        self.set_round_bet_high(bring_in);
        self.set_min_raise(big);
        self.set_last_raise(bring_in);
        self.set_bring_in_seat(Some(index));
        index
    }
}
