use super::error::EngineError;
use super::player::Player;
use super::player::PlayerId;
use super::rit::RitDecider;
use super::rit::RitPrompt;
use super::rit::RitState;
use super::stage::Stage;
use super::variant::BettingMode;
use super::variant::Variant;
use pit_core::Chips;
use pit_core::ID;
use pit_core::Position;
use pit_core::Seq;
use pit_cards::Card;
use serde::Deserialize;
use serde::Serialize;

pub type TableId = ID<TableState>;

/// Static table configuration, fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub variant: Variant,
    pub betting: BettingMode,
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// Forced opening bet in stud games.
    pub bring_in: Chips,
    /// Whether enabling run-it-twice needs every live player's consent.
    pub require_rit_unanimous: bool,
    /// Which hand picks the run-it-twice decider.
    pub rit_decider: RitDecider,
}

impl TableConfig {
    /// Sanity-checks the stakes before a table opens.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.small_blind > 0, "small blind must be positive");
        anyhow::ensure!(
            self.big_blind >= self.small_blind,
            "big blind below the small blind"
        );
        anyhow::ensure!(self.bring_in > 0, "bring-in must be positive");
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Holdem,
            betting: BettingMode::NoLimit,
            small_blind: 5,
            big_blind: 10,
            bring_in: 5,
            require_rit_unanimous: false,
            rit_decider: RitDecider::Weakest,
        }
    }
}

/// The authoritative, serialisable state of one table.
///
/// Players sit in seat order; `dealer` indexes into that vector. Between
/// hands everything per-hand resets while stacks persist.
///
/// # Invariant
///
/// `Σ player.round_bet + pot` equals the chips committed to the hand, and
/// `Σ player.stack + pot + Σ player.round_bet` is constant from hand start
/// to hand end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    table: TableId,
    config: TableConfig,
    stage: Stage,
    players: Vec<Player>,
    to_act: Option<PlayerId>,
    pot: Chips,
    board: Vec<Card>,
    round_bet_high: Chips,
    min_raise: Chips,
    last_raise: Chips,
    dealer: Position,
    hand_no: u64,
    sequence: Seq,
    public_seed: String,
    hand_nonce: String,
    rit: Option<RitState>,
    rit_prompt: Option<RitPrompt>,
    rit_declined: bool,
    bring_in_seat: Option<Position>,
}

impl TableState {
    pub fn new(table: TableId, config: TableConfig) -> Self {
        Self {
            table,
            config,
            stage: Stage::Complete,
            players: Vec::new(),
            to_act: None,
            pot: 0,
            board: Vec::new(),
            round_bet_high: 0,
            min_raise: 0,
            last_raise: 0,
            dealer: 0,
            hand_no: 0,
            sequence: 0,
            public_seed: String::new(),
            hand_nonce: String::new(),
            rit: None,
            rit_prompt: None,
            rit_declined: false,
            bring_in_seat: None,
        }
    }
}

/// Read accessors.
impl TableState {
    pub fn table(&self) -> TableId {
        self.table
    }
    pub fn config(&self) -> &TableConfig {
        &self.config
    }
    pub fn variant(&self) -> Variant {
        self.config.variant
    }
    pub fn stage(&self) -> Stage {
        self.stage
    }
    pub fn players(&self) -> &[Player] {
        &self.players
    }
    pub fn to_act(&self) -> Option<PlayerId> {
        self.to_act
    }
    pub fn pot(&self) -> Chips {
        self.pot
    }
    pub fn board(&self) -> &[Card] {
        &self.board
    }
    pub fn round_bet_high(&self) -> Chips {
        self.round_bet_high
    }
    pub fn min_raise(&self) -> Chips {
        self.min_raise
    }
    pub fn last_raise(&self) -> Chips {
        self.last_raise
    }
    pub fn dealer(&self) -> Position {
        self.dealer
    }
    pub fn hand_no(&self) -> u64 {
        self.hand_no
    }
    pub fn sequence(&self) -> Seq {
        self.sequence
    }
    pub fn public_seed(&self) -> &str {
        &self.public_seed
    }
    pub fn hand_nonce(&self) -> &str {
        &self.hand_nonce
    }
    pub fn rit(&self) -> Option<&RitState> {
        self.rit.as_ref()
    }
    pub fn rit_prompt(&self) -> Option<&RitPrompt> {
        self.rit_prompt.as_ref()
    }
    pub fn rit_declined(&self) -> bool {
        self.rit_declined
    }
    pub fn bring_in_seat(&self) -> Option<Position> {
        self.bring_in_seat
    }
}

/// Player lookup.
impl TableState {
    pub fn player(&self, id: PlayerId) -> Result<&Player, EngineError> {
        self.players
            .iter()
            .find(|p| p.id() == id)
            .ok_or(EngineError::PlayerNotFound)
    }
    pub fn index_of(&self, id: PlayerId) -> Result<usize, EngineError> {
        self.players
            .iter()
            .position(|p| p.id() == id)
            .ok_or(EngineError::PlayerNotFound)
    }
    pub fn seats(&self) -> usize {
        self.players.len()
    }
}

/// Hand census.
impl TableState {
    /// Players still contesting the pot.
    pub fn in_hand_count(&self) -> usize {
        self.players.iter().filter(|p| p.in_hand()).count()
    }
    /// Players who can still make decisions.
    pub fn can_act_count(&self) -> usize {
        self.players.iter().filter(|p| p.can_act()).count()
    }
    pub fn any_all_in(&self) -> bool {
        self.players.iter().any(|p| p.is_all_in())
    }
    /// Chips in front of players this round.
    pub fn committed(&self) -> Chips {
        self.players.iter().map(|p| p.round_bet()).sum()
    }
    /// All chips on the table: the conserved quantity.
    pub fn total_chips(&self) -> Chips {
        self.pot + self.players.iter().map(|p| p.stack() + p.round_bet()).sum::<Chips>()
    }
    /// All board cards the variant will ever deal are out.
    pub fn board_complete(&self) -> bool {
        if self.variant().is_stud() {
            !self.stage.is_betting()
                || self.stage == *self.variant().policy().streets.last().expect("streets")
        } else {
            self.board.len() == pit_core::BOARD_SIZE
        }
    }
}

/// Turn order.
impl TableState {
    /// The betting round is over: every non-folded, non-all-in player has
    /// acted and matched the high bet, or nobody is left to respond to it.
    pub fn is_round_complete(&self) -> bool {
        let actionable: Vec<&Player> = self.players.iter().filter(|p| p.can_act()).collect();
        if actionable.len() <= 1 {
            // nobody can respond to a raise; only an unmatched bet keeps
            // the round open
            return actionable
                .iter()
                .all(|p| p.round_bet() >= self.round_bet_high);
        }
        actionable
            .iter()
            .all(|p| p.has_acted() && p.round_bet() == self.round_bet_high)
    }
    /// The next player to act clockwise from `from`, skipping folded,
    /// all-in, and already-matched actors. `None` when the round is done.
    pub fn find_next_actor(&self, from: Position) -> Option<usize> {
        if self.is_round_complete() {
            return None;
        }
        let n = self.players.len();
        (1..=n).map(|i| (from + i) % n).find(|&i| {
            let p = &self.players[i];
            p.can_act() && (!p.has_acted() || p.round_bet() < self.round_bet_high)
        })
    }
    /// Seat indices clockwise starting just past the dealer.
    pub fn clockwise_from_dealer(&self) -> impl Iterator<Item = usize> + '_ {
        let n = self.players.len();
        (1..=n).map(move |i| (self.dealer + i) % n)
    }
}

/// Controlled mutation, used by the flow and betting modules.
impl TableState {
    pub(crate) fn player_mut(&mut self, index: usize) -> &mut Player {
        &mut self.players[index]
    }
    pub(crate) fn players_mut(&mut self) -> &mut Vec<Player> {
        &mut self.players
    }
    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }
    pub(crate) fn set_to_act(&mut self, to_act: Option<PlayerId>) {
        self.to_act = to_act;
    }
    pub(crate) fn set_dealer(&mut self, dealer: Position) {
        self.dealer = dealer;
    }
    pub(crate) fn set_bring_in_seat(&mut self, seat: Option<Position>) {
        self.bring_in_seat = seat;
    }
    pub(crate) fn add_to_pot(&mut self, chips: Chips) {
        self.pot += chips;
    }
    pub(crate) fn take_pot(&mut self) -> Chips {
        std::mem::take(&mut self.pot)
    }
    pub(crate) fn board_mut(&mut self) -> &mut Vec<Card> {
        &mut self.board
    }
    pub(crate) fn set_round_bet_high(&mut self, chips: Chips) {
        self.round_bet_high = chips;
    }
    pub(crate) fn set_min_raise(&mut self, chips: Chips) {
        self.min_raise = chips;
    }
    pub(crate) fn set_last_raise(&mut self, chips: Chips) {
        self.last_raise = chips;
    }
    pub(crate) fn begin_hand(&mut self, public_seed: String) {
        self.hand_no += 1;
        self.public_seed = public_seed;
        self.hand_nonce = format!("hand-{}", self.hand_no);
        self.board.clear();
        self.pot = 0;
        self.round_bet_high = 0;
        self.min_raise = self.config.big_blind;
        self.last_raise = 0;
        self.rit = None;
        self.rit_prompt = None;
        self.rit_declined = false;
        self.bring_in_seat = None;
        for player in self.players.iter_mut() {
            player.reset_hand();
        }
    }
    pub(crate) fn set_rit(&mut self, rit: Option<RitState>) {
        self.rit = rit;
    }
    pub(crate) fn rit_mut(&mut self) -> Option<&mut RitState> {
        self.rit.as_mut()
    }
    pub(crate) fn set_rit_prompt(&mut self, prompt: Option<RitPrompt>) {
        self.rit_prompt = prompt;
    }
    pub(crate) fn set_rit_declined(&mut self, declined: bool) {
        self.rit_declined = declined;
    }
    pub fn bump_sequence(&mut self) -> Seq {
        self.sequence += 1;
        self.sequence
    }
}

impl pit_core::Unique for TableState {
    fn id(&self) -> ID<Self> {
        self.table
    }
}

/// Seating between hands.
impl TableState {
    /// Seats a player. Seats must be unique and hands must not be running.
    pub fn sit(&mut self, player: Player) -> Result<(), EngineError> {
        if self.stage.is_betting() {
            return Err(EngineError::IllegalAction("hand in progress".into()));
        }
        if player.seat() >= pit_core::MAX_SEATS {
            return Err(EngineError::IllegalAction("no such seat".into()));
        }
        if self.players.iter().any(|p| p.seat() == player.seat()) {
            return Err(EngineError::IllegalAction("seat taken".into()));
        }
        if self.players.iter().any(|p| p.id() == player.id()) {
            return Err(EngineError::IllegalAction("already seated".into()));
        }
        self.players.push(player);
        self.players.sort_by_key(|p| p.seat());
        Ok(())
    }
    /// Removes a player between hands, returning their stack.
    pub fn stand(&mut self, id: PlayerId) -> Result<Chips, EngineError> {
        if self.stage.is_betting() {
            return Err(EngineError::IllegalAction("hand in progress".into()));
        }
        let index = self.index_of(id)?;
        let player = self.players.remove(index);
        if self.dealer >= self.players.len() {
            self.dealer = 0;
        }
        Ok(player.stack())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(stacks: &[Chips]) -> TableState {
        let mut state = TableState::new(TableId::default(), TableConfig::default());
        for (seat, stack) in stacks.iter().enumerate() {
            state
                .sit(Player::new(PlayerId::default(), format!("p{}", seat), seat, *stack))
                .unwrap();
        }
        state
    }

    #[test]
    fn seats_are_unique() {
        let mut state = state_with(&[100, 100]);
        let dup = Player::new(PlayerId::default(), "dup", 1, 100);
        assert!(state.sit(dup).is_err());
    }

    #[test]
    fn players_sorted_by_seat() {
        let mut state = TableState::new(TableId::default(), TableConfig::default());
        state.sit(Player::new(PlayerId::default(), "b", 4, 100)).unwrap();
        state.sit(Player::new(PlayerId::default(), "a", 1, 100)).unwrap();
        let seats: Vec<_> = state.players().iter().map(|p| p.seat()).collect();
        assert_eq!(seats, vec![1, 4]);
    }

    #[test]
    fn stand_returns_stack() {
        let mut state = state_with(&[100, 250]);
        let id = state.players()[1].id();
        assert_eq!(state.stand(id).unwrap(), 250);
        assert_eq!(state.seats(), 1);
        assert_eq!(state.stand(id), Err(EngineError::PlayerNotFound));
    }

    #[test]
    fn round_completion_all_matched() {
        let mut state = state_with(&[100, 100, 100]);
        state.set_round_bet_high(10);
        for i in 0..3 {
            state.player_mut(i).commit(10);
            state.player_mut(i).mark_acted();
        }
        assert!(state.is_round_complete());
        assert_eq!(state.find_next_actor(0), None);
    }

    #[test]
    fn round_open_while_unmatched() {
        let mut state = state_with(&[100, 100, 100]);
        state.set_round_bet_high(20);
        state.player_mut(0).commit(20);
        state.player_mut(0).mark_acted();
        state.player_mut(1).commit(10);
        state.player_mut(1).mark_acted();
        assert!(!state.is_round_complete());
        // actor 1 has to respond to the raise despite having acted
        assert_eq!(state.find_next_actor(0), Some(1));
    }

    #[test]
    fn next_actor_skips_folded_and_all_in() {
        let mut state = state_with(&[100, 50, 100]);
        state.set_round_bet_high(50);
        state.player_mut(0).commit(50);
        state.player_mut(0).mark_acted();
        state.player_mut(1).commit(50); // all-in
        state.player_mut(2).fold();
        // only the all-in and folded players remain besides 0: round done
        assert!(state.is_round_complete());
        assert_eq!(state.find_next_actor(0), None);
    }

    #[test]
    fn single_actionable_player_facing_bet_still_acts() {
        let mut state = state_with(&[100, 60, 100]);
        state.set_round_bet_high(60);
        state.player_mut(1).commit(60); // all-in shove
        state.player_mut(2).fold();
        // player 0 must respond to the shove
        assert!(!state.is_round_complete());
        assert_eq!(state.find_next_actor(1), Some(0));
    }

    #[test]
    fn chip_conservation_accounting() {
        let mut state = state_with(&[100, 100]);
        let before = state.total_chips();
        state.player_mut(0).commit(25);
        assert_eq!(state.total_chips(), before);
        let committed = state.committed();
        state.add_to_pot(committed);
        state.player_mut(0).reset_round();
        assert_eq!(state.total_chips(), before);
    }
}
