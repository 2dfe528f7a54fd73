use pit_core::Chips;
use pit_core::ID;
use pit_core::Millis;
use pit_core::Position;
use pit_cards::Card;
use serde::Deserialize;
use serde::Serialize;

pub type PlayerId = ID<Player>;

/// A seated player's state within a table.
///
/// Chip bookkeeping mirrors the physical table: `stack` is behind,
/// `round_bet` is in front for the current street, `spent` is everything
/// committed this hand (what side-pot layers are built from). `hole` is the
/// private down cards; `shown` is the public stud up-cards.
///
/// # Invariants
///
/// - `stack >= 0`
/// - `all_in ⇒ stack == 0`
/// - `folded ⇒ has_acted`
/// - a player whose stack hits zero on a wager becomes `all_in`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    seat: Position,
    stack: Chips,
    round_bet: Chips,
    spent: Chips,
    hole: Vec<Card>,
    shown: Vec<Card>,
    has_acted: bool,
    folded: bool,
    all_in: bool,
    time_bank_ms: Millis,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, seat: Position, stack: Chips) -> Self {
        Self {
            id,
            name: name.into(),
            seat,
            stack,
            round_bet: 0,
            spent: 0,
            hole: Vec::new(),
            shown: Vec::new(),
            has_acted: false,
            folded: false,
            all_in: false,
            time_bank_ms: 0,
        }
    }
    pub fn id(&self) -> PlayerId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn seat(&self) -> Position {
        self.seat
    }
    pub fn stack(&self) -> Chips {
        self.stack
    }
    /// Chips committed this betting round.
    pub fn round_bet(&self) -> Chips {
        self.round_bet
    }
    /// Chips committed this hand.
    pub fn spent(&self) -> Chips {
        self.spent
    }
    pub fn hole(&self) -> &[Card] {
        &self.hole
    }
    pub fn shown(&self) -> &[Card] {
        &self.shown
    }
    pub fn has_acted(&self) -> bool {
        self.has_acted
    }
    pub fn is_folded(&self) -> bool {
        self.folded
    }
    pub fn is_all_in(&self) -> bool {
        self.all_in
    }
    pub fn time_bank_ms(&self) -> Millis {
        self.time_bank_ms
    }
    /// Still contesting the pot.
    pub fn in_hand(&self) -> bool {
        !self.folded
    }
    /// Able to make further decisions.
    pub fn can_act(&self) -> bool {
        !self.folded && !self.all_in
    }

    /// Commits chips from stack into the round bet, going all-in when the
    /// stack runs dry. Returns what was actually committed.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        let paid = amount.min(self.stack);
        self.stack -= paid;
        self.round_bet += paid;
        self.spent += paid;
        if self.stack == 0 {
            self.all_in = true;
        }
        paid
    }
    pub fn win(&mut self, amount: Chips) {
        self.stack += amount;
    }
    pub fn fold(&mut self) {
        self.folded = true;
        self.has_acted = true;
    }
    pub fn mark_acted(&mut self) {
        self.has_acted = true;
    }
    /// Reopens the action for this player after a full raise.
    pub fn unmark_acted(&mut self) {
        if self.can_act() {
            self.has_acted = false;
        }
    }
    pub fn deal_hole(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.hole.extend(cards);
    }
    pub fn deal_shown(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.shown.extend(cards);
    }
    pub fn set_time_bank(&mut self, ms: Millis) {
        self.time_bank_ms = ms;
    }

    /// Street transition: bets sweep into the pot, everyone gets a fresh
    /// turn. Folded players keep `has_acted` so the invariant holds.
    pub fn reset_round(&mut self) {
        self.round_bet = 0;
        if self.can_act() {
            self.has_acted = false;
        }
    }
    /// Hand transition: cards and per-hand flags clear, the stack persists.
    pub fn reset_hand(&mut self) {
        self.round_bet = 0;
        self.spent = 0;
        self.hole.clear();
        self.shown.clear();
        self.has_acted = false;
        self.folded = false;
        self.all_in = false;
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} (seat {}, ${})", self.name, self.seat, self.stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(stack: Chips) -> Player {
        Player::new(PlayerId::default(), "p", 0, stack)
    }

    #[test]
    fn commit_moves_chips() {
        let mut p = player(100);
        assert_eq!(p.commit(30), 30);
        assert_eq!(p.stack(), 70);
        assert_eq!(p.round_bet(), 30);
        assert_eq!(p.spent(), 30);
        assert!(!p.is_all_in());
    }

    #[test]
    fn short_commit_goes_all_in() {
        let mut p = player(20);
        assert_eq!(p.commit(50), 20);
        assert_eq!(p.stack(), 0);
        assert!(p.is_all_in());
        assert!(!p.can_act());
    }

    #[test]
    fn folding_sets_has_acted() {
        let mut p = player(100);
        p.fold();
        assert!(p.is_folded());
        assert!(p.has_acted());
        assert!(!p.can_act());
    }

    #[test]
    fn round_reset_keeps_folded_acted() {
        let mut p = player(100);
        p.fold();
        p.reset_round();
        assert!(p.has_acted());
        let mut q = player(100);
        q.commit(10);
        q.mark_acted();
        q.reset_round();
        assert!(!q.has_acted());
        assert_eq!(q.round_bet(), 0);
        assert_eq!(q.spent(), 10);
    }

    #[test]
    fn hand_reset_preserves_stack() {
        let mut p = player(100);
        p.commit(40);
        p.fold();
        p.reset_hand();
        assert_eq!(p.stack(), 60);
        assert!(!p.is_folded());
        assert_eq!(p.spent(), 0);
    }
}
