use pit_core::Chips;
use pit_core::Millis;
use pit_core::Position;
use pit_core::Seq;
use pit_cards::Card;
use pit_engine::BettingMode;
use pit_engine::PlayerId;
use pit_engine::RitState;
use pit_engine::Stage;
use pit_engine::TableId;
use pit_engine::TableState;
use pit_engine::Variant;
use serde::Deserialize;
use serde::Serialize;

/// A player's state as one particular audience may see it.
///
/// `hole: None` means hidden, not empty. The count of concealed cards is
/// public knowledge at a physical table and stays public here via
/// `hole_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub seat: Position,
    pub stack: Chips,
    pub round_bet: Chips,
    pub has_acted: bool,
    pub folded: bool,
    pub all_in: bool,
    pub time_bank_ms: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<Vec<Card>>,
    pub hole_count: usize,
    /// Stud up-cards, always visible.
    pub shown: Vec<Card>,
}

/// The table as one audience may see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub table: TableId,
    pub variant: Variant,
    pub betting: BettingMode,
    pub stage: Stage,
    pub hand_no: u64,
    pub sequence: Seq,
    pub dealer: Position,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub pot: Chips,
    pub board: Vec<Card>,
    pub round_bet_high: Chips,
    pub min_raise: Chips,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_act: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rit: Option<RitState>,
    pub players: Vec<PlayerView>,
}

/// True when concealed cards may be shown to everyone: a showdown was
/// reached (two or more contenders past betting), or an all-in runout is in
/// progress and no decisions remain. A hand won by folding everyone out
/// reveals nothing.
pub fn reveal_condition(state: &TableState) -> bool {
    if state.in_hand_count() < 2 {
        return false;
    }
    if !state.stage().is_betting() {
        return true;
    }
    state.to_act().is_none() && state.any_all_in()
}

/// Sanitises table state for an audience.
///
/// `audience: Some(p)` always sees p's own cards. Everyone else's down
/// cards are stripped unless [`reveal_condition`] holds, and even then only
/// players still in the hand are shown. `audience: None` is the room-wide broadcast
/// variant. Stud up-cards are public either way.
pub fn sanitize(state: &TableState, audience: Option<PlayerId>) -> TableView {
    let reveal = reveal_condition(state);
    TableView {
        table: state.table(),
        variant: state.variant(),
        betting: state.config().betting,
        stage: state.stage(),
        hand_no: state.hand_no(),
        sequence: state.sequence(),
        dealer: state.dealer(),
        small_blind: state.config().small_blind,
        big_blind: state.config().big_blind,
        pot: state.pot(),
        board: state.board().to_vec(),
        round_bet_high: state.round_bet_high(),
        min_raise: state.min_raise(),
        to_act: state.to_act(),
        rit: state.rit().cloned(),
        players: state
            .players()
            .iter()
            .map(|p| {
                let visible = audience == Some(p.id()) || (reveal && p.in_hand());
                PlayerView {
                    id: p.id(),
                    name: p.name().to_string(),
                    seat: p.seat(),
                    stack: p.stack(),
                    round_bet: p.round_bet(),
                    has_acted: p.has_acted(),
                    folded: p.is_folded(),
                    all_in: p.is_all_in(),
                    time_bank_ms: p.time_bank_ms(),
                    hole: visible.then(|| p.hole().to_vec()),
                    hole_count: p.hole().len(),
                    shown: p.shown().to_vec(),
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pit_engine::Engine;
    use pit_engine::Player;
    use pit_engine::PlayerAction;
    use pit_engine::TableConfig;

    fn engine(stacks: &[Chips]) -> Engine {
        let mut engine = Engine::new(TableId::default(), TableConfig::default());
        for (seat, stack) in stacks.iter().enumerate() {
            engine
                .sit(Player::new(PlayerId::default(), format!("p{}", seat), seat, *stack))
                .unwrap();
        }
        engine.start_hand([1; 32], "ps".into()).unwrap();
        engine
    }

    #[test]
    fn own_cards_only_while_betting() {
        let engine = engine(&[500, 500, 500]);
        let me = engine.state().players()[0].id();
        let view = sanitize(engine.state(), Some(me));
        assert_eq!(view.players[0].hole.as_ref().map(|h| h.len()), Some(2));
        assert!(view.players[1].hole.is_none());
        assert_eq!(view.players[1].hole_count, 2);
        assert!(view.players[2].hole.is_none());
    }

    #[test]
    fn broadcast_variant_hides_everyone() {
        let engine = engine(&[500, 500, 500]);
        let view = sanitize(engine.state(), None);
        assert!(view.players.iter().all(|p| p.hole.is_none()));
    }

    #[test]
    fn all_in_lock_reveals_contenders() {
        let mut engine = engine(&[500, 500]);
        let a = engine.state().players()[0].id();
        let b = engine.state().players()[1].id();
        engine.submit(a, PlayerAction::Raise { amount: 500 }).unwrap();
        engine.submit(b, PlayerAction::Call).unwrap();
        assert!(reveal_condition(engine.state()));
        let view = sanitize(engine.state(), None);
        assert!(view.players.iter().all(|p| p.hole.is_some()));
    }

    #[test]
    fn win_by_fold_reveals_nothing() {
        let mut engine = engine(&[500, 500]);
        let a = engine.state().players()[0].id();
        engine.submit(a, PlayerAction::Fold).unwrap();
        assert!(!reveal_condition(engine.state()));
        let view = sanitize(engine.state(), None);
        assert!(view.players.iter().all(|p| p.hole.is_none()));
    }

    #[test]
    fn folded_players_stay_hidden_at_showdown() {
        let mut engine = engine(&[500, 500, 500]);
        let utg = engine.state().players()[0].id();
        engine.submit(utg, PlayerAction::Fold).unwrap();
        let sb = engine.state().players()[1].id();
        let bb = engine.state().players()[2].id();
        engine.submit(sb, PlayerAction::Call).unwrap();
        engine.submit(bb, PlayerAction::Check).unwrap();
        while engine.state().stage().is_betting() {
            let actor = engine.state().to_act().unwrap();
            engine.submit(actor, PlayerAction::Check).unwrap();
        }
        let view = sanitize(engine.state(), None);
        assert!(view.players[0].hole.is_none()); // folded preflop
        assert!(view.players[1].hole.is_some());
        assert!(view.players[2].hole.is_some());
    }

    #[test]
    fn stud_up_cards_always_visible_down_never() {
        let mut engine = Engine::new(
            TableId::default(),
            TableConfig {
                variant: Variant::SevenStud,
                ..TableConfig::default()
            },
        );
        for seat in 0..2 {
            engine
                .sit(Player::new(PlayerId::default(), format!("p{}", seat), seat, 500))
                .unwrap();
        }
        engine.start_hand([2; 32], "ps".into()).unwrap();
        let view = sanitize(engine.state(), None);
        for p in &view.players {
            assert_eq!(p.shown.len(), 1);
            assert!(p.hole.is_none());
            assert_eq!(p.hole_count, 2);
        }
    }
}
