use super::error::EngineError;
use super::flow::Engine;
use super::stage::Stage;
use pit_cards::Card;

/// Rabbit hunt: what would have come.
impl Engine {
    /// The community cards that **would** complete the board through
    /// `street`, given the deck's current cursor, without advancing engine
    /// state. Also returns the deck suffix left after those draws.
    ///
    /// Because reveals and previews share one authoritative cursor, a
    /// preview followed by actually dealing the street yields the same
    /// cards.
    pub fn rabbit_preview(&mut self, street: Stage) -> Result<(Vec<Card>, Vec<Card>), EngineError> {
        self.guard()?;
        if !self.state().variant().policy().community {
            return Err(EngineError::IllegalAction("no board in this variant".into()));
        }
        let target = street.board_target();
        let have = self.state().board().len();
        if target == 0 || target <= have {
            return Err(EngineError::IllegalAction(format!(
                "{} is already dealt",
                street
            )));
        }
        let mut fork = self.deck().fork();
        let cards = fork.draw_n(target - have);
        let remaining = fork.remaining().to_vec();
        self.mark_rabbit_previewed();
        Ok((cards, remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::PlayerAction;
    use crate::flow::tests::engine_with;
    use crate::flow::tests::seed;

    fn folded_out_engine() -> Engine {
        let mut engine = engine_with(&[500, 500]);
        engine.start_hand(seed(20), "ps".into()).unwrap();
        let dealer = engine.state().players()[0].id();
        engine.submit(dealer, PlayerAction::Fold).unwrap();
        engine
    }

    #[test]
    fn preview_counts_per_street() {
        let mut engine = folded_out_engine();
        let (flop, _) = engine.rabbit_preview(Stage::Flop).unwrap();
        assert_eq!(flop.len(), 3);
        let (turn, _) = engine.rabbit_preview(Stage::Turn).unwrap();
        assert_eq!(turn.len(), 4);
        let (river, rest) = engine.rabbit_preview(Stage::River).unwrap();
        assert_eq!(river.len(), 5);
        assert_eq!(rest.len(), engine.deck().len() - 5);
        assert!(engine.rabbit_previewed());
    }

    #[test]
    fn preview_does_not_move_the_cursor() {
        let mut engine = folded_out_engine();
        let before = engine.deck().remaining().to_vec();
        let (a, _) = engine.rabbit_preview(Stage::River).unwrap();
        let (b, _) = engine.rabbit_preview(Stage::River).unwrap();
        assert_eq!(a, b);
        assert_eq!(engine.deck().remaining(), &before[..]);
    }

    #[test]
    fn preview_matches_an_actual_runout() {
        // two engines from the same seed: previewing in one predicts the
        // runout dealt by the other
        let mut alpha = engine_with(&[500, 500]);
        alpha.start_hand(seed(21), "ps".into()).unwrap();
        let mut omega = alpha.clone();
        let (preview, _) = alpha.rabbit_preview(Stage::River).unwrap();
        let a = omega.state().players()[0].id();
        let b = omega.state().players()[1].id();
        omega.submit(a, PlayerAction::Raise { amount: 500 }).unwrap();
        omega.submit(b, PlayerAction::Call).unwrap();
        omega.reveal_next().unwrap();
        omega.reveal_next().unwrap();
        omega.reveal_next().unwrap();
        assert_eq!(omega.state().board(), &preview[..]);
    }

    #[test]
    fn preview_rejects_dealt_streets() {
        let mut engine = engine_with(&[500, 500]);
        engine.start_hand(seed(22), "ps".into()).unwrap();
        let a = engine.state().players()[0].id();
        let b = engine.state().players()[1].id();
        engine.submit(a, PlayerAction::Call).unwrap();
        engine.submit(b, PlayerAction::Check).unwrap();
        // flop is out
        assert!(engine.rabbit_preview(Stage::Flop).is_err());
        assert!(engine.rabbit_preview(Stage::Turn).is_ok());
    }
}
