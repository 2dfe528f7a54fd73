use pit_core::Chips;
use pit_cards::Card;
use pit_engine::PlayerId;
use pit_engine::RitRun;
use pit_engine::TableId;
use serde::Deserialize;
use serde::Serialize;

/// One winner's slice of a run-it-twice board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerShare {
    pub player: PlayerId,
    pub pot_share: Chips,
}

/// Append-only record of one executed run-it-twice board.
///
/// Natural key `(hand, board_number)`: re-emitting the same run is a no-op
/// for a conforming store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitOutcome {
    pub table: TableId,
    /// `table id : hand number`, unique per hand.
    pub hand: String,
    pub board_number: usize,
    pub community_cards: Vec<Card>,
    pub winners: Vec<WinnerShare>,
    pub pot_amount: Chips,
}

impl RitOutcome {
    /// Builds the record for one executed run.
    pub fn from_run(table: TableId, hand_no: u64, run: &RitRun) -> Self {
        Self {
            table,
            hand: format!("{}:{}", table, hand_no),
            board_number: run.number,
            community_cards: run.board.clone(),
            winners: run
                .winners
                .iter()
                .map(|p| WinnerShare {
                    player: p.player,
                    pot_share: p.chips,
                })
                .collect(),
            pot_amount: run.pot,
        }
    }
}
