use super::error::EngineError;
use super::flow::Engine;
use super::player::PlayerId;
use super::pots::Contribution;
use super::pots::SidePot;
use super::pots::side_pots;
use super::showdown::Payout;
use super::showdown::Settlement;
use super::showdown::distribute;
use super::showdown::hi_strength;
use super::showdown::score;
use super::stage::Stage;
use pit_core::Chips;
use pit_audit::SeedChain;
use pit_cards::Card;
use pit_cards::CardSet;
use pit_cards::Strength;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Which hand picks the run-it-twice decider.
///
/// Both conventions exist in live rooms: prompt the player currently behind
/// (`Weakest`, the default here) or the strongest hand that is still losing
/// (`Strongest`). Ties break by a uniform random choice over the tied set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RitDecider {
    Weakest,
    Strongest,
}

/// The offer extended when an all-in lock makes extra boards possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitPrompt {
    /// Who decides.
    pub player: PlayerId,
    pub eligible: Vec<PlayerId>,
    /// Current hand description per contender.
    pub descriptions: BTreeMap<PlayerId, String>,
    /// Board cards already visible when the prompt was issued.
    pub board_cards: usize,
}

/// One executed run-it-twice board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitRun {
    pub number: usize,
    pub board: Vec<Card>,
    pub winners: Vec<Payout>,
    pub pot: Chips,
}

/// Run-it-twice state, from enablement through execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitState {
    pub enabled: bool,
    pub runs: usize,
    /// Audited seeds and commitment chain.
    pub chain: SeedChain,
    pub boards: Vec<Vec<Card>>,
    pub results: Vec<Vec<PlayerId>>,
    pub shares: Vec<Chips>,
    pub consents: BTreeSet<PlayerId>,
}

/// Run-it-twice control.
impl Engine {
    /// Computes the prompt that should be issued right now, if any: the
    /// table is runout-eligible, nobody has enabled or declined yet, and
    /// the variant has a board to re-run.
    pub fn compute_rit_prompt(&self) -> Option<RitPrompt> {
        if !self.is_auto_runout_eligible()
            || !self.state().variant().policy().community
            || self.state().rit().is_some()
            || self.state().rit_prompt().is_some()
            || self.state().rit_declined()
        {
            return None;
        }
        let board = self.state().board().to_vec();
        let contenders: Vec<(PlayerId, Strength)> = self
            .state()
            .players()
            .iter()
            .filter(|p| p.in_hand())
            .map(|p| (p.id(), hi_strength(self.state().variant(), p, &board)))
            .collect();
        let player = self.pick_decider(&contenders)?;
        Some(RitPrompt {
            player,
            eligible: contenders.iter().map(|(id, _)| *id).collect(),
            descriptions: contenders
                .iter()
                .map(|(id, s)| (*id, s.to_string()))
                .collect(),
            board_cards: self.state().board().len(),
        })
    }
    /// Computes and records the prompt; actions are refused until the
    /// decider answers.
    pub fn issue_rit_prompt(&mut self) -> Option<RitPrompt> {
        let prompt = self.compute_rit_prompt()?;
        self.state_mut().set_rit_prompt(Some(prompt.clone()));
        log::debug!("[engine {}] rit prompt to {}", self.state().table(), prompt.player);
        Some(prompt)
    }
    fn pick_decider(&self, contenders: &[(PlayerId, Strength)]) -> Option<PlayerId> {
        if contenders.is_empty() {
            return None;
        }
        let chosen: Vec<PlayerId> = match self.state().config().rit_decider {
            RitDecider::Weakest => {
                let weakest = contenders.iter().map(|(_, s)| *s).min()?;
                contenders
                    .iter()
                    .filter(|(_, s)| *s == weakest)
                    .map(|(id, _)| *id)
                    .collect()
            }
            RitDecider::Strongest => {
                let best = contenders.iter().map(|(_, s)| *s).max()?;
                let losers: Vec<&(PlayerId, Strength)> =
                    contenders.iter().filter(|(_, s)| *s < best).collect();
                match losers.iter().map(|(_, s)| *s).max() {
                    Some(top) => losers
                        .iter()
                        .filter(|(_, s)| *s == top)
                        .map(|(id, _)| *id)
                        .collect(),
                    // everyone is tied; any contender may decide
                    None => contenders.iter().map(|(id, _)| *id).collect(),
                }
            }
        };
        let pick = rand::rng().random_range(0..chosen.len());
        chosen.get(pick).copied()
    }

    /// Records a player's consent for unanimity tables.
    pub fn consent_rit(&mut self, id: PlayerId) -> Result<(), EngineError> {
        let player = self.state().player(id)?;
        if !player.in_hand() {
            return Err(EngineError::IllegalAction("folded players have no say".into()));
        }
        self.consents_mut().insert(id);
        Ok(())
    }

    /// The prompted decider turns the offer down; the hand runs out once
    /// on the single board.
    pub fn decline_rit(&mut self, id: PlayerId) -> Result<(), EngineError> {
        match self.state().rit_prompt() {
            Some(prompt) if prompt.player == id => {
                self.state_mut().set_rit_prompt(None);
                self.state_mut().set_rit_declined(true);
                Ok(())
            }
            Some(_) => Err(EngineError::IllegalAction("not the prompted player".into())),
            None => Err(EngineError::IllegalAction("no prompt pending".into())),
        }
    }

    /// Enables run-it-twice: allocates the audited seeds and freezes the
    /// deck baseline all runs fork from.
    ///
    /// Only possible while the board is incomplete and before showdown;
    /// `runs` is capped by the live player count. Unanimity tables require
    /// every non-folded player's recorded consent (the requester's is
    /// implied).
    pub fn enable_rit(&mut self, id: PlayerId, runs: usize) -> Result<RitState, EngineError> {
        self.guard()?;
        self.state().player(id)?;
        if !self.state().variant().policy().community {
            return Err(EngineError::IllegalAction("no board to re-run".into()));
        }
        if self.state().rit().is_some() {
            return Err(EngineError::IllegalAction("already enabled".into()));
        }
        if self.state().rit_declined() {
            return Err(EngineError::IllegalAction("declined for this hand".into()));
        }
        if !self.state().stage().is_betting() || self.state().board_complete() {
            return Err(EngineError::IllegalAction("board already complete".into()));
        }
        let cap = self.state().in_hand_count().max(1);
        if runs < 1 || runs > cap {
            return Err(EngineError::IllegalAction(format!("runs must be 1..={}", cap)));
        }
        self.consents_mut().insert(id);
        if self.state().config().require_rit_unanimous {
            let missing = self
                .state()
                .players()
                .iter()
                .filter(|p| p.in_hand())
                .any(|p| !self.rit_consents().contains(&p.id()));
            if missing {
                return Err(EngineError::IllegalAction("awaiting unanimous consent".into()));
            }
        }
        let chain = SeedChain::derive(
            self.state().public_seed(),
            self.state().hand_nonce(),
            runs,
        );
        let rit = RitState {
            enabled: true,
            runs,
            chain,
            boards: Vec::new(),
            results: Vec::new(),
            shares: Vec::new(),
            consents: self.rit_consents().clone(),
        };
        self.rit_baseline = Some(self.deck().fork());
        self.state_mut().set_rit(Some(rit.clone()));
        self.state_mut().set_rit_prompt(None);
        log::info!("[engine {}] rit enabled, {} runs", self.state().table(), runs);
        Ok(rit)
    }

    /// Deals every enabled run, scores each board, and distributes each
    /// run's pot share.
    ///
    /// Run `i` forks the frozen baseline minus the cards earlier runs
    /// consumed, then re-shuffles with `seed_i` — draws are
    /// seed-deterministic and boards can never overlap. Each side pot
    /// contributes `floor(amount / runs)` per run, with the last run
    /// absorbing remainders, so the total distributed equals the pot
    /// exactly.
    pub fn run_it(&mut self) -> Result<Vec<RitRun>, EngineError> {
        self.guard()?;
        let rit = self
            .state()
            .rit()
            .cloned()
            .filter(|r| r.enabled)
            .ok_or_else(|| EngineError::IllegalAction("run-it-twice not enabled".into()))?;
        if !rit.boards.is_empty() {
            return Err(EngineError::IllegalAction("already executed".into()));
        }
        let baseline = self
            .rit_baseline
            .clone()
            .unwrap_or_else(|| self.deck().fork());
        let contributions: Vec<Contribution> =
            self.state().players().iter().map(Contribution::from).collect();
        let pots = side_pots(&contributions, 0);
        let expected = self.state().pot();
        let need = pit_core::BOARD_SIZE - self.state().board().len();
        let mut used = CardSet::empty();
        let mut runs = Vec::new();
        let mut boards = Vec::new();
        let mut results = Vec::new();
        let mut shares = Vec::new();
        let mut distributed_total: Chips = 0;
        for i in 0..rit.runs {
            let mut deck = baseline.without(&used).reshuffled(rit.chain.key(i));
            let drawn = deck.draw_n(need);
            for card in &drawn {
                used.insert(*card);
            }
            let board: Vec<Card> = self
                .state()
                .board()
                .iter()
                .copied()
                .chain(drawn)
                .collect();
            let scored = score(self.state(), &board);
            let scaled = Self::run_share(&pots, i, rit.runs);
            let run_pot: Chips = scaled.iter().map(|p| p.amount).sum();
            let payouts = distribute(self.state(), &scaled, &scored);
            distributed_total += payouts.iter().map(|(_, c)| c).sum::<Chips>();
            for (id, chips) in &payouts {
                let index = self.state().index_of(*id)?;
                self.state_mut().player_mut(index).win(*chips);
            }
            boards.push(board.clone());
            results.push(payouts.iter().map(|(id, _)| *id).collect());
            shares.push(run_pot);
            runs.push(RitRun {
                number: i + 1,
                board,
                winners: payouts
                    .into_iter()
                    .map(|(player, chips)| Payout { player, chips })
                    .collect(),
                pot: run_pot,
            });
        }
        if distributed_total != expected {
            return self.poison(format!(
                "rit distributed {} != pot {}",
                distributed_total, expected
            ));
        }
        self.state_mut().take_pot();
        self.state_mut().set_to_act(None);
        self.state_mut().set_stage(Stage::Complete);
        if let Some(state) = self.state_mut().rit_mut() {
            state.boards = boards;
            state.results = results;
            state.shares = shares;
        }
        self.store_settlement(Settlement {
            payouts: merge_runs(&runs),
            pots,
            descriptions: BTreeMap::new(),
        });
        log::info!("[engine {}] rit executed, {} runs", self.state().table(), rit.runs);
        Ok(runs)
    }

    /// Per-run slice of every pot: equal floors, last run absorbs.
    fn run_share(pots: &[SidePot], i: usize, runs: usize) -> Vec<SidePot> {
        pots.iter()
            .map(|pot| {
                let floor = pot.amount / runs as Chips;
                let amount = if i + 1 == runs {
                    pot.amount - floor * (runs as Chips - 1)
                } else {
                    floor
                };
                SidePot {
                    amount,
                    eligible: pot.eligible.clone(),
                }
            })
            .collect()
    }
}

fn merge_runs(runs: &[RitRun]) -> Vec<Payout> {
    let mut merged: Vec<Payout> = Vec::new();
    for payout in runs.iter().flat_map(|r| r.winners.iter()) {
        match merged.iter_mut().find(|p| p.player == payout.player) {
            Some(p) => p.chips += payout.chips,
            None => merged.push(*payout),
        }
    }
    merged
}
