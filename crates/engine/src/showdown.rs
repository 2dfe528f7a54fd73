use super::player::Player;
use super::player::PlayerId;
use super::pots::SidePot;
use super::pots::split;
use super::table::TableState;
use super::variant::Variant;
use pit_core::Chips;
use pit_cards::Card;
use pit_cards::CardSet;
use pit_cards::Low;
use pit_cards::Strength;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// A player's share of the distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub player: PlayerId,
    pub chips: Chips,
}

/// The result of settling a hand: who won what, out of which pots, with
/// which hands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub payouts: Vec<Payout>,
    pub pots: Vec<SidePot>,
    /// Hand descriptions for every player still in the hand.
    pub descriptions: BTreeMap<PlayerId, String>,
}

/// A scored contender.
#[derive(Debug, Clone)]
pub(crate) struct Scored {
    pub index: usize,
    pub id: PlayerId,
    pub hi: Strength,
    pub lo: Low,
}

/// Evaluates a player's high hand under the variant's rules.
pub(crate) fn hi_strength(variant: Variant, player: &Player, board: &[Card]) -> Strength {
    let policy = variant.policy();
    let hole: CardSet = player.hole().into();
    if !policy.community {
        let shown: CardSet = player.shown().into();
        Strength::from(CardSet::add(hole, shown))
    } else if policy.omaha {
        Strength::omaha(hole, board.into())
    } else {
        Strength::from(CardSet::add(hole, board.into()))
    }
}

/// Evaluates a player's low hand, or no-low for high-only variants.
pub(crate) fn lo_strength(variant: Variant, player: &Player, board: &[Card]) -> Low {
    let policy = variant.policy();
    if !policy.hi_lo {
        return Low::none();
    }
    let hole: CardSet = player.hole().into();
    if !policy.community {
        let shown: CardSet = player.shown().into();
        Low::eval(CardSet::add(hole, shown))
    } else if policy.omaha {
        Low::omaha(hole, board.into())
    } else {
        Low::eval(CardSet::add(hole, board.into()))
    }
}

/// Scores every player still in the hand against the given board.
pub(crate) fn score(state: &TableState, board: &[Card]) -> Vec<Scored> {
    let variant = state.variant();
    state
        .players()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.in_hand())
        .map(|(index, p)| Scored {
            index,
            id: p.id(),
            hi: hi_strength(variant, p, board),
            lo: lo_strength(variant, p, board),
        })
        .collect()
}

/// Distributes the given pots among the scored contenders.
///
/// Per pot: the best high hand takes it, split against the best qualifying
/// low when the variant plays Hi/Lo (odd chip to the high side). Ties split
/// equally; remainder chips go one at a time in ascending seat order
/// starting from the first eligible seat clockwise of the dealer.
pub(crate) fn distribute(
    state: &TableState,
    pots: &[SidePot],
    scored: &[Scored],
) -> Vec<(PlayerId, Chips)> {
    let hi_lo = state.variant().is_hi_lo();
    let mut payouts: Vec<(PlayerId, Chips)> = Vec::new();
    for pot in pots {
        let contenders: Vec<&Scored> = scored
            .iter()
            .filter(|s| pot.eligible.contains(&s.id))
            .collect();
        if contenders.is_empty() {
            continue;
        }
        let best_lo = contenders.iter().map(|s| s.lo).max().unwrap_or(Low::none());
        let (hi_amount, lo_amount) = if hi_lo && best_lo.qualifies() {
            // odd chip to the high side
            (pot.amount - pot.amount / 2, pot.amount / 2)
        } else {
            (pot.amount, 0)
        };
        let best_hi = contenders.iter().map(|s| s.hi).max().expect("contenders");
        let hi_winners = in_payout_order(
            state,
            contenders.iter().filter(|s| s.hi == best_hi).map(|s| s.index),
        );
        payouts.extend(split(hi_amount, &hi_winners));
        if lo_amount > 0 {
            let lo_winners = in_payout_order(
                state,
                contenders.iter().filter(|s| s.lo == best_lo).map(|s| s.index),
            );
            payouts.extend(split(lo_amount, &lo_winners));
        }
    }
    merge(payouts)
}

/// Orders winner indices clockwise from the seat after the dealer.
fn in_payout_order(state: &TableState, winners: impl Iterator<Item = usize>) -> Vec<PlayerId> {
    let winners: Vec<usize> = winners.collect();
    state
        .clockwise_from_dealer()
        .filter(|i| winners.contains(i))
        .map(|i| state.players()[i].id())
        .collect()
}

fn merge(payouts: Vec<(PlayerId, Chips)>) -> Vec<(PlayerId, Chips)> {
    let mut merged: Vec<(PlayerId, Chips)> = Vec::new();
    for (id, chips) in payouts {
        match merged.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, total)) => *total += chips,
            None => merged.push((id, chips)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use crate::table::TableConfig;
    use crate::table::TableId;
    use crate::variant::Variant;

    fn table(variant: Variant, holes: &[&str], board_cards: &str) -> (TableState, Vec<Card>) {
        let mut state = TableState::new(
            TableId::default(),
            TableConfig {
                variant,
                ..TableConfig::default()
            },
        );
        for (seat, hole) in holes.iter().enumerate() {
            let mut player = Player::new(PlayerId::default(), format!("p{}", seat), seat, 1000);
            player.deal_hole(Card::parse(hole).unwrap());
            state.sit(player).unwrap();
        }
        (state, Card::parse(board_cards).unwrap())
    }

    #[test]
    fn best_high_hand_takes_a_single_pot() {
        let (mut state, board) = table(
            Variant::Holdem,
            &["As Ah", "Kd Kc"],
            "2c 7d 9h Js Qd",
        );
        for i in 0..2 {
            state.player_mut(i).commit(100);
        }
        let scored = score(&state, &board);
        let pots = vec![SidePot {
            amount: 200,
            eligible: state.players().iter().map(|p| p.id()).collect(),
        }];
        let payouts = distribute(&state, &pots, &scored);
        assert_eq!(payouts, vec![(state.players()[0].id(), 200)]);
    }

    #[test]
    fn ties_split_with_remainder_to_early_seats() {
        // identical board plays for everyone: three-way chop of 250
        let (state, board) = table(
            Variant::Holdem,
            &["2c 3d", "2d 3h", "2h 3s"],
            "Ts Js Qs Ks As",
        );
        let pots = vec![SidePot {
            amount: 250,
            eligible: state.players().iter().map(|p| p.id()).collect(),
        }];
        let payouts = distribute(&state, &pots, &score(&state, &board));
        // dealer is seat 0, so seat 1 is first clockwise
        assert_eq!(
            payouts,
            vec![
                (state.players()[1].id(), 84),
                (state.players()[2].id(), 83),
                (state.players()[0].id(), 83),
            ]
        );
    }

    #[test]
    fn hi_lo_splits_with_odd_chip_high() {
        // p0 has the nut high (set of aces), p1 the nut low (wheel draw made)
        let (state, board) = table(
            Variant::OmahaHiLo,
            &["As Ah Kd Qc", "2s 3h 4d Kc"],
            "Ac 5d 8h Jc 7s",
        );
        let pots = vec![SidePot {
            amount: 101,
            eligible: state.players().iter().map(|p| p.id()).collect(),
        }];
        let payouts = distribute(&state, &pots, &score(&state, &board));
        let p0 = state.players()[0].id();
        let p1 = state.players()[1].id();
        assert!(payouts.contains(&(p0, 51)));
        assert!(payouts.contains(&(p1, 50)));
    }

    #[test]
    fn no_qualifying_low_ships_it_all_high() {
        let (state, board) = table(
            Variant::OmahaHiLo,
            &["As Ah Kd Qc", "9s Ts Jd Kc"],
            "Ac 9d Th Jc Qs",
        );
        let pots = vec![SidePot {
            amount: 100,
            eligible: state.players().iter().map(|p| p.id()).collect(),
        }];
        let payouts = distribute(&state, &pots, &score(&state, &board));
        assert_eq!(payouts.iter().map(|(_, c)| c).sum::<Chips>(), 100);
        assert_eq!(payouts.len(), 1);
    }

    #[test]
    fn layered_pots_with_folded_contributors_split_by_seat_order() {
        // bets 113/113/113/50/81, the last two folded, board plays for the
        // three survivors: layers of 250/124/96 chop three ways with
        // remainders to the earliest seats
        let (mut state, board) = table(
            Variant::Holdem,
            &["2c 3d", "2d 3h", "2h 3s", "4c 5d", "4d 5h"],
            "Ts Js Qs Ks As",
        );
        for (i, bet) in [113, 113, 113, 50, 81].into_iter().enumerate() {
            state.player_mut(i).commit(bet);
        }
        state.player_mut(3).fold();
        state.player_mut(4).fold();
        state.set_dealer(4); // seat 0 is first clockwise of the dealer
        let contributions: Vec<crate::pots::Contribution> =
            state.players().iter().map(crate::pots::Contribution::from).collect();
        let pots = crate::pots::side_pots(&contributions, 0);
        let payouts = distribute(&state, &pots, &score(&state, &board));
        let of = |i: usize| {
            payouts
                .iter()
                .find(|(id, _)| *id == state.players()[i].id())
                .map(|(_, c)| *c)
                .unwrap_or(0)
        };
        assert_eq!(of(0), 84 + 42 + 32);
        assert_eq!(of(1), 83 + 41 + 32);
        assert_eq!(of(2), 83 + 41 + 32);
        assert_eq!(of(3), 0);
        assert_eq!(of(4), 0);
        assert_eq!(payouts.iter().map(|(_, c)| c).sum::<Chips>(), 470);
    }

    #[test]
    fn stud_scores_hole_plus_shown() {
        let (mut state, _) = table(Variant::SevenStud, &["As Ah 2c", "Kd Kc 3d"], "");
        state.player_mut(0).deal_shown(Card::parse("Ad 7c 8d 9h").unwrap());
        state.player_mut(1).deal_shown(Card::parse("Kh 7d 8c 2h").unwrap());
        let scored = score(&state, &[]);
        // trips aces beat trips kings
        assert!(scored[0].hi > scored[1].hi);
    }
}
