use super::kicks::Kickers;
use super::rank::Rank;
use super::ranking::Ranking;
use super::set::CardSet;

/// Five-card hand evaluation over a card set.
///
/// Works from two summaries built in one pass: a per-rank multiplicity
/// histogram and a per-suit rank mask. Paired shapes (quads, boats, two
/// pair) read straight off the histogram; straights come from a run scan
/// over fourteen lanes with the ace counted at both ends; flushes from
/// whichever suit bucket holds five ranks. Evaluating up to seven cards
/// yields the best five-card hand because every summary spans the whole
/// set and the kicker trim keeps only what five cards can use.
pub struct Evaluator {
    ranks: u16,
    counts: [u8; 13],
    suits: [u16; 4],
}

impl From<CardSet> for Evaluator {
    fn from(set: CardSet) -> Self {
        let mut counts = [0u8; 13];
        let mut suits = [0u16; 4];
        for card in set.iter() {
            counts[u8::from(card.rank()) as usize] += 1;
            suits[u8::from(card.suit()) as usize] |= u16::from(card.rank());
        }
        Self {
            ranks: set.rank_mask(),
            counts,
            suits,
        }
    }
}

impl Evaluator {
    /// The best category this set makes. Panics on an empty set.
    pub fn category(&self) -> Ranking {
        let quads = self.with_multiplicity(4);
        let trips = self.with_multiplicity(3);
        let pairs = self.with_multiplicity(2);
        if let Some(flush) = self.flush_family() {
            // a straight flush settles it; a plain flush still ranks
            // below quads and full houses
            if !matches!(flush, Ranking::Flush(_)) {
                return flush;
            }
            if let Some(&quad) = quads.first() {
                return Ranking::FourOAK(quad);
            }
            if let Some(boat) = self.full_house(&trips, &pairs) {
                return boat;
            }
            return flush;
        }
        if let Some(&quad) = quads.first() {
            return Ranking::FourOAK(quad);
        }
        if let Some(boat) = self.full_house(&trips, &pairs) {
            return boat;
        }
        if let Some(top) = Self::straight_top(self.ranks) {
            return Ranking::Straight(top);
        }
        if let Some(&three) = trips.first() {
            return Ranking::ThreeOAK(three);
        }
        if pairs.len() >= 2 {
            return Ranking::TwoPair(pairs[0], pairs[1]);
        }
        if let Some(&pair) = pairs.first() {
            return Ranking::OnePair(pair);
        }
        debug_assert!(self.ranks != 0, "at least one card in set");
        Ranking::HighCard(Rank::from(self.ranks))
    }

    /// Tie-breaking ranks for the category, highest first, trimmed to what
    /// a five-card hand has room for.
    pub fn kickers(&self, category: Ranking) -> Kickers {
        let (room, used) = match category {
            Ranking::HighCard(top) => (4, u16::from(top)),
            Ranking::OnePair(pair) => (3, u16::from(pair)),
            Ranking::ThreeOAK(three) => (2, u16::from(three)),
            Ranking::TwoPair(hi, lo) => (1, u16::from(hi) | u16::from(lo)),
            Ranking::FourOAK(quad) => (1, u16::from(quad)),
            // flush kickers come from the flush suit only
            Ranking::Flush(top) => {
                let suited = self.flush_suit().expect("flush has a suit");
                return Kickers::from(Self::top_ranks(suited & !u16::from(top), 4));
            }
            _ => return Kickers::default(),
        };
        Kickers::from(Self::top_ranks(self.ranks & !used, room))
    }

    /// Ranks present at least `m` times, descending.
    fn with_multiplicity(&self, m: u8) -> Vec<Rank> {
        (0..13u8)
            .rev()
            .filter(|&r| self.counts[r as usize] >= m)
            .map(Rank::from)
            .collect()
    }
    /// Full house from the shape lists: the best trips filled by the best
    /// other rank holding at least a pair (which may be a second trips).
    fn full_house(&self, trips: &[Rank], pairs: &[Rank]) -> Option<Ranking> {
        let three = *trips.first()?;
        let filler = pairs.iter().copied().find(|r| *r != three)?;
        Some(Ranking::FullHouse(three, filler))
    }
    /// The suit holding five or more ranks, if any.
    fn flush_suit(&self) -> Option<u16> {
        self.suits.iter().copied().find(|m| m.count_ones() >= 5)
    }
    /// Royal, straight flush, or plain flush, read from the flush suit's
    /// own rank mask.
    fn flush_family(&self) -> Option<Ranking> {
        let suited = self.flush_suit()?;
        Some(match Self::straight_top(suited) {
            Some(Rank::Ace) => Ranking::RoyalFlush,
            Some(top) => Ranking::StraightFlush(top),
            None => Ranking::Flush(Rank::from(suited)),
        })
    }
    /// Highest rank topping a five-long run in the mask. The scan walks
    /// fourteen lanes, lane 0 holding a copy of the ace so the wheel
    /// counts; lane `b` otherwise holds the rank below `b`.
    fn straight_top(mask: u16) -> Option<Rank> {
        let ace = u32::from(mask >> 12) & 1;
        let lanes = (u32::from(mask) << 1) | ace;
        let mut run = 0;
        let mut best = None;
        for lane in 0..14u32 {
            if lanes & (1u32 << lane) == 0 {
                run = 0;
                continue;
            }
            run += 1;
            if run >= 5 {
                best = Some(Rank::from(lane as u8 - 1));
            }
        }
        best
    }
    /// The `n` highest ranks of a mask.
    fn top_ranks(mask: u16, n: u32) -> u16 {
        let mut kept = mask;
        while kept.count_ones() > n {
            kept &= kept - 1;
        }
        kept
    }
}
