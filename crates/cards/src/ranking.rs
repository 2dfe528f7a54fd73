use super::rank::Rank;

/// A hand's category, ordered weakest to strongest.
///
/// Carries the defining rank(s) of the category; kicker cards live in
/// [`Kickers`] and break ties between equal rankings. `MAX` is a sentinel
/// upper bound used when sweeping showdown tiers from the top down.
///
/// [`Kickers`]: super::kicks::Kickers
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub enum Ranking {
    HighCard(Rank),        // 4 kickers
    OnePair(Rank),         // 3 kickers
    TwoPair(Rank, Rank),   // 1 kicker
    ThreeOAK(Rank),        // 2 kickers
    Straight(Rank),        // 0 kickers
    Flush(Rank),           // 4 kickers
    FullHouse(Rank, Rank), // 0 kickers
    FourOAK(Rank),         // 1 kicker
    StraightFlush(Rank),   // 0 kickers
    RoyalFlush,            // 0 kickers
    MAX,
}

impl Ranking {
    /// Category number 1 (high card) through 10 (royal flush).
    pub fn class(&self) -> u8 {
        match self {
            Ranking::HighCard(_) => 1,
            Ranking::OnePair(_) => 2,
            Ranking::TwoPair(_, _) => 3,
            Ranking::ThreeOAK(_) => 4,
            Ranking::Straight(_) => 5,
            Ranking::Flush(_) => 6,
            Ranking::FullHouse(_, _) => 7,
            Ranking::FourOAK(_) => 8,
            Ranking::StraightFlush(_) => 9,
            Ranking::RoyalFlush => 10,
            Ranking::MAX => unreachable!("sentinel"),
        }
    }
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Ranking::MAX => unreachable!("sentinel"),
            Ranking::HighCard(r) => write!(f, "{} High", r),
            Ranking::OnePair(r) => write!(f, "Pair of {}s", r),
            Ranking::TwoPair(r1, r2) => write!(f, "Two Pair, {}s and {}s", r1, r2),
            Ranking::ThreeOAK(r) => write!(f, "Three of a Kind, {}s", r),
            Ranking::Straight(r) => write!(f, "Straight to {}", r),
            Ranking::Flush(r) => write!(f, "Flush, {} High", r),
            Ranking::FullHouse(r1, r2) => write!(f, "Full House, {}s over {}s", r1, r2),
            Ranking::FourOAK(r) => write!(f, "Four of a Kind, {}s", r),
            Ranking::StraightFlush(r) => write!(f, "Straight Flush to {}", r),
            Ranking::RoyalFlush => write!(f, "Royal Flush"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ordering() {
        assert!(Ranking::RoyalFlush > Ranking::StraightFlush(Rank::King));
        assert!(Ranking::StraightFlush(Rank::Five) > Ranking::FourOAK(Rank::Ace));
        assert!(Ranking::Flush(Rank::Two) > Ranking::Straight(Rank::Ace));
        assert!(Ranking::MAX > Ranking::RoyalFlush);
    }

    #[test]
    fn within_category_ordering() {
        assert!(Ranking::OnePair(Rank::Ace) > Ranking::OnePair(Rank::King));
        assert!(Ranking::TwoPair(Rank::Ace, Rank::Three) > Ranking::TwoPair(Rank::King, Rank::Queen));
    }

    #[test]
    fn classes_are_one_through_ten() {
        assert_eq!(Ranking::HighCard(Rank::Ace).class(), 1);
        assert_eq!(Ranking::RoyalFlush.class(), 10);
    }
}
