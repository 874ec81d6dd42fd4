//! Primary bid storage and the per-item indices.

use adx_core::models::{AdslotId, AdunitId, Bid, BidId, BidState};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::hash::Hash;

/// Append-only sequences of bid ids, keyed by item.
///
/// Iteration over the keys follows first insertion, so listings are stable.
#[derive(Debug)]
pub(crate) struct Index<K: Eq + Hash>(IndexMap<K, Vec<BidId>, FxBuildHasher>);

impl<K: Eq + Hash> Default for Index<K> {
    fn default() -> Self {
        Self(IndexMap::default())
    }
}

impl<K: Eq + Hash> Index<K> {
    pub fn append(&mut self, key: K, bid_id: BidId) {
        self.0.entry(key).or_default().push(bid_id);
    }

    pub fn get(&self, key: &K) -> &[BidId] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

/// The bid arena plus the two secondary indices.
///
/// A bid's id is its position in the arena plus one, so ids are dense and
/// lookups are direct. Bids are never removed.
#[derive(Debug, Default)]
pub(crate) struct BidBook {
    bids: Vec<Bid>,
    by_adunit: Index<AdunitId>,
    by_adslot: Index<AdslotId>,
}

impl BidBook {
    /// The id the next inserted bid will receive
    pub fn next_id(&self) -> BidId {
        BidId(self.bids.len() as u64 + 1)
    }

    /// Store a freshly opened bid and index it under its ad unit.
    pub fn insert(&mut self, bid: Bid) -> &Bid {
        debug_assert_eq!(bid.id, self.next_id());
        debug_assert_eq!(bid.state, BidState::Open);
        self.by_adunit.append(bid.adunit_id, bid.id);
        let position = self.bids.len();
        self.bids.push(bid);
        &self.bids[position]
    }

    fn position(bid_id: BidId) -> Option<usize> {
        bid_id
            .0
            .checked_sub(1)
            .and_then(|position| usize::try_from(position).ok())
    }

    pub fn get(&self, bid_id: BidId) -> Option<&Bid> {
        Self::position(bid_id).and_then(|position| self.bids.get(position))
    }

    pub fn get_mut(&mut self, bid_id: BidId) -> Option<&mut Bid> {
        Self::position(bid_id).and_then(|position| self.bids.get_mut(position))
    }

    /// Record that `bid_id` was accepted into `adslot_id`.
    pub fn bind_adslot(&mut self, adslot_id: AdslotId, bid_id: BidId) {
        self.by_adslot.append(adslot_id, bid_id);
    }

    pub fn by_adunit(&self, adunit_id: AdunitId) -> &[BidId] {
        self.by_adunit.get(&adunit_id)
    }

    pub fn by_adslot(&self, adslot_id: AdslotId) -> &[BidId] {
        self.by_adslot.get(&adslot_id)
    }

    /// The subsequence of `ids` whose bids are currently in `state`.
    pub fn filter(&self, ids: &[BidId], state: BidState) -> Vec<BidId> {
        ids.iter()
            .copied()
            .filter(|id| self.get(*id).is_some_and(|bid| bid.state == state))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bid> {
        self.bids.iter()
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adx_core::models::{Address, ContentId};

    fn bid(id: u64, adunit: u64) -> Bid {
        Bid {
            id: BidId(id),
            state: BidState::Open,
            advertiser: Address([2; 20]),
            adunit_id: AdunitId(adunit),
            adunit_snapshot: ContentId([0; 32]),
            advertiser_peer: String::new(),
            target: 0,
            reward_amount: 10,
            timeout_seconds: 0,
            acceptance: None,
            adv_report: None,
            pub_report: None,
        }
    }

    #[test]
    fn test_ids_are_positions() {
        let mut book = BidBook::default();
        assert_eq!(book.next_id(), BidId(1));
        book.insert(bid(1, 7));
        book.insert(bid(2, 8));
        assert_eq!(book.next_id(), BidId(3));

        assert!(book.get(BidId(0)).is_none());
        assert_eq!(book.get(BidId(2)).map(|b| b.adunit_id), Some(AdunitId(8)));
        assert!(book.get(BidId(3)).is_none());
        assert!(book.get(BidId(u64::MAX)).is_none());
    }

    #[test]
    fn test_indices_are_append_only() {
        let mut book = BidBook::default();
        for id in 1..=3 {
            book.insert(bid(id, 1));
        }
        book.bind_adslot(AdslotId(5), BidId(3));
        book.bind_adslot(AdslotId(5), BidId(1));

        assert_eq!(book.by_adunit(AdunitId(1)), &[BidId(1), BidId(2), BidId(3)]);
        assert_eq!(book.by_adslot(AdslotId(5)), &[BidId(3), BidId(1)]);
        assert!(book.by_adunit(AdunitId(2)).is_empty());
        assert!(book.by_adslot(AdslotId(1)).is_empty());
    }

    #[test]
    fn test_filter_preserves_order() {
        let mut book = BidBook::default();
        for id in 1..=4 {
            book.insert(bid(id, 1));
        }
        book.get_mut(BidId(2)).unwrap().state = BidState::Canceled;
        book.get_mut(BidId(4)).unwrap().state = BidState::Canceled;

        let all = book.by_adunit(AdunitId(1)).to_vec();
        assert_eq!(book.filter(&all, BidState::Canceled), vec![BidId(2), BidId(4)]);
        assert_eq!(book.filter(&all, BidState::Open), vec![BidId(1), BidId(3)]);
        assert!(book.filter(&all, BidState::Claimed).is_empty());
    }
}
