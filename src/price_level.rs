//! C3 — per-side sorted array of price levels. Binary search locates a level;
//! insertion/removal shift the tail. Typical active depth (dozens to
//! hundreds of distinct prices) keeps this cheaper in practice than a tree:
//! the common case is an append at (or near) the edge already in cache.

use crate::types::{Price, PriceLevel, Side, L_MAX};

pub struct PriceLevelTable {
    side: Side,
    levels: Vec<PriceLevel>,
}

impl PriceLevelTable {
    pub fn new(side: Side) -> Self {
        PriceLevelTable {
            side,
            levels: Vec::with_capacity(64.min(L_MAX)),
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[inline]
    pub fn best(&self) -> Option<&PriceLevel> {
        self.levels.first()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> &PriceLevel {
        &self.levels[idx]
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> &mut PriceLevel {
        &mut self.levels[idx]
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, PriceLevel> {
        self.levels.iter()
    }

    /// Ordering used to keep `levels` sorted best-first for this side.
    #[inline]
    fn better(&self, a: Price, b: Price) -> bool {
        match self.side {
            Side::Buy => a > b,
            Side::Sell => a < b,
        }
    }

    /// Binary search for `price`. `Ok(idx)` if present, `Err(idx)` for the
    /// insertion point that keeps the array sorted.
    pub fn find(&self, price: Price) -> Result<usize, usize> {
        self.levels.binary_search_by(|level| {
            if level.price == price {
                std::cmp::Ordering::Equal
            } else if self.better(level.price, price) {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Greater
            }
        })
    }

    /// Finds the level at `price`, creating it (sorted insert) if absent.
    /// Returns the level's index.
    pub fn find_or_insert(&mut self, price: Price) -> usize {
        match self.find(price) {
            Ok(idx) => idx,
            Err(idx) => {
                debug_assert!(
                    self.levels.len() < L_MAX,
                    "price level table exceeded L_MAX"
                );
                self.levels.insert(idx, PriceLevel::new(price));
                idx
            }
        }
    }

    /// Removes an emptied level.
    pub fn remove(&mut self, idx: usize) {
        debug_assert!(self.levels[idx].is_empty());
        self.levels.remove(idx);
    }

    #[cfg(test)]
    pub fn is_sorted(&self) -> bool {
        self.levels.windows(2).all(|w| self.better(w[0].price, w[1].price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bids_sort_descending() {
        let mut t = PriceLevelTable::new(Side::Buy);
        t.find_or_insert(10);
        t.find_or_insert(12);
        t.find_or_insert(11);
        let prices: Vec<_> = t.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![12, 11, 10]);
        assert!(t.is_sorted());
    }

    #[test]
    fn asks_sort_ascending() {
        let mut t = PriceLevelTable::new(Side::Sell);
        t.find_or_insert(10);
        t.find_or_insert(8);
        t.find_or_insert(9);
        let prices: Vec<_> = t.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![8, 9, 10]);
        assert!(t.is_sorted());
    }

    #[test]
    fn find_or_insert_is_idempotent_for_existing_price() {
        let mut t = PriceLevelTable::new(Side::Buy);
        let a = t.find_or_insert(10);
        let b = t.find_or_insert(10);
        assert_eq!(a, b);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn remove_shifts_tail_down() {
        let mut t = PriceLevelTable::new(Side::Buy);
        t.find_or_insert(10);
        t.find_or_insert(9);
        t.remove(0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0).price, 9);
    }
}
