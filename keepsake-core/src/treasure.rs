//! Treasure hunt index arithmetic.
//!
//! Inside `[start, end]` pages alternate code page / reward page, starting
//! with a code page. Gift `g` owns pages `start + 2g` and `start + 2g + 1`.
use serde::{Deserialize, Serialize};

/// Role of a page inside the treasure hunt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreasureSlot {
    Code { gift: usize },
    Reward { gift: usize },
}

impl TreasureSlot {
    #[must_use]
    pub const fn gift(self) -> usize {
        match self {
            Self::Code { gift } | Self::Reward { gift } => gift,
        }
    }

    #[must_use]
    pub const fn is_code(self) -> bool {
        matches!(self, Self::Code { .. })
    }

    #[must_use]
    pub const fn is_reward(self) -> bool {
        matches!(self, Self::Reward { .. })
    }
}

/// Inclusive page range forming the treasure hunt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasureRange {
    pub start: usize,
    pub end: usize,
}

impl TreasureRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn contains(&self, page: usize) -> bool {
        page >= self.start && page <= self.end
    }

    /// Number of pages in the range, or zero when inverted.
    #[must_use]
    pub const fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn gift_count(&self) -> usize {
        self.len() / 2
    }

    #[must_use]
    pub const fn slot(&self, page: usize) -> Option<TreasureSlot> {
        if !self.contains(page) {
            return None;
        }
        let offset = page - self.start;
        let gift = offset / 2;
        if offset % 2 == 0 {
            Some(TreasureSlot::Code { gift })
        } else {
            Some(TreasureSlot::Reward { gift })
        }
    }

    /// Page index of the code page for `gift`.
    #[must_use]
    pub const fn code_page(&self, gift: usize) -> usize {
        self.start + gift * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_treasure_page_has_exactly_one_role() {
        let range = TreasureRange::new(5, 30);
        assert_eq!(range.gift_count(), 13);
        for page in range.start..=range.end {
            let slot = range.slot(page).expect("inside range");
            assert_ne!(slot.is_code(), slot.is_reward(), "page {page}");
            assert_eq!(slot.gift(), (page - range.start) / 2);
        }
    }

    #[test]
    fn code_pages_pair_with_following_reward() {
        let range = TreasureRange::new(5, 30);
        for gift in 0..range.gift_count() {
            let code = range.code_page(gift);
            assert_eq!(range.slot(code), Some(TreasureSlot::Code { gift }));
            assert_eq!(range.slot(code + 1), Some(TreasureSlot::Reward { gift }));
        }
        assert_eq!(range.code_page(0), 5);
        assert_eq!(range.code_page(12), 29);
    }

    #[test]
    fn pages_outside_range_have_no_slot() {
        let range = TreasureRange::new(5, 30);
        assert!(range.slot(4).is_none());
        assert!(range.slot(31).is_none());
        assert!(TreasureRange::new(4, 3).is_empty());
    }
}
