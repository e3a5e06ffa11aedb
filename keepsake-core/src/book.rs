//! Story book paginator and the treasure hunt that runs through its middle.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{CardConfig, GallerySlot, Page, PageKind};
use crate::constants::{UNLOCK_MESSAGE, UNLOCK_MESSAGE_MS};
use crate::effects::{ConfettiBurst, Effect};
use crate::gate::{GateFeedback, GateOutcome, PassphraseGate};
use crate::summary::{SummaryVerdict, summary_verdict};
use crate::treasure::TreasureSlot;

/// Operations the current page does not expose.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavError {
    #[error("page {page} is locked until its gift code is entered")]
    LockedByCode { page: usize },
    #[error("page {page} is inside the treasure hunt, which only moves forward")]
    BackwardInHunt { page: usize },
    #[error("page {page} does not take a gift code")]
    NotACodePage { page: usize },
    #[error("page {page} has no gallery")]
    NotAGalleryPage { page: usize },
    #[error("gallery has no image {id}")]
    UnknownGalleryImage { id: u32 },
    #[error("start over is only offered on the final page, not page {page}")]
    RestartUnavailable { page: usize },
}

/// Controls the render layer should show for the current page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordances {
    pub prev: bool,
    pub next: bool,
    pub submit: bool,
    pub restart: bool,
}

#[derive(Debug, Clone)]
pub struct StoryBook {
    config: Arc<CardConfig>,
    current_page: usize,
    gate: PassphraseGate,
    feedback: GateFeedback,
    confetti: Option<ConfettiBurst>,
    selected_image: Option<u32>,
    code_input: String,
    effects: Vec<Effect>,
}

impl StoryBook {
    /// Open the book on its cover, continuing the tally carried over from the
    /// outer secret code.
    #[must_use]
    pub fn new(config: Arc<CardConfig>, total_failures: u32) -> Self {
        let first_code = config.gift_codes.first().cloned().unwrap_or_default();
        Self {
            config,
            current_page: 0,
            gate: PassphraseGate::with_tally(first_code, total_failures),
            feedback: GateFeedback::default(),
            confetti: None,
            selected_image: None,
            code_input: String::new(),
            effects: Vec::new(),
        }
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn page(&self) -> Option<&Page> {
        self.config.pages.get(self.current_page)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.config.page_count()
    }

    #[must_use]
    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    #[must_use]
    pub fn treasure_slot(&self) -> Option<TreasureSlot> {
        self.config.treasure.slot(self.current_page)
    }

    #[must_use]
    pub const fn total_failures(&self) -> u32 {
        self.gate.total_failures()
    }

    #[must_use]
    pub const fn chances_remaining(&self) -> u8 {
        self.gate.chances_remaining()
    }

    #[must_use]
    pub const fn feedback(&self) -> &GateFeedback {
        &self.feedback
    }

    #[must_use]
    pub const fn confetti(&self) -> Option<&ConfettiBurst> {
        self.confetti.as_ref()
    }

    #[must_use]
    pub fn confetti_visible(&self, now: DateTime<Utc>) -> bool {
        self.confetti.is_some_and(|burst| burst.is_visible(now))
    }

    #[must_use]
    pub const fn selected_image(&self) -> Option<u32> {
        self.selected_image
    }

    #[must_use]
    pub fn selected_slot(&self) -> Option<&GallerySlot> {
        self.selected_image.and_then(|id| self.config.gallery_slot(id))
    }

    #[must_use]
    pub fn code_input(&self) -> &str {
        &self.code_input
    }

    pub fn set_code_input(&mut self, text: impl Into<String>) {
        self.code_input = text.into();
    }

    /// Verdict for the summary page at the current tally.
    #[must_use]
    pub fn summary(&self) -> SummaryVerdict {
        summary_verdict(self.gate.total_failures())
    }

    /// Take the effects emitted since the last drain.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    fn last_page(&self) -> usize {
        self.config.page_count().saturating_sub(1)
    }

    fn on_final_page(&self) -> bool {
        self.page().is_some_and(|page| page.kind == PageKind::Final)
    }

    #[must_use]
    pub fn affordances(&self) -> Affordances {
        match self.treasure_slot() {
            Some(TreasureSlot::Code { .. }) => Affordances {
                submit: true,
                ..Affordances::default()
            },
            Some(TreasureSlot::Reward { .. }) => Affordances {
                next: true,
                ..Affordances::default()
            },
            None => Affordances {
                prev: self.current_page > 0,
                next: self.current_page < self.last_page(),
                submit: false,
                restart: self.on_final_page(),
            },
        }
    }

    /// Move forward one page. Clamps at the last page.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::LockedByCode`] on a code page.
    pub fn go_next(&mut self) -> Result<usize, NavError> {
        let page = self.current_page;
        let next = match self.treasure_slot() {
            Some(TreasureSlot::Code { .. }) => return Err(NavError::LockedByCode { page }),
            Some(TreasureSlot::Reward { .. }) => page + 1,
            None => (page + 1).min(self.last_page()),
        };
        self.move_to(next);
        Ok(self.current_page)
    }

    /// Move back one page. Clamps at the cover.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::BackwardInHunt`] anywhere inside the treasure hunt.
    pub fn go_prev(&mut self) -> Result<usize, NavError> {
        let page = self.current_page;
        if self.treasure_slot().is_some() {
            return Err(NavError::BackwardInHunt { page });
        }
        self.move_to(page.saturating_sub(1));
        Ok(self.current_page)
    }

    /// Submit a gift code on the current code page.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::NotACodePage`] when the page takes no code.
    pub fn submit_code(
        &mut self,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<GateOutcome, NavError> {
        let page = self.current_page;
        let Some(TreasureSlot::Code { gift }) = self.treasure_slot() else {
            return Err(NavError::NotACodePage { page });
        };
        let outcome = self.gate.submit(candidate);
        let punishment = self.feedback.record(outcome, now);
        self.effects.extend(punishment);

        if outcome.is_accepted() {
            log::info!("gift {} unlocked on page {page}", gift + 1);
            self.move_to(page + 1);
            self.confetti = Some(ConfettiBurst::new(now));
            self.feedback.announce(UNLOCK_MESSAGE, now, UNLOCK_MESSAGE_MS);
            self.effects.push(Effect::Confetti);
        } else {
            log::debug!("gift {} code rejected: {outcome:?}", gift + 1);
        }
        Ok(outcome)
    }

    /// Submit whatever is in the code input box.
    ///
    /// # Errors
    ///
    /// See [`StoryBook::submit_code`].
    pub fn submit_typed_code(&mut self, now: DateTime<Utc>) -> Result<GateOutcome, NavError> {
        let typed = self.code_input.clone();
        self.submit_code(&typed, now)
    }

    /// Open the gallery modal on image `id`.
    ///
    /// # Errors
    ///
    /// Fails off the gallery page or for an id with no configured slot.
    pub fn select_gallery_image(&mut self, id: u32) -> Result<(), NavError> {
        if !self
            .page()
            .is_some_and(|page| page.kind == PageKind::Gallery)
        {
            return Err(NavError::NotAGalleryPage {
                page: self.current_page,
            });
        }
        if self.config.gallery_slot(id).is_none() {
            return Err(NavError::UnknownGalleryImage { id });
        }
        self.selected_image = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_image = None;
    }

    /// "Start Over" from the final page. The tally survives.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::RestartUnavailable`] on any other page.
    pub fn restart(&mut self) -> Result<(), NavError> {
        if !self.on_final_page() {
            return Err(NavError::RestartUnavailable {
                page: self.current_page,
            });
        }
        log::debug!("story restarted with {} punches", self.total_failures());
        self.move_to(0);
        Ok(())
    }

    fn move_to(&mut self, page: usize) {
        if page == self.current_page {
            return;
        }
        self.current_page = page;
        self.feedback.clear();
        self.confetti = None;
        self.selected_image = None;
        self.code_input.clear();
        if let Some(TreasureSlot::Code { gift }) = self.treasure_slot() {
            if let Some(code) = self.config.gift_codes.get(gift) {
                self.gate.rearm(code.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_CHANCES;
    use crate::effects::ConfettiPhase;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap()
    }

    fn book(tally: u32) -> StoryBook {
        StoryBook::new(Arc::new(CardConfig::classic().unwrap()), tally)
    }

    fn walk_to(book: &mut StoryBook, page: usize) {
        while book.current_page() < page {
            book.go_next().unwrap();
        }
    }

    #[test]
    fn regular_pages_clamp_at_both_ends() {
        let mut book = book(0);
        assert_eq!(book.go_prev(), Ok(0));
        assert_eq!(book.go_next(), Ok(1));
        assert_eq!(book.go_prev(), Ok(0));

        walk_to(&mut book, 4);
        assert_eq!(book.go_next(), Ok(5));
        assert_eq!(
            book.affordances(),
            Affordances {
                submit: true,
                ..Affordances::default()
            }
        );
    }

    #[test]
    fn correct_first_code_unlocks_reward() {
        let mut book = book(0);
        walk_to(&mut book, 4);
        book.go_next().unwrap();
        book.set_code_input("pwd1");

        assert_eq!(book.submit_typed_code(now()), Ok(GateOutcome::Accepted));
        assert_eq!(book.current_page(), 6);
        assert_eq!(book.chances_remaining(), DEFAULT_CHANCES);
        assert!(book.code_input().is_empty());
        assert!(book.confetti_visible(now()));
        assert_eq!(book.feedback().status_text(now()), Some(UNLOCK_MESSAGE));
        let later = now() + Duration::milliseconds(3_000);
        assert_eq!(book.feedback().status_text(later), None);
        assert_eq!(
            book.confetti().map(|burst| burst.phase(now() + Duration::seconds(5))),
            Some(ConfettiPhase::Gone)
        );
        assert_eq!(book.drain_effects(), vec![Effect::Confetti]);
        assert!(book.drain_effects().is_empty());
    }

    #[test]
    fn three_wrong_codes_punish_without_moving() {
        let mut book = book(0);
        walk_to(&mut book, 4);
        book.go_next().unwrap();
        for attempt in ["x", "y", "z"] {
            book.submit_code(attempt, now()).unwrap();
        }
        assert_eq!(book.current_page(), 5);
        assert_eq!(book.total_failures(), 1);
        assert_eq!(book.chances_remaining(), DEFAULT_CHANCES);
        assert!(book.feedback().punishment_visible(now()));
        assert_eq!(book.drain_effects(), vec![Effect::Punishment]);
    }

    #[test]
    fn hunt_only_moves_forward() {
        let mut book = book(0);
        walk_to(&mut book, 4);
        book.go_next().unwrap();
        assert_eq!(book.go_next(), Err(NavError::LockedByCode { page: 5 }));
        assert_eq!(book.go_prev(), Err(NavError::BackwardInHunt { page: 5 }));

        book.submit_code("PWD1", now()).unwrap();
        assert_eq!(book.go_prev(), Err(NavError::BackwardInHunt { page: 6 }));
        assert_eq!(book.go_next(), Ok(7));
        assert_eq!(
            book.submit_code("pwd1", now()),
            Ok(GateOutcome::Rejected { chances_left: 2 })
        );
        assert_eq!(book.submit_code("pwd2", now()), Ok(GateOutcome::Accepted));
    }

    #[test]
    fn full_hunt_reaches_final_and_restarts() {
        let mut book = book(2);
        walk_to(&mut book, 4);
        book.go_next().unwrap();
        let codes = book.config().gift_codes.clone();
        for code in &codes {
            assert!(book.submit_code(code, now()).unwrap().is_accepted());
            book.go_next().unwrap();
        }
        assert_eq!(book.current_page(), 31);
        assert_eq!(book.summary().total_failures, 2);
        assert_eq!(book.go_prev(), Ok(30));
        assert_eq!(book.go_next(), Ok(31));

        assert_eq!(
            book.restart(),
            Err(NavError::RestartUnavailable { page: 31 })
        );
        book.go_next().unwrap();
        let aff = book.affordances();
        assert!(aff.restart && aff.prev && !aff.next);
        assert_eq!(book.go_next(), Ok(32));

        book.restart().unwrap();
        assert_eq!(book.current_page(), 0);
        assert_eq!(book.total_failures(), 2);
    }

    #[test]
    fn gallery_selection_is_dropped_on_navigation() {
        let mut book = book(0);
        assert_eq!(
            book.select_gallery_image(1),
            Err(NavError::NotAGalleryPage { page: 0 })
        );
        walk_to(&mut book, 3);
        assert_eq!(
            book.select_gallery_image(99),
            Err(NavError::UnknownGalleryImage { id: 99 })
        );
        book.select_gallery_image(4).unwrap();
        assert_eq!(book.selected_slot().map(|slot| slot.id), Some(4));
        book.clear_selection();
        assert!(book.selected_image().is_none());

        book.select_gallery_image(2).unwrap();
        book.go_next().unwrap();
        assert!(book.selected_image().is_none());
    }

    #[test]
    fn submit_off_code_page_is_rejected() {
        let mut book = book(0);
        assert_eq!(
            book.submit_code("pwd1", now()),
            Err(NavError::NotACodePage { page: 0 })
        );
    }
}
