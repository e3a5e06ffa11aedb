//! One recipient's pass through the card: outer flow, then the story book.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::book::{Affordances, StoryBook};
use crate::config::{CardConfig, ConfigError};
use crate::effects::{AudioState, BackgroundAudio, ConfettiBurst, Effect};
use crate::gate::GateOutcome;
use crate::outer::{CardEvent, CardState, CelebrationView, FlowError, OuterFlow, Transition};

/// Render-facing view of a session at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: CardState,
    pub page: Option<usize>,
    pub page_key: Option<String>,
    pub total_failures: u32,
    pub chances_remaining: u8,
    pub status: Option<String>,
    pub punishment_visible: bool,
    pub confetti_visible: bool,
    pub audio: AudioState,
    pub celebration: Option<CelebrationView>,
    pub affordances: Option<Affordances>,
}

#[derive(Debug, Clone)]
pub struct CardSession {
    config: Arc<CardConfig>,
    outer: OuterFlow,
    book: Option<StoryBook>,
    audio: BackgroundAudio,
    confetti: Option<ConfettiBurst>,
    effects: Vec<Effect>,
}

impl CardSession {
    /// Start a session on a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] the configuration violates.
    pub fn new(config: CardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let outer = OuterFlow::new(&config);
        let audio = BackgroundAudio::new(config.audio_source.clone());
        Ok(Self {
            config: Arc::new(config),
            outer,
            book: None,
            audio,
            confetti: None,
            effects: Vec::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> CardState {
        self.outer.state()
    }

    #[must_use]
    pub const fn outer(&self) -> &OuterFlow {
        &self.outer
    }

    #[must_use]
    pub const fn story(&self) -> Option<&StoryBook> {
        self.book.as_ref()
    }

    pub const fn story_mut(&mut self) -> Option<&mut StoryBook> {
        self.book.as_mut()
    }

    #[must_use]
    pub const fn audio(&self) -> &BackgroundAudio {
        &self.audio
    }

    pub const fn audio_mut(&mut self) -> &mut BackgroundAudio {
        &mut self.audio
    }

    /// Tally owned by the outer gate until hand-off, then by the book.
    #[must_use]
    pub fn total_failures(&self) -> u32 {
        self.book
            .as_ref()
            .map_or_else(|| self.outer.total_failures(), StoryBook::total_failures)
    }

    pub fn handle(&mut self, event: CardEvent, now: DateTime<Utc>) -> Transition {
        let transition = self.outer.handle(event, now);
        self.apply(&transition, now);
        transition
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Transition {
        let transition = self.outer.tick(now);
        self.apply(&transition, now);
        transition
    }

    /// Submit the outer passphrase. Acceptance opens the story book with the
    /// punches collected so far.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::NoGateActive`] outside the secret code card.
    pub fn submit_passphrase(
        &mut self,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<GateOutcome, FlowError> {
        let (outcome, transition) = self.outer.submit_passphrase(candidate, now)?;
        self.apply(&transition, now);
        Ok(outcome)
    }

    /// See [`OuterFlow::enter_yes_response`].
    pub fn enter_yes_response(&mut self, now: DateTime<Utc>) -> Transition {
        let transition = self.outer.enter_yes_response(now);
        self.apply(&transition, now);
        transition
    }

    /// Effects emitted since the last drain, oldest first.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        let mut drained = std::mem::take(&mut self.effects);
        if let Some(book) = self.book.as_mut() {
            drained.extend(book.drain_effects());
        }
        drained
    }

    fn apply(&mut self, transition: &Transition, now: DateTime<Utc>) {
        for effect in transition.effects() {
            match effect {
                Effect::StartAudio => self.audio.start(),
                Effect::Confetti => self.confetti = Some(ConfettiBurst::new(now)),
                Effect::Punishment => {}
            }
            self.effects.push(*effect);
        }
        if transition.moved_to() == Some(CardState::MainContent) && self.book.is_none() {
            let tally = self.outer.total_failures();
            log::info!("opening story book with {tally} punches");
            self.book = Some(StoryBook::new(Arc::clone(&self.config), tally));
        }
    }

    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        let (status, punishment_visible, chances_remaining) = self.book.as_ref().map_or_else(
            || {
                let feedback = self.outer.feedback();
                (
                    feedback.status_text(now).map(str::to_string),
                    feedback.punishment_visible(now),
                    self.outer.gate().chances_remaining(),
                )
            },
            |book| {
                (
                    book.feedback().status_text(now).map(str::to_string),
                    book.feedback().punishment_visible(now),
                    book.chances_remaining(),
                )
            },
        );
        let outer_confetti = self.confetti.is_some_and(|burst| burst.is_visible(now));
        SessionSnapshot {
            state: self.outer.state(),
            page: self.book.as_ref().map(StoryBook::current_page),
            page_key: self
                .book
                .as_ref()
                .and_then(StoryBook::page)
                .map(|page| page.key.clone()),
            total_failures: self.total_failures(),
            chances_remaining,
            status,
            punishment_visible,
            confetti_visible: outer_confetti
                || self.book.as_ref().is_some_and(|book| book.confetti_visible(now)),
            audio: self.audio.state(),
            celebration: self.outer.celebration_view(now),
            affordances: self.book.as_ref().map(StoryBook::affordances),
        }
    }
}
