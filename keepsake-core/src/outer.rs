//! Outer card flow: the opening questions, the celebration countdown and the
//! shared secret passphrase that unlocks the story book.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::CardConfig;
use crate::countdown::{Countdown, CountdownTick};
use crate::effects::Effect;
use crate::gate::{GateFeedback, GateOutcome, PassphraseGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    Initial,
    MainQuestion,
    BirthdayCelebration,
    /// Defined with a handler but never entered by the question wiring.
    YesResponse,
    SecretCode,
    AreYouSure,
    FinalNoResponse,
    MainContent,
}

impl CardState {
    pub const ALL: [Self; 8] = [
        Self::Initial,
        Self::MainQuestion,
        Self::BirthdayCelebration,
        Self::YesResponse,
        Self::SecretCode,
        Self::AreYouSure,
        Self::FinalNoResponse,
        Self::MainContent,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::MainQuestion => "main_question",
            Self::BirthdayCelebration => "birthday_celebration",
            Self::YesResponse => "yes_response",
            Self::SecretCode => "secret_code",
            Self::AreYouSure => "are_you_sure",
            Self::FinalNoResponse => "final_no_response",
            Self::MainContent => "main_content",
        }
    }
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single user action on the outer cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardEvent {
    /// The single button on a card without yes/no choices.
    Proceed,
    Answer(bool),
    /// "Go back" / "More love ahead" style confirmation buttons.
    Acknowledge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Moved {
        from: CardState,
        to: CardState,
        effects: Vec<Effect>,
    },
    Stayed,
    Ignored {
        state: CardState,
        event: CardEvent,
    },
}

impl Transition {
    #[must_use]
    pub const fn moved_to(&self) -> Option<CardState> {
        match self {
            Self::Moved { to, .. } => Some(*to),
            _ => None,
        }
    }

    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        match self {
            Self::Moved { effects, .. } => effects,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CelebrationPhase {
    Loading { until: DateTime<Utc> },
    Countdown(Countdown),
}

/// What the celebration screen should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CelebrationView {
    Loading,
    Countdown(CountdownTick),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("no passphrase is requested while on the {state} card")]
    NoGateActive { state: CardState },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OuterFlow {
    state: CardState,
    celebration_target: DateTime<Utc>,
    loader_ms: i64,
    celebration: Option<CelebrationPhase>,
    gate: PassphraseGate,
    feedback: GateFeedback,
}

impl OuterFlow {
    #[must_use]
    pub fn new(config: &CardConfig) -> Self {
        Self {
            state: CardState::Initial,
            celebration_target: config.celebration_target,
            loader_ms: config.loader_ms,
            celebration: None,
            gate: PassphraseGate::new(config.outer_passphrase.clone()),
            feedback: GateFeedback::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> CardState {
        self.state
    }

    #[must_use]
    pub const fn gate(&self) -> &PassphraseGate {
        &self.gate
    }

    #[must_use]
    pub const fn feedback(&self) -> &GateFeedback {
        &self.feedback
    }

    #[must_use]
    pub const fn total_failures(&self) -> u32 {
        self.gate.total_failures()
    }

    /// Apply one user event. Pairs without a handler are ignored.
    pub fn handle(&mut self, event: CardEvent, now: DateTime<Utc>) -> Transition {
        let (next, effects) = match (self.state, event) {
            (CardState::Initial, CardEvent::Proceed) => {
                (CardState::MainQuestion, vec![Effect::StartAudio])
            }
            (CardState::MainQuestion, CardEvent::Answer(true)) => {
                (CardState::BirthdayCelebration, vec![Effect::Confetti])
            }
            (CardState::MainQuestion, CardEvent::Answer(false)) => (CardState::AreYouSure, vec![]),
            (CardState::AreYouSure, CardEvent::Answer(true)) => {
                (CardState::FinalNoResponse, vec![])
            }
            (CardState::AreYouSure, CardEvent::Answer(false))
            | (CardState::FinalNoResponse, CardEvent::Acknowledge) => {
                (CardState::MainQuestion, vec![])
            }
            (CardState::YesResponse, CardEvent::Acknowledge) => (CardState::SecretCode, vec![]),
            (state, event) => {
                log::warn!("ignoring {event:?} on the {state} card");
                return Transition::Ignored { state, event };
            }
        };
        self.transition(next, effects, now)
    }

    /// Drive the celebration loader and countdown by one second.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Transition {
        if self.state != CardState::BirthdayCelebration {
            return Transition::Stayed;
        }
        match &mut self.celebration {
            Some(CelebrationPhase::Loading { until }) => {
                if now >= *until {
                    log::debug!("celebration loader finished");
                    self.celebration = Some(CelebrationPhase::Countdown(Countdown::start(
                        self.celebration_target,
                        now,
                    )));
                }
                Transition::Stayed
            }
            Some(CelebrationPhase::Countdown(countdown)) => {
                if countdown.tick(now) == CountdownTick::Completed {
                    self.transition(CardState::SecretCode, vec![], now)
                } else {
                    Transition::Stayed
                }
            }
            None => {
                self.reset_celebration(now);
                Transition::Stayed
            }
        }
    }

    #[must_use]
    pub fn celebration_view(&self, now: DateTime<Utc>) -> Option<CelebrationView> {
        if self.state != CardState::BirthdayCelebration {
            return None;
        }
        match self.celebration.as_ref()? {
            CelebrationPhase::Loading { .. } => Some(CelebrationView::Loading),
            CelebrationPhase::Countdown(countdown) => {
                Some(CelebrationView::Countdown(countdown.peek(now)))
            }
        }
    }

    /// Submit the shared passphrase on the secret code card.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::NoGateActive`] on any other card.
    pub fn submit_passphrase(
        &mut self,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<(GateOutcome, Transition), FlowError> {
        if self.state != CardState::SecretCode {
            return Err(FlowError::NoGateActive { state: self.state });
        }
        let outcome = self.gate.submit(candidate);
        let punishment = self.feedback.record(outcome, now);
        let transition = if outcome.is_accepted() {
            log::info!(
                "secret code accepted with {} punches carried forward",
                self.gate.total_failures()
            );
            self.transition(CardState::MainContent, vec![], now)
        } else {
            log::debug!("secret code rejected: {outcome:?}");
            punishment.map_or(Transition::Stayed, |effect| Transition::Moved {
                from: self.state,
                to: self.state,
                effects: vec![effect],
            })
        };
        Ok((outcome, transition))
    }

    /// Enter the yes-response card, which the question wiring never reaches.
    /// Only allowed from the question cards, so the passphrase gate can't be
    /// skipped this way.
    pub fn enter_yes_response(&mut self, now: DateTime<Utc>) -> Transition {
        match self.state {
            CardState::Initial
            | CardState::MainQuestion
            | CardState::AreYouSure
            | CardState::FinalNoResponse => self.transition(CardState::YesResponse, vec![], now),
            state => {
                log::warn!("yes response not reachable from {state}");
                Transition::Stayed
            }
        }
    }

    fn transition(
        &mut self,
        next: CardState,
        effects: Vec<Effect>,
        now: DateTime<Utc>,
    ) -> Transition {
        let from = self.state;
        log::debug!("card flow {from} -> {next}");
        self.state = next;
        match next {
            CardState::BirthdayCelebration => self.reset_celebration(now),
            CardState::SecretCode => {
                self.celebration = None;
                self.feedback.clear();
                let expected = self.gate.expected().to_string();
                self.gate.rearm(expected);
            }
            _ => self.celebration = None,
        }
        Transition::Moved {
            from,
            to: next,
            effects,
        }
    }

    fn reset_celebration(&mut self, now: DateTime<Utc>) {
        let until = Duration::try_milliseconds(self.loader_ms.max(0))
            .and_then(|loader| now.checked_add_signed(loader))
            .unwrap_or(now);
        self.celebration = Some(CelebrationPhase::Loading { until });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cfg() -> CardConfig {
        CardConfig::classic().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn proceed_starts_audio_and_asks_main_question() {
        let mut flow = OuterFlow::new(&cfg());
        let transition = flow.handle(CardEvent::Proceed, now());
        assert_eq!(transition.moved_to(), Some(CardState::MainQuestion));
        assert_eq!(transition.effects(), &[Effect::StartAudio]);
    }

    #[test]
    fn no_loop_never_reaches_celebration() {
        let mut flow = OuterFlow::new(&cfg());
        flow.handle(CardEvent::Proceed, now());
        for _ in 0..3 {
            flow.handle(CardEvent::Answer(false), now());
            assert_eq!(flow.state(), CardState::AreYouSure);
            flow.handle(CardEvent::Answer(true), now());
            assert_eq!(flow.state(), CardState::FinalNoResponse);
            flow.handle(CardEvent::Acknowledge, now());
            assert_eq!(flow.state(), CardState::MainQuestion);
        }
        flow.handle(CardEvent::Answer(false), now());
        flow.handle(CardEvent::Answer(false), now());
        assert_eq!(flow.state(), CardState::MainQuestion);
    }

    #[test]
    fn unhandled_events_are_ignored() {
        let mut flow = OuterFlow::new(&cfg());
        assert_eq!(
            flow.handle(CardEvent::Answer(true), now()),
            Transition::Ignored {
                state: CardState::Initial,
                event: CardEvent::Answer(true)
            }
        );
        assert_eq!(flow.state(), CardState::Initial);
        assert!(matches!(
            flow.submit_passphrase("pookie", now()),
            Err(FlowError::NoGateActive {
                state: CardState::Initial
            })
        ));
    }

    #[test]
    fn celebration_loads_counts_down_then_asks_for_code() {
        let mut flow = OuterFlow::new(&cfg());
        flow.handle(CardEvent::Proceed, now());
        let yes = flow.handle(CardEvent::Answer(true), now());
        assert_eq!(yes.effects(), &[Effect::Confetti]);
        assert_eq!(flow.celebration_view(now()), Some(CelebrationView::Loading));

        let mut clock = now();
        flow.tick(clock);
        assert_eq!(flow.celebration_view(clock), Some(CelebrationView::Loading));

        clock += Duration::milliseconds(3_000);
        flow.tick(clock);
        assert_eq!(
            flow.celebration_view(clock),
            Some(CelebrationView::Countdown(CountdownTick::Fallback(10)))
        );

        for _ in 0..9 {
            clock += Duration::seconds(1);
            assert_eq!(flow.tick(clock), Transition::Stayed);
        }
        clock += Duration::seconds(1);
        assert_eq!(flow.tick(clock).moved_to(), Some(CardState::SecretCode));
        assert!(flow.celebration_view(clock).is_none());
    }

    fn at_secret_code() -> OuterFlow {
        let mut flow = OuterFlow::new(&cfg());
        flow.transition(CardState::SecretCode, vec![], now());
        flow
    }

    #[test]
    fn reentering_celebration_resets_the_loader() {
        let mut flow = OuterFlow::new(&cfg());
        flow.transition(CardState::BirthdayCelebration, vec![], now());
        let later = now() + Duration::seconds(5);
        flow.tick(later);
        assert!(matches!(
            flow.celebration_view(later),
            Some(CelebrationView::Countdown(_))
        ));

        flow.transition(CardState::BirthdayCelebration, vec![], later);
        assert_eq!(flow.celebration_view(later), Some(CelebrationView::Loading));
    }

    #[test]
    fn yes_response_leads_to_secret_code() {
        let mut flow = OuterFlow::new(&cfg());
        flow.handle(CardEvent::Proceed, now());
        assert_eq!(
            flow.enter_yes_response(now()).moved_to(),
            Some(CardState::YesResponse)
        );
        let transition = flow.handle(CardEvent::Acknowledge, now());
        assert_eq!(transition.moved_to(), Some(CardState::SecretCode));
    }

    #[test]
    fn secret_code_counts_punches_before_unlocking() {
        let mut flow = at_secret_code();
        for attempt in ["a", "b"] {
            let (outcome, transition) = flow.submit_passphrase(attempt, now()).unwrap();
            assert!(matches!(outcome, GateOutcome::Rejected { .. }));
            assert_eq!(transition, Transition::Stayed);
        }
        let (outcome, transition) = flow.submit_passphrase("c", now()).unwrap();
        assert_eq!(outcome, GateOutcome::Exhausted { total_failures: 1 });
        assert_eq!(transition.effects(), &[Effect::Punishment]);
        assert!(flow.feedback().punishment_visible(now()));

        let (outcome, transition) = flow.submit_passphrase("PooKie", now()).unwrap();
        assert_eq!(outcome, GateOutcome::Accepted);
        assert_eq!(transition.moved_to(), Some(CardState::MainContent));
        assert_eq!(flow.total_failures(), 1);
    }

    #[test]
    fn yes_response_bridge_cannot_skip_the_passphrase() {
        let mut flow = at_secret_code();
        assert_eq!(flow.enter_yes_response(now()), Transition::Stayed);
        assert_eq!(flow.state(), CardState::SecretCode);

        flow.submit_passphrase("pookie", now()).unwrap();
        assert_eq!(flow.enter_yes_response(now()), Transition::Stayed);
        assert_eq!(flow.state(), CardState::MainContent);
    }

    #[test]
    fn out_of_range_loader_never_overflows_the_clock() {
        for loader_ms in [i64::MAX, i64::MIN, -5_000] {
            let mut config = cfg();
            config.loader_ms = loader_ms;
            let mut flow = OuterFlow::new(&config);
            flow.handle(CardEvent::Proceed, now());
            flow.handle(CardEvent::Answer(true), now());
            assert_eq!(flow.state(), CardState::BirthdayCelebration);
            assert_eq!(flow.celebration_view(now()), Some(CelebrationView::Loading));
        }
    }
}
