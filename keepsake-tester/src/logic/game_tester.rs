use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::{DateTime, Duration, Utc};
use keepsake_core::{
    CardConfig, CardEvent, CardSession, CardState, Effect, GateOutcome, PageKind,
    SessionSnapshot, SummaryVerdict, TreasureSlot,
};
use serde::Serialize;

use crate::logic::assets::TesterAssets;
use crate::logic::policy::{GameplayStrategy, GateKind, GateView, PlayerPolicy};

/// Default cap on question answers and passphrase attempts per run.
pub const DEFAULT_MAX_STEPS: usize = 400;
const MAX_COUNTDOWN_TICKS: u32 = 10_000;

/// A single headless playthrough to run and check.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_steps: usize,
    /// Session clock start relative to the celebration target.
    pub clock_offset: Duration,
    pub restart_at_end: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_steps: DEFAULT_MAX_STEPS,
            clock_offset: Duration::days(1),
            restart_at_end: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Start the clock at `target + offset`; a negative offset leaves the
    /// countdown running toward the target.
    #[must_use]
    pub const fn with_clock_offset(mut self, offset: Duration) -> Self {
        self.clock_offset = offset;
        self
    }

    #[must_use]
    pub const fn with_restart(mut self) -> Self {
        self.restart_at_end = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// One entry in the playthrough trail.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub state: CardState,
    pub page: Option<usize>,
    pub action: String,
    pub outcome: String,
}

/// Counters gathered while a policy plays through the card.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    pub questions_answered: u32,
    pub no_loops: u32,
    pub reached_celebration: bool,
    pub countdown_ticks: u32,
    pub outer_misses: u32,
    pub gift_misses: Vec<u32>,
    pub punishments_seen: u32,
    pub confetti_bursts: u32,
    pub pages_visited: usize,
    pub gallery_views: u32,
    pub restarted: bool,
    pub completed: bool,
}

impl RunMetrics {
    pub fn total_misses(&self) -> u32 {
        self.outer_misses + self.gift_misses.iter().sum::<u32>()
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub config: Arc<CardConfig>,
    pub trail: Vec<StepRecord>,
    pub metrics: RunMetrics,
    pub final_snapshot: SessionSnapshot,
    pub verdict: Option<SummaryVerdict>,
    pub started_at: DateTime<Utc>,
}

impl SimulationSummary {
    pub fn total_failures(&self) -> u32 {
        self.final_snapshot.total_failures
    }
}

/// Headless deterministic runner for the card logic.
#[derive(Debug, Clone)]
pub struct GameTester {
    verbose: bool,
    assets: Arc<TesterAssets>,
}

struct Run<'a> {
    session: CardSession,
    policy: Box<dyn PlayerPolicy + Send>,
    clock: DateTime<Utc>,
    max_steps: usize,
    steps: usize,
    trail: Vec<StepRecord>,
    metrics: RunMetrics,
    verbose: bool,
    config: &'a CardConfig,
}

impl GameTester {
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { verbose, assets }
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Play the card once under `plan` with policies seeded by `seed`.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let config = Arc::clone(self.assets.config());
        let started_at = config.celebration_target + plan.clock_offset;
        let session = CardSession::new(config.as_ref().clone())?;
        let mut run = Run {
            session,
            policy: plan.strategy.create_policy(seed),
            clock: started_at,
            max_steps: plan.max_steps,
            steps: 0,
            trail: Vec::new(),
            metrics: RunMetrics {
                gift_misses: vec![0; config.gift_codes.len()],
                ..RunMetrics::default()
            },
            verbose: self.verbose,
            config: &config,
        };

        if run.play_outer()? {
            run.play_book(plan.restart_at_end)?;
        }

        let Run {
            session,
            trail,
            metrics,
            clock,
            ..
        } = run;
        let verdict = session.story().map(keepsake_core::StoryBook::summary);
        Ok(SimulationSummary {
            seed,
            strategy: plan.strategy,
            config: Arc::clone(&config),
            trail,
            metrics,
            final_snapshot: session.snapshot(clock),
            verdict,
            started_at,
        })
    }
}

impl Run<'_> {
    fn record(&mut self, action: impl Into<String>, outcome: impl Into<String>) {
        let state = self.session.state();
        let page = self.session.story().map(keepsake_core::StoryBook::current_page);
        let action = action.into();
        let outcome = outcome.into();
        if self.verbose {
            println!("     · [{state}] {action} -> {outcome}");
        }
        log::debug!(
            "{} step {} [{state}] {action} -> {outcome}",
            self.policy.name(),
            self.trail.len()
        );
        self.trail.push(StepRecord {
            step: self.trail.len(),
            state,
            page,
            action,
            outcome,
        });
        for effect in self.session.drain_effects() {
            match effect {
                Effect::Confetti => self.metrics.confetti_bursts += 1,
                Effect::Punishment => self.metrics.punishments_seen += 1,
                Effect::StartAudio => {}
            }
        }
    }

    fn spend_step(&mut self) -> bool {
        self.steps += 1;
        self.steps <= self.max_steps
    }

    /// Drive the outer cards up to the story book. Returns false when the
    /// step budget ran out first.
    fn play_outer(&mut self) -> Result<bool> {
        let transition = self.session.handle(CardEvent::Proceed, self.clock);
        self.record("proceed", format!("{transition:?}"));

        while self.session.state() != CardState::BirthdayCelebration {
            if !self.spend_step() {
                return Ok(false);
            }
            let state = self.session.state();
            let event = match state {
                CardState::MainQuestion | CardState::AreYouSure => {
                    self.metrics.questions_answered += 1;
                    CardEvent::Answer(self.policy.answer(state))
                }
                CardState::FinalNoResponse => {
                    self.metrics.no_loops += 1;
                    CardEvent::Acknowledge
                }
                other => bail!("unexpected {other} card before the celebration"),
            };
            let transition = self.session.handle(event, self.clock);
            self.record(format!("{event:?}"), format!("{:?}", transition.moved_to()));
        }

        self.metrics.reached_celebration = true;
        self.clock += Duration::milliseconds(self.config.loader_ms);
        self.session.tick(self.clock);
        while self.session.state() == CardState::BirthdayCelebration {
            if self.metrics.countdown_ticks >= MAX_COUNTDOWN_TICKS {
                bail!("countdown did not finish within {MAX_COUNTDOWN_TICKS} ticks");
            }
            self.clock += Duration::seconds(1);
            self.session.tick(self.clock);
            self.metrics.countdown_ticks += 1;
        }
        self.record("countdown", format!("{} ticks", self.metrics.countdown_ticks));

        while self.session.state() == CardState::SecretCode {
            if !self.spend_step() {
                return Ok(false);
            }
            let expected = self.session.outer().gate().expected().to_string();
            let view = GateView {
                kind: GateKind::Outer,
                expected: &expected,
                chances_remaining: self.session.outer().gate().chances_remaining(),
                misses: self.metrics.outer_misses,
            };
            let candidate = self.policy.guess(&view);
            let outcome = self.session.submit_passphrase(&candidate, self.clock)?;
            if !outcome.is_accepted() {
                self.metrics.outer_misses += 1;
            }
            self.record(describe_gate(&view), format!("{outcome:?}"));
        }
        Ok(self.session.state() == CardState::MainContent)
    }

    fn play_book(&mut self, restart_at_end: bool) -> Result<()> {
        loop {
            let Some(book) = self.session.story_mut() else {
                bail!("story book missing after hand-off");
            };
            let page = book.current_page();
            self.metrics.pages_visited = self.metrics.pages_visited.max(page + 1);
            let kind = book.page().map(|p| p.kind.clone());

            match book.treasure_slot() {
                Some(TreasureSlot::Code { gift }) => self.play_code_page(gift)?,
                Some(TreasureSlot::Reward { .. }) => {
                    let moved = book.go_next()?;
                    self.record("next", format!("page {moved}"));
                }
                None if kind == Some(PageKind::Final) => {
                    self.metrics.completed = true;
                    if restart_at_end {
                        book.restart()?;
                        self.metrics.restarted = true;
                        self.record("start over", "page 0");
                    }
                    return Ok(());
                }
                None => {
                    if kind == Some(PageKind::Gallery) && self.policy.browse_gallery() {
                        self.browse_gallery()?;
                    }
                    let Some(book) = self.session.story_mut() else {
                        bail!("story book missing after hand-off");
                    };
                    let moved = book.go_next()?;
                    if moved == page {
                        bail!("navigation stalled on page {page}");
                    }
                    self.record("next", format!("page {moved}"));
                }
            }
        }
    }

    fn browse_gallery(&mut self) -> Result<()> {
        let Some(id) = self.config.gallery.first().map(|slot| slot.id) else {
            return Ok(());
        };
        if let Some(book) = self.session.story_mut() {
            book.select_gallery_image(id)?;
            book.clear_selection();
            self.metrics.gallery_views += 1;
            self.record(format!("view image {id}"), "closed");
        }
        Ok(())
    }

    fn play_code_page(&mut self, gift: usize) -> Result<()> {
        let mut misses = 0;
        loop {
            if !self.spend_step() {
                bail!("step budget exhausted on gift {}", gift + 1);
            }
            let Some(expected) = self.config.gift_codes.get(gift) else {
                bail!("no gift code configured for gift {gift}");
            };
            let Some(book) = self.session.story_mut() else {
                bail!("story book missing after hand-off");
            };
            let view = GateView {
                kind: GateKind::Gift(gift),
                expected,
                chances_remaining: book.chances_remaining(),
                misses,
            };
            let candidate = self.policy.guess(&view);
            book.set_code_input(candidate);
            let outcome = book.submit_typed_code(self.clock)?;
            let label = describe_gate(&view);
            if let Some(slot) = self.metrics.gift_misses.get_mut(gift)
                && !outcome.is_accepted()
            {
                *slot += 1;
            }
            self.record(label, format!("{outcome:?}"));
            if outcome == GateOutcome::Accepted {
                return Ok(());
            }
            misses += 1;
        }
    }
}

fn describe_gate(view: &GateView<'_>) -> String {
    match view.kind {
        GateKind::Outer => format!("secret code ({} chances)", view.chances_remaining),
        GateKind::Gift(gift) => {
            format!("gift {} code ({} chances)", gift + 1, view.chances_remaining)
        }
    }
}
