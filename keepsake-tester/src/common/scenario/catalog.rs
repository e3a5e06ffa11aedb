use anyhow::{Context, Result, anyhow, bail, ensure};
use chrono::{DateTime, Duration, Utc};
use keepsake_core::{
    CardConfig, CardEvent, CardSession, CardState, ConfigError, GateOutcome, NavError, PageKind,
    StoryBook, Transition,
};

use super::TestScenario;
use crate::logic::game_tester::SimulationSummary;
use crate::logic::{GameplayStrategy, SimulationPlan};

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::simulation(
            "Gift Gate Unlock and Punishment",
            base_plan().with_expectation(gate_rules_expectation),
        ),
        TestScenario::simulation(
            "Navigation Clamping",
            base_plan().with_expectation(navigation_clamp_expectation),
        ),
        TestScenario::simulation(
            "Treasure Page Parity",
            base_plan().with_expectation(treasure_parity_expectation),
        ),
        TestScenario::simulation(
            "Mismatched Card Refused",
            base_plan().with_expectation(config_mismatch_expectation),
        ),
        TestScenario::simulation(
            "Yes Response Bridge",
            base_plan().with_expectation(yes_response_expectation),
        ),
    ]
}

pub fn find_catalog_scenario(name: &str) -> Option<TestScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.name == name)
}

fn base_plan() -> SimulationPlan {
    SimulationPlan::new(GameplayStrategy::Perfect).with_max_steps(0)
}

const MAX_CELEBRATION_TICKS: u32 = 10_000;

/// Say yes and sit through the celebration. Returns the clock on arrival at
/// the secret code card.
fn reach_secret_code(session: &mut CardSession, start: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let mut clock = start;
    session.handle(CardEvent::Proceed, clock);
    session.handle(CardEvent::Answer(true), clock);
    for _ in 0..MAX_CELEBRATION_TICKS {
        if session.state() == CardState::SecretCode {
            return Ok(clock);
        }
        clock += Duration::seconds(1);
        session.tick(clock);
    }
    bail!("celebration never reached the secret code, stuck on {}", session.state())
}

/// Fresh session on the run's card, already past the secret code.
fn open_story(summary: &SimulationSummary) -> Result<(CardSession, DateTime<Utc>)> {
    let config: CardConfig = summary.config.as_ref().clone();
    let passphrase = config.outer_passphrase.to_uppercase();
    let mut session = CardSession::new(config)?;
    let now = reach_secret_code(&mut session, summary.started_at)?;
    let outcome = session.submit_passphrase(&passphrase, now)?;
    ensure!(outcome.is_accepted(), "Upper-cased passphrase should unlock");
    ensure!(
        session.story().is_some(),
        "Story book should open after the secret code"
    );
    Ok((session, now))
}

fn story(session: &mut CardSession) -> Result<&mut StoryBook> {
    session
        .story_mut()
        .ok_or_else(|| anyhow!("story book should be open"))
}

fn walk_to(book: &mut StoryBook, page: usize) -> Result<()> {
    while book.current_page() < page {
        let before = book.current_page();
        let after = book.go_next()?;
        ensure!(after > before, "Navigation stalled on page {before}");
    }
    Ok(())
}

fn gate_rules_expectation(summary: &SimulationSummary) -> Result<()> {
    let (mut session, now) = open_story(summary)?;
    let book = story(&mut session)?;
    let start = book.config().treasure.start;
    let code = book
        .config()
        .gift_codes
        .first()
        .cloned()
        .context("card should have at least one gift")?;
    walk_to(book, start)?;

    for (attempt, left) in [(0, Some(2)), (1, Some(1)), (2, None)] {
        let outcome = book.submit_code(&format!("{code}-{attempt}"), now)?;
        match left {
            Some(chances_left) => ensure!(
                outcome == GateOutcome::Rejected { chances_left },
                "Miss {attempt} should leave {chances_left} chances, got {outcome:?}"
            ),
            None => ensure!(
                outcome == GateOutcome::Exhausted { total_failures: 1 },
                "Third miss should cost a punch, got {outcome:?}"
            ),
        }
    }
    ensure!(book.current_page() == start, "Misses must not move the page");
    ensure!(book.chances_remaining() == 3, "Chances reset after a punch");
    ensure!(
        book.feedback().punishment_visible(now),
        "Punishment banner should be showing"
    );

    let outcome = book.submit_code(&code.to_lowercase(), now)?;
    ensure!(outcome.is_accepted(), "Lower-cased gift code should unlock");
    ensure!(book.current_page() == start + 1, "Unlock advances by one page");
    ensure!(book.confetti_visible(now), "Unlock starts confetti");
    ensure!(book.total_failures() == 1, "Unlock keeps the tally");
    Ok(())
}

fn navigation_clamp_expectation(summary: &SimulationSummary) -> Result<()> {
    let (mut session, now) = open_story(summary)?;
    let book = story(&mut session)?;
    let config = book.config().clone();

    ensure!(book.go_prev()? == 0, "Previous on the cover stays on the cover");
    walk_to(book, config.treasure.start)?;
    let locked = NavError::LockedByCode {
        page: config.treasure.start,
    };
    ensure!(
        book.go_next() == Err(locked),
        "Code pages must block forward navigation"
    );
    ensure!(
        matches!(book.go_prev(), Err(NavError::BackwardInHunt { .. })),
        "The hunt must block backward navigation"
    );

    for code in &config.gift_codes {
        let outcome = book.submit_code(code, now)?;
        ensure!(outcome.is_accepted(), "Code {code} should unlock");
        book.go_next()?;
    }
    walk_to(book, config.page_count() - 1)?;
    let last = book.current_page();
    ensure!(book.go_next()? == last, "Next on the final page stays put");
    ensure!(
        book.affordances().restart && !book.affordances().next,
        "Final page offers start over instead of next"
    );
    Ok(())
}

fn treasure_parity_expectation(summary: &SimulationSummary) -> Result<()> {
    let config = &summary.config;
    let range = config.treasure;
    for page in range.start..=range.end {
        let slot = range
            .slot(page)
            .with_context(|| format!("page {page} should be in the hunt"))?;
        ensure!(
            slot.is_code() != slot.is_reward(),
            "Page {page} must be exactly one of code or reward"
        );
        ensure!(
            slot.gift() == (page - range.start) / 2,
            "Page {page} has gift index {}",
            slot.gift()
        );
        let declared = config.pages.get(page).and_then(|p| p.kind.treasure_slot());
        ensure!(
            declared == Some(slot),
            "Page {page} is declared as {declared:?} but the range implies {slot:?}"
        );
    }
    ensure!(
        config
            .pages
            .last()
            .is_some_and(|page| page.kind == PageKind::Final),
        "Last page should be the final page"
    );
    Ok(())
}

fn config_mismatch_expectation(summary: &SimulationSummary) -> Result<()> {
    let mut short_codes = summary.config.as_ref().clone();
    short_codes.gift_codes.pop();
    ensure!(
        matches!(
            CardSession::new(short_codes).map(|_| ()),
            Err(ConfigError::GiftCountMismatch { .. })
        ),
        "Dropping a gift code must refuse to start"
    );

    let mut shifted = summary.config.as_ref().clone();
    shifted.treasure.start += 1;
    shifted.treasure.end += 1;
    ensure!(
        CardSession::new(shifted).is_err(),
        "Shifting the hunt must refuse to start"
    );
    Ok(())
}

fn yes_response_expectation(summary: &SimulationSummary) -> Result<()> {
    let now = summary.started_at;
    let mut session = CardSession::new(summary.config.as_ref().clone())?;
    session.handle(CardEvent::Proceed, now);
    ensure!(
        matches!(
            session.handle(CardEvent::Proceed, now),
            Transition::Ignored { .. }
        ),
        "Unlisted events are ignored"
    );
    let bridged = session.enter_yes_response(now);
    ensure!(
        bridged.moved_to() == Some(CardState::YesResponse),
        "Question cards should bridge to the yes response, got {bridged:?}"
    );
    let transition = session.handle(CardEvent::Acknowledge, now);
    ensure!(
        transition.moved_to() == Some(CardState::SecretCode),
        "Yes response should lead to the secret code, got {transition:?}"
    );
    ensure!(
        session.enter_yes_response(now) == Transition::Stayed,
        "The bridge must not leave the secret code card"
    );
    ensure!(
        session.story().is_none(),
        "Story must stay locked without the passphrase"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{GameTester, TesterAssets};
    use keepsake_core::{CardEngine, Preset};
    use std::sync::Arc;

    #[test]
    fn catalog_passes_on_both_presets() {
        for preset in Preset::ALL {
            let config = CardEngine::new(preset).load_config().unwrap();
            let assets = TesterAssets::from_config(config, "test");
            let tester = GameTester::new(Arc::new(assets), false);
            for scenario in catalog_scenarios() {
                let summary = tester.run_plan(&scenario.plan, 7).unwrap();
                for expectation in &scenario.plan.expectations {
                    expectation
                        .evaluate(&summary)
                        .unwrap_or_else(|err| panic!("{} on {preset}: {err:#}", scenario.name));
                }
            }
        }
    }
}
