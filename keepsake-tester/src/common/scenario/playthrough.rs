use anyhow::{Result, ensure};
use chrono::Duration;
use keepsake_core::{CardState, PunchTier};

use super::TestScenario;
use crate::logic::game_tester::SimulationSummary;
use crate::logic::{GameplayStrategy, SimulationPlan};

const CHANCES_PER_PUNCH: u32 = 3;

fn gate_count(summary: &SimulationSummary) -> u32 {
    u32::try_from(summary.config.gift_codes.len()).unwrap_or(u32::MAX) + 1
}

fn completed_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.metrics.completed,
        "Playthrough should reach the final page"
    );
    ensure!(
        summary.final_snapshot.state == CardState::MainContent,
        "Story should be open at the end, found {}",
        summary.final_snapshot.state
    );
    Ok(())
}

fn countdown_expectation(summary: &SimulationSummary) -> Result<()> {
    let after_loader = summary.started_at + Duration::milliseconds(summary.config.loader_ms);
    let remaining_ms = (summary.config.celebration_target - after_loader).num_milliseconds();
    let expected = if remaining_ms > 0 {
        u32::try_from((remaining_ms + 999) / 1_000).unwrap_or(u32::MAX)
    } else {
        10
    };
    ensure!(
        summary.metrics.countdown_ticks == expected,
        "Countdown should take {expected} ticks, took {}",
        summary.metrics.countdown_ticks
    );
    Ok(())
}

fn tally_expectation(summary: &SimulationSummary) -> Result<()> {
    let outer = summary.metrics.outer_misses / CHANCES_PER_PUNCH;
    let gifts: u32 = summary
        .metrics
        .gift_misses
        .iter()
        .map(|misses| misses / CHANCES_PER_PUNCH)
        .sum();
    ensure!(
        summary.total_failures() == outer + gifts,
        "Tally {} should equal one punch per three misses ({})",
        summary.total_failures(),
        outer + gifts
    );
    ensure!(
        summary.metrics.punishments_seen == summary.total_failures(),
        "Every punch should raise the punishment banner"
    );
    if let Some(verdict) = &summary.verdict {
        ensure!(
            verdict.tier == PunchTier::for_tally(summary.total_failures()),
            "Summary tier {:?} does not match tally {}",
            verdict.tier,
            summary.total_failures()
        );
    }
    Ok(())
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    countdown_expectation(summary)?;
    ensure!(summary.total_failures() == 0, "Perfect run should not be punched");
    ensure!(
        summary.metrics.confetti_bursts == gate_count(summary),
        "Expected confetti for the celebration and every gift, saw {}",
        summary.metrics.confetti_bursts
    );
    ensure!(
        summary.metrics.pages_visited == summary.config.page_count(),
        "Every page should be visited"
    );
    Ok(())
}

fn clumsy_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    ensure!(
        summary.metrics.total_misses() == gate_count(summary),
        "Clumsy player should miss once per gate, missed {}",
        summary.metrics.total_misses()
    );
    ensure!(
        summary.total_failures() == 0,
        "A single miss per gate should never cost a punch"
    );
    Ok(())
}

fn stubborn_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    tally_expectation(summary)?;
    ensure!(summary.metrics.no_loops == 2, "Stubborn player says no twice");
    ensure!(
        summary.total_failures() == gate_count(summary),
        "Expected one punch per gate, got {}",
        summary.total_failures()
    );
    Ok(())
}

fn random_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    countdown_expectation(summary)?;
    tally_expectation(summary)
}

fn no_loop_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        !summary.metrics.reached_celebration,
        "Answering no must never reach the celebration"
    );
    ensure!(
        matches!(
            summary.final_snapshot.state,
            CardState::MainQuestion | CardState::AreYouSure | CardState::FinalNoResponse
        ),
        "Refuser should stay on the question cards, found {}",
        summary.final_snapshot.state
    );
    ensure!(summary.verdict.is_none(), "Story should stay locked");
    Ok(())
}

fn start_over_expectation(summary: &SimulationSummary) -> Result<()> {
    completed_expectation(summary)?;
    ensure!(summary.metrics.restarted, "Start over should be offered");
    ensure!(
        summary.final_snapshot.page == Some(0),
        "Start over should return to the cover"
    );
    ensure!(
        summary.total_failures() == gate_count(summary),
        "Tally should survive the restart, found {}",
        summary.total_failures()
    );
    Ok(())
}

pub fn smoke_scenario() -> TestScenario {
    TestScenario::simulation(
        "Perfect Playthrough",
        SimulationPlan::new(GameplayStrategy::Perfect).with_expectation(smoke_expectation),
    )
}

pub fn clumsy_scenario() -> TestScenario {
    TestScenario::simulation(
        "Clumsy Typist Playthrough",
        SimulationPlan::new(GameplayStrategy::Clumsy).with_expectation(clumsy_expectation),
    )
}

pub fn stubborn_scenario() -> TestScenario {
    TestScenario::simulation(
        "Stubborn Punch Collector",
        SimulationPlan::new(GameplayStrategy::Stubborn).with_expectation(stubborn_expectation),
    )
}

pub fn random_scenario() -> TestScenario {
    TestScenario::simulation(
        "Seeded Random Playthrough",
        SimulationPlan::new(GameplayStrategy::Random).with_expectation(random_expectation),
    )
}

pub fn no_loop_scenario() -> TestScenario {
    TestScenario::simulation(
        "Endless No Loop",
        SimulationPlan::new(GameplayStrategy::Refuser)
            .with_max_steps(90)
            .with_expectation(no_loop_expectation),
    )
}

pub fn countdown_target_scenario() -> TestScenario {
    TestScenario::simulation(
        "Countdown Toward Target",
        SimulationPlan::new(GameplayStrategy::Perfect)
            .with_clock_offset(Duration::seconds(-8))
            .with_expectation(completed_expectation)
            .with_expectation(countdown_expectation),
    )
}

pub fn start_over_scenario() -> TestScenario {
    TestScenario::simulation(
        "Start Over Keeps Tally",
        SimulationPlan::new(GameplayStrategy::Stubborn)
            .with_restart()
            .with_expectation(start_over_expectation)
            .with_expectation(tally_expectation),
    )
}
