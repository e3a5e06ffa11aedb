use chrono::{DateTime, Duration, TimeZone, Utc};
use keepsake_core::{
    CardConfig, CardEvent, CardSession, CardState, Countdown, CountdownTick, Effect, GateOutcome,
    PassphraseGate, Preset, PunchTier, StoryBook, TreasureSlot,
};
use keepsake_core::{CardLoader, constants::DEFAULT_CHANCES};
use std::sync::Arc;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 9, 12, 0, 0).unwrap()
}

fn preset_configs() -> Vec<CardConfig> {
    Preset::ALL
        .iter()
        .map(|preset| preset.load_card().unwrap())
        .collect()
}

fn book_at_first_code(config: &CardConfig) -> StoryBook {
    let mut book = StoryBook::new(Arc::new(config.clone()), 0);
    while book.treasure_slot().is_none() {
        book.go_next().unwrap();
    }
    book
}

#[test]
fn passphrase_accepts_any_casing() {
    for candidate in ["pookie", "POOKIE", "PoOkIe", "pOOKIe"] {
        let mut gate = PassphraseGate::new("Pookie");
        assert_eq!(gate.submit(candidate), GateOutcome::Accepted, "{candidate}");
    }
    let mut gate = PassphraseGate::new("pookie");
    assert_ne!(gate.submit(" pookie"), GateOutcome::Accepted);
}

#[test]
fn chances_drop_one_per_miss_and_tally_keeps_growing() {
    let mut gate = PassphraseGate::new("gift");
    for lockout in 1..=4_u32 {
        for k in 1..DEFAULT_CHANCES {
            gate.submit("wrong");
            assert_eq!(gate.chances_remaining(), 3 - k);
            assert_eq!(gate.total_failures(), lockout - 1);
        }
        assert_eq!(
            gate.submit("wrong"),
            GateOutcome::Exhausted {
                total_failures: lockout
            }
        );
        assert_eq!(gate.chances_remaining(), 3);
    }
    assert_eq!(gate.submit("GIFT"), GateOutcome::Accepted);
    assert_eq!(gate.total_failures(), 4);
}

#[test]
fn treasure_pages_alternate_code_and_reward() {
    for config in preset_configs() {
        let range = config.treasure;
        for page in range.start..=range.end {
            let slot = range.slot(page).unwrap();
            assert_ne!(slot.is_code(), slot.is_reward());
            assert_eq!(slot.gift(), (page - range.start) / 2);
            assert_eq!(config.pages[page].kind.treasure_slot(), Some(slot));
        }
        assert_eq!(range.gift_count(), config.gift_codes.len());
        assert!(range.slot(range.start - 1).is_none());
        assert!(range.slot(range.end + 1).is_none());
    }
}

#[test]
fn navigation_clamps_at_both_ends() {
    let config = CardConfig::classic().unwrap();
    let mut book = StoryBook::new(Arc::new(config.clone()), 0);
    assert_eq!(book.go_prev(), Ok(0));

    let mut book_end = book_at_first_code(&config);
    for code in &config.gift_codes {
        book_end.submit_code(code, now()).unwrap();
        book_end.go_next().unwrap();
    }
    let last = config.page_count() - 1;
    while book_end.current_page() < last {
        book_end.go_next().unwrap();
    }
    assert_eq!(book_end.go_next(), Ok(last));
    assert_eq!(book_end.current_page(), last);

    book.go_next().unwrap();
    assert_eq!(book.go_prev(), Ok(0));
}

#[test]
fn first_gift_code_unlocks_and_advances_one_page() {
    for config in preset_configs() {
        let mut book = book_at_first_code(&config);
        let start = book.current_page();
        book.submit_code("nope", now()).unwrap();

        let outcome = book.submit_code(&config.gift_codes[0], now()).unwrap();
        assert_eq!(outcome, GateOutcome::Accepted);
        assert_eq!(book.current_page(), start + 1);
        assert!(book.confetti_visible(now()));
        assert!(!book.confetti_visible(now() + Duration::seconds(5)));
        assert_eq!(book.drain_effects(), vec![Effect::Confetti]);

        book.go_next().unwrap();
        assert_eq!(book.treasure_slot(), Some(TreasureSlot::Code { gift: 1 }));
        assert_eq!(book.chances_remaining(), 3);
    }
}

#[test]
fn three_wrong_codes_cost_one_punch() {
    for config in preset_configs() {
        let mut book = book_at_first_code(&config);
        let page = book.current_page();
        for _ in 0..3 {
            book.submit_code("definitely wrong", now()).unwrap();
            assert_eq!(book.current_page(), page);
        }
        assert_eq!(book.total_failures(), 1);
        assert_eq!(book.chances_remaining(), 3);
        assert!(book.feedback().punishment_visible(now()));
        assert!(!book.feedback().punishment_visible(now() + Duration::seconds(5)));
        assert_eq!(book.drain_effects(), vec![Effect::Punishment]);
    }
}

#[test]
fn no_loop_never_reaches_the_celebration() {
    let mut session = CardSession::new(CardConfig::classic().unwrap()).unwrap();
    session.handle(CardEvent::Proceed, now());
    for _ in 0..5 {
        assert_eq!(session.state(), CardState::MainQuestion);
        session.handle(CardEvent::Answer(false), now());
        assert_eq!(session.state(), CardState::AreYouSure);
        session.handle(CardEvent::Answer(true), now());
        assert_eq!(session.state(), CardState::FinalNoResponse);
        session.handle(CardEvent::Acknowledge, now());
    }
    assert_eq!(session.state(), CardState::MainQuestion);
    assert!(session.story().is_none());
}

#[test]
fn past_target_falls_back_to_ten_second_countdown() {
    let mut countdown = Countdown::start(now() - Duration::days(1), now());
    assert!(countdown.is_fallback());
    assert_eq!(countdown.peek(now()), CountdownTick::Fallback(10));
    for expected in (1..10).rev() {
        assert_eq!(countdown.tick(now()), CountdownTick::Fallback(expected));
    }
    assert_eq!(countdown.tick(now()), CountdownTick::Completed);
    assert!(countdown.is_completed());
}

#[test]
fn full_card_carries_punches_to_the_summary() {
    let config = CardConfig::riddles().unwrap();
    let mut clock = config.celebration_target + Duration::days(30);
    let mut session = CardSession::new(config.clone()).unwrap();

    session.handle(CardEvent::Proceed, clock);
    session.handle(CardEvent::Answer(true), clock);
    assert_eq!(session.state(), CardState::BirthdayCelebration);
    let mut ticks = 0;
    while session.state() == CardState::BirthdayCelebration {
        clock += Duration::seconds(1);
        session.tick(clock);
        ticks += 1;
        assert!(ticks < 30, "celebration never finished");
    }
    assert_eq!(session.state(), CardState::SecretCode);

    for _ in 0..3 {
        session.submit_passphrase("wrong", clock).unwrap();
    }
    assert!(session.submit_passphrase("POOKIE", clock).unwrap().is_accepted());
    assert_eq!(session.state(), CardState::MainContent);

    let codes = config.gift_codes.clone();
    let book = session.story_mut().unwrap();
    while book.treasure_slot().is_none() {
        book.go_next().unwrap();
    }
    for code in &codes {
        for _ in 0..3 {
            book.submit_code("wrong", clock).unwrap();
        }
        book.submit_code(code, clock).unwrap();
        book.go_next().unwrap();
    }
    let verdict = book.summary();
    assert_eq!(verdict.total_failures, 7);
    assert_eq!(verdict.tier, PunchTier::Many);

    while book.go_next().unwrap() < config.page_count() - 1 {}
    book.restart().unwrap();
    assert_eq!(book.current_page(), 0);
    assert_eq!(session.total_failures(), 7);
}
