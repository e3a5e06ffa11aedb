pub mod catalog;
pub mod playthrough;

use crate::logic::SimulationPlan;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

const SCENARIOS: &[(&str, &str)] = &[
    ("smoke", "Perfect Playthrough"),
    ("clumsy", "Clumsy Typist Playthrough"),
    ("stubborn", "Stubborn Punch Collector"),
    ("random", "Seeded Random Playthrough"),
    ("no-loop", "Endless No Loop"),
    ("countdown-target", "Countdown Toward Target"),
    ("start-over", "Start Over Keeps Tally"),
    ("gate-rules", "Gift Gate Unlock and Punishment"),
    ("navigation-clamp", "Navigation Clamping"),
    ("treasure-parity", "Treasure Page Parity"),
    ("config-mismatch", "Mismatched Card Refused"),
    ("yes-response", "Yes Response Bridge"),
];

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" | "perfect" => playthrough::smoke_scenario(),
        "clumsy" => playthrough::clumsy_scenario(),
        "stubborn" | "punches" => playthrough::stubborn_scenario(),
        "random" => playthrough::random_scenario(),
        "no-loop" | "refuser" => playthrough::no_loop_scenario(),
        "countdown-target" | "countdown" => playthrough::countdown_target_scenario(),
        "start-over" | "restart" => playthrough::start_over_scenario(),
        "gate-rules" | "gates" => catalog::find_catalog_scenario("Gift Gate Unlock and Punishment")?,
        "navigation-clamp" | "navigation" => {
            catalog::find_catalog_scenario("Navigation Clamping")?
        }
        "treasure-parity" | "parity" => catalog::find_catalog_scenario("Treasure Page Parity")?,
        "config-mismatch" | "config" => {
            catalog::find_catalog_scenario("Mismatched Card Refused")?
        }
        "yes-response" => catalog::find_catalog_scenario("Yes Response Bridge")?,
        _ => return None,
    };
    Some(scenario)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.to_vec()
}

pub fn all_scenario_keys() -> Vec<String> {
    SCENARIOS.iter().map(|(key, _)| (*key).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves_by_key() {
        for (key, description) in list_scenarios() {
            let scenario = get_scenario(key).unwrap_or_else(|| panic!("{key} should resolve"));
            assert_eq!(scenario.name, description);
        }
        assert!(get_scenario("boss-fight").is_none());
    }

    #[test]
    fn aliases_are_case_insensitive() {
        assert_eq!(get_scenario("PERFECT").map(|s| s.name), Some("Perfect Playthrough".into()));
        assert!(get_scenario("Restart").is_some());
    }
}
