use anyhow::{Context, Result, bail};

const DEFAULT_SEED: u64 = 1337;
const MAX_RANGE_LEN: u64 = 10_000;

/// Resolve CLI seed tokens into a de-duplicated, ordered seed list.
///
/// Supports decimal and `0x` hex literals, negative numbers (by magnitude)
/// and inclusive ranges such as `1..=5` or `1..5`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = parse_range(token)? {
            if end < start {
                bail!("Seed range {token} is inverted");
            }
            if end - start >= MAX_RANGE_LEN {
                bail!("Seed range {token} is longer than {MAX_RANGE_LEN} seeds");
            }
            seeds.extend(start..=end);
            continue;
        }

        seeds.push(parse_seed(token)?);
    }

    let mut seen = std::collections::HashSet::new();
    seeds.retain(|seed| seen.insert(*seed));

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}

fn parse_range(token: &str) -> Result<Option<(u64, u64)>> {
    if let Some((start, end)) = token.split_once("..=") {
        return Ok(Some((parse_seed(start)?, parse_seed(end)?)));
    }
    if let Some((start, end)) = token.split_once("..") {
        let end = parse_seed(end)?;
        let Some(end) = end.checked_sub(1) else {
            bail!("Seed range {token} is empty");
        };
        return Ok(Some((parse_seed(start)?, end)));
    }
    Ok(None)
}

fn parse_seed(token: &str) -> Result<u64> {
    let token = token.trim();
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .with_context(|| format!("Unrecognized seed token: {token}"));
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    token
        .parse::<u64>()
        .with_context(|| format!("Unrecognized seed token: {token}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numeric_hex_and_ranges() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0x10", "1..=3", "5..7"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 16, 1, 2, 3, 5, 6]);
    }

    #[test]
    fn deduplicates_and_defaults() {
        let seeds = resolve_seed_inputs(&tokens(&["3", "1..=4", "3"])).unwrap();
        assert_eq!(seeds, vec![3, 1, 2, 4]);
        assert_eq!(resolve_seed_inputs(&tokens(&["", " "])).unwrap(), vec![1337]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(resolve_seed_inputs(&tokens(&["CL-ORANGE42"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["9..=2"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..0"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..=20000"])).is_err());
    }
}
