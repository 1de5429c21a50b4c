use anyhow::{Context, Result, bail, ensure};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Widest `a..b` range accepted on the command line.
const MAX_RANGE_LEN: u64 = 10_000;

/// Seed metadata used for logic and live runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// The CLI token this seed came from.
    pub source: String,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            source: seed.to_string(),
        }
    }
}

fn range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<start>\d+)\.\.(?P<inclusive>=)?(?P<end>\d+)$")
            .unwrap_or_else(|err| unreachable!("seed range pattern is valid: {err}"))
    })
}

/// Resolve CLI seed tokens into seeds.
///
/// Supports literal integers (negative values use their magnitude),
/// half-open `a..b` ranges and inclusive `a..=b` ranges. Duplicates are
/// dropped keeping first occurrence; no tokens means seed 1337.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let expanded: Vec<u64> = if let Some(caps) = range_pattern().captures(token) {
            let start: u64 = caps["start"]
                .parse()
                .with_context(|| format!("range start out of bounds in {token}"))?;
            let end: u64 = caps["end"]
                .parse()
                .with_context(|| format!("range end out of bounds in {token}"))?;
            let end = if caps.name("inclusive").is_some() {
                end.checked_add(1)
                    .with_context(|| format!("range end overflows in {token}"))?
            } else {
                end
            };
            ensure!(start < end, "empty seed range: {token}");
            ensure!(
                end - start <= MAX_RANGE_LEN,
                "seed range {token} spans more than {MAX_RANGE_LEN} seeds"
            );
            (start..end).collect()
        } else if let Ok(value) = token.parse::<i64>() {
            vec![value.unsigned_abs()]
        } else if let Ok(value) = token.parse::<u64>() {
            vec![value]
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        for seed in expanded {
            if seen.insert(seed) {
                seeds.push(SeedInfo {
                    seed,
                    source: token.to_string(),
                });
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(SeedInfo::from_numeric(1337));
    }

    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    fn values(infos: &[SeedInfo]) -> Vec<u64> {
        infos.iter().map(|s| s.seed).collect()
    }

    #[test]
    fn resolves_numbers_and_ranges() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "3..6", "10..=11"])).unwrap();
        assert_eq!(values(&seeds), vec![42, 7, 3, 4, 5, 10, 11]);
        assert_eq!(seeds[2].source, "3..6");
    }

    #[test]
    fn drops_duplicates_and_defaults() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "4..7"])).unwrap();
        assert_eq!(values(&seeds), vec![5, 4, 6]);
        let seeds = resolve_seed_inputs(&tokens(&["", " "])).unwrap();
        assert_eq!(values(&seeds), vec![1337]);
    }

    #[test]
    fn rejects_garbage_and_bad_ranges() {
        assert!(resolve_seed_inputs(&tokens(&["CL-ORANGE42"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["9..3"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..99999999"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["1...4"])).is_err());
    }

    #[test]
    fn large_literals_still_parse() {
        let seeds = resolve_seed_inputs(&tokens(&["18446744073709551615"])).unwrap();
        assert_eq!(values(&seeds), vec![u64::MAX]);
    }
}
