use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("unrecognised seed `{0}` (expected an integer, 0x-prefixed hex, or `random`)")]
    Unrecognised(String),
    #[error("no seeds given")]
    Empty,
}

/// Resolve CLI seed tokens into numeric seeds.
///
/// Accepts decimal integers (negative values use their magnitude),
/// `0x`-prefixed hex, and the keyword `random`, which picks a fresh seed
/// from the thread RNG. Duplicates are dropped, first occurrence wins.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>, SeedError> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let seed = parse_seed(token).ok_or_else(|| SeedError::Unrecognised(token.to_string()))?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        return Err(SeedError::Empty);
    }
    Ok(seeds)
}

fn parse_seed(token: &str) -> Option<u64> {
    if token.eq_ignore_ascii_case("random") {
        return Some(rand::thread_rng().r#gen());
    }
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(&hex.replace('_', ""), 16).ok();
    }
    if let Ok(value) = token.parse::<u64>() {
        return Some(value);
    }
    token.parse::<i64>().ok().map(i64::unsigned_abs)
}
