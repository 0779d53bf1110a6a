use anyhow::{Result, bail};

/// Seed used when the command line names none.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed arguments into a deduplicated list.
///
/// Accepts decimal integers (negative values use their magnitude) and `0x`
/// prefixed hex. An empty list resolves to [`DEFAULT_SEED`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let seed = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            match u64::from_str_radix(&hex.replace('_', ""), 16) {
                Ok(value) => value,
                Err(_) => bail!("invalid hex seed: {token}"),
            }
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else {
            bail!("unrecognised seed: {token}");
        };

        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_decimal_negative_and_hex() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xff", "18446744073709551615"]))
            .unwrap();
        assert_eq!(seeds, vec![42, 7, 255, u64::MAX]);
    }

    #[test]
    fn duplicates_collapse_and_empty_defaults() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "0x5", "-5", " "])).unwrap();
        assert_eq!(seeds, vec![5]);
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(resolve_seed_inputs(&tokens(&["seed"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
    }
}
