//! Decoding of Junos `$9$` obfuscated secrets.
//!
//! Devices store plain-text secrets (archive site passwords, pre-shared
//! keys) in a reversible type-9 encoding. Each plain character becomes a
//! group of letters from a fixed 65-letter alphabet; the gap between
//! consecutive letters carries the value, weighted by a position-dependent
//! encoding table.

use crate::error::ProviderError;

const PREFIX: &str = "$9$";

const FAMILY: [&str; 4] = [
    "QzF3n6/9CAtpu0O",
    "B1IREhcSyrleKvMW8LXx",
    "7N-dVbwsY2g4oaJZGUDj",
    "iHkq.mPf5T",
];

const ENCODING: [&[u32]; 7] = [
    &[1, 4, 32],
    &[1, 16, 32],
    &[1, 8, 32],
    &[1, 64],
    &[1, 32],
    &[1, 4, 16, 128],
    &[1, 32, 64],
];

fn alphabet() -> Vec<char> {
    FAMILY.iter().flat_map(|f| f.chars()).collect()
}

/// Number of random letters that follow the salt letter.
fn extra(c: char) -> Option<usize> {
    FAMILY
        .iter()
        .position(|f| f.contains(c))
        .map(|family| 3 - family)
}

/// Whether a value is in `$9$` form.
pub fn is_encoded(value: &str) -> bool {
    value.starts_with(PREFIX)
}

/// Decode a `$9$` secret to plain text.
pub fn decode(secret: &str) -> Result<String, ProviderError> {
    let body = secret
        .strip_prefix(PREFIX)
        .ok_or_else(|| ProviderError::Decode(format!("missing {} prefix", PREFIX)))?;
    let alpha = alphabet();
    let index = |c: char| {
        alpha
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| ProviderError::Decode(format!("invalid character '{}'", c)))
    };

    let mut chars = body.chars();
    let salt = chars
        .next()
        .ok_or_else(|| ProviderError::Decode("empty secret".to_string()))?;
    let skip = extra(salt)
        .ok_or_else(|| ProviderError::Decode(format!("invalid salt '{}'", salt)))?;
    let rest: Vec<char> = chars.collect();
    if rest.len() < skip {
        return Err(ProviderError::Decode("secret too short".to_string()));
    }

    let mut prev = salt;
    let mut plain = String::new();
    let mut cursor = &rest[skip..];
    while !cursor.is_empty() {
        let weights = ENCODING[plain.chars().count() % ENCODING.len()];
        if cursor.len() < weights.len() {
            return Err(ProviderError::Decode("truncated secret".to_string()));
        }
        let (nibble, tail) = cursor.split_at(weights.len());
        let mut value: u32 = 0;
        for (&c, &weight) in nibble.iter().zip(weights) {
            let gap = (index(c)? as i64 - index(prev)? as i64).rem_euclid(alpha.len() as i64) - 1;
            if gap < 0 {
                return Err(ProviderError::Decode(format!("invalid sequence at '{}'", c)));
            }
            value += gap as u32 * weight;
            prev = c;
        }
        plain.push(char::from((value % 256) as u8));
        cursor = tail;
    }
    Ok(plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Inverse of `decode` with caller-chosen salt and padding.
    fn encode(plain: &str, salt: char, padding: &str) -> String {
        let alpha = alphabet();
        let index = |c: char| alpha.iter().position(|&a| a == c).unwrap();
        assert_eq!(padding.chars().count(), extra(salt).unwrap());

        let mut crypt = format!("{}{}{}", PREFIX, salt, padding);
        let mut prev = salt;
        for (pos, p) in plain.chars().enumerate() {
            let weights = ENCODING[pos % ENCODING.len()];
            let mut ord = p as u32;
            let mut gaps = vec![0u32; weights.len()];
            for (i, &weight) in weights.iter().enumerate().rev() {
                gaps[i] = ord / weight;
                ord %= weight;
            }
            for gap in gaps {
                let next = alpha[(gap as usize + index(prev) + 1) % alpha.len()];
                crypt.push(next);
                prev = next;
            }
        }
        crypt
    }

    #[test]
    fn test_alphabet_size() {
        assert_eq!(alphabet().len(), 65);
        assert_eq!(extra('Q'), Some(3));
        assert_eq!(extra('i'), Some(0));
        assert_eq!(extra('$'), None);
    }

    #[test]
    fn test_decode_reverses_encoding() {
        for (plain, salt, padding) in [
            ("password", 'i', ""),
            ("Juniper123!", 'Q', "zF3"),
            ("ftp archive key", '7', "N"),
        ] {
            let secret = encode(plain, salt, padding);
            assert!(is_encoded(&secret));
            assert_eq!(decode(&secret).unwrap(), plain);
        }
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode("plain"), Err(ProviderError::Decode(_))));
        assert!(matches!(decode("$9$"), Err(ProviderError::Decode(_))));
        assert!(matches!(decode("$9$Q"), Err(ProviderError::Decode(_))));
        assert!(matches!(decode("$9$i$$$"), Err(ProviderError::Decode(_))));
        assert!(matches!(decode("$9$iQQ"), Err(ProviderError::Decode(_))));
    }
}
