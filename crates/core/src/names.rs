//! Name normalization and comparison.
//!
//! These functions underpin the discrepancy checks between the name printed on
//! a pilot certificate and the name printed on a medical certificate. They are
//! pure and total: any input string normalizes to a (possibly empty) token
//! sequence, and absent inputs always compare as "no discrepancy judgeable".
//!
//! Known limitation: apostrophes and hyphens are preserved, so `O'Brien` and
//! `OBrien` are different tokens and a hyphenated surname written unhyphenated
//! on one document will be reported as a general discrepancy. This matches the
//! behaviour users already see; do not strip these characters without a
//! product decision.

/// Normalizes a raw name into an ordered token sequence.
///
/// Lowercases, strips `.` and `,`, collapses whitespace, trims, and splits on
/// whitespace. Empty or whitespace-only input yields an empty sequence.
///
/// Idempotent: re-normalizing the joined result yields the same tokens.
pub fn normalize(name: &str) -> Vec<String> {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '.' | ',' => {}
            _ => {
                for lc in ch.to_lowercase() {
                    out.push(lc);
                }
            }
        }
    }
    out.split_whitespace().map(str::to_owned).collect()
}

/// Returns true when both names are present and normalize to identical token
/// sequences.
///
/// Symmetric: `names_match(a, b) == names_match(b, a)`.
pub fn names_match(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => normalize(a) == normalize(b),
        _ => false,
    }
}

/// Returns true when name `a` carries one or more extra interior tokens that
/// name `b` lacks: `a` has strictly more tokens, and the first and last tokens
/// of both agree.
///
/// Deliberately asymmetric. The certificate name is always passed as `a` and
/// the medical name as `b`: a certificate commonly carries the full legal name
/// while a medical form may abbreviate it. Only the first and last tokens are
/// checked; two extra interior tokens count the same as one.
pub fn has_middle_name_asymmetry(a: Option<&str>, b: Option<&str>) -> bool {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };
    let tokens_a = normalize(a);
    let tokens_b = normalize(b);
    if tokens_a.len() <= tokens_b.len() {
        return false;
    }
    match (
        tokens_a.first(),
        tokens_a.last(),
        tokens_b.first(),
        tokens_b.last(),
    ) {
        (Some(a_first), Some(a_last), Some(b_first), Some(b_last)) => {
            a_first == b_first && a_last == b_last
        }
        _ => false,
    }
}

/// Returns true when both names are present and differ in a way not explained
/// by a missing middle name.
pub fn has_general_discrepancy(a: Option<&str>, b: Option<&str>) -> bool {
    if a.is_none() || b.is_none() {
        return false;
    }
    !names_match(a, b) && !has_middle_name_asymmetry(a, b)
}
