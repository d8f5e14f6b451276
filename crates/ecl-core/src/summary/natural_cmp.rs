use std::cmp::Ordering;

/// Orders keys so that embedded digit runs compare by value: `WOPR:W2`
/// sorts before `WOPR:W10`.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut left = left.as_bytes();
    let mut right = right.as_bytes();

    loop {
        match (left.first(), right.first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) if a.is_ascii_digit() && b.is_ascii_digit() => {
                let (left_run, left_rest) = split_digits(left);
                let (right_run, right_rest) = split_digits(right);
                let ordering = compare_digit_runs(left_run, right_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left = left_rest;
                right = right_rest;
            }
            (Some(a), Some(b)) => {
                if a != b {
                    return a.cmp(b);
                }
                left = &left[1..];
                right = &right[1..];
            }
        }
    }
}

fn split_digits(bytes: &[u8]) -> (&[u8], &[u8]) {
    let end = bytes
        .iter()
        .position(|byte| !byte.is_ascii_digit())
        .unwrap_or(bytes.len());
    bytes.split_at(end)
}

fn compare_digit_runs(left: &[u8], right: &[u8]) -> Ordering {
    let trim = |run: &[u8]| -> usize { run.iter().take_while(|byte| **byte == b'0').count() };
    let left_trimmed = &left[trim(left).min(left.len().saturating_sub(1))..];
    let right_trimmed = &right[trim(right).min(right.len().saturating_sub(1))..];

    left_trimmed
        .len()
        .cmp(&right_trimmed.len())
        .then_with(|| left_trimmed.cmp(right_trimmed))
        .then_with(|| left.len().cmp(&right.len()))
}
