use std::hint::black_box;

/// Compare two byte slices without an early exit.
///
/// The length difference and every overlapping byte difference are folded
/// into one accumulator, so the running time depends only on the shorter
/// length, never on where the first mismatch sits.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = (a.len() ^ b.len()) as u64;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= u64::from(black_box(x ^ y));
    }
    black_box(diff) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn equal_slices_match() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn differing_bytes_do_not_match() {
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"xbc", b"abc"));
    }

    #[test]
    fn length_mismatch_does_not_match() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"", b"a"));
        // a prefix is still a mismatch
        assert!(!constant_time_eq(&[0u8; 64], &[0u8; 63]));
    }

    fn sample(a: &[u8], b: &[u8], rounds: usize) -> Duration {
        let start = Instant::now();
        for _ in 0..rounds {
            black_box(constant_time_eq(black_box(a), black_box(b)));
        }
        start.elapsed()
    }

    // Statistical sampling; noisy on shared machines, run with `--ignored`.
    #[test]
    #[ignore]
    fn timing_does_not_depend_on_mismatch_position() {
        let base = vec![0xA5u8; 4096];
        let mut first = base.clone();
        first[0] ^= 1;
        let mut last = base.clone();
        last[4095] ^= 1;

        let rounds = 2_000;
        let mut first_total = Duration::ZERO;
        let mut last_total = Duration::ZERO;
        for _ in 0..20 {
            first_total += sample(&base, &first, rounds);
            last_total += sample(&base, &last, rounds);
        }

        let ratio = first_total.as_secs_f64() / last_total.as_secs_f64();
        println!("first/last mismatch timing ratio: {ratio:.3}");
        assert!(ratio > 0.5 && ratio < 2.0, "ratio {ratio} out of range");
    }
}
