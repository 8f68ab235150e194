use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds.
///
/// Clocks that report a time before the epoch (misconfigured hosts) clamp to
/// zero rather than panicking; every consumer treats `0` as "unknown/never".
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_unix_is_plausible() {
        let t = now_unix();
        assert!(t > 1_700_000_000);
    }
}
