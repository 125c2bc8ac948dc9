//! Identifier generation for transactions and members.

use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

static LAST_ISSUED: AtomicI64 = AtomicI64::new(i64::MIN);

/// Create an ID from the Unix time of `now` in milliseconds.
///
/// IDs issued by this process are strictly increasing: if two IDs are
/// requested within the same millisecond, the later one is bumped forward.
pub(crate) fn time_derived_id(now: OffsetDateTime) -> String {
    let millis = i64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX);

    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let candidate = if millis > last { millis } else { last + 1 };

        match LAST_ISSUED.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate.to_string(),
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use time::macros::datetime;

    use super::time_derived_id;

    #[test]
    fn ids_from_the_same_instant_are_unique() {
        let now = datetime!(2026-02-07 10:00 UTC);

        let ids: HashSet<String> = (0..100).map(|_| time_derived_id(now)).collect();

        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn id_is_at_least_the_unix_millis() {
        let now = datetime!(2100-01-01 0:00 UTC);

        let id: i64 = time_derived_id(now).parse().unwrap();

        assert!(id >= 4_102_444_800_000);
    }
}
