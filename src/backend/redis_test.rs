use super::redis::ttl_secs;
use std::time::Duration;

// Connection-level behavior needs a live server and is exercised by the
// memory engine tests through the shared contract; these cover the unit
// conversion the contract mandates.

#[test]
fn ttl_rounds_up_to_whole_seconds() {
    assert_eq!(ttl_secs(Duration::from_millis(1)), 1);
    assert_eq!(ttl_secs(Duration::from_millis(999)), 1);
    assert_eq!(ttl_secs(Duration::from_millis(1000)), 1);
    assert_eq!(ttl_secs(Duration::from_millis(1001)), 2);
    assert_eq!(ttl_secs(Duration::from_secs(30)), 30);
}

#[test]
fn conversion_never_produces_ex_zero() {
    // `SET EX 0` is a redis error; the floor is one second. Zero TTLs are
    // normalized to "no deadline" before conversion and never reach here.
    assert_eq!(ttl_secs(Duration::ZERO), 1);
}
