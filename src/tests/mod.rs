//! Integration tests for tagcache.
//!
//! End-to-end cases exercising the frontend against the in-process engine:
//! round trips, lifetimes, tag invalidation and notifications.

mod cases_roundtrip_test;

pub mod support;
