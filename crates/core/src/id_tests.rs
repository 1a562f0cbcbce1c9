// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

crate::define_id! {
    pub struct TestId;
}

#[test]
fn short_truncates_long_ids() {
    let id = TestId::new("abcdefgh");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn short_is_noop_on_short_ids() {
    let id = TestId::new("ab");
    assert_eq!(id.short(4), "ab");
}

#[test]
fn sequential_id_gen_is_deterministic() {
    let gen = SequentialIdGen::new("build");
    assert_eq!(gen.next(), "build-1");
    assert_eq!(gen.next(), "build-2");
}

#[test]
fn uuid_id_gen_produces_distinct_ids() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}