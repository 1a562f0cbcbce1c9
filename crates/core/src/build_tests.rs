// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn new_build() -> Build {
    Build::new(
        BuildId::new("b1"),
        JobId::new("j1"),
        1,
        Trigger::Manual {
            triggered_by: "alice".into(),
        },
        BuildConfig::default(),
        0,
    )
}

#[test]
fn queued_to_running_stamps_started_at() {
    let mut build = new_build();
    build.transition(BuildStatus::Running, 100).unwrap();
    assert_eq!(build.status, BuildStatus::Running);
    assert_eq!(build.started_at_ms, Some(100));
    assert_eq!(build.finished_at_ms, None);
}

#[test]
fn running_to_success_stamps_finished_at() {
    let mut build = new_build();
    build.transition(BuildStatus::Running, 100).unwrap();
    build.transition(BuildStatus::Success, 200).unwrap();
    assert_eq!(build.status, BuildStatus::Success);
    assert_eq!(build.finished_at_ms, Some(200));
}

#[test]
fn queued_can_abort_directly() {
    let mut build = new_build();
    build.transition(BuildStatus::Aborted, 50).unwrap();
    assert_eq!(build.status, BuildStatus::Aborted);
}

#[test]
fn queued_can_fail_directly_when_dispatch_never_starts_it() {
    let mut build = new_build();
    build.transition(BuildStatus::Failure, 50).unwrap();
    assert_eq!(build.status, BuildStatus::Failure);
    assert_eq!(build.started_at_ms, None);
    assert_eq!(build.finished_at_ms, Some(50));
}

#[test]
fn queued_cannot_go_straight_to_success() {
    let mut build = new_build();
    let err = build.transition(BuildStatus::Success, 50).unwrap_err();
    assert_eq!(err.from, BuildStatus::Queued);
    assert_eq!(err.to, BuildStatus::Success);
    assert_eq!(build.status, BuildStatus::Queued);
}

#[test]
fn terminal_states_reject_any_further_transition() {
    let mut build = new_build();
    build.transition(BuildStatus::Running, 1).unwrap();
    build.transition(BuildStatus::Failure, 2).unwrap();

    for next in [
        BuildStatus::Queued,
        BuildStatus::Running,
        BuildStatus::Success,
        BuildStatus::Aborted,
    ] {
        let err = build.transition(next, 3).unwrap_err();
        assert_eq!(err.from, BuildStatus::Failure);
        assert_eq!(build.status, BuildStatus::Failure);
    }
}

#[test]
fn same_state_transition_is_rejected() {
    let mut build = new_build();
    let err = build.transition(BuildStatus::Queued, 1).unwrap_err();
    assert_eq!(err.from, BuildStatus::Queued);
    assert_eq!(err.to, BuildStatus::Queued);
}