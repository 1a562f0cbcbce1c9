// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn build_id_extracts_across_variants() {
    let id = BuildId::new("b1");
    let events = vec![
        Event::StageStarted {
            build_id: id.clone(),
            stage_name: "build".into(),
            at_ms: 0,
        },
        Event::LogOverflow {
            build_id: id.clone(),
            step_name: "compile".into(),
            dropped_bytes: 10,
        },
    ];
    for event in &events {
        assert_eq!(event.build_id(), &id);
    }
}