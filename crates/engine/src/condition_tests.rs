use super::*;
use std::collections::HashMap;

fn ctx<'a>(branch: Option<&'a str>, params: &'a HashMap<String, String>) -> ConditionContext<'a> {
    ConditionContext { branch, params }
}

#[test]
fn always_is_always_true() {
    let params = HashMap::new();
    assert!(evaluate(&Condition::Always, &ctx(None, &params)));
    assert!(evaluate(&Condition::Always, &ctx(Some("main"), &params)));
}

#[test]
fn branch_condition_matches_exactly() {
    let params = HashMap::new();
    let condition = Condition::Branch {
        value: "main".to_string(),
    };
    assert!(evaluate(&condition, &ctx(Some("main"), &params)));
    assert!(!evaluate(&condition, &ctx(Some("develop"), &params)));
}

#[test]
fn branch_condition_is_case_sensitive() {
    let params = HashMap::new();
    let condition = Condition::Branch {
        value: "Main".to_string(),
    };
    assert!(!evaluate(&condition, &ctx(Some("main"), &params)));
}

#[test]
fn branch_condition_with_no_checkout_branch_is_false() {
    let params = HashMap::new();
    let condition = Condition::Branch {
        value: "main".to_string(),
    };
    assert!(!evaluate(&condition, &ctx(None, &params)));
}

#[test]
fn param_condition_matches_resolved_value() {
    let mut params = HashMap::new();
    params.insert("env".to_string(), "prod".to_string());
    let condition = Condition::Param {
        key: "env".to_string(),
        value: "prod".to_string(),
    };
    assert!(evaluate(&condition, &ctx(None, &params)));
}

#[test]
fn param_condition_on_a_missing_key_is_false() {
    let params = HashMap::new();
    let condition = Condition::Param {
        key: "env".to_string(),
        value: "prod".to_string(),
    };
    assert!(!evaluate(&condition, &ctx(None, &params)));
}

#[test]
fn param_condition_on_a_mismatched_value_is_false() {
    let mut params = HashMap::new();
    params.insert("env".to_string(), "staging".to_string());
    let condition = Condition::Param {
        key: "env".to_string(),
        value: "prod".to_string(),
    };
    assert!(!evaluate(&condition, &ctx(None, &params)));
}
