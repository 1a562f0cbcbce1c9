use super::*;

#[test]
fn stays_closed_below_threshold() {
    let mut c = Circuit::new(3, 1000);
    c.record_failure(0);
    c.record_failure(0);
    assert_eq!(c.state(), CircuitState::Closed);
}

#[test]
fn trips_open_at_threshold() {
    let mut c = Circuit::new(3, 1000);
    c.record_failure(0);
    c.record_failure(0);
    c.record_failure(0);
    assert_eq!(c.state(), CircuitState::Open);
}

#[test]
fn moves_to_half_open_after_cooldown() {
    let mut c = Circuit::new(1, 1000);
    c.record_failure(0);
    assert_eq!(c.state(), CircuitState::Open);
    c.tick(500);
    assert_eq!(c.state(), CircuitState::Open);
    c.tick(1000);
    assert_eq!(c.state(), CircuitState::HalfOpen);
}

#[test]
fn success_in_half_open_closes() {
    let mut c = Circuit::new(1, 1000);
    c.record_failure(0);
    c.tick(1000);
    assert_eq!(c.state(), CircuitState::HalfOpen);
    c.record_success();
    assert_eq!(c.state(), CircuitState::Closed);
}

#[test]
fn failure_in_half_open_reopens() {
    let mut c = Circuit::new(1, 1000);
    c.record_failure(0);
    c.tick(1000);
    assert_eq!(c.state(), CircuitState::HalfOpen);
    c.record_failure(1000);
    assert_eq!(c.state(), CircuitState::Open);
}
