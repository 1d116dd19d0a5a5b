// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn display_is_the_bare_integer() {
    assert_eq!(SessionId::new(7).to_string(), "7");
    assert_eq!(RegistrationId::new(12).to_string(), "12");
    assert_eq!(RequestId::new(900).to_string(), "900");
}

#[test]
fn converts_to_and_from_u64() {
    let id = SessionId::from(42);
    assert_eq!(id.value(), 42);
    assert_eq!(u64::from(id), 42);
}

#[test]
fn serializes_as_a_bare_json_integer() {
    let json = serde_json::to_string(&RequestId::new(9)).unwrap();
    assert_eq!(json, "9");

    let parsed: RequestId = serde_json::from_str("9").unwrap();
    assert_eq!(parsed, RequestId::new(9));
}

#[test]
fn ids_order_by_value() {
    assert!(RegistrationId::new(1) < RegistrationId::new(2));
}

#[test]
fn distinct_values_are_unequal() {
    assert_ne!(SessionId::new(1), SessionId::new(2));
    assert_eq!(SessionId::new(3), SessionId::new(3));
}
