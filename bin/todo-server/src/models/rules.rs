//! Required-field checks run before any persistence side effect.

use serde_json::Value;

use crate::error::ServerError;
use crate::models::payload::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Key present, not `null`, not `""`.
    Present,
    /// A JSON array with at least one element.
    NonEmptyList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub field: &'static str,
    pub message: &'static str,
    pub requirement: Requirement,
}

impl Rule {
    pub const fn present(field: &'static str, message: &'static str) -> Self {
        Self { field, message, requirement: Requirement::Present }
    }

    pub const fn non_empty_list(field: &'static str, message: &'static str) -> Self {
        Self { field, message, requirement: Requirement::NonEmptyList }
    }

    fn is_met(&self, payload: &Payload) -> bool {
        match (self.requirement, payload.get(self.field)) {
            (_, None | Some(Value::Null)) => false,
            (Requirement::Present, Some(Value::String(s))) => !s.is_empty(),
            (Requirement::Present, Some(_)) => true,
            (Requirement::NonEmptyList, Some(Value::Array(items))) => !items.is_empty(),
            (Requirement::NonEmptyList, Some(_)) => false,
        }
    }
}

/// Fail with the message of the first unmet rule, in slice order.
pub fn check_required(payload: &Payload, rules: &[Rule]) -> Result<(), ServerError> {
    match rules.iter().find(|rule| !rule.is_met(payload)) {
        Some(rule) => Err(ServerError::ValidationFailed(rule.message.to_owned())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const RULES: &[Rule] = &[
        Rule::present("title", "title missing"),
        Rule::present("level", "level missing"),
        Rule::non_empty_list("tid", "tid missing"),
    ];

    fn payload(raw: &str) -> Payload {
        Payload::parse(raw.as_bytes()).unwrap()
    }

    fn failure(raw: &str) -> Option<String> {
        match check_required(&payload(raw), RULES) {
            Ok(()) => None,
            Err(ServerError::ValidationFailed(m)) => Some(m),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn all_present_passes() {
        assert_eq!(failure(r#"{"title":"t","level":0,"tid":["a"]}"#), None);
    }

    #[test]
    fn first_unmet_rule_wins() {
        assert_eq!(failure(r#"{}"#).as_deref(), Some("title missing"));
        assert_eq!(failure(r#"{"title":"t"}"#).as_deref(), Some("level missing"));
    }

    #[test]
    fn rule_order_not_payload_order_decides() {
        assert_eq!(
            failure(r#"{"tid":[],"level":null}"#).as_deref(),
            Some("title missing")
        );
    }

    #[test]
    fn null_and_empty_string_are_missing() {
        assert_eq!(failure(r#"{"title":""}"#).as_deref(), Some("title missing"));
        assert_eq!(failure(r#"{"title":null}"#).as_deref(), Some("title missing"));
    }

    #[test]
    fn zero_and_false_count_as_present() {
        assert_eq!(failure(r#"{"title":false,"level":0,"tid":[0]}"#), None);
    }

    #[test]
    fn list_rule_needs_non_empty_array() {
        assert_eq!(
            failure(r#"{"title":"t","level":1,"tid":[]}"#).as_deref(),
            Some("tid missing")
        );
        assert_eq!(
            failure(r#"{"title":"t","level":1,"tid":"a"}"#).as_deref(),
            Some("tid missing")
        );
    }

    #[test]
    fn no_rules_always_passes() {
        assert!(check_required(&Payload::default(), &[]).is_ok());
    }
}
