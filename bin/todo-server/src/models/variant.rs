//! The two deployments that share this engine.

use std::fmt;
use std::str::FromStr;

use crate::models::payload::{KEY_CREATE_AT, KEY_ID};
use crate::models::rules::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// To-do list: tasks ranked by priority.
    Task,
    /// Time-tracking log: events with the time elapsed since the previous one.
    Log,
}

const EVENT: Rule = Rule::present("event", "please describe what happened");
const TAGS: Rule = Rule::non_empty_list("tid", "please pick at least one tag");
const RECORD_ID: Rule = Rule::present(KEY_ID, "record id must not be empty");

const TASK_CREATE: &[Rule] = &[
    Rule::present("title", "please enter a task name"),
    Rule::present("level", "please pick a priority"),
];
const LOG_CREATE: &[Rule] = &[EVENT, TAGS];
const UPDATE: &[Rule] = &[EVENT, TAGS, RECORD_ID];

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Task => "task",
            Variant::Log => "log",
        }
    }

    /// Path prefix the record routes are mounted under.
    pub fn route_prefix(self) -> &'static str {
        match self {
            Variant::Task => "/v1/task",
            Variant::Log => "/v1/record",
        }
    }

    pub fn collection(self) -> &'static str {
        match self {
            Variant::Task => "t_task",
            Variant::Log => "t_record",
        }
    }

    pub fn create_rules(self) -> &'static [Rule] {
        match self {
            Variant::Task => TASK_CREATE,
            Variant::Log => LOG_CREATE,
        }
    }

    pub fn update_rules(self) -> &'static [Rule] {
        UPDATE
    }

    /// Field the list is sorted on, descending.
    pub fn list_sort_field(self) -> &'static str {
        match self {
            Variant::Task => "level",
            Variant::Log => KEY_CREATE_AT,
        }
    }

    pub fn tracks_duration(self) -> bool {
        matches!(self, Variant::Log)
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task" | "todo" => Ok(Variant::Task),
            "log" | "record" => Ok(Variant::Log),
            other => Err(format!("unknown variant '{other}' (expected 'task' or 'log')")),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("TODO".parse::<Variant>(), Ok(Variant::Task));
        assert_eq!(" record ".parse::<Variant>(), Ok(Variant::Log));
        assert!("ledger".parse::<Variant>().is_err());
    }

    #[test]
    fn update_requires_the_target_id_last() {
        let fields: Vec<_> = Variant::Task.update_rules().iter().map(|r| r.field).collect();
        assert_eq!(fields, vec!["event", "tid", "id"]);
    }

    #[test]
    fn only_the_log_tracks_duration() {
        assert!(Variant::Log.tracks_duration());
        assert!(!Variant::Task.tracks_duration());
    }

    #[test]
    fn sort_fields_differ_per_variant() {
        assert_eq!(Variant::Task.list_sort_field(), "level");
        assert_eq!(Variant::Log.list_sort_field(), "createAt");
    }
}
