//! Record types shared by every module.
//!
//! All entities live in one flat collection per project. Each stored record
//! carries the host-assigned `id`, the owning project (`dataCategoryId`) and a
//! `type` discriminant selecting the body.

use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type RecordId = i64;
pub type ProjectId = i64;
pub type ModuleId = i64;
pub type PersonId = i64;

/// A record as returned by the store: host id and project scope around a body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stored<T> {
    pub id: RecordId,
    pub data_category_id: ProjectId,
    #[serde(flatten)]
    pub value: T,
}

impl<T> Stored<T> {
    pub fn new(id: RecordId, data_category_id: ProjectId, value: T) -> Self {
        Self {
            id,
            data_category_id,
            value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Stored<U> {
        Stored {
            id: self.id,
            data_category_id: self.data_category_id,
            value: f(self.value),
        }
    }
}

impl<T> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Stored<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// Body of a custom module data value, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordBody {
    Task(Task),
    List(TaskList),
    Tag(Tag),
}

impl RecordBody {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordBody::Task(_) => "task",
            RecordBody::List(_) => "list",
            RecordBody::Tag(_) => "tag",
        }
    }
}

pub type Record = Stored<RecordBody>;
pub type StoredTask = Stored<Task>;
pub type StoredList = Stored<TaskList>;
pub type StoredTag = Stored<Tag>;

/// A unit of work.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub fullfilled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso8601::option"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date_relative: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activity: Vec<ActivityEntry>,
    #[serde(default)]
    pub sort_key: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<RecordId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assigned_to: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_tasks: Vec<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso8601::option"
    )]
    pub recurrence_last_created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub can_view_users: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub can_edit_users: Vec<PersonId>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// A named bucket of tasks with per-list visibility defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub name: String,
    #[serde(default)]
    pub sort_key: i64,
    #[serde(default)]
    pub is_collapsed: bool,
    #[serde(default)]
    pub show_sub_tasks: bool,
    #[serde(default)]
    pub show_completed: bool,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub sort_key: i64,
}

/// A project is a data category of the plugin's module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub shorty: String,
    pub security_level_id: i64,
    pub custom_module_id: ModuleId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_users: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_only_users: Vec<PersonId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub person_id: PersonId,
    #[serde(with = "iso8601")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl ActivityEntry {
    pub fn new(person_id: PersonId, kind: ActivityKind, value: Option<serde_json::Value>) -> Self {
        Self {
            person_id,
            date: Utc::now(),
            kind,
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Create,
    Update,
    Fullfilled,
    Comment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }

    /// i18n key of the status label
    pub fn label_key(self) -> String {
        format!("tasks.status.{}", self.as_str())
    }

    pub fn badge_color(self) -> &'static str {
        match self {
            TaskStatus::Open => "#e5e7eb",
            TaskStatus::InProgress => "#fbbf24",
            TaskStatus::Blocked => "#ef4444",
            TaskStatus::Done => "#10b981",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    /// Display order, most pressing first.
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Critical,
        TaskPriority::High,
        TaskPriority::Medium,
        TaskPriority::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }

    pub fn label_key(self) -> String {
        format!("tasks.priority.{}", self.as_str())
    }

    pub fn badge_color(self) -> &'static str {
        match self {
            TaskPriority::Critical => "#7c2d12",
            TaskPriority::High => "#ef4444",
            TaskPriority::Medium => "#f59e0b",
            TaskPriority::Low => "#9ca3af",
        }
    }

    /// Rank for sorting, 0 = critical.
    pub fn rank(self) -> usize {
        match self {
            TaskPriority::Critical => 0,
            TaskPriority::High => 1,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

impl RecurrencePattern {
    pub const ALL: [RecurrencePattern; 5] = [
        RecurrencePattern::Daily,
        RecurrencePattern::Weekly,
        RecurrencePattern::Biweekly,
        RecurrencePattern::Monthly,
        RecurrencePattern::Yearly,
    ];

    /// Fixed interval in days. Months and years are not calendar-aware.
    pub fn interval_days(self) -> i64 {
        match self {
            RecurrencePattern::Daily => 1,
            RecurrencePattern::Weekly => 7,
            RecurrencePattern::Biweekly => 14,
            RecurrencePattern::Monthly => 30,
            RecurrencePattern::Yearly => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Biweekly => "biweekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Yearly => "yearly",
        }
    }

    pub fn label_key(self) -> String {
        format!("tasks.recurrence.{}", self.as_str())
    }
}

/// Reminder choices offered for a task, in minutes before the due date.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ReminderOption {
    pub minutes: u32,
    pub label_key: &'static str,
}

pub const REMINDER_OPTIONS: [ReminderOption; 6] = [
    ReminderOption { minutes: 0, label_key: "tasks.reminder.none" },
    ReminderOption { minutes: 15, label_key: "tasks.reminder.15min" },
    ReminderOption { minutes: 60, label_key: "tasks.reminder.1hour" },
    ReminderOption { minutes: 1440, label_key: "tasks.reminder.1day" },
    ReminderOption { minutes: 2880, label_key: "tasks.reminder.2days" },
    ReminderOption { minutes: 10080, label_key: "tasks.reminder.1week" },
];

pub fn reminder_option(minutes: u32) -> Option<&'static ReminderOption> {
    REMINDER_OPTIONS.iter().find(|option| option.minutes == minutes)
}

/// ISO-8601 timestamps as the host writes them (`toISOString`), also
/// accepting plain `YYYY-MM-DD` dates as midnight UTC.
pub mod iso8601 {
    use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_str(&super::format(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(raw) => super::parse(raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn task_record_roundtrips_host_shape() {
        let raw = r#"{
            "id": 7,
            "dataCategoryId": 3,
            "type": "task",
            "name": "Plan service",
            "fullfilled": false,
            "dueDate": "2024-03-10T09:00:00.000Z",
            "subTasks": [8, 9],
            "sortKey": 2,
            "recurrencePattern": "weekly",
            "status": "in-progress"
        }"#;
        let record: Record = serde_json::from_str(raw).expect("parse");
        assert_eq!(record.id, 7);
        assert_eq!(record.data_category_id, 3);
        let RecordBody::Task(task) = &record.value else {
            panic!("expected task body");
        };
        assert_eq!(task.sub_tasks, vec![8, 9]);
        assert_eq!(task.status, Some(TaskStatus::InProgress));
        assert_eq!(
            task.due_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap())
        );

        let back = serde_json::to_value(&record).expect("serialize");
        assert_eq!(back["type"], "task");
        assert_eq!(back["dueDate"], "2024-03-10T09:00:00.000Z");
        assert_eq!(back["recurrencePattern"], "weekly");
    }

    #[test]
    fn plain_dates_parse_as_midnight() {
        let parsed = iso8601::parse("2024-05-01").expect("date");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert!(iso8601::parse("next tuesday").is_none());
    }

    #[test]
    fn option_catalogs_match_host_labels() {
        assert_eq!(TaskStatus::InProgress.label_key(), "tasks.status.in-progress");
        assert_eq!(TaskPriority::ALL[0], TaskPriority::Critical);
        assert_eq!(RecurrencePattern::Biweekly.interval_days(), 14);
        assert_eq!(reminder_option(1440).map(|o| o.label_key), Some("tasks.reminder.1day"));
        assert!(reminder_option(5).is_none());
    }
}
