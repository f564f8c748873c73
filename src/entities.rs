use crate::entity::{Entity, Field, Model};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;

/// Implements [`Model`] for a struct whose only field is `entity`
macro_rules! plain_model {
    ($name:ident, [$($field:expr),* $(,)?]) => {
        impl Model for $name {
            const FIELDS: &'static [Field] = &[$($field),*];

            fn from_entity(entity: Entity) -> Self {
                Self { entity }
            }

            fn entity(&self) -> &Entity {
                &self.entity
            }
        }
    };
}

/// Detailed task information
#[derive(Debug, Clone, Default)]
pub struct TaskDetail {
    entity: Entity,
}

plain_model!(
    TaskDetail,
    [
        Field::str("destination"),
        Field::str("uri"),
        Field::int("create_time"),
        Field::int("started_time"),
        Field::int("completed_time"),
        Field::str("priority"),
        Field::int("total_peers"),
        Field::int("connected_seeders"),
        Field::int("connected_leechers"),
    ]
);

impl TaskDetail {
    #[must_use]
    pub fn destination(&self) -> Cow<'_, str> {
        self.entity.str("destination")
    }

    #[must_use]
    pub fn uri(&self) -> Cow<'_, str> {
        self.entity.str("uri")
    }

    #[must_use]
    pub fn priority(&self) -> Cow<'_, str> {
        self.entity.str("priority")
    }

    #[must_use]
    pub fn create_time(&self) -> i64 {
        self.entity.int("create_time")
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("create_time")
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("started_time")
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("completed_time")
    }

    #[must_use]
    pub fn total_peers(&self) -> i64 {
        self.entity.int("total_peers")
    }

    #[must_use]
    pub fn connected_seeders(&self) -> i64 {
        self.entity.int("connected_seeders")
    }

    #[must_use]
    pub fn connected_leechers(&self) -> i64 {
        self.entity.int("connected_leechers")
    }

    /// Zero means the event did not happen yet
    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.entity
            .opt_int(name)
            .filter(|seconds| *seconds > 0)
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }
}

/// Transfer statistics
#[derive(Debug, Clone, Default)]
pub struct TaskTransfer {
    entity: Entity,
}

plain_model!(
    TaskTransfer,
    [
        Field::int("downloaded_pieces"),
        Field::int("size_downloaded"),
        Field::int("size_uploaded"),
        Field::int("speed_download"),
        Field::int("speed_upload"),
    ]
);

impl TaskTransfer {
    #[must_use]
    pub fn downloaded_pieces(&self) -> u64 {
        self.entity.uint("downloaded_pieces")
    }

    #[must_use]
    pub fn size_downloaded(&self) -> u64 {
        self.entity.uint("size_downloaded")
    }

    #[must_use]
    pub fn size_uploaded(&self) -> u64 {
        self.entity.uint("size_uploaded")
    }

    /// Bytes per second
    #[must_use]
    pub fn speed_download(&self) -> u64 {
        self.entity.uint("speed_download")
    }

    /// Bytes per second
    #[must_use]
    pub fn speed_upload(&self) -> u64 {
        self.entity.uint("speed_upload")
    }
}

/// Information about a file within a download task
#[derive(Debug, Clone, Default)]
pub struct TaskFile {
    entity: Entity,
}

plain_model!(
    TaskFile,
    [
        Field::str("filename"),
        Field::int("size"),
        Field::int("size_downloaded"),
        Field::str("priority"),
        Field::bool("wanted"),
    ]
);

impl TaskFile {
    #[must_use]
    pub fn filename(&self) -> Cow<'_, str> {
        self.entity.str("filename")
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.entity.uint("size")
    }

    #[must_use]
    pub fn size_downloaded(&self) -> u64 {
        self.entity.uint("size_downloaded")
    }

    #[must_use]
    pub fn priority(&self) -> Cow<'_, str> {
        self.entity.str("priority")
    }

    #[must_use]
    pub fn wanted(&self) -> bool {
        self.entity.bool("wanted")
    }
}

/// Information about a tracker
#[derive(Debug, Clone, Default)]
pub struct TaskTracker {
    entity: Entity,
}

plain_model!(
    TaskTracker,
    [
        Field::str("url"),
        Field::str("status"),
        Field::int("update_timer"),
        Field::int("seeds"),
        Field::int("peers"),
    ]
);

impl TaskTracker {
    #[must_use]
    pub fn url(&self) -> Cow<'_, str> {
        self.entity.str("url")
    }

    #[must_use]
    pub fn status(&self) -> Cow<'_, str> {
        self.entity.str("status")
    }

    /// Seconds until the next announce
    #[must_use]
    pub fn update_timer(&self) -> i64 {
        self.entity.int("update_timer")
    }

    #[must_use]
    pub fn seeds(&self) -> i64 {
        self.entity.int("seeds")
    }

    #[must_use]
    pub fn peers(&self) -> i64 {
        self.entity.int("peers")
    }
}

/// Information about a connected peer
#[derive(Debug, Clone, Default)]
pub struct TaskPeer {
    entity: Entity,
}

plain_model!(
    TaskPeer,
    [
        Field::str("address"),
        Field::str("agent"),
        Field::float("progress"),
        Field::int("speed_download"),
        Field::int("speed_upload"),
    ]
);

impl TaskPeer {
    #[must_use]
    pub fn address(&self) -> Cow<'_, str> {
        self.entity.str("address")
    }

    #[must_use]
    pub fn agent(&self) -> Cow<'_, str> {
        self.entity.str("agent")
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.entity.float("progress")
    }

    #[must_use]
    pub fn speed_download(&self) -> u64 {
        self.entity.uint("speed_download")
    }

    #[must_use]
    pub fn speed_upload(&self) -> u64 {
        self.entity.uint("speed_upload")
    }
}

/// Extra task details
#[derive(Debug, Clone, Default)]
pub struct StatusExtra {
    entity: Entity,
}

plain_model!(
    StatusExtra,
    [Field::str("error_detail"), Field::int("unzip_progress")]
);

impl StatusExtra {
    #[must_use]
    pub fn error_detail(&self) -> Option<&str> {
        self.entity.opt_str("error_detail")
    }

    #[must_use]
    pub fn unzip_progress(&self) -> Option<i64> {
        self.entity.opt_int("unzip_progress")
    }
}

/// Additional detailed information about a task
#[derive(Debug, Clone, Default)]
pub struct Additional {
    entity: Entity,
    detail: TaskDetail,
    transfer: TaskTransfer,
    file: Vec<TaskFile>,
    tracker: Vec<TaskTracker>,
    peer: Vec<TaskPeer>,
}

impl Model for Additional {
    const FIELDS: &'static [Field] = &[
        Field::entity("detail"),
        Field::entity("transfer"),
        Field::entity_list("file"),
        Field::entity_list("tracker"),
        Field::entity_list("peer"),
    ];

    fn from_entity(entity: Entity) -> Self {
        Self {
            detail: entity.nested("detail"),
            transfer: entity.nested("transfer"),
            file: entity.nested_list("file"),
            tracker: entity.nested_list("tracker"),
            peer: entity.nested_list("peer"),
            entity,
        }
    }

    fn entity(&self) -> &Entity {
        &self.entity
    }
}

impl Additional {
    #[must_use]
    pub fn detail(&self) -> &TaskDetail {
        &self.detail
    }

    #[must_use]
    pub fn transfer(&self) -> &TaskTransfer {
        &self.transfer
    }

    #[must_use]
    pub fn file(&self) -> &[TaskFile] {
        &self.file
    }

    #[must_use]
    pub fn tracker(&self) -> &[TaskTracker] {
        &self.tracker
    }

    #[must_use]
    pub fn peer(&self) -> &[TaskPeer] {
        &self.peer
    }
}

/// Download task status
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Waiting,
    Downloading,
    Paused,
    Finishing,
    Finished,
    HashChecking,
    Seeding,
    FilehostingWaiting,
    Extracting,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Individual download task information
#[derive(Debug, Clone, Default)]
pub struct Task {
    entity: Entity,
    status_extra: StatusExtra,
    additional: Additional,
}

impl Model for Task {
    const FIELDS: &'static [Field] = &[
        Field::str("id"),
        Field::str("type"),
        Field::str("username"),
        Field::str("title"),
        Field::int("size"),
        Field::str("status"),
        Field::entity("status_extra"),
        Field::entity("additional"),
    ];

    fn from_entity(entity: Entity) -> Self {
        Self {
            status_extra: entity.nested("status_extra"),
            additional: entity.nested("additional"),
            entity,
        }
    }

    fn entity(&self) -> &Entity {
        &self.entity
    }
}

impl Task {
    /// Unique identifier for the task
    #[must_use]
    pub fn id(&self) -> Cow<'_, str> {
        self.entity.str("id")
    }

    /// Type of download task (e.g., "bt" for `BitTorrent`)
    #[must_use]
    pub fn task_type(&self) -> Cow<'_, str> {
        self.entity.str("type")
    }

    #[must_use]
    pub fn username(&self) -> Cow<'_, str> {
        self.entity.str("username")
    }

    #[must_use]
    pub fn title(&self) -> Cow<'_, str> {
        self.entity.str("title")
    }

    /// Total size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.entity.uint("size")
    }

    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.entity.get("status")
    }

    #[must_use]
    pub fn status_extra(&self) -> &StatusExtra {
        &self.status_extra
    }

    #[must_use]
    pub fn additional(&self) -> &Additional {
        &self.additional
    }

    #[must_use]
    pub fn is_bit_torrent(&self) -> bool {
        self.task_type() == "bt"
    }
}

/// Detailed information about specific tasks
#[derive(Debug, Clone, Default)]
pub struct TaskInfo {
    entity: Entity,
    tasks: Vec<Task>,
}

impl Model for TaskInfo {
    const FIELDS: &'static [Field] = &[Field::entity_list("tasks")];

    fn from_entity(entity: Entity) -> Self {
        Self {
            tasks: entity.nested_list("tasks"),
            entity,
        }
    }

    fn entity(&self) -> &Entity {
        &self.entity
    }
}

impl TaskInfo {
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<'a> IntoIterator for &'a TaskInfo {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One page of the task list
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    info: TaskInfo,
}

impl Model for TaskList {
    const FIELDS: &'static [Field] = &[
        Field::int("offset"),
        Field::int("total"),
        Field::entity_list("tasks"),
    ];

    fn from_entity(entity: Entity) -> Self {
        Self {
            info: TaskInfo::from_entity(entity),
        }
    }

    fn entity(&self) -> &Entity {
        self.info.entity()
    }
}

impl TaskList {
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.entity().int("offset")
    }

    /// Number of tasks on the server, not the size of this page
    #[must_use]
    pub fn total(&self) -> usize {
        usize::try_from(self.entity().uint("total")).unwrap_or(usize::MAX)
    }

    /// Same as [`Self::total`]
    #[must_use]
    pub fn len(&self) -> usize {
        self.total()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Number of tasks materialized on this page
    #[must_use]
    pub fn page_len(&self) -> usize {
        self.info.len()
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        self.info.tasks()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.info.iter()
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Outcome of a pause, resume or delete for one task
#[derive(Debug, Clone, Default)]
pub struct TaskActionResult {
    entity: Entity,
}

plain_model!(TaskActionResult, [Field::str("id"), Field::int("error")]);

impl TaskActionResult {
    #[must_use]
    pub fn id(&self) -> Cow<'_, str> {
        self.entity.str("id")
    }

    /// Zero on success, a Download Station error code otherwise
    #[must_use]
    pub fn error(&self) -> i64 {
        self.entity.int("error")
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error() == 0
    }

    /// Materializes the per-task results of a task action payload
    #[must_use]
    pub fn from_payload(payload: Value) -> Vec<Self> {
        match payload {
            Value::Array(items) => items.into_iter().map(Self::materialize).collect(),
            _ => Vec::new(),
        }
    }
}

/// Download Station package information
#[derive(Debug, Clone, Default)]
pub struct StationInfo {
    entity: Entity,
}

plain_model!(
    StationInfo,
    [
        Field::int("version"),
        Field::str("version_string"),
        Field::bool("is_manager"),
    ]
);

impl StationInfo {
    #[must_use]
    pub fn version(&self) -> i64 {
        self.entity.int("version")
    }

    #[must_use]
    pub fn version_string(&self) -> Cow<'_, str> {
        self.entity.str("version_string")
    }

    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.entity.bool("is_manager")
    }
}

/// Download Station server configuration
#[derive(Debug, Clone, Default)]
pub struct StationConfig {
    entity: Entity,
}

plain_model!(
    StationConfig,
    [
        Field::int("bt_max_download"),
        Field::int("bt_max_upload"),
        Field::int("emule_max_download"),
        Field::int("emule_max_upload"),
        Field::int("nzb_max_download"),
        Field::int("http_max_download"),
        Field::int("ftp_max_download"),
        Field::bool("emule_enabled"),
        Field::bool("unzip_service_enabled"),
        Field::str("default_destination"),
        Field::str("emule_default_destination"),
    ]
);

impl StationConfig {
    /// Max BT download speed in KB/s, 0 means unlimited
    #[must_use]
    pub fn bt_max_download(&self) -> i64 {
        self.entity.int("bt_max_download")
    }

    #[must_use]
    pub fn bt_max_upload(&self) -> i64 {
        self.entity.int("bt_max_upload")
    }

    #[must_use]
    pub fn http_max_download(&self) -> i64 {
        self.entity.int("http_max_download")
    }

    #[must_use]
    pub fn ftp_max_download(&self) -> i64 {
        self.entity.int("ftp_max_download")
    }

    #[must_use]
    pub fn emule_enabled(&self) -> bool {
        self.entity.bool("emule_enabled")
    }

    #[must_use]
    pub fn unzip_service_enabled(&self) -> bool {
        self.entity.bool("unzip_service_enabled")
    }

    #[must_use]
    pub fn default_destination(&self) -> Cow<'_, str> {
        self.entity.str("default_destination")
    }
}

/// Download schedule configuration
#[derive(Debug, Clone, Default)]
pub struct ScheduleConfig {
    entity: Entity,
}

plain_model!(
    ScheduleConfig,
    [Field::bool("enabled"), Field::bool("emule_enabled")]
);

impl ScheduleConfig {
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.entity.bool("enabled")
    }

    #[must_use]
    pub fn emule_enabled(&self) -> bool {
        self.entity.bool("emule_enabled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_json() -> Value {
        json!({
            "id": "dbid_1",
            "type": "bt",
            "username": "admin",
            "title": "ubuntu.iso",
            "size": 1_234_567_890,
            "status": "downloading",
            "status_extra": {"error_detail": "broken_link"},
            "additional": {
                "detail": {"destination": "downloads", "create_time": 1_700_000_000},
                "transfer": {"size_downloaded": "1000", "speed_download": 250},
                "file": [{"filename": "ubuntu.iso", "size": 10, "wanted": true}],
                "tracker": [{"url": "udp://tracker.example.com:80", "seeds": 5}],
                "peer": [{"address": "10.0.0.2:6881", "progress": 0.5}]
            }
        })
    }

    #[test]
    fn test_task_fields_round_trip() {
        let raw = task_json();
        let task = Task::materialize(raw.clone());

        assert_eq!(raw["id"], &*task.id());
        assert_eq!(raw["type"], &*task.task_type());
        assert_eq!(raw["username"], &*task.username());
        assert_eq!(raw["title"], &*task.title());
        assert_eq!(raw["size"], task.size());
        assert_eq!(raw["status"], &*task.entity().str("status"));
        assert_eq!(TaskStatus::Downloading, task.status());
        assert!(task.is_bit_torrent());
    }

    #[test]
    fn test_task_nested_entities() {
        let task = Task::materialize(task_json());
        let additional = task.additional();

        assert_eq!(Some("broken_link"), task.status_extra().error_detail());
        assert_eq!(None, task.status_extra().unzip_progress());
        assert_eq!("downloads", additional.detail().destination());
        assert_eq!(
            DateTime::from_timestamp(1_700_000_000, 0),
            additional.detail().created_at()
        );
        assert_eq!(None, additional.detail().completed_at());
        assert_eq!(1000, additional.transfer().size_downloaded());
        assert_eq!(250, additional.transfer().speed_download());
        assert_eq!("ubuntu.iso", additional.file()[0].filename());
        assert!(additional.file()[0].wanted());
        assert_eq!(5, additional.tracker()[0].seeds());
        assert_eq!("udp://tracker.example.com:80", additional.tracker()[0].url());
        assert!((additional.peer()[0].progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_task_without_nested_objects() {
        let task = Task::materialize(json!({"id": "dbid_2", "status_extra": null}));

        assert_eq!("dbid_2", task.id());
        assert_eq!(0, task.size());
        assert_eq!(TaskStatus::Unknown, task.status());
        assert_eq!(None, task.status_extra().error_detail());
        assert_eq!(0, task.additional().transfer().speed_download());
        assert!(task.additional().file().is_empty());
        assert!(task.additional().peer().is_empty());
        assert_eq!(None, task.additional().detail().created_at());
    }

    #[test]
    fn test_unknown_status() {
        let task = Task::materialize(json!({"status": "seeding_paused"}));
        assert_eq!(TaskStatus::Unknown, task.status());
        let task = Task::materialize(json!({"status": "hash_checking"}));
        assert_eq!(TaskStatus::HashChecking, task.status());
    }

    #[test]
    fn test_task_list_reports_server_total() {
        let list = TaskList::materialize(json!({
            "offset": 0,
            "total": 2,
            "tasks": [{"id": "1", "title": "a", "additional": {}}]
        }));

        assert_eq!(2, list.len());
        assert_eq!(2, list.total());
        assert_eq!(1, list.page_len());
        assert_eq!(0, list.offset());
        assert_eq!("a", list.tasks()[0].title());
        assert_eq!(1, list.iter().count());
    }

    #[test]
    fn test_task_info_without_tasks() {
        let info = TaskInfo::materialize(json!({}));
        assert!(info.is_empty());
        assert_eq!(0, (&info).into_iter().count());

        let info = TaskInfo::materialize(json!({"tasks": [{"id": "1"}, {"id": "2"}]}));
        assert_eq!(2, info.len());
        let ids: Vec<String> = info.iter().map(|task| task.id().into_owned()).collect();
        assert_eq!(vec!["1", "2"], ids);
    }

    #[test]
    fn test_numeric_id_keeps_raw_value() {
        let task = Task::materialize(json!({"id": 7, "title": "a", "size": 2048.0}));

        assert_eq!("7", task.id());
        assert_eq!(json!(7), task.entity().raw()["id"]);
        assert_eq!(2048, task.size());
    }

    #[test]
    fn test_task_action_results() {
        let results = TaskActionResult::from_payload(json!([
            {"id": "dbid_1", "error": 0},
            {"id": "dbid_2", "error": 405}
        ]));
        assert_eq!(2, results.len());
        assert!(results[0].is_success());
        assert_eq!("dbid_2", results[1].id());
        assert_eq!(405, results[1].error());

        assert!(TaskActionResult::from_payload(Value::Bool(true)).is_empty());
    }
}
