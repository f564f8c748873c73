use crate::client::SynoClient;
use crate::entities::{ScheduleConfig, StationConfig, StationInfo, TaskActionResult, TaskInfo, TaskList};
use crate::entity::Model;
use crate::error::Subsystem;
use crate::error::SynoError::{self, InvalidInput};
use crate::request::Params;
use crate::transport::{HttpMethod, Transport};
use anyhow::{Context, Result};
use log::{debug, warn};
use serde_json::Value;

const TASK_API: &str = "Task";
const INFO_API: &str = "Info";
const SCHEDULE_API: &str = "Schedule";

const URI_SCHEMES: [&str; 8] = [
    "http://",
    "https://",
    "ftp://",
    "magnet:",
    "ed2k://",
    "thunder://",
    "flashget://",
    "qqdl://",
];

/// Extra task information requested with a task list or task info call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalField {
    Detail,
    Transfer,
    File,
    Tracker,
    Peer,
}

impl AdditionalField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detail => "detail",
            Self::Transfer => "transfer",
            Self::File => "file",
            Self::Tracker => "tracker",
            Self::Peer => "peer",
        }
    }

    /// Comma separated list, `None` when nothing is requested
    fn join(fields: &[Self]) -> Option<String> {
        if fields.is_empty() {
            return None;
        }
        Some(
            fields
                .iter()
                .map(|field| field.as_str())
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Download Station endpoints of a [`SynoClient`]
pub struct DownloadStation<'a, T: Transport> {
    client: &'a SynoClient<T>,
}

impl<'a, T: Transport> DownloadStation<'a, T> {
    pub(crate) fn new(client: &'a SynoClient<T>) -> Self {
        Self { client }
    }

    /// Lists download tasks
    ///
    /// `limit` of -1 lists every task starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - API returns an error response
    /// - Session cannot be established
    pub async fn task_list(
        &self,
        offset: u32,
        limit: i32,
        additional: &[AdditionalField],
    ) -> Result<TaskList> {
        let params = Params::new()
            .set("additional", AdditionalField::join(additional))
            .set("offset", offset)
            .set("limit", limit);

        let data = self
            .request(TASK_API, "list", HttpMethod::Get, params)
            .await
            .context("Failed to get tasks")?;
        Ok(TaskList::materialize(data))
    }

    /// Gets detailed information about specific task(s)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - IDs slice is empty
    /// - Network request fails
    /// - API returns an error response, e.g. an unknown task id
    pub async fn task_info(&self, ids: &[&str], additional: &[AdditionalField]) -> Result<TaskInfo> {
        let params = Params::new()
            .set("id", join_ids(ids)?)
            .set("additional", AdditionalField::join(additional));

        let data = self
            .request(TASK_API, "getinfo", HttpMethod::Get, params)
            .await
            .context("Failed to get task details")?;
        Ok(TaskInfo::materialize(data))
    }

    /// Creates a new download task from a URI, into `destination` or the
    /// default destination of the user
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - URI is empty or uses an unsupported scheme
    /// - Network request fails
    /// - API returns an error response
    pub async fn task_create(&self, uri: &str, destination: Option<&str>) -> Result<()> {
        if uri.is_empty() {
            return Err(InvalidInput("URI cannot be empty".into()).into());
        }

        if !URI_SCHEMES.iter().any(|scheme| uri.starts_with(scheme)) {
            return Err(InvalidInput(format!("Unsupported URI scheme, got: {uri}")).into());
        }

        debug!("Creating download task. URI: {uri}, Destination: {destination:?}");

        let params = Params::new()
            .set("uri", uri)
            .set("destination", destination);

        self.request(TASK_API, "create", HttpMethod::Post, params)
            .await
            .context("Failed to create download task")?;
        Ok(())
    }

    /// Pauses task(s)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - IDs slice is empty
    /// - Network request fails
    /// - API returns an error response
    pub async fn task_pause(&self, ids: &[&str]) -> Result<Vec<TaskActionResult>> {
        let params = Params::new().set("id", join_ids(ids)?);

        let data = self
            .request(TASK_API, "pause", HttpMethod::Get, params)
            .await
            .context("Failed to pause download task")?;
        Ok(TaskActionResult::from_payload(data))
    }

    /// Resumes task(s)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - IDs slice is empty
    /// - Network request fails
    /// - API returns an error response
    pub async fn task_resume(&self, ids: &[&str]) -> Result<Vec<TaskActionResult>> {
        let params = Params::new().set("id", join_ids(ids)?);

        let data = self
            .request(TASK_API, "resume", HttpMethod::Get, params)
            .await
            .context("Failed to resume download task")?;
        Ok(TaskActionResult::from_payload(data))
    }

    /// Deletes task(s), `force_complete` moves unfinished files to the destination
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - IDs slice is empty
    /// - Network request fails
    /// - API returns an error response
    pub async fn task_delete(
        &self,
        ids: &[&str],
        force_complete: bool,
    ) -> Result<Vec<TaskActionResult>> {
        let params = Params::new()
            .set("id", join_ids(ids)?)
            .set("force_complete", force_complete);

        let data = self
            .request(TASK_API, "delete", HttpMethod::Get, params)
            .await
            .context("Failed to delete download task")?;
        Ok(TaskActionResult::from_payload(data))
    }

    /// Gets Download Station package information
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error response
    pub async fn info(&self) -> Result<StationInfo> {
        let data = self
            .request(INFO_API, "getinfo", HttpMethod::Get, Params::new())
            .await
            .context("Failed to get Download Station info")?;
        Ok(StationInfo::materialize(data))
    }

    /// Gets Download Station server configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error response
    pub async fn config(&self) -> Result<StationConfig> {
        let data = self
            .request(INFO_API, "getconfig", HttpMethod::Get, Params::new())
            .await
            .context("Failed to get Download Station config")?;
        Ok(StationConfig::materialize(data))
    }

    /// Gets the download schedule configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error response
    pub async fn schedule_config(&self) -> Result<ScheduleConfig> {
        let data = self
            .request(SCHEDULE_API, "getconfig", HttpMethod::Get, Params::new())
            .await
            .context("Failed to get schedule config")?;
        Ok(ScheduleConfig::materialize(data))
    }

    /// Calls a Download Station API, logging in again once if the session expired
    async fn request(
        &self,
        sub_api: &str,
        method: &str,
        http_method: HttpMethod,
        params: Params,
    ) -> Result<Value> {
        let sid = self.client.ensure_session().await?;
        let result = self
            .client
            .dispatch(
                Subsystem::DownloadStation,
                Some(sub_api),
                method,
                http_method,
                params.clone(),
                Some(&sid),
            )
            .await;

        match result {
            Err(error) if is_session_error(&error) => {
                warn!("Session expired during {sub_api}.{method}, logging in again");
                self.client.expire_session(&sid).await;
                self.client
                    .call(
                        Subsystem::DownloadStation,
                        Some(sub_api),
                        method,
                        http_method,
                        params,
                    )
                    .await
            }
            other => other,
        }
    }
}

fn is_session_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<SynoError>()
        .is_some_and(SynoError::is_session_error)
}

fn join_ids(ids: &[&str]) -> Result<String> {
    if ids.is_empty() || ids.iter().any(|id| id.is_empty()) {
        return Err(InvalidInput("Task IDs cannot be empty".into()).into());
    }
    Ok(ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_additional_fields() {
        assert_eq!(None, AdditionalField::join(&[]));
        assert_eq!(
            Some("detail,transfer".to_string()),
            AdditionalField::join(&[AdditionalField::Detail, AdditionalField::Transfer])
        );
    }

    #[test]
    fn test_join_ids() {
        assert_eq!("dbid_1,dbid_2", join_ids(&["dbid_1", "dbid_2"]).unwrap());
        assert!(join_ids(&[]).is_err());
        assert!(join_ids(&["dbid_1", ""]).is_err());
    }
}
