use crate::download_station::DownloadStation;
use crate::error::Subsystem;
use crate::error::SynoError::{
    Configuration, Discovery, Environment, InvalidResponse, UnknownApi,
};
use crate::request::{
    decode_envelope, qualify_api_name, ApiCatalog, Params, SynologyResponse, INFO_API, INFO_PATH,
    QUERY_API_LIST,
};
use crate::session::Session;
use crate::transport::{HttpMethod, HttpTransport, Transport};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::Value;
use std::env;
use std::sync::Arc;
use tokio::sync::Mutex;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SECURE_PORT: u16 = 5001;
const DEFAULT_SESSION: &str = "DownloadStation";

/// Synology DSM web API client.
///
/// Owns the connection settings, the lazily discovered API catalog and the
/// login session. Requests are issued one at a time; the catalog and the
/// session are each guarded so that concurrent callers share one discovery
/// and one login.
pub struct SynoClient<T: Transport = HttpTransport> {
    base_url: String,
    username: String,
    password: String,
    session_name: String,
    transport: T,
    catalog: Mutex<Option<Arc<ApiCatalog>>>,
    session: Mutex<Session>,
}

impl SynoClient {
    /// Creates a new `SynoClient` with a builder pattern
    #[must_use]
    pub fn builder() -> SynoClientBuilder {
        SynoClientBuilder::default()
    }
}

impl<T: Transport> SynoClient<T> {
    /// Base address of the server, e.g. `http://nas.local:5000`
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Download Station endpoints sharing this client's session
    #[must_use]
    pub fn download_station(&self) -> DownloadStation<'_, T> {
        DownloadStation::new(self)
    }

    /// Logs in unless a live session already exists
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - API discovery fails
    /// - Network request fails
    /// - Credentials are rejected (resolved through the Auth error table)
    /// - Response carries no session id
    pub async fn login(&self) -> Result<()> {
        self.ensure_session().await.map(|_| ())
    }

    /// Logs in if needed and returns the session id of the live session
    pub(crate) async fn ensure_session(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        if let Some(sid) = session.sid() {
            info!("User already logged in");
            return Ok(sid.to_string());
        }

        let params = Params::new()
            .set("account", self.username.as_str())
            .set("passwd", self.password.as_str())
            .set("session", self.session_name.as_str())
            .set("format", "sid");

        let data = self
            .dispatch(Subsystem::Auth, None, "login", HttpMethod::Post, params, None)
            .await
            .context("Failed to authorize")?;

        let sid = data
            .get("sid")
            .and_then(Value::as_str)
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| InvalidResponse("No session id received".into()))?;

        session.establish(sid.to_string());
        info!("User logged in, new session started");
        Ok(sid.to_string())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.lock().await.is_active()
    }

    /// Current session id, `None` unless logged in
    pub async fn sid(&self) -> Option<String> {
        self.session.lock().await.sid().map(str::to_string)
    }

    /// Forces the next non-auth request to log in again
    pub async fn mark_expired(&self) {
        warn!("Session marked as expired");
        self.session.lock().await.expire();
    }

    /// Expires the session only while `sid` is still the live session id.
    ///
    /// Returns `false` when the session was already replaced or expired.
    pub async fn expire_session(&self, sid: &str) -> bool {
        let expired = self.session.lock().await.expire_if(sid);
        if expired {
            warn!("Session marked as expired");
        }
        expired
    }

    /// Catalog of available APIs, discovered on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the discovery request fails or reports no success
    pub async fn api_catalog(&self) -> Result<Arc<ApiCatalog>> {
        let mut catalog = self.catalog.lock().await;
        if let Some(catalog) = catalog.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        let discovered = Arc::new(self.discover().await?);
        *catalog = Some(Arc::clone(&discovered));
        Ok(discovered)
    }

    /// Drops the cached catalog so that the next request discovers again
    pub async fn invalidate_api_catalog(&self) {
        self.catalog.lock().await.take();
    }

    /// Calls `method` of an API and returns the payload of the response.
    ///
    /// The target is `subsystem`'s declared API, or `sub_api` qualified
    /// within it. Requests outside `SYNO.API.Auth` log in first when there is
    /// no live session.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - API discovery or login fails
    /// - API is not in the discovered catalog
    /// - Network request fails or HTTP status is not 200
    /// - Response carries an error code
    pub async fn call(
        &self,
        subsystem: Subsystem,
        sub_api: Option<&str>,
        method: &str,
        http_method: HttpMethod,
        params: Params,
    ) -> Result<Value> {
        let sid = if subsystem == Subsystem::Auth {
            self.sid().await
        } else {
            Some(self.ensure_session().await?)
        };

        self.dispatch(subsystem, sub_api, method, http_method, params, sid.as_deref())
            .await
    }

    /// Shorthand for a GET [`Self::call`]
    ///
    /// # Errors
    ///
    /// See [`Self::call`]
    pub async fn request_get(
        &self,
        subsystem: Subsystem,
        sub_api: Option<&str>,
        method: &str,
        params: Params,
    ) -> Result<Value> {
        self.call(subsystem, sub_api, method, HttpMethod::Get, params)
            .await
    }

    /// Shorthand for a POST [`Self::call`]
    ///
    /// # Errors
    ///
    /// See [`Self::call`]
    pub async fn request_post(
        &self,
        subsystem: Subsystem,
        sub_api: Option<&str>,
        method: &str,
        params: Params,
    ) -> Result<Value> {
        self.call(subsystem, sub_api, method, HttpMethod::Post, params)
            .await
    }

    /// Resolves, sends and decodes one request without touching the session
    pub(crate) async fn dispatch(
        &self,
        subsystem: Subsystem,
        sub_api: Option<&str>,
        method: &str,
        http_method: HttpMethod,
        params: Params,
        sid: Option<&str>,
    ) -> Result<Value> {
        let api_name = qualify_api_name(subsystem.api_name(), sub_api);
        let catalog = self.api_catalog().await?;
        let descriptor = catalog
            .get(&api_name)
            .ok_or_else(|| UnknownApi(api_name.clone()))?;

        let base = Params::new()
            .set("version", descriptor.max_version)
            .set("_sid", sid);
        let params = params.set("method", method).merged_over(base).normalize();

        let url = format!(
            "{}/webapi/{}?api={}",
            self.base_url, descriptor.path, api_name
        );
        debug!(
            "Making API request to: {} with {} parameters",
            url,
            params.len()
        );

        let response = self
            .transport
            .send(http_method, &url, &params)
            .await
            .with_context(|| format!("Failed to make API request to {api_name}"))?;

        decode_envelope(subsystem, response.status, &response.body)
    }

    async fn discover(&self) -> Result<ApiCatalog> {
        let url = format!("{}/webapi/{}", self.base_url, INFO_PATH);
        let params = Params::new()
            .set("api", INFO_API)
            .set("version", 1)
            .set("method", "query")
            .set("query", QUERY_API_LIST.join(","))
            .normalize();

        debug!("Discovering APIs at: {url}");
        let response = self
            .transport
            .send(HttpMethod::Get, &url, &params)
            .await
            .map_err(|e| Discovery(format!("Failed to make API discovery request: {e:#}")))?;

        if response.status != 200 {
            return Err(Discovery(format!("HTTP status code {}", response.status)).into());
        }

        let envelope: SynologyResponse<ApiCatalog> = serde_json::from_str(&response.body)
            .map_err(|e| Discovery(format!("Failed to parse discovery response: {e}")))?;

        if !envelope.success {
            let code = envelope.error.map_or(0, |error| error.code);
            return Err(Discovery(format!("Request not successful, code={code}")).into());
        }

        let catalog = envelope.data.unwrap_or_default();
        info!("Discovered {} APIs", catalog.len());
        Ok(catalog)
    }
}

/// Builder for [`SynoClient`]
#[derive(Default)]
pub struct SynoClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    secure: bool,
    username: Option<String>,
    password: Option<String>,
    session: Option<String>,
    timeout: Option<u64>,
}

impl SynoClientBuilder {
    /// Reads `SYNOLOGY_HOST`, `SYNOLOGY_USERNAME`, `SYNOLOGY_PASSWORD` and the
    /// optional `SYNOLOGY_PORT` and `SYNOLOGY_SECURE`
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or the port is not a number
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::default()
            .host(env::var("SYNOLOGY_HOST").map_err(Environment)?)
            .username(env::var("SYNOLOGY_USERNAME").map_err(Environment)?)
            .password(env::var("SYNOLOGY_PASSWORD").map_err(Environment)?);

        if let Ok(port) = env::var("SYNOLOGY_PORT") {
            let port = port
                .parse()
                .map_err(|_| Configuration(format!("Invalid SYNOLOGY_PORT: {port}")))?;
            builder = builder.port(port);
        }

        if let Ok(secure) = env::var("SYNOLOGY_SECURE") {
            builder = builder.secure(matches!(secure.as_str(), "1" | "true" | "yes"));
        }

        Ok(builder)
    }

    /// Sets the host, either a bare name (`nas.local`) or a URL (`https://nas.local:5001`)
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the full base URL of the server
    #[must_use]
    pub fn url(self, url: impl Into<String>) -> Self {
        self.host(url)
    }

    /// Sets the port used with a bare host name
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Uses HTTPS with a bare host name
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the username
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the password
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the session name sent on login
    #[must_use]
    pub fn session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Sets the request timeout in milliseconds
    #[must_use]
    pub fn timeout(mut self, timeout_millis: u64) -> Self {
        self.timeout = Some(timeout_millis);
        self
    }

    /// Builds the [`SynoClient`] with an HTTP transport
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required fields (host, username, password) are not provided or empty
    /// - Host URL uses a scheme other than "http://" or "https://"
    pub fn build(self) -> Result<SynoClient> {
        let transport = HttpTransport::new(self.timeout.unwrap_or(3000));
        self.build_with_transport(transport)
    }

    /// Builds the [`SynoClient`] on top of a custom [`Transport`]
    ///
    /// # Errors
    ///
    /// See [`Self::build`]
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<SynoClient<T>> {
        let host = self
            .host
            .ok_or_else(|| Configuration("Host URL is required".into()))?;
        let username = self
            .username
            .ok_or_else(|| Configuration("Username is required".into()))?;
        let password = self
            .password
            .ok_or_else(|| Configuration("Password is required".into()))?;

        if username.is_empty() {
            return Err(Configuration("Username cannot be empty".into()).into());
        }

        if password.is_empty() {
            return Err(Configuration("Password cannot be empty".into()).into());
        }

        let base_url = base_url(&host, self.port, self.secure)?;

        Ok(SynoClient {
            base_url,
            username,
            password,
            session_name: self.session.unwrap_or_else(|| DEFAULT_SESSION.into()),
            transport,
            catalog: Mutex::new(None),
            session: Mutex::new(Session::default()),
        })
    }
}

fn base_url(host: &str, port: Option<u16>, secure: bool) -> Result<String> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(Configuration("Host URL cannot be empty".into()).into());
    }

    if host.contains("://") {
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(Configuration(format!(
                "Host URL must start with http:// or https://, got: {host}"
            ))
            .into());
        }
        return Ok(match port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        });
    }

    let (scheme, default_port) = if secure {
        ("https", DEFAULT_SECURE_PORT)
    } else {
        ("http", DEFAULT_PORT)
    };
    Ok(format!(
        "{scheme}://{host}:{}",
        port.unwrap_or(default_port)
    ))
}
