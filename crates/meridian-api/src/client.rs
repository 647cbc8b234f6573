//! Endpoint request builders over a shared session.

use crate::models::{LoginRequest, Profile, SiteRequest};
use crate::Result;
use meridian_core::{ApiResponse, Error, RestRequest, Session, SessionIdentity};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

// API versions of the endpoint groups used here. Versions move
// independently per resource on the controller.
const LOGIN_VERSION: &str = "v2.0";
const PROFILE_VERSION: &str = "v2.0";
const SITES_VERSION: &str = "v4.5";
const ELEMENTS_VERSION: &str = "v2.2";

/// Typed request builders for the controller API.
///
/// Owns the [`Session`] and delegates every call to the core engine; none
/// of the retry, region, or trust logic lives here.
pub struct ApiClient {
    session: Session,
}

impl ApiClient {
    /// Wrap an existing session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Build a client with default session settings for the given
    /// controller URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be constructed.
    pub fn connect(controller: impl Into<String>) -> Result<Self> {
        Ok(Self::new(Session::new(controller)?))
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the underlying session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Consume the client and return the session.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Log in with email and password.
    ///
    /// On success the login response may advertise a target region; the
    /// session controller is rewritten accordingly, the login cookies are
    /// rebound to the regional host, and the account profile is fetched to
    /// populate the session identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] when the controller rejects
    /// the credentials, or an endpoint error if the rewritten controller
    /// URL is unusable.
    pub fn login(&mut self, email: &str, password: &SecretString) -> Result<ApiResponse> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.expose_secret().to_string(),
        })?;

        let url = self.url(LOGIN_VERSION, "login");
        let response = self
            .session
            .rest_call(RestRequest::post(url).data(body).sensitive(true));

        if !response.success {
            return Err(Error::AuthenticationFailed(
                response
                    .error_message()
                    .unwrap_or("login rejected by controller")
                    .to_string(),
            ));
        }

        if let Some(region) = self.session.parse_region(&response) {
            info!(%region, "controller advertised region at login");
            self.session.update_region(&region);
            self.session.rebind_login_cookies(&response)?;
        }

        self.populate_identity();

        Ok(response)
    }

    /// Log out and clear the session identity.
    pub fn logout(&mut self) -> ApiResponse {
        let response = self
            .session
            .rest_call(RestRequest::get(self.url(LOGIN_VERSION, "logout")));
        if response.success {
            *self.session.identity_mut() = SessionIdentity::default();
        }
        response
    }

    /// Fetch the profile of the logged-in account.
    #[must_use]
    pub fn profile(&self) -> ApiResponse {
        self.session
            .rest_call(RestRequest::get(self.url(PROFILE_VERSION, "profile")))
    }

    /// List sites for the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if no tenant id is known (log in first).
    pub fn list_sites(&self) -> Result<ApiResponse> {
        let url = self.tenant_url(SITES_VERSION, "sites")?;
        Ok(self.session.rest_call(RestRequest::get(url)))
    }

    /// Fetch a single site by id.
    ///
    /// # Errors
    ///
    /// Returns an error if no tenant id is known (log in first).
    pub fn get_site(&self, site_id: &str) -> Result<ApiResponse> {
        let url = self.tenant_url(SITES_VERSION, &format!("sites/{site_id}"))?;
        Ok(self.session.rest_call(RestRequest::get(url)))
    }

    /// Create a site.
    ///
    /// # Errors
    ///
    /// Returns an error if no tenant id is known or the request cannot be
    /// serialized.
    pub fn create_site(&self, request: &SiteRequest) -> Result<ApiResponse> {
        let url = self.tenant_url(SITES_VERSION, "sites")?;
        let body = serde_json::to_value(request)?;
        Ok(self.session.rest_call(RestRequest::post(url).data(body)))
    }

    /// Update a site.
    ///
    /// # Errors
    ///
    /// Returns an error if no tenant id is known or the request cannot be
    /// serialized.
    pub fn update_site(&self, site_id: &str, request: &SiteRequest) -> Result<ApiResponse> {
        let url = self.tenant_url(SITES_VERSION, &format!("sites/{site_id}"))?;
        let body = serde_json::to_value(request)?;
        Ok(self.session.rest_call(RestRequest::put(url).data(body)))
    }

    /// Delete a site.
    ///
    /// # Errors
    ///
    /// Returns an error if no tenant id is known (log in first).
    pub fn delete_site(&self, site_id: &str) -> Result<ApiResponse> {
        let url = self.tenant_url(SITES_VERSION, &format!("sites/{site_id}"))?;
        Ok(self.session.rest_call(RestRequest::delete(url)))
    }

    /// List elements claimed by the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if no tenant id is known (log in first).
    pub fn list_elements(&self) -> Result<ApiResponse> {
        let url = self.tenant_url(ELEMENTS_VERSION, "elements")?;
        Ok(self.session.rest_call(RestRequest::get(url)))
    }

    fn populate_identity(&mut self) {
        let response = self.profile();
        if !response.success {
            debug!("profile fetch after login failed; identity left empty");
            return;
        }

        match Profile::from_content(&response.content) {
            Ok(profile) => {
                let identity = self.session.identity_mut();
                identity.tenant_id = profile.tenant_id.clone();
                identity.tenant_name = profile.tenant_name.clone();
                identity.email = profile.email.clone();
                identity.roles = profile.role_names();
                identity.is_esp = profile.is_esp;
                identity.client_id = profile.client_id.clone();
                identity.token_session = Some(false);
            }
            Err(err) => {
                debug!(error = %err, "profile content did not parse; identity left empty");
            }
        }
    }

    fn url(&self, version: &str, path: &str) -> String {
        format!("{}/{version}/api/{path}", self.session.controller())
    }

    fn tenant_url(&self, version: &str, path: &str) -> Result<String> {
        let tenant_id = self
            .session
            .identity()
            .tenant_id
            .clone()
            .ok_or_else(|| {
                Error::AuthenticationFailed("no tenant id on session; log in first".to_string())
            })?;
        Ok(format!(
            "{}/{version}/api/tenants/{tenant_id}/{path}",
            self.session.controller()
        ))
    }
}
