//! Data models for the controller API surface.

use chrono::{DateTime, Utc};
use meridian_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Account email (username).
    pub email: String,
    /// Account password.
    pub password: String,
}

/// A role granted to the logged-in account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleSpec {
    /// Role name (e.g. `tenant_super`).
    pub name: Option<String>,
}

/// Profile of the logged-in account.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Profile {
    /// Profile object id.
    pub id: Option<String>,
    /// Numeric tenant (account) id.
    pub tenant_id: Option<String>,
    /// Tenant (account) name.
    pub tenant_name: Option<String>,
    /// Account email (username).
    pub email: Option<String>,
    /// First name on the account.
    pub first_name: Option<String>,
    /// Last name on the account.
    pub last_name: Option<String>,
    /// Roles granted to the account.
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
    /// Whether the tenant is an ESP/MSP.
    pub is_esp: Option<bool>,
    /// Logged-in client id, when operating on behalf of an ESP client.
    pub client_id: Option<String>,
}

impl Profile {
    /// Deserialize a profile from normalized response content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content does not have the profile shape.
    pub fn from_content(content: &Value) -> Result<Self, Error> {
        serde_json::from_value(content.clone()).map_err(Error::from)
    }

    /// Names of the granted roles, skipping unnamed entries.
    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        self.roles
            .iter()
            .filter_map(|role| role.name.clone())
            .collect()
    }
}

/// Physical address attached to a site.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Address {
    /// Street line.
    pub street: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State or province.
    pub state: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Postal code.
    pub post_code: Option<String>,
}

/// A site (branch or data center) registered with the controller.
#[derive(Debug, Clone, Deserialize)]
pub struct Site {
    /// Site id.
    pub id: Option<String>,
    /// Site name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Administrative state (`active`, `disabled`, `monitor`).
    pub admin_state: Option<String>,
    /// Role of the element cluster at this site.
    pub element_cluster_role: Option<String>,
    /// Physical address.
    pub address: Option<Address>,
    /// Caller-defined tags.
    pub tags: Option<Vec<String>>,
    /// Creation timestamp.
    pub created_on: Option<DateTime<Utc>>,
}

/// Request body for creating or updating a site.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SiteRequest {
    /// Site name.
    pub name: String,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Administrative state (`active`, `disabled`, `monitor`).
    pub admin_state: String,
    /// Role of the element cluster at this site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_cluster_role: Option<String>,
    /// Physical address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Caller-defined tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A device (element) claimed by the tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    /// Element id.
    pub id: Option<String>,
    /// Element name.
    pub name: Option<String>,
    /// Site the element is assigned to.
    pub site_id: Option<String>,
    /// Hardware serial number.
    pub serial_number: Option<String>,
    /// Element state (`ready`, `bound`, `declaim_in_progress`).
    pub state: Option<String>,
    /// Whether the element is currently connected to the controller.
    pub connected: Option<bool>,
    /// Running software version.
    pub software_version: Option<String>,
    /// Registration timestamp.
    pub registered_on: Option<DateTime<Utc>>,
}
