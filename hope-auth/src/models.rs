use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use hope_shared::types::auth::UserRole;

use crate::schema::{permissions, users};

// --- Users ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub phone_number: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> UserRole {
        self.role.parse::<UserRole>().unwrap_or(UserRole::User)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub phone_number: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

// --- Permissions ---

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = permissions)]
pub struct PermissionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub microphone: bool,
    pub camera: bool,
    pub audio: bool,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub full_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = permissions)]
pub struct NewPermission {
    pub user_id: Uuid,
    pub microphone: bool,
    pub camera: bool,
    pub audio: bool,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub full_address: Option<String>,
}

const LOCATION_PLACEHOLDER: &str = "Location permission granted";

/// `VARCHAR(255)` columns: `users.name`, `users.email`, `permissions.location_name`.
pub const MAX_TEXT_LEN: usize = 255;

/// Where the user was when they granted location access, if they did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Location {
    Unset,
    #[serde(rename_all = "camelCase")]
    Structured {
        name: String,
        latitude: f64,
        longitude: f64,
        full_address: Option<String>,
    },
}

impl Location {
    fn placeholder() -> Self {
        Location::Structured {
            name: LOCATION_PLACEHOLDER.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            full_address: None,
        }
    }

    /// Reshape the browser's location payload. Clients send either a bare
    /// boolean or `{name, coordinates: {latitude, longitude}, fullAddress}`.
    pub fn from_client(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Location::Unset,
            Some(Value::Object(map)) => {
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|n| !n.is_empty());
                let coordinates = map.get("coordinates").and_then(Value::as_object);

                match (name, coordinates) {
                    (Some(name), Some(coordinates)) => Location::Structured {
                        name: short_place_name(name),
                        latitude: coerce_coordinate(coordinates.get("latitude")),
                        longitude: coerce_coordinate(coordinates.get("longitude")),
                        full_address: map
                            .get("fullAddress")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    },
                    _ => Location::placeholder(),
                }
            }
            Some(_) => Location::placeholder(),
        }
    }

    fn from_columns(
        name: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        full_address: Option<&str>,
    ) -> Self {
        match name {
            Some(name) => Location::Structured {
                name: name.to_string(),
                latitude: latitude.unwrap_or(0.0),
                longitude: longitude.unwrap_or(0.0),
                full_address: full_address.map(str::to_string),
            },
            None => Location::Unset,
        }
    }
}

/// "Pune, Maharashtra, India" -> "Pune, Maharashtra"
fn short_place_name(name: &str) -> String {
    let parts: Vec<&str> = name
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(2)
        .collect();
    let short = if parts.is_empty() {
        name.trim().to_string()
    } else {
        parts.join(", ")
    };
    // Postgres counts VARCHAR length in characters.
    short.chars().take(MAX_TEXT_LEN).collect::<String>().trim_end().to_string()
}

fn coerce_coordinate(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Capabilities the user agreed to share, as sent by the browser at sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionsPayload {
    #[serde(default)]
    pub microphone: Option<bool>,
    #[serde(default)]
    pub camera: Option<bool>,
    #[serde(default)]
    pub audio: Option<bool>,
    #[serde(default)]
    pub location: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Permissions {
    pub microphone: bool,
    pub camera: bool,
    pub audio: bool,
    pub location: Location,
}

impl Permissions {
    pub fn from_client(payload: Option<&PermissionsPayload>) -> Self {
        let payload = payload.cloned().unwrap_or_default();
        Self {
            microphone: payload.microphone.unwrap_or(false),
            camera: payload.camera.unwrap_or(false),
            audio: payload.audio.unwrap_or(false),
            location: Location::from_client(payload.location.as_ref()),
        }
    }

    pub fn into_new(self, user_id: Uuid) -> NewPermission {
        let (location_name, latitude, longitude, full_address) = match self.location {
            Location::Unset => (None, None, None, None),
            Location::Structured { name, latitude, longitude, full_address } => {
                (Some(name), Some(latitude), Some(longitude), full_address)
            }
        };
        NewPermission {
            user_id,
            microphone: self.microphone,
            camera: self.camera,
            audio: self.audio,
            location_name,
            latitude,
            longitude,
            full_address,
        }
    }
}

impl From<&PermissionRow> for Permissions {
    fn from(row: &PermissionRow) -> Self {
        Self {
            microphone: row.microphone,
            camera: row.camera,
            audio: row.audio,
            location: Location::from_columns(
                row.location_name.as_deref(),
                row.latitude,
                row.longitude,
                row.full_address.as_deref(),
            ),
        }
    }
}
