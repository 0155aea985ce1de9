//! Wire types shared by the endpoint modules

use chrono::{DateTime, Utc};
use fourmore_geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// OpenStreetMap element type
///
/// The backend stores the one-letter form (`N`, `W`, `R`) and the API speaks
/// the long form. Both are accepted; the long form is always sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    #[serde(alias = "N", alias = "n")]
    Node,
    #[serde(alias = "W", alias = "w")]
    Way,
    #[serde(alias = "R", alias = "r")]
    Relation,
}

impl OsmType {
    /// Long form used in URLs and request bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    /// One-letter form stored by the backend
    pub fn short(&self) -> &'static str {
        match self {
            Self::Node => "N",
            Self::Way => "W",
            Self::Relation => "R",
        }
    }
}

impl fmt::Display for OsmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsmType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "node" | "n" => Ok(Self::Node),
            "way" | "w" => Ok(Self::Way),
            "relation" | "r" => Ok(Self::Relation),
            other => Err(ApiError::validation(format!("unknown OSM type: {other}"))),
        }
    }
}

/// Composite identity of a POI
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoiKey {
    pub osm_type: OsmType,
    pub osm_id: i64,
}

impl PoiKey {
    pub fn new(osm_type: OsmType, osm_id: i64) -> Self {
        Self { osm_type, osm_id }
    }
}

impl fmt::Display for PoiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.osm_type, self.osm_id)
    }
}

impl FromStr for PoiKey {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (osm_type, osm_id) = s
            .split_once(':')
            .ok_or_else(|| ApiError::validation(format!("expected type:id, got {s}")))?;
        let osm_id = osm_id
            .parse()
            .map_err(|_| ApiError::validation(format!("invalid OSM id: {osm_id}")))?;
        Ok(Self::new(osm_type.parse()?, osm_id))
    }
}

/// A free-form OSM tag value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub osm_type: OsmType,
    pub osm_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "class")]
    pub class: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, TagValue>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default, with = "flexible_datetime::option")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Meters from the search origin; only present on search results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Whether this is the user's active check-in location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_checked_in: Option<bool>,
}

impl Poi {
    pub fn key(&self) -> PoiKey {
        PoiKey::new(self.osm_type, self.osm_id)
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// Name if tagged, else the class
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.class)
    }

    pub fn is_checked_in(&self) -> bool {
        self.is_checked_in.unwrap_or(false)
    }
}

/// Location bias for free-text search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchBias {
    pub center: Coordinate,
    pub radius_m: u32,
}

/// Radius search around a point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    /// Meters, 1..=10000
    pub radius: f64,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 1..=100
    pub limit: u32,
    pub offset: u32,
}

impl NearbyQuery {
    pub const DEFAULT_RADIUS_M: f64 = 1000.0;
    pub const MAX_RADIUS_M: f64 = 10_000.0;
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(center: Coordinate) -> Self {
        Self {
            lat: center.latitude,
            lon: center.longitude,
            radius: Self::DEFAULT_RADIUS_M,
            category: None,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }

    #[must_use]
    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius = radius_m;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Mirror the backend's range checks before sending
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ApiError::validation(format!("latitude {} is out of range", self.lat)));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(ApiError::validation(format!("longitude {} is out of range", self.lon)));
        }
        if !(1.0..=Self::MAX_RADIUS_M).contains(&self.radius) {
            return Err(ApiError::validation(format!(
                "radius must be between 1 and {} meters",
                Self::MAX_RADIUS_M
            )));
        }
        if !(1..=Self::MAX_LIMIT).contains(&self.limit) {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {}",
                Self::MAX_LIMIT
            )));
        }
        Ok(())
    }
}

/// A new check-in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCheckIn {
    #[serde(rename = "poi_osm_type")]
    pub osm_type: OsmType,
    #[serde(rename = "poi_osm_id")]
    pub osm_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "user_lat", skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(rename = "user_lon", skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl NewCheckIn {
    pub const MAX_COMMENT_CHARS: usize = 500;

    pub fn new(key: PoiKey) -> Self {
        Self {
            osm_type: key.osm_type,
            osm_id: key.osm_id,
            comment: None,
            lat: None,
            lon: None,
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Coordinate) -> Self {
        self.lat = Some(location.latitude);
        self.lon = Some(location.longitude);
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref comment) = self.comment {
            if comment.chars().count() > Self::MAX_COMMENT_CHARS {
                return Err(ApiError::validation(format!(
                    "Comments are limited to {} characters",
                    Self::MAX_COMMENT_CHARS
                )));
            }
        }
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            if !Coordinate::new(lat, lon).is_valid() {
                return Err(ApiError::validation(format!("invalid location {lat},{lon}")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: i64,
    pub poi_osm_type: OsmType,
    pub poi_osm_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    pub poi: Poi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInPage {
    pub checkins: Vec<CheckIn>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInStats {
    pub total_checkins: u64,
    pub unique_places: u64,
    #[serde(default)]
    pub favorite_class: Option<String>,
    #[serde(default, with = "flexible_datetime::option")]
    pub member_since: Option<DateTime<Utc>>,
}

/// Result of marking a place as still accurate upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmResult {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub changeset_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub check_date: Option<String>,
    #[serde(default)]
    pub new_version: Option<i64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteResult {
    pub note_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestList {
    pub quests: Vec<Quest>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestAnswer {
    #[serde(rename = "poi_osm_type")]
    pub osm_type: OsmType,
    #[serde(rename = "poi_osm_id")]
    pub osm_id: i64,
    pub quest_id: String,
    pub answer: String,
}

/// Outcome of a quest answer; `success == false` carries the upstream reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestAnswerResult {
    pub success: bool,
    #[serde(default)]
    pub changeset_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub expert: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_true")]
    pub participate_in_quests: bool,
}

fn default_theme() -> String {
    "light".to_string()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            expert: false,
            theme: default_theme(),
            notifications: true,
            participate_in_quests: true,
        }
    }
}

/// Partial settings update; only set fields are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participate_in_quests: Option<bool>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub settings: Option<UserSettings>,
    pub osm_user_id: String,
    #[serde(default, with = "flexible_datetime::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

/// A POI category from the shared mapping file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "class")]
    pub class: String,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Tag match rules; opaque to the client
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<serde_json::Value>,
}

/// The backend's `{success, message, data}` wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// The payload, or an error carrying the envelope message
    pub fn into_data(self) -> Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(ApiError::api_response(200, self.message)),
        }
    }
}

/// Timestamps arrive either as RFC 3339 or as naive UTC (`2024-05-01T10:00:00`)
mod flexible_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
                None => Ok(None),
            }
        }
    }
}
