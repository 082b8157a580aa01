use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Contact fields accepted from callers. Every field is optional; an absent
/// field is never written to the store, and an empty string is treated the
/// same as absent.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ContactInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// Accepted in the payload for compatibility but always overwritten by
    /// the pipeline output or the configured defaults.
    pub img_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

/// An uploaded portrait: the client-supplied filename plus the raw bytes.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub name: String,
    pub data: Bytes,
}

/// A contact row as persisted. `contact_id` and `date_added` are always
/// store-assigned; the rest mirrors exactly what the caller supplied or what
/// the image pipeline produced.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ContactRecord {
    pub contact_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub img_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(with = "sql_datetime")]
    #[schema(value_type = String, example = "2024-05-01 12:30:00")]
    pub date_added: NaiveDateTime,
}

/// Serde codec for the `YYYY-MM-DD HH:MM:SS` timestamp rendering used both
/// in the contacts table and in response JSON.
pub mod sql_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)
    }
}
