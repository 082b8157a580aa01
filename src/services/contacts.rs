use crate::config::AppConfig;
use crate::models::{ContactInput, ContactRecord, sql_datetime};
use crate::services::image_pipeline::{ImagePipeline, PipelineError};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OnboardError {
    #[error("no contact supplied")]
    MissingContact,

    #[error("contact payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("contact insert failed: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("inserted contact {0} could not be re-read")]
    MissingRow(i64),
}

impl OnboardError {
    /// Onboarding stage the failure is attributed to, for log correlation.
    pub fn stage(&self) -> &'static str {
        match self {
            OnboardError::MissingContact | OnboardError::Malformed(_) => "validation",
            OnboardError::Pipeline(e) => e.stage(),
            OnboardError::Persistence(_) | OnboardError::MissingRow(_) => "persistence",
        }
    }
}

/// Entry point for contact onboarding: runs the image pipeline when a
/// picture was uploaded, otherwise falls back to the configured default
/// URLs, then persists the contact and returns the stored row.
pub struct ContactService {
    db: SqlitePool,
    pipeline: ImagePipeline,
    default_img_url: String,
    default_thumbnail_url: String,
}

impl ContactService {
    pub fn new(db: SqlitePool, pipeline: ImagePipeline, config: &AppConfig) -> Self {
        Self {
            db,
            pipeline,
            default_img_url: config.default_img_url.clone(),
            default_thumbnail_url: config.default_thumbnail_url.clone(),
        }
    }

    /// Onboards one contact. An image failure aborts the whole attempt; the
    /// row is only written after both URLs are known.
    pub async fn onboard(&self, contact: ContactInput) -> Result<ContactRecord, OnboardError> {
        match &contact.image {
            Some(image) => {
                tracing::info!("📥 Onboarding contact with image '{}'", image.name);
                let processed = self.pipeline.run(image).await?;
                self.compose(&contact, &processed.img_url, &processed.thumbnail_url)
                    .await
            }
            None => {
                tracing::info!("📥 Onboarding contact without image");
                self.compose(&contact, &self.default_img_url, &self.default_thumbnail_url)
                    .await
            }
        }
    }

    /// All stored contacts in insertion order.
    pub async fn list(&self) -> Result<Vec<ContactRecord>, sqlx::Error> {
        sqlx::query_as::<_, ContactRecord>(
            "SELECT contact_id, first_name, last_name, phone, img_url, thumbnail_url, date_added \
             FROM contacts ORDER BY contact_id",
        )
        .fetch_all(&self.db)
        .await
    }

    /// Writes the contact with the supplied URLs and re-reads the row by its
    /// generated id. The store is the source of truth for the returned
    /// record; a missing row after a successful insert is an error, never an
    /// empty success.
    async fn compose(
        &self,
        contact: &ContactInput,
        img_url: &str,
        thumbnail_url: &str,
    ) -> Result<ContactRecord, OnboardError> {
        let date_added = Utc::now()
            .naive_utc()
            .format(sql_datetime::FORMAT)
            .to_string();
        let pairs = insert_pairs(contact, img_url, thumbnail_url, &date_added);

        let mut insert = build_insert(&pairs);
        let result = insert.build().execute(&self.db).await?;
        let contact_id = result.last_insert_rowid();

        let record = sqlx::query_as::<_, ContactRecord>(
            "SELECT contact_id, first_name, last_name, phone, img_url, thumbnail_url, date_added \
             FROM contacts WHERE contact_id = ?",
        )
        .bind(contact_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(OnboardError::MissingRow(contact_id))?;

        tracing::info!("✅ Contact {} saved", record.contact_id);
        Ok(record)
    }
}

/// Column/value pairs for the insert, in the order they are rendered. Only
/// fields that are present and non-empty get a column; the supplied URLs
/// overwrite whatever the caller put in `img_url`/`thumbnail_url`;
/// `date_added` is always last.
fn insert_pairs(
    contact: &ContactInput,
    img_url: &str,
    thumbnail_url: &str,
    date_added: &str,
) -> Vec<(&'static str, String)> {
    let candidates = [
        ("first_name", contact.first_name.as_deref()),
        ("last_name", contact.last_name.as_deref()),
        ("phone", contact.phone.as_deref()),
        ("img_url", Some(img_url)),
        ("thumbnail_url", Some(thumbnail_url)),
    ];

    let mut pairs: Vec<(&'static str, String)> = candidates
        .into_iter()
        .filter_map(|(column, value)| match value {
            Some(v) if !v.is_empty() => Some((column, v.to_string())),
            _ => None,
        })
        .collect();
    pairs.push(("date_added", date_added.to_string()));
    pairs
}

/// Renders the pair list into one parameterized insert. Columns and
/// placeholders come from the same slice, so they cannot drift apart.
fn build_insert(pairs: &[(&'static str, String)]) -> QueryBuilder<'static, Sqlite> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO contacts (");

    let mut columns = builder.separated(", ");
    for (column, _) in pairs {
        columns.push(*column);
    }

    builder.push(") VALUES (");
    let mut values = builder.separated(", ");
    for (_, value) in pairs {
        values.push_bind(value.clone());
    }
    builder.push(")");

    builder
}
