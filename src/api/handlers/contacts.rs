use axum::{
    Json,
    extract::{Multipart, State},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;
use crate::api::error::AppError;
use crate::models::{ContactInput, ContactRecord, ImageUpload};
use crate::services::contacts::OnboardError;

/// Multipart form: a `contact` part carrying the JSON payload, optionally a
/// `picture` file part. Parts may arrive in any order.
#[utoipa::path(
    post,
    path = "/contacts",
    responses(
        (status = 200, description = "Contact stored, returned as persisted", body = ContactRecord),
        (status = 500, description = "Onboarding failed; nothing was persisted")
    ),
    tag = "contacts"
)]
pub async fn add_contact(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ContactRecord>, AppError> {
    let mut contact: Option<ContactInput> = None;
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "contact" {
            let raw = field.bytes().await?;
            contact = Some(serde_json::from_slice(&raw).map_err(OnboardError::Malformed)?);
        } else if name == "picture" {
            let file_name = field.file_name().unwrap_or("unnamed").to_string();
            let data = field.bytes().await?;

            // Some clients send an empty file part when no picture was
            // chosen; treat that the same as omitting the part.
            if !data.is_empty() {
                image = Some(ImageUpload {
                    name: file_name,
                    data,
                });
            }
        }
    }

    let mut contact = contact.ok_or(OnboardError::MissingContact)?;
    contact.image = image;

    let record = state.contacts.onboard(contact).await?;
    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/contacts",
    responses(
        (status = 200, description = "All stored contacts in insertion order", body = [ContactRecord]),
        (status = 400, description = "Contact list could not be read")
    ),
    tag = "contacts"
)]
pub async fn list_contacts(State(state): State<AppState>) -> Result<Response, AppError> {
    let contacts = state.contacts.list().await.map_err(AppError::ListContacts)?;

    // An empty list is reported as an explicit empty result set, not a bare
    // [] like the populated case.
    if contacts.is_empty() {
        return Ok(Json(json!({ "resultCount": 0, "results": [] })).into_response());
    }

    Ok(Json(contacts).into_response())
}
