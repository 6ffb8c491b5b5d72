use crate::dtos::{LeaderboardEntry, LeaderboardRow, UploadResponse};
use crate::error::AppError;
use crate::models::Submission;
use crate::services::StagedImage;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use std::path::Path;

struct UploadedImage {
    bytes: Vec<u8>,
    content_type: String,
    file_name: String,
}

/// Pull the `email` text field and the `image` file field out of the
/// multipart body. Anything missing (or an empty email) is a client error;
/// no other constraint is enforced.
async fn read_submission_fields(
    multipart: &mut Multipart,
) -> Result<(String, UploadedImage), AppError> {
    let mut email: Option<String> = None;
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        match field.name() {
            Some("email") => {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read email field: {}", e))
                })?;
                email = Some(value);
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AppError::BadRequest(anyhow::anyhow!("Failed to read image field: {}", e))
                    })?
                    .to_vec();
                image = Some(UploadedImage {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            _ => {}
        }
    }

    match (email, image) {
        (Some(email), Some(image)) if !email.is_empty() => Ok((email, image)),
        _ => Err(AppError::BadRequest(anyhow::anyhow!(
            "Email and image are required"
        ))),
    }
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (email, image) = read_submission_fields(&mut multipart).await?;

    let submission = Submission::new(email.clone(), image.bytes.clone(), image.content_type.clone());
    state
        .db
        .submissions()
        .insert_one(&submission, None)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert submission for {}: {}", email, e);
            AppError::from(e)
        })?;

    tracing::info!(
        submission_id = %submission.id,
        email = %submission.email,
        size = image.bytes.len(),
        "Submission created"
    );

    // Staged file is removed when the guard drops, on every exit path.
    let staged = StagedImage::create(
        Path::new(&state.config.staging.dir),
        &image.file_name,
        &image.bytes,
    )
    .await?;

    let display_name = format!("{}-image", email);
    let annotation = state
        .annotator
        .annotate(
            staged.path(),
            &image.content_type,
            &display_name,
            &state.catalog.contents(),
        )
        .await?;
    drop(staged);

    tracing::info!(
        submission_id = %submission.id,
        uri = %annotation.file_uri,
        "Image accepted by annotation service"
    );

    // The caller gets the annotation even if recording the reference fails;
    // the record is then left pending without one.
    let update = doc! { "$set": {
        "status": "annotated",
        "gemini_uri": &annotation.file_uri,
        "updated_at": mongodb::bson::DateTime::now(),
    } };
    if let Err(e) = state
        .db
        .submissions()
        .update_one(doc! { "_id": &submission.id }, update, None)
        .await
    {
        tracing::error!(
            submission_id = %submission.id,
            error = %e,
            "Failed to record annotation reference"
        );
    }

    Ok(Json(UploadResponse {
        message: "Image uploaded successfully!".to_string(),
        gemini_response: annotation.text,
        gemini_uri: annotation.file_uri,
    }))
}

pub async fn upload_creation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (email, image) = read_submission_fields(&mut multipart).await?;

    let submission = Submission::new(email, image.bytes, image.content_type);
    state
        .db
        .submissions()
        .insert_one(&submission, None)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert submission {}: {}", submission.id, e);
            AppError::from(e)
        })?;

    tracing::info!(submission_id = %submission.id, "Submission created without annotation");

    Ok((StatusCode::CREATED, "User and image saved successfully"))
}

pub async fn leaderboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    // Natural store order; no sort is applied.
    let find_options = FindOptions::builder()
        .projection(doc! { "email": 1, "image": 1, "content_type": 1, "gemini_uri": 1 })
        .build();

    let mut cursor = state
        .db
        .submissions()
        .clone_with_type::<LeaderboardRow>()
        .find(None, find_options)
        .await
        .map_err(AppError::from)?;

    let mut entries = Vec::new();
    while let Some(row) = cursor.try_next().await.map_err(AppError::from)? {
        entries.push(LeaderboardEntry::from(row));
    }

    Ok(Json(entries))
}
