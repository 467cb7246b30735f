// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin CMS routes: memories, routine schedules, and challenges.
//!
//! Every action is a form post answering `{"success": true}` or
//! `{"error": "..."}`. Checks run in a fixed order: admin, id format,
//! existence, then field validation.

use crate::db::{NewChallenge, NewSchedule};
use crate::error::{action_failure, ActionError, ActionResult, ActionSuccess, AppError, Result};
use crate::models::{
    ChallengeStatus, ChallengeSummary, ChallengeType, Memory, Profile, RoutineSchedule,
};
use crate::services::media::{extension_for, MAX_UPLOAD_BYTES};
use crate::services::RequestContext;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

/// Body limit for the upload route. Leaves room for the other multipart
/// fields so an oversized image gets the friendly 413 message.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin", get(get_admin))
        .route(
            "/api/admin/memories/create",
            post(create_memory).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/admin/memories/update", post(update_memory))
        .route("/api/admin/memories/delete", post(delete_memory))
        .route("/api/admin/memories/reorder", post(reorder_memories))
        .route("/api/admin/schedules/create", post(create_schedule))
        .route("/api/admin/schedules/update", post(update_schedule))
        .route("/api/admin/schedules/delete", post(delete_schedule))
        .route("/api/admin/schedules/toggle", post(toggle_schedule))
        .route("/api/admin/challenges/create", post(create_challenge))
        .route("/api/admin/challenges/update", post(update_challenge))
        .route("/api/admin/challenges/delete", post(delete_challenge))
}

// ─── Helpers ─────────────────────────────────────────────────

fn require_admin(ctx: &RequestContext) -> std::result::Result<&Profile, ActionError> {
    ctx.admin_profile()
        .ok_or_else(|| ActionError::unauthorized("Unauthorized"))
}

/// Hyphenated UUID, any case.
fn is_valid_uuid(raw: &str) -> bool {
    raw.len() == 36 && uuid::Uuid::try_parse(raw).is_ok()
}

fn require_uuid(raw: Option<&str>, message: &str) -> std::result::Result<String, ActionError> {
    match raw {
        Some(id) if is_valid_uuid(id) => Ok(id.to_string()),
        _ => Err(ActionError::bad_request(message)),
    }
}

/// First validation message, taking fields in `order`.
fn first_error(errors: &ValidationErrors, order: &[&str]) -> ActionError {
    let fields = errors.field_errors();
    let message = order
        .iter()
        .filter_map(|name| fields.get(*name))
        .chain(fields.values())
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request.".to_string());
    ActionError::bad_request(message)
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

/// Form checkboxes post the literal string "true".
fn is_true(raw: Option<&str>) -> bool {
    raw == Some("true")
}

/// Parse a date from a form field: RFC 3339, a `datetime-local` value
/// (taken as UTC), or a bare date at midnight UTC.
fn parse_form_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Integer form field. Empty or absent is `None`; garbage is `Some(Err)`.
fn parse_form_int(raw: Option<&str>) -> Option<std::result::Result<i64, ()>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(raw.parse::<i64>().map_err(|_| ()))
}

// ─── Page Data ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub profile: Profile,
    pub memories: Vec<Memory>,
    pub routine_schedules: Vec<RoutineSchedule>,
    pub challenges: Vec<ChallengeSummary>,
}

/// All CMS content, including inactive items. Loading failures yield empty
/// lists.
async fn get_admin(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<AdminResponse>> {
    let Some(profile) = ctx.admin_profile().cloned() else {
        tracing::warn!("Admin page requested without an admin profile");
        return Err(AppError::Unauthorized);
    };

    let loaded = tokio::try_join!(
        state.db.list_memories(false),
        state.db.list_schedules(false),
        state.db.list_challenge_summaries(),
    );
    let (memories, routine_schedules, challenges) = loaded.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Admin load error");
        (Vec::new(), Vec::new(), Vec::new())
    });

    Ok(Json(AdminResponse {
        profile,
        memories,
        routine_schedules,
        challenges,
    }))
}

// ─── Memories ────────────────────────────────────────────────

#[derive(Debug, Validate)]
struct CaptionInput {
    #[validate(length(max = 500, message = "Caption must be 500 characters or less."))]
    caption: String,
}

fn validate_caption(caption: String) -> std::result::Result<String, ActionError> {
    if caption.is_empty() {
        return Err(ActionError::bad_request("Caption is required."));
    }
    let input = CaptionInput { caption };
    input.validate().map_err(|e| first_error(&e, &["caption"]))?;
    Ok(input.caption)
}

struct Upload {
    content_type: String,
    bytes: axum::body::Bytes,
}

/// Create a memory from a multipart upload (`id`, `file`, `caption`).
async fn create_memory(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    mut multipart: Multipart,
) -> ActionResult {
    require_admin(&ctx)?;

    let mut id = None;
    let mut caption = String::new();
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ActionError::payload_too_large("Image must be 5MB or smaller."));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed memory upload");
                return Err(ActionError::bad_request("Please select an image to upload."));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "id" => id = field.text().await.ok(),
            "caption" => caption = field.text().await.unwrap_or_default().trim().to_string(),
            "file" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some(Upload {
                            content_type,
                            bytes,
                        })
                    }
                    Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                        return Err(ActionError::payload_too_large(
                            "Image must be 5MB or smaller.",
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read uploaded file");
                        return Err(ActionError::bad_request("Please select an image to upload."));
                    }
                }
            }
            _ => {}
        }
    }

    let id = require_uuid(id.as_deref(), "Invalid ID.")?;

    let existing = state
        .db
        .get_memory(&id)
        .await
        .map_err(|e| action_failure(e, "create_memory", "Failed to save memory. Please try again."))?;
    if existing.is_some() {
        return Err(ActionError::bad_request("Memory already exists."));
    }

    let Some(upload) = upload.filter(|u| !u.bytes.is_empty()) else {
        return Err(ActionError::bad_request("Please select an image to upload."));
    };
    let Some(extension) = extension_for(&upload.content_type) else {
        return Err(ActionError::bad_request(
            "Invalid file type. Allowed: JPEG, PNG, WebP, GIF.",
        ));
    };
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ActionError::payload_too_large("Image must be 5MB or smaller."));
    }

    let caption = validate_caption(caption)?;

    let file_id = uuid::Uuid::new_v4().to_string();
    let src = state
        .media
        .save_memory_image(&file_id, extension, &upload.bytes)
        .await
        .map_err(|e| {
            action_failure(e, "create_memory", "Failed to upload image. Please try again.")
        })?;

    let now = Utc::now();
    let saved = async {
        let sort_order = state.db.next_memory_sort_order().await?;
        state
            .db
            .insert_memory(&Memory {
                id: id.clone(),
                src: src.clone(),
                caption,
                sort_order,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
    }
    .await;

    if let Err(e) = saved {
        if let Err(cleanup) = state.media.delete_by_url(&src).await {
            tracing::warn!(error = %cleanup, src = %src, "Failed to remove orphaned upload");
        }
        return Err(action_failure(
            e,
            "create_memory",
            "Failed to save memory. Please try again.",
        ));
    }

    tracing::info!(memory_id = %id, "Memory created");
    Ok(ActionSuccess::ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUpdateForm {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    caption: String,
    #[serde(default)]
    sort_order: Option<String>,
    #[serde(default)]
    is_active: Option<String>,
}

async fn update_memory(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<MemoryUpdateForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to update memory. Please try again.";
    require_admin(&ctx)?;

    let id = require_uuid(form.id.as_deref(), "Invalid memory ID.")?;
    let existing = state
        .db
        .get_memory(&id)
        .await
        .map_err(|e| action_failure(e, "update_memory", FAILED))?;
    if existing.is_none() {
        return Err(ActionError::not_found("Memory not found."));
    }

    let caption = validate_caption(form.caption)?;

    let sort_order = match parse_form_int(form.sort_order.as_deref()) {
        Some(Ok(n)) if n >= 0 => n,
        _ => {
            return Err(ActionError::bad_request(
                "Sort order must be a non-negative number.",
            ))
        }
    };

    state
        .db
        .update_memory(
            &id,
            &caption,
            sort_order,
            is_true(form.is_active.as_deref()),
            Utc::now(),
        )
        .await
        .map_err(|e| action_failure(e, "update_memory", FAILED))?;

    Ok(ActionSuccess::ok())
}

#[derive(Debug, Deserialize)]
pub struct IdForm {
    #[serde(default)]
    id: Option<String>,
}

/// Delete a memory and its stored image.
async fn delete_memory(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<IdForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to delete memory. Please try again.";
    require_admin(&ctx)?;

    let id = require_uuid(form.id.as_deref(), "Invalid memory ID.")?;
    let Some(memory) = state
        .db
        .get_memory(&id)
        .await
        .map_err(|e| action_failure(e, "delete_memory", FAILED))?
    else {
        return Err(ActionError::not_found("Memory not found."));
    };

    if let Err(e) = state.media.delete_by_url(&memory.src).await {
        tracing::warn!(error = %e, memory_id = %id, "Failed to remove memory image");
    }

    state
        .db
        .delete_memory(&id)
        .await
        .map_err(|e| action_failure(e, "delete_memory", FAILED))?;

    tracing::info!(memory_id = %id, "Memory deleted");
    Ok(ActionSuccess::ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderForm {
    #[serde(default)]
    ordered_ids: Option<String>,
}

/// Parse the `orderedIds` JSON array.
fn parse_ordered_ids(raw: Option<&str>) -> std::result::Result<Vec<String>, ActionError> {
    let raw = raw
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ActionError::bad_request("Ordered IDs are required."))?;

    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|_| ActionError::bad_request("Invalid ordered IDs format."))?;

    let items = match value {
        serde_json::Value::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(ActionError::bad_request(
                "Ordered IDs must be a non-empty array.",
            ))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::String(id) if is_valid_uuid(&id) => Ok(id),
            _ => Err(ActionError::bad_request("All IDs must be valid UUIDs.")),
        })
        .collect()
}

async fn reorder_memories(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ReorderForm>,
) -> ActionResult {
    require_admin(&ctx)?;

    let ids = parse_ordered_ids(form.ordered_ids.as_deref())?;
    state
        .db
        .reorder_memories(&ids, Utc::now())
        .await
        .map_err(|e| {
            action_failure(e, "reorder_memories", "Failed to reorder memories. Please try again.")
        })?;

    Ok(ActionSuccess::ok())
}

// ─── Routine Schedules ───────────────────────────────────────

const SCHEDULE_ORDER: &[&str] = &["day", "time", "location", "accent_color", "description"];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleForm {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(
        min = 1,
        max = 50,
        message = "Day is required and must be 50 characters or less."
    ))]
    day: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(
        min = 1,
        max = 20,
        message = "Time is required and must be 20 characters or less."
    ))]
    time: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(
        min = 1,
        max = 200,
        message = "Location is required and must be 200 characters or less."
    ))]
    location: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(
        min = 1,
        max = 100,
        message = "Accent color is required and must be 100 characters or less."
    ))]
    accent_color: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(
        min = 1,
        max = 500,
        message = "Description is required and must be 500 characters or less."
    ))]
    description: String,
}

impl ScheduleForm {
    fn to_new_schedule(&self) -> std::result::Result<NewSchedule, ActionError> {
        self.validate().map_err(|e| first_error(&e, SCHEDULE_ORDER))?;
        Ok(NewSchedule {
            day: self.day.clone(),
            time: self.time.clone(),
            location: self.location.clone(),
            accent_color: self.accent_color.clone(),
            description: self.description.clone(),
        })
    }
}

async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ScheduleForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to create schedule. Please try again.";
    require_admin(&ctx)?;

    let id = require_uuid(form.id.as_deref(), "Invalid ID.")?;
    let existing = state
        .db
        .get_schedule(&id)
        .await
        .map_err(|e| action_failure(e, "create_schedule", FAILED))?;
    if existing.is_some() {
        return Err(ActionError::bad_request("Schedule already exists."));
    }

    let schedule = form.to_new_schedule()?;
    state
        .db
        .insert_schedule(&id, &schedule, Utc::now())
        .await
        .map_err(|e| action_failure(e, "create_schedule", FAILED))?;

    tracing::info!(schedule_id = %id, "Routine schedule created");
    Ok(ActionSuccess::ok())
}

async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ScheduleForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to update schedule. Please try again.";
    require_admin(&ctx)?;

    let id = require_uuid(form.id.as_deref(), "Invalid schedule ID.")?;
    let existing = state
        .db
        .get_schedule(&id)
        .await
        .map_err(|e| action_failure(e, "update_schedule", FAILED))?;
    if existing.is_none() {
        return Err(ActionError::not_found("Schedule not found."));
    }

    let schedule = form.to_new_schedule()?;
    state
        .db
        .update_schedule(&id, &schedule, Utc::now())
        .await
        .map_err(|e| action_failure(e, "update_schedule", FAILED))?;

    Ok(ActionSuccess::ok())
}

async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<IdForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to delete schedule. Please try again.";
    require_admin(&ctx)?;

    let id = require_uuid(form.id.as_deref(), "Invalid schedule ID.")?;
    let existing = state
        .db
        .get_schedule(&id)
        .await
        .map_err(|e| action_failure(e, "delete_schedule", FAILED))?;
    if existing.is_none() {
        return Err(ActionError::not_found("Schedule not found."));
    }

    state
        .db
        .delete_schedule(&id)
        .await
        .map_err(|e| action_failure(e, "delete_schedule", FAILED))?;

    Ok(ActionSuccess::ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleForm {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    is_active: Option<String>,
}

/// Set a schedule's visibility to the posted `isActive` value.
async fn toggle_schedule(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ToggleForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to update schedule. Please try again.";
    require_admin(&ctx)?;

    let id = require_uuid(form.id.as_deref(), "Invalid schedule ID.")?;
    let existing = state
        .db
        .get_schedule(&id)
        .await
        .map_err(|e| action_failure(e, "toggle_schedule", FAILED))?;
    if existing.is_none() {
        return Err(ActionError::not_found("Schedule not found."));
    }

    state
        .db
        .set_schedule_active(&id, is_true(form.is_active.as_deref()), Utc::now())
        .await
        .map_err(|e| action_failure(e, "toggle_schedule", FAILED))?;

    Ok(ActionSuccess::ok())
}

// ─── Challenges ──────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeForm {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title is required and must be 200 characters or less."
    ))]
    title: String,
    #[serde(default, deserialize_with = "trimmed")]
    description: String,
    #[serde(default, rename = "type")]
    challenge_type: Option<String>,
    #[serde(default)]
    goal_value: Option<String>,
    #[serde(default)]
    segment_id: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl ChallengeForm {
    /// Validate the form. `existing` supplies values for optional numeric
    /// fields left blank on update.
    fn to_new_challenge(
        &self,
        existing: Option<&crate::models::Challenge>,
    ) -> std::result::Result<NewChallenge, ActionError> {
        self.validate().map_err(|e| first_error(&e, &["title"]))?;

        let challenge_type = self
            .challenge_type
            .as_deref()
            .and_then(ChallengeType::parse)
            .ok_or_else(|| ActionError::bad_request("Invalid challenge type."))?;
        let status = match self.status.as_deref() {
            None => ChallengeStatus::Upcoming,
            Some(raw) => ChallengeStatus::parse(raw)
                .ok_or_else(|| ActionError::bad_request("Invalid challenge status."))?,
        };

        let goal_value = parse_form_int(self.goal_value.as_deref());
        let segment_id = parse_form_int(self.segment_id.as_deref());

        if challenge_type.requires_goal() && !matches!(goal_value, Some(Ok(n)) if n > 0) {
            return Err(ActionError::bad_request(
                "Goal value is required for cumulative and best-effort challenges.",
            ));
        }
        if challenge_type == ChallengeType::SegmentRace && !matches!(segment_id, Some(Ok(_))) {
            return Err(ActionError::bad_request(
                "Segment ID is required for segment race challenges.",
            ));
        }

        let start_date = parse_form_date(self.start_date.as_deref())
            .ok_or_else(|| ActionError::bad_request("Start date is required and must be valid."))?;
        let end_date = parse_form_date(self.end_date.as_deref())
            .ok_or_else(|| ActionError::bad_request("End date is required and must be valid."))?;
        if start_date >= end_date {
            return Err(ActionError::bad_request("End date must be after start date."));
        }

        Ok(NewChallenge {
            title: self.title.clone(),
            description: self.description.clone(),
            challenge_type,
            goal_value: goal_value
                .and_then(|v| v.ok())
                .or_else(|| existing.and_then(|c| c.goal_value)),
            segment_id: segment_id
                .and_then(|v| v.ok())
                .or_else(|| existing.and_then(|c| c.segment_id)),
            start_date,
            end_date,
            status,
            is_active: existing.map_or(true, |c| c.is_active),
        })
    }
}

async fn create_challenge(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ChallengeForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to create challenge. Please try again.";
    require_admin(&ctx)?;

    let id = require_uuid(form.id.as_deref(), "Invalid challenge ID.").inspect_err(|_| {
        tracing::warn!(id = ?form.id, "Invalid challenge ID");
    })?;
    let existing = state
        .db
        .get_challenge(&id)
        .await
        .map_err(|e| action_failure(e, "create_challenge", FAILED))?;
    if existing.is_some() {
        return Err(ActionError::bad_request("Challenge already exists."));
    }

    let challenge = form.to_new_challenge(None)?;
    state
        .db
        .insert_challenge(&id, &challenge, Utc::now())
        .await
        .map_err(|e| action_failure(e, "create_challenge", FAILED))?;

    tracing::info!(
        challenge_id = %id,
        challenge_type = challenge.challenge_type.as_str(),
        "Challenge created"
    );
    Ok(ActionSuccess::ok())
}

async fn update_challenge(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ChallengeForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to update challenge. Please try again.";
    require_admin(&ctx)?;

    let id = require_uuid(form.id.as_deref(), "Invalid challenge ID.")?;
    let Some(existing) = state
        .db
        .get_challenge(&id)
        .await
        .map_err(|e| action_failure(e, "update_challenge", FAILED))?
    else {
        return Err(ActionError::not_found("Challenge not found."));
    };

    let challenge = form.to_new_challenge(Some(&existing))?;
    state
        .db
        .update_challenge(&id, &challenge, Utc::now())
        .await
        .map_err(|e| action_failure(e, "update_challenge", FAILED))?;

    Ok(ActionSuccess::ok())
}

/// Delete a challenge. Participants and contributions go with it.
async fn delete_challenge(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<IdForm>,
) -> ActionResult {
    const FAILED: &str = "Failed to delete challenge. Please try again.";
    require_admin(&ctx)?;

    let id = require_uuid(form.id.as_deref(), "Invalid challenge ID.")?;
    let existing = state
        .db
        .get_challenge(&id)
        .await
        .map_err(|e| action_failure(e, "delete_challenge", FAILED))?;
    if existing.is_none() {
        return Err(ActionError::not_found("Challenge not found."));
    }

    state
        .db
        .delete_challenge(&id)
        .await
        .map_err(|e| action_failure(e, "delete_challenge", FAILED))?;

    tracing::info!(challenge_id = %id, "Challenge deleted");
    Ok(ActionSuccess::ok())
}
