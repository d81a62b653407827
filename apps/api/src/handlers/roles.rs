use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use pillow_core::{AppError, Principal};
use pillow_domain::{AuditActionName, AuditDetails, RoleChange, RoleId};
use serde_json::json;
use uuid::Uuid;

use crate::dto::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};
use crate::error::ApiResult;
use crate::middleware::AuditHint;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .list_roles()
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state.role_service.get_role(parse_role_id(&role_id)?).await?;
    Ok(Json(RoleResponse::from(role)))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, AuditHint, Json<RoleResponse>)> {
    let role = RoleResponse::from(state.role_service.create_role(payload.into()).await?);
    let hint = role_change_hint(RoleChange::Created, &principal, None, Some(&role));

    Ok((StatusCode::CREATED, hint, Json(role)))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<(AuditHint, Json<RoleResponse>)> {
    let change = state
        .role_service
        .update_role(parse_role_id(&role_id)?, payload.into())
        .await?;
    let before = RoleResponse::from(change.before);
    let after = RoleResponse::from(change.after);
    let hint = role_change_hint(RoleChange::Updated, &principal, Some(&before), Some(&after));

    Ok((hint, Json(after)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<String>,
) -> ApiResult<(StatusCode, AuditHint, ())> {
    let deleted = RoleResponse::from(
        state
            .role_service
            .delete_role(parse_role_id(&role_id)?)
            .await?,
    );
    let hint = role_change_hint(RoleChange::Deleted, &principal, Some(&deleted), None);

    Ok((StatusCode::NO_CONTENT, hint, ()))
}

fn parse_role_id(raw: &str) -> Result<RoleId, AppError> {
    Uuid::parse_str(raw.trim())
        .map(RoleId::from_uuid)
        .map_err(|_| AppError::Validation(format!("invalid role id '{raw}'")))
}

fn role_change_hint(
    change: RoleChange,
    principal: &Principal,
    before: Option<&RoleResponse>,
    after: Option<&RoleResponse>,
) -> AuditHint {
    let snapshot = |role: &RoleResponse| serde_json::to_value(role).ok();

    AuditHint::new(AuditActionName::from(change)).with_details(AuditDetails::Change {
        before: before.and_then(snapshot),
        after: after.and_then(snapshot),
        context: Some(json!({
            "performed_by": principal.username(),
            "role_id": after.or(before).map(|role| role.id.as_str()),
        })),
    })
}
