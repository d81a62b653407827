use axum::Json;
use axum::extract::{Path, Query, State};
use pillow_application::AuditLogQuery;
use pillow_core::AppError;
use pillow_domain::AuditEventId;
use serde::Deserialize;
use uuid::Uuid;

use crate::dto::{AuditLogEntryResponse, AuditLogListResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Raw paging parameters; unparsable values fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl From<AuditLogListParams> for AuditLogQuery {
    fn from(value: AuditLogListParams) -> Self {
        let parse = |raw: Option<String>| raw.and_then(|raw| raw.trim().parse::<i64>().ok());
        AuditLogQuery::new(parse(value.page), parse(value.limit))
    }
}

pub async fn list_audit_logs_handler(
    State(state): State<AppState>,
    Query(params): Query<AuditLogListParams>,
) -> ApiResult<Json<AuditLogListResponse>> {
    let page = state
        .audit_log_service
        .list_audit_log(AuditLogQuery::from(params))
        .await?;

    Ok(Json(AuditLogListResponse::from(page)))
}

pub async fn get_audit_log_handler(
    State(state): State<AppState>,
    Path(audit_log_id): Path<String>,
) -> ApiResult<Json<AuditLogEntryResponse>> {
    let id = Uuid::parse_str(audit_log_id.trim())
        .map(AuditEventId::from_uuid)
        .map_err(|_| AppError::Validation(format!("invalid audit log id '{audit_log_id}'")))?;

    let record = state.audit_log_service.get_audit_log(id).await?;
    Ok(Json(AuditLogEntryResponse::from(record)))
}

#[cfg(test)]
mod tests {
    use pillow_application::AuditLogQuery;

    use super::AuditLogListParams;

    #[test]
    fn unparsable_paging_values_use_defaults() {
        let params = AuditLogListParams {
            page: Some("two".to_owned()),
            limit: Some("-5".to_owned()),
        };

        assert_eq!(
            AuditLogQuery::from(params),
            AuditLogQuery { page: 1, limit: 50 }
        );
    }

    #[test]
    fn valid_paging_values_are_kept() {
        let params = AuditLogListParams {
            page: Some("3".to_owned()),
            limit: Some(" 25 ".to_owned()),
        };

        assert_eq!(
            AuditLogQuery::from(params),
            AuditLogQuery { page: 3, limit: 25 }
        );
    }
}
