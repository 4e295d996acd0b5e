use crate::database::{ai_config as db, AsyncDbConnection};
use actix_web::{web, HttpResponse, Result as ActixResult};
use shared_types::{mask_api_key_suffix, AIConfigView, UpdateAIConfigRequest};

/// `GET /v1/config/ai`: the stored key is never echoed back, only its last-4 suffix.
pub async fn get(db_conn: web::Data<AsyncDbConnection>) -> ActixResult<HttpResponse> {
    let config = db::get(db_conn.get_ref().clone())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AIConfigView {
        provider: config.provider,
        model_name: config.model_name,
        is_enabled: config.is_enabled,
        masked_api_key: config.api_key.as_deref().map(mask_api_key_suffix),
    }))
}

pub async fn update(
    db_conn: web::Data<AsyncDbConnection>,
    request: web::Json<UpdateAIConfigRequest>,
) -> ActixResult<HttpResponse> {
    let updated = db::update(db_conn.get_ref().clone(), request.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AIConfigView {
        provider: updated.provider,
        model_name: updated.model_name,
        is_enabled: updated.is_enabled,
        masked_api_key: updated.api_key.as_deref().map(mask_api_key_suffix),
    }))
}
