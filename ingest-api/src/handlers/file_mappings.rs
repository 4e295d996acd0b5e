use crate::database::{file_configs, AsyncDbConnection};
use actix_web::{web, HttpResponse, Result as ActixResult};
use shared_types::SaveFileMappingRequest;

/// `POST /v1/config/mapping`: upserts a FileParsingConfig by fingerprint (§6.2).
pub async fn save(
    db_conn: web::Data<AsyncDbConnection>,
    request: web::Json<SaveFileMappingRequest>,
) -> ActixResult<HttpResponse> {
    let saved = file_configs::save(db_conn.get_ref().clone(), request.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(saved))
}
