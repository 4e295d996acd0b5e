use crate::database::{aliases as db, AsyncDbConnection};
use actix_web::{web, HttpResponse, Result as ActixResult};
use shared_types::CreateAliasRequest;

pub async fn list(db_conn: web::Data<AsyncDbConnection>) -> ActixResult<HttpResponse> {
    let rows = db::list(db_conn.get_ref().clone())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn create(
    db_conn: web::Data<AsyncDbConnection>,
    request: web::Json<CreateAliasRequest>,
) -> ActixResult<HttpResponse> {
    let created = db::insert(db_conn.get_ref().clone(), request.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn delete(db_conn: web::Data<AsyncDbConnection>, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    let found = db::delete(db_conn.get_ref().clone(), path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if found {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::NotFound().json(shared_types::ErrorResponse {
            error: "alias not found".to_string(),
        }))
    }
}
