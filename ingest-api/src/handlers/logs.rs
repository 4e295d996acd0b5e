use crate::database::{request_log as db, AsyncDbConnection};
use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::Utc;
use shared_types::ListLogsQuery;

pub async fn list(db_conn: web::Data<AsyncDbConnection>, query: web::Query<ListLogsQuery>) -> ActixResult<HttpResponse> {
    let response = db::list(db_conn.get_ref().clone(), &query)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn get(db_conn: web::Data<AsyncDbConnection>, path: web::Path<String>) -> ActixResult<HttpResponse> {
    let log = db::get(db_conn.get_ref().clone(), &path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    match log {
        Some(l) => Ok(HttpResponse::Ok().json(l)),
        None => Ok(HttpResponse::NotFound().json(shared_types::ErrorResponse {
            error: "request log not found".to_string(),
        })),
    }
}

pub async fn stats(db_conn: web::Data<AsyncDbConnection>) -> ActixResult<HttpResponse> {
    let response = db::stats(db_conn.get_ref().clone(), Utc::now())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(response))
}
