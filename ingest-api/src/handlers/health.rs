use crate::database::AsyncDbConnection;
use actix_web::{web, HttpResponse, Result as ActixResult};

pub async fn health(db: web::Data<AsyncDbConnection>) -> ActixResult<HttpResponse> {
    let conn = db.get_ref().lock().await;
    match conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))),
        Err(e) => Ok(HttpResponse::ServiceUnavailable().json(shared_types::ErrorResponse {
            error: format!("database unreachable: {e}"),
        })),
    }
}
