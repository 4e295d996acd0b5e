use crate::database::{patterns as db, AsyncDbConnection};
use actix_web::{web, HttpResponse, Result as ActixResult};
use extractors::pattern_engine::{evaluate_pattern, TransactionPattern, FIELD_AMOUNT};
use regex::Regex;
use shared_types::{
    CreatePatternRuleRequest, ListPatternsQuery, TestPatternRequest, TestPatternResponse, TransactionType,
    UpdatePatternRuleRequest,
};
use std::collections::HashMap;

pub async fn list(db_conn: web::Data<AsyncDbConnection>, query: web::Query<ListPatternsQuery>) -> ActixResult<HttpResponse> {
    let rows = db::list(db_conn.get_ref().clone(), &query)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn get(db_conn: web::Data<AsyncDbConnection>, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    let row = db::get(db_conn.get_ref().clone(), path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    match row {
        Some(p) => Ok(HttpResponse::Ok().json(p)),
        None => Ok(HttpResponse::NotFound().json(shared_types::ErrorResponse { error: "pattern not found".to_string() })),
    }
}

pub async fn create(
    db_conn: web::Data<AsyncDbConnection>,
    request: web::Json<CreatePatternRuleRequest>,
) -> ActixResult<HttpResponse> {
    let created = db::insert(db_conn.get_ref().clone(), request.into_inner(), false)
        .await
        .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn update(
    db_conn: web::Data<AsyncDbConnection>,
    path: web::Path<i64>,
    request: web::Json<UpdatePatternRuleRequest>,
) -> ActixResult<HttpResponse> {
    let updated = db::update(db_conn.get_ref().clone(), path.into_inner(), request.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?;
    match updated {
        Some(p) => Ok(HttpResponse::Ok().json(p)),
        None => Ok(HttpResponse::NotFound().json(shared_types::ErrorResponse { error: "pattern not found".to_string() })),
    }
}

/// Soft-delete (§3 Lifecycles: PatternRule is never hard-deleted).
pub async fn deactivate(db_conn: web::Data<AsyncDbConnection>, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    let found = db::set_active(db_conn.get_ref().clone(), path.into_inner(), false)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if found {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::NotFound().json(shared_types::ErrorResponse { error: "pattern not found".to_string() }))
    }
}

/// Static bank set merged with whatever sources active `PatternRule`s have
/// actually been persisted under (§6.2: "static or persisted"), so a bank
/// added only via a learned/operator pattern still shows up here.
pub async fn banks(db_conn: web::Data<AsyncDbConnection>) -> ActixResult<HttpResponse> {
    let static_banks = ["HDFC", "ICICI", "SBI", "Axis", "Kotak", "Generic"];
    let mut banks: Vec<String> = static_banks.iter().map(|s| s.to_string()).collect();

    let active_sources = db::distinct_active_sources(db_conn.get_ref().clone())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    for source in active_sources {
        let name = source.as_str().to_string();
        if !banks.iter().any(|b| b.eq_ignore_ascii_case(&name)) {
            banks.push(name);
        }
    }

    Ok(HttpResponse::Ok().json(banks))
}

/// `/v1/patterns/test`: evaluates a regex+mapping against supplied text
/// without persisting anything (§6.2).
pub async fn test(request: web::Json<TestPatternRequest>) -> ActixResult<HttpResponse> {
    let req = request.into_inner();

    let regex = match Regex::new(&req.regex) {
        Ok(r) => r,
        Err(e) => {
            return Ok(HttpResponse::Ok().json(TestPatternResponse {
                matched: false,
                extracted: HashMap::new(),
                errors: vec![format!("regex did not compile: {e}")],
            }))
        }
    };

    if let Err(e) = extractors::pattern_engine::validate_field_mapping(&regex, &req.field_mapping) {
        return Ok(HttpResponse::Ok().json(TestPatternResponse {
            matched: false,
            extracted: HashMap::new(),
            errors: vec![e],
        }));
    }

    if req.field_mapping.get(FIELD_AMOUNT).is_none() {
        return Ok(HttpResponse::Ok().json(TestPatternResponse {
            matched: false,
            extracted: HashMap::new(),
            errors: vec!["field_mapping must include 'amount'".to_string()],
        }));
    }

    let field_map: HashMap<&'static str, usize> = req
        .field_mapping
        .iter()
        .filter_map(|(k, v)| {
            let key: &'static str = match k.as_str() {
                "amount" => extractors::pattern_engine::FIELD_AMOUNT,
                "date" => extractors::pattern_engine::FIELD_DATE,
                "mask" => extractors::pattern_engine::FIELD_MASK,
                "recipient" => extractors::pattern_engine::FIELD_RECIPIENT,
                "ref_id" => extractors::pattern_engine::FIELD_REF_ID,
                "balance" => extractors::pattern_engine::FIELD_BALANCE,
                "type" => extractors::pattern_engine::FIELD_TYPE,
                "credit_limit" => extractors::pattern_engine::FIELD_CREDIT_LIMIT,
                _ => return None,
            };
            Some((key, *v))
        })
        .collect();

    let pattern = TransactionPattern {
        regex,
        confidence: 0.7,
        txn_type: TransactionType::Debit,
        field_map,
    };

    let now = chrono::Utc::now();
    match evaluate_pattern(&pattern, &req.test_text, &req.test_text, None, now) {
        Some(transaction) => {
            let mut extracted = HashMap::new();
            extracted.insert("amount".to_string(), transaction.amount.to_string());
            extracted.insert("recipient".to_string(), transaction.recipient.clone());
            extracted.insert("ref_id".to_string(), transaction.ref_id.clone());
            if let Some(mask) = &transaction.account.mask {
                extracted.insert("mask".to_string(), mask.clone());
            }
            Ok(HttpResponse::Ok().json(TestPatternResponse {
                matched: true,
                extracted,
                errors: Vec::new(),
            }))
        }
        None => Ok(HttpResponse::Ok().json(TestPatternResponse {
            matched: false,
            extracted: HashMap::new(),
            errors: vec!["regex compiled but did not match (or amount group was empty/zero)".to_string()],
        })),
    }
}
