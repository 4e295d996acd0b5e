use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use extractors::bank_parsers::ParserRegistry;
use extractors::{cas_parser, file_parser};
use crate::database::{file_configs, AsyncDbConnection};
use crate::pipeline;
use futures::StreamExt;
use serde::Deserialize;
use shared_types::{IngestionResult, ParsedItem, ParsedItemMetadata, ParsedItemStatus, SaveFileMappingRequest, Source};

#[derive(Debug, Deserialize)]
pub struct IngestSmsRequest {
    pub sender: String,
    pub body: String,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

pub async fn ingest_sms(
    db: web::Data<AsyncDbConnection>,
    registry: web::Data<ParserRegistry>,
    request: web::Json<IngestSmsRequest>,
) -> ActixResult<HttpResponse> {
    let now = Utc::now();
    let result = pipeline::ingest_message(
        db.get_ref().clone(),
        Source::Sms,
        &request.sender,
        &request.body,
        request.received_at,
        now,
        registry.get_ref(),
    )
    .await
    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(result))
}

#[derive(Debug, Deserialize)]
pub struct IngestEmailRequest {
    pub subject: String,
    pub body_text: String,
    pub sender: String,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

pub async fn ingest_email(
    db: web::Data<AsyncDbConnection>,
    registry: web::Data<ParserRegistry>,
    request: web::Json<IngestEmailRequest>,
) -> ActixResult<HttpResponse> {
    let now = Utc::now();
    let content = format!("{}\n{}", request.subject, request.body_text);
    let result = pipeline::ingest_message(
        db.get_ref().clone(),
        Source::Email,
        &request.sender,
        &content,
        request.received_at,
        now,
        registry.get_ref(),
    )
    .await
    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(result))
}

struct MultipartFile {
    filename: String,
    bytes: Vec<u8>,
    fields: std::collections::HashMap<String, String>,
}

async fn collect_multipart(mut payload: Multipart) -> ActixResult<MultipartFile> {
    let mut filename = String::new();
    let mut bytes = Vec::new();
    let mut fields = std::collections::HashMap::new();

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(actix_web::error::ErrorBadRequest)?;
        let content_disposition = field.content_disposition().cloned();
        let name = content_disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or("")
            .to_string();

        if name == "file" {
            filename = content_disposition
                .as_ref()
                .and_then(|cd| cd.get_filename())
                .unwrap_or("upload")
                .to_string();
            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(actix_web::error::ErrorBadRequest)?;
                data.extend_from_slice(&chunk);
            }
            bytes = data;
        } else {
            let mut value = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(actix_web::error::ErrorBadRequest)?;
                value.extend_from_slice(&chunk);
            }
            fields.insert(name, String::from_utf8_lossy(&value).to_string());
        }
    }

    Ok(MultipartFile { filename, bytes, fields })
}

/// `POST /v1/ingest/file`: multipart `file`, optional `account_fingerprint`,
/// `mapping_override` (JSON), `header_row_index`, `password` (§6.1). When no
/// remembered mapping exists for the fingerprint, returns `analysis_required`
/// with the detected header row and a preview instead of parsing blind.
pub async fn ingest_file(
    db: web::Data<AsyncDbConnection>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let upload = collect_multipart(payload).await?;
    let now = Utc::now();

    let fingerprint = upload
        .fields
        .get("account_fingerprint")
        .cloned()
        .unwrap_or_else(|| upload.filename.clone());

    let config = if let Some(mapping_json) = upload.fields.get("mapping_override") {
        let save_request: SaveFileMappingRequest = serde_json::from_str(mapping_json)
            .map_err(|e| actix_web::error::ErrorBadRequest(format!("invalid mapping_override: {e}")))?;
        Some(
            file_configs::save(db.get_ref().clone(), save_request)
                .await
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?,
        )
    } else {
        file_configs::get(db.get_ref().clone(), &fingerprint)
            .await
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
    };

    let config = match config {
        Some(c) => c,
        None => {
            let analysis = file_parser::analyze(&upload.bytes, &upload.filename)
                .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?;
            return Ok(HttpResponse::Ok().json(IngestionResult::analysis_required(
                analysis,
                vec![format!("no remembered column mapping for fingerprint '{fingerprint}'")],
            )));
        }
    };

    let transactions = file_parser::parse(&upload.bytes, &upload.filename, &config, None, now)
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let results = transactions
        .into_iter()
        .map(|transaction| ParsedItem {
            status: ParsedItemStatus::Extracted,
            metadata: ParsedItemMetadata {
                parser_used: "FileParser".to_string(),
                source_original: upload.filename.clone(),
                confidence: transaction.confidence,
            },
            transaction,
        })
        .collect();

    Ok(HttpResponse::Ok().json(IngestionResult::success(results, Vec::new())))
}

/// `POST /v1/ingest/cas`: multipart `file`, `password` (§6.1). Layer-2 dedup
/// is skipped for bulk CAS imports (§4.10 — "typically skipped for bulk
/// imports").
pub async fn ingest_cas(payload: Multipart) -> ActixResult<HttpResponse> {
    let upload = collect_multipart(payload).await?;
    let password = upload.fields.get("password").map(|s| s.as_str());

    let rows = cas_parser::parse_pdf(&upload.bytes, password)
        .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?;

    let results = rows
        .into_iter()
        .map(|row| {
            let txn_type = match row.txn_type {
                cas_parser::CasTransactionType::Buy => shared_types::TransactionType::Debit,
                cas_parser::CasTransactionType::Sell => shared_types::TransactionType::Credit,
            };
            let transaction = shared_types::Transaction {
                amount: row.amount,
                txn_type,
                date: row.date,
                currency: "INR".to_string(),
                account: shared_types::Account {
                    mask: Some(row.folio_number.clone()),
                    provider: row.isin.clone(),
                },
                merchant: shared_types::Merchant {
                    raw: row.scheme_name.clone(),
                    cleaned: row.scheme_name.clone(),
                },
                description: row.scheme_name.clone(),
                recipient: row.scheme_name.clone(),
                ref_id: String::new(),
                balance: None,
                credit_limit: None,
                category: Some("Mutual Fund".to_string()),
                raw_message: row.raw_line.clone(),
                confidence: 0.95,
            };
            ParsedItem {
                status: ParsedItemStatus::Extracted,
                metadata: ParsedItemMetadata {
                    parser_used: "CasParser".to_string(),
                    source_original: row.raw_line,
                    confidence: 0.95,
                },
                transaction,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(IngestionResult::success(results, Vec::new())))
}
