use crate::dtos::{
    AddPaymentRequest, CreateInvoiceRequest, CreateInvoiceResponse, InvoiceListParams,
    InvoiceListResponse, InvoiceResponse, PaymentStatusResponse, SetStatusRequest,
    StatusUpdatedResponse,
};
use crate::models::{invoice::line_items_total, Invoice, InvoiceKind, InvoiceStatus, Payment};
use crate::services::database::is_duplicate_key_error;
use crate::services::numbering::escape_regex;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::FindOptions;
use service_core::error::AppError;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

fn parse_invoice_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid invoice id: {}", id)))
}

fn parse_kind(selector: &str) -> Result<InvoiceKind, AppError> {
    selector
        .parse()
        .map_err(|e: String| AppError::BadRequest(anyhow::anyhow!(e)))
}

async fn list_invoices(
    state: &AppState,
    kind: InvoiceKind,
    params: InvoiceListParams,
) -> Result<Json<InvoiceListResponse>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    // Clamp to at least 1 so totalPages never divides by zero
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .max(1)
        .min(MAX_PAGE_SIZE);
    let skip = (page - 1) * limit;

    let mut filter = doc! {};
    if let Some(search) = params.search.as_deref() {
        if !search.is_empty() {
            filter.insert(
                "clientName",
                doc! { "$regex": escape_regex(search), "$options": "i" },
            );
        }
    }

    let total = state
        .db
        .invoices(kind)
        .count_documents(filter.clone(), None)
        .await
        .map_err(AppError::from)?;

    let find_options = FindOptions::builder()
        .sort(doc! { "invoiceDate": -1 }) // Newest first
        .skip(skip)
        .limit(limit as i64)
        .build();

    let mut cursor = state
        .db
        .invoices(kind)
        .find(filter, find_options)
        .await
        .map_err(AppError::from)?;

    let mut data = Vec::new();
    while let Some(invoice) = cursor.try_next().await.map_err(AppError::from)? {
        data.push(InvoiceResponse::from(invoice));
    }

    let total_pages = (total as f64 / limit as f64).ceil() as u64;

    Ok(Json(InvoiceListResponse {
        data,
        total,
        page,
        limit,
        total_pages,
    }))
}

async fn get_invoice(
    state: &AppState,
    kind: InvoiceKind,
    id: &str,
) -> Result<Json<InvoiceResponse>, AppError> {
    let oid = parse_invoice_id(id)?;

    let invoice = state
        .db
        .invoices(kind)
        .find_one(doc! { "_id": oid }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    Ok(Json(InvoiceResponse::from(invoice)))
}

async fn create_invoice(
    state: &AppState,
    kind: InvoiceKind,
    payload: CreateInvoiceRequest,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let down_payment = payload.down_payment.unwrap_or(0.0);
    let now = Utc::now();

    // Numbering uses wall-clock time, not invoiceDate: a backdated invoice
    // still gets a number in the current month's sequence.
    let invoice_number = state.db.next_invoice_number(kind, now).await?;

    let total_amount = line_items_total(&payload.line_items);

    let (payments, status) = if down_payment > 0.0 {
        let status = if down_payment >= total_amount {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::DepositPaid
        };
        let payment = Payment {
            amount: down_payment,
            date: payload.invoice_date,
            notes: "Down Payment".to_string(),
        };
        (vec![payment], status)
    } else {
        (Vec::new(), InvoiceStatus::Unpaid)
    };

    let invoice = Invoice {
        id: None,
        invoice_number: invoice_number.clone(),
        client_name: payload.client_name,
        client_phone: payload.client_phone,
        invoice_date: payload.invoice_date,
        line_items: payload.line_items,
        payments,
        status,
        kind,
        created_at: now,
    };

    let result = state
        .db
        .invoices(kind)
        .insert_one(&invoice, None)
        .await
        .map_err(|e| {
            if is_duplicate_key_error(&e) {
                // Lost the allocation race; the caller can safely retry
                AppError::Conflict(anyhow::anyhow!(
                    "Duplicate invoice number {}, please retry",
                    invoice_number
                ))
            } else {
                tracing::error!("Failed to insert invoice {}: {}", invoice_number, e);
                AppError::from(e)
            }
        })?;

    let id = result
        .inserted_id
        .as_object_id()
        .map(|oid| oid.to_hex())
        .unwrap_or_default();

    tracing::info!(
        invoice_id = %id,
        invoice_number = %invoice_number,
        kind = kind.as_str(),
        status = status.as_str(),
        "Invoice created"
    );
    metrics::counter!("invoices_created_total", "kind" => kind.as_str()).increment(1);

    Ok((
        StatusCode::CREATED,
        Json(CreateInvoiceResponse {
            id,
            invoice_number,
            status,
        }),
    ))
}

async fn delete_invoice(
    state: &AppState,
    kind: InvoiceKind,
    id: &str,
) -> Result<impl IntoResponse, AppError> {
    let oid = parse_invoice_id(id)?;

    let result = state
        .db
        .invoices(kind)
        .delete_one(doc! { "_id": oid }, None)
        .await
        .map_err(AppError::from)?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
    }

    tracing::info!(invoice_id = %id, kind = kind.as_str(), "Invoice deleted");
    metrics::counter!("invoices_deleted_total", "kind" => kind.as_str()).increment(1);

    Ok(Json(serde_json::json!({ "message": "Invoice deleted" })))
}

pub async fn add_payment(
    State(state): State<AppState>,
    Path((selector, id)): Path<(String, String)>,
    Json(payload): Json<AddPaymentRequest>,
) -> Result<Json<PaymentStatusResponse>, AppError> {
    let kind = parse_kind(&selector)?;
    let oid = parse_invoice_id(&id)?;

    let amount = payload
        .amount
        .filter(|amount| *amount > 0.0)
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Payment amount must be greater than zero"))
        })?;

    let invoice = state
        .db
        .invoices(kind)
        .find_one(doc! { "_id": oid }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    let payment = Payment {
        amount,
        date: payload.date.unwrap_or_else(Utc::now),
        notes: payload.notes.unwrap_or_else(|| "Payment".to_string()),
    };

    let total_amount = invoice.total_amount();
    let total_paid = invoice.total_paid() + amount;
    let status = InvoiceStatus::derive(total_paid, total_amount);

    let payment_bson = mongodb::bson::to_bson(&payment)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to serialize payment: {}", e)))?;

    // Append and status change go out as one update, so a half-applied
    // payment is not observable.
    let result = state
        .db
        .invoices(kind)
        .update_one(
            doc! { "_id": oid },
            doc! {
                "$push": { "payments": payment_bson },
                "$set": { "status": status.as_str() },
            },
            None,
        )
        .await
        .map_err(AppError::from)?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
    }

    tracing::info!(
        invoice_id = %id,
        kind = kind.as_str(),
        amount = amount,
        status = status.as_str(),
        "Payment recorded"
    );
    metrics::counter!("invoice_payments_total", "kind" => kind.as_str()).increment(1);

    Ok(Json(PaymentStatusResponse { status }))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path((selector, id)): Path<(String, String)>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<StatusUpdatedResponse>, AppError> {
    let kind = parse_kind(&selector)?;
    let oid = parse_invoice_id(&id)?;

    let status: InvoiceStatus = payload
        .status
        .parse()
        .map_err(|e: String| AppError::BadRequest(anyhow::anyhow!(e)))?;

    // Manual override: no consistency check against payment totals
    let result = state
        .db
        .invoices(kind)
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "status": status.as_str() } },
            None,
        )
        .await
        .map_err(AppError::from)?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
    }

    tracing::info!(
        invoice_id = %id,
        kind = kind.as_str(),
        status = status.as_str(),
        "Invoice status overridden"
    );

    Ok(Json(StatusUpdatedResponse { status }))
}

// Per-kind route entry points. The general and hotel collections share one
// lifecycle, so each pair funnels into the same implementation.

pub async fn list_general_invoices(
    State(state): State<AppState>,
    Query(params): Query<InvoiceListParams>,
) -> Result<impl IntoResponse, AppError> {
    list_invoices(&state, InvoiceKind::General, params).await
}

pub async fn list_hotel_invoices(
    State(state): State<AppState>,
    Query(params): Query<InvoiceListParams>,
) -> Result<impl IntoResponse, AppError> {
    list_invoices(&state, InvoiceKind::Hotel, params).await
}

pub async fn get_general_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    get_invoice(&state, InvoiceKind::General, &id).await
}

pub async fn get_hotel_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    get_invoice(&state, InvoiceKind::Hotel, &id).await
}

pub async fn create_general_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    create_invoice(&state, InvoiceKind::General, payload).await
}

pub async fn create_hotel_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    create_invoice(&state, InvoiceKind::Hotel, payload).await
}

pub async fn delete_general_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    delete_invoice(&state, InvoiceKind::General, &id).await
}

pub async fn delete_hotel_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    delete_invoice(&state, InvoiceKind::Hotel, &id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_id_must_be_a_valid_object_id() {
        assert!(parse_invoice_id("not-an-object-id").is_err());
        assert!(parse_invoice_id("652f1a2b3c4d5e6f70818283").is_ok());
    }
}
