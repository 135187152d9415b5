use crate::models::{Invoice, InvoiceStatus, LineItem, Payment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "clientName must not be empty"))]
    pub client_name: String,
    #[serde(default)]
    pub client_phone: String,
    pub invoice_date: DateTime<Utc>,
    pub line_items: Vec<LineItem>,
    #[validate(range(min = 0.0, message = "downPayment must not be negative"))]
    pub down_payment: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize)]
pub struct AddPaymentRequest {
    // Option so an absent amount surfaces as a 400, not a decode error
    pub amount: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdatedResponse {
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceListParams {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListResponse {
    pub data: Vec<InvoiceResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub amount: f64,
    pub date: String,
    pub notes: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            amount: payment.amount,
            date: payment.date.to_rfc3339(),
            notes: payment.notes,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    pub client_name: String,
    pub client_phone: String,
    pub invoice_date: String,
    pub line_items: Vec<LineItem>,
    pub payments: Vec<PaymentResponse>,
    pub status: InvoiceStatus,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice
                .id
                .map(|oid| oid.to_hex())
                .unwrap_or_default(),
            invoice_number: invoice.invoice_number,
            client_name: invoice.client_name,
            client_phone: invoice.client_phone,
            invoice_date: invoice.invoice_date.to_rfc3339(),
            line_items: invoice.line_items,
            payments: invoice.payments.into_iter().map(PaymentResponse::from).collect(),
            status: invoice.status,
            kind: invoice.kind.as_str().to_string(),
            created_at: invoice.created_at.to_rfc3339(),
        }
    }
}
