use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Which invoice collection an operation targets.
///
/// Validated once at the HTTP boundary; everything below works with the
/// enum, never with the raw path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    General,
    Hotel,
}

impl InvoiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceKind::General => "general",
            InvoiceKind::Hotel => "hotel",
        }
    }

    pub fn collection_name(&self) -> &'static str {
        match self {
            InvoiceKind::General => "invoices",
            InvoiceKind::Hotel => "hotel_invoices",
        }
    }

    /// Prefix of the human-facing invoice number for this kind.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            InvoiceKind::General => "INV/TP",
            InvoiceKind::Hotel => "INV/SV",
        }
    }
}

impl std::str::FromStr for InvoiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(InvoiceKind::General),
            "hotel" => Ok(InvoiceKind::Hotel),
            _ => Err(format!("Unknown invoice type: {}", s)),
        }
    }
}

/// Payment status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceStatus {
    Unpaid,
    DepositPaid,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::DepositPaid => "deposit-paid",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Derive the status from cumulative payments against the invoice total.
    ///
    /// Paid once payments cover the total, deposit-paid for any partial
    /// payment, unpaid only when nothing has been paid at all.
    pub fn derive(total_paid: f64, total_amount: f64) -> Self {
        if total_paid >= total_amount {
            InvoiceStatus::Paid
        } else if total_paid > 0.0 {
            InvoiceStatus::DepositPaid
        } else {
            InvoiceStatus::Unpaid
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(InvoiceStatus::Unpaid),
            "deposit-paid" => Ok(InvoiceStatus::DepositPaid),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

/// A single line on an invoice.
///
/// Only `total` matters to this service; everything else the caller sends
/// (descriptions, quantities, unit prices) is carried through opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub total: f64,
    #[serde(flatten)]
    pub extra: mongodb::bson::Document,
}

/// A recorded payment against an invoice. Amounts are always positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub amount: f64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    pub notes: String,
}

/// Invoice document as stored in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub invoice_number: String,
    pub client_name: String,
    pub client_phone: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub invoice_date: DateTime<Utc>,
    pub line_items: Vec<LineItem>,
    pub payments: Vec<Payment>,
    pub status: InvoiceStatus,
    #[serde(rename = "type")]
    pub kind: InvoiceKind,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Sum of line-item totals. Items without a `total` count as zero.
    pub fn total_amount(&self) -> f64 {
        line_items_total(&self.line_items)
    }

    /// Sum of all recorded payment amounts.
    pub fn total_paid(&self) -> f64 {
        payments_total(&self.payments)
    }
}

pub fn line_items_total(items: &[LineItem]) -> f64 {
    items.iter().map(|item| item.total).sum()
}

pub fn payments_total(payments: &[Payment]) -> f64 {
    payments.iter().map(|p| p.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(total: f64) -> LineItem {
        LineItem {
            total,
            extra: mongodb::bson::Document::new(),
        }
    }

    #[test]
    fn derive_status_covers_all_transitions() {
        assert_eq!(InvoiceStatus::derive(0.0, 1_500_000.0), InvoiceStatus::Unpaid);
        assert_eq!(
            InvoiceStatus::derive(500_000.0, 1_500_000.0),
            InvoiceStatus::DepositPaid
        );
        assert_eq!(
            InvoiceStatus::derive(1_500_000.0, 1_500_000.0),
            InvoiceStatus::Paid
        );
        assert_eq!(
            InvoiceStatus::derive(2_000_000.0, 1_500_000.0),
            InvoiceStatus::Paid
        );
    }

    #[test]
    fn line_items_total_treats_missing_total_as_zero() {
        let items: Vec<LineItem> = serde_json::from_str(
            r#"[{"total": 250.5, "description": "room"}, {"description": "no total here"}]"#,
        )
        .unwrap();
        assert_eq!(line_items_total(&items), 250.5);
        assert_eq!(items[1].total, 0.0);
        assert_eq!(items[0].extra.get_str("description").unwrap(), "room");
    }

    #[test]
    fn totals_sum_in_order() {
        let items = vec![item(100.0), item(200.0), item(50.0)];
        assert_eq!(line_items_total(&items), 350.0);
    }

    #[test]
    fn status_wire_format_is_kebab_case() {
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::DepositPaid).unwrap(),
            r#""deposit-paid""#
        );
        assert_eq!(
            serde_json::from_str::<InvoiceStatus>(r#""unpaid""#).unwrap(),
            InvoiceStatus::Unpaid
        );
        assert_eq!("paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert!("cancelled".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn kind_parses_known_selectors_only() {
        assert_eq!("hotel".parse::<InvoiceKind>().unwrap(), InvoiceKind::Hotel);
        assert_eq!(
            "general".parse::<InvoiceKind>().unwrap(),
            InvoiceKind::General
        );
        assert!("retail".parse::<InvoiceKind>().is_err());
        assert_eq!(InvoiceKind::Hotel.number_prefix(), "INV/SV");
        assert_eq!(InvoiceKind::General.number_prefix(), "INV/TP");
    }
}
