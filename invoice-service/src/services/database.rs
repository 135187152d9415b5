use crate::models::{Invoice, InvoiceKind};
use crate::services::numbering;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{FindOneOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    /// Create indexes on both invoice collections.
    ///
    /// The unique index on `invoiceNumber` is load-bearing: number
    /// allocation is read-then-write with no reservation, so concurrent
    /// creates in the same prefix/month can pick the same sequence. The
    /// index turns that race into a duplicate-key error the handler maps
    /// to 409 for retry.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for invoice-service");

        for kind in [InvoiceKind::General, InvoiceKind::Hotel] {
            let collection = self.invoices(kind);

            let number_index = IndexModel::builder()
                .keys(doc! { "invoiceNumber": 1 })
                .options(
                    IndexOptions::builder()
                        .name("invoice_number_unique".to_string())
                        .unique(true)
                        .build(),
                )
                .build();

            collection.create_index(number_index, None).await.map_err(|e| {
                tracing::error!(
                    "Failed to create invoiceNumber index on {}: {}",
                    kind.collection_name(),
                    e
                );
                AppError::from(e)
            })?;

            // Listing always sorts by invoiceDate descending
            let date_index = IndexModel::builder()
                .keys(doc! { "invoiceDate": -1 })
                .options(
                    IndexOptions::builder()
                        .name("invoice_date_sort".to_string())
                        .build(),
                )
                .build();

            collection.create_index(date_index, None).await.map_err(|e| {
                tracing::error!(
                    "Failed to create invoiceDate index on {}: {}",
                    kind.collection_name(),
                    e
                );
                AppError::from(e)
            })?;

            tracing::info!(collection = kind.collection_name(), "Created invoice indexes");
        }

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn invoices(&self, kind: InvoiceKind) -> Collection<Invoice> {
        self.db.collection(kind.collection_name())
    }

    /// Allocate the next invoice number for `kind` in the month of `now`.
    ///
    /// Finds the highest number already allocated in the prefix/year/month
    /// scope (descending sort on the zero-padded number) and increments its
    /// suffix, starting at 1 for an empty scope. Not atomic; see
    /// `initialize_indexes`.
    pub async fn next_invoice_number(
        &self,
        kind: InvoiceKind,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let prefix = kind.number_prefix();
        let pattern = numbering::month_scope_pattern(prefix, now);

        let options = FindOneOptions::builder()
            .sort(doc! { "invoiceNumber": -1 })
            .build();

        let latest = self
            .invoices(kind)
            .find_one(doc! { "invoiceNumber": { "$regex": &pattern } }, options)
            .await
            .map_err(AppError::from)?;

        let sequence = numbering::next_sequence(
            latest.as_ref().map(|invoice| invoice.invoice_number.as_str()),
        );

        Ok(numbering::format_invoice_number(prefix, now, sequence))
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// True when the error is a unique-index violation (duplicate key).
pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}
