pub mod invoice;

pub use invoice::{Invoice, InvoiceKind, InvoiceStatus, LineItem, Payment};
