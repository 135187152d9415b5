pub mod invoices;

pub use invoices::{
    AddPaymentRequest, CreateInvoiceRequest, CreateInvoiceResponse, InvoiceListParams,
    InvoiceListResponse, InvoiceResponse, PaymentResponse, PaymentStatusResponse,
    SetStatusRequest, StatusUpdatedResponse,
};
