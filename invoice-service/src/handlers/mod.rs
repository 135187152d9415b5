pub mod health;
pub mod invoices;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use invoices::{
    add_payment, create_general_invoice, create_hotel_invoice, delete_general_invoice,
    delete_hotel_invoice, get_general_invoice, get_hotel_invoice, list_general_invoices,
    list_hotel_invoices, set_status,
};
