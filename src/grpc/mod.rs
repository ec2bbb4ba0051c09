pub mod server;

pub use crate::quotation_proto::quotation_service_client::QuotationServiceClient;
pub use crate::sayhi_proto::say_hi_service_client::SayHiServiceClient;
pub use server::{serve_quotation, serve_sayhi, start_quotation_server};
