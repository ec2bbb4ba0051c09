//! Quote creation: the premium calculator and the unary RPC around it.

pub mod premium;
pub mod service;

pub use premium::{PremiumBreakdown, PremiumCalculator, round2};
pub use service::QuotationServiceImpl;
