use chrono::{DateTime, Duration, Utc};
use prost_types::Timestamp;
use tonic::{Request, Response, Status};
use tracing::{info, info_span};
use uuid::Uuid;

use crate::quotation::premium::PremiumCalculator;
use crate::quotation_proto::quotation_service_server::{QuotationService, QuotationServiceServer};
use crate::quotation_proto::{CoverageDetail, CoverageType, Money, QuoteRequest, QuoteResponse};

pub const CURRENCY: &str = "USD";
pub const QUOTE_STATUS_ACTIVE: &str = "ACTIVE";

/// How long a quote stays valid after it is issued.
pub const QUOTE_VALIDITY_DAYS: i64 = 30;

/// Unary quote creation. Without a pinned calculator the current year is read
/// per call.
#[derive(Debug, Clone, Default)]
pub struct QuotationServiceImpl {
    calculator: Option<PremiumCalculator>,
}

impl QuotationServiceImpl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calculator(calculator: PremiumCalculator) -> Self {
        Self {
            calculator: Some(calculator),
        }
    }

    pub fn into_server(self) -> QuotationServiceServer<Self> {
        QuotationServiceServer::new(self)
    }

    /// Price a request and build the response as of `now`.
    pub fn quote(&self, request: &QuoteRequest, now: DateTime<Utc>) -> Result<QuoteResponse, Status> {
        let customer = request
            .customer
            .as_ref()
            .ok_or_else(|| Status::invalid_argument("customer is required"))?;
        let vehicle = request
            .vehicle
            .as_ref()
            .ok_or_else(|| Status::invalid_argument("vehicle is required"))?;

        for coverage in &request.coverages {
            match CoverageType::try_from(coverage.r#type) {
                Ok(CoverageType::Unspecified) | Err(_) => {
                    return Err(Status::invalid_argument(format!(
                        "unknown coverage type {}",
                        coverage.r#type
                    )));
                }
                Ok(_) => {}
            }
        }

        let calculator = self
            .calculator
            .unwrap_or_else(PremiumCalculator::for_current_year);
        let breakdown = calculator.calculate(customer, vehicle, &request.coverages);

        let coverage_details = request
            .coverages
            .iter()
            .zip(&breakdown.per_coverage)
            .map(|(coverage, &premium)| CoverageDetail {
                r#type: coverage.r#type,
                premium: Some(usd(premium)),
                deductible: coverage.deductible,
                limit: coverage.limit,
            })
            .collect();

        Ok(QuoteResponse {
            quote_id: Uuid::new_v4().to_string(),
            monthly_premium: Some(usd(breakdown.monthly)),
            annual_premium: Some(usd(breakdown.annual)),
            coverage_details,
            valid_until: Some(timestamp(now + Duration::days(QUOTE_VALIDITY_DAYS))),
            status: QUOTE_STATUS_ACTIVE.to_string(),
        })
    }
}

#[tonic::async_trait]
impl QuotationService for QuotationServiceImpl {
    async fn create_quote(
        &self,
        request: Request<QuoteRequest>,
    ) -> Result<Response<QuoteResponse>, Status> {
        let request = request.into_inner();
        info_span!("create_quote", request_id = %request.request_id).in_scope(|| {
            let response = self.quote(&request, Utc::now())?;
            info!(
                quote_id = %response.quote_id,
                coverages = response.coverage_details.len(),
                monthly = response.monthly_premium.as_ref().map_or(0.0, |m| m.amount),
                "Quote created"
            );
            Ok(Response::new(response))
        })
    }
}

fn usd(amount: f64) -> Money {
    Money {
        amount,
        currency: CURRENCY.to_string(),
    }
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}
