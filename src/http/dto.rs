use chrono::{DateTime, SecondsFormat, Utc};
use prost_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::quotation_proto::{
    Coverage, CoverageDetail, CoverageType, Customer, Money, QuoteRequest, QuoteResponse, Vehicle,
};

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequestBody {
    pub request_id: String,
    pub customer: CustomerBody,
    pub vehicle: VehicleBody,
    pub coverages: Vec<CoverageBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerBody {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub years_licensed: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleBody {
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub license_plate: String,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverageBody {
    /// Wire number of the coverage type.
    #[serde(rename = "type")]
    pub kind: i32,
    pub limit: f64,
    pub deductible: f64,
}

impl QuoteRequestBody {
    /// Map onto the RPC request. Coverage types must name a known, non-zero
    /// variant.
    pub fn into_proto(self) -> Result<QuoteRequest, ApiError> {
        let coverages = self
            .coverages
            .into_iter()
            .map(CoverageBody::into_proto)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QuoteRequest {
            request_id: self.request_id,
            customer: Some(Customer {
                customer_id: self.customer.customer_id,
                name: self.customer.name,
                email: self.customer.email,
                age: self.customer.age,
                years_licensed: self.customer.years_licensed,
            }),
            vehicle: Some(Vehicle {
                brand: self.vehicle.brand,
                model: self.vehicle.model,
                year: self.vehicle.year,
                license_plate: self.vehicle.license_plate,
                value: self.vehicle.value,
            }),
            coverages,
        })
    }
}

impl CoverageBody {
    fn into_proto(self) -> Result<Coverage, ApiError> {
        match CoverageType::try_from(self.kind) {
            Ok(CoverageType::Unspecified) | Err(_) => Err(ApiError::BadRequest(format!(
                "unknown coverage type {}",
                self.kind
            ))),
            Ok(kind) => Ok(Coverage {
                r#type: kind as i32,
                limit: self.limit,
                deductible: self.deductible,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyBody {
    pub amount: f64,
    pub currency: String,
}

impl From<Option<Money>> for MoneyBody {
    fn from(money: Option<Money>) -> Self {
        let money = money.unwrap_or_default();
        Self {
            amount: money.amount,
            currency: money.currency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageDetailBody {
    #[serde(rename = "type")]
    pub kind: i32,
    pub premium: MoneyBody,
    pub deductible: f64,
    pub limit: f64,
}

impl From<CoverageDetail> for CoverageDetailBody {
    fn from(detail: CoverageDetail) -> Self {
        Self {
            kind: detail.r#type,
            premium: detail.premium.into(),
            deductible: detail.deductible,
            limit: detail.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponseBody {
    pub quote_id: String,
    pub monthly_premium: MoneyBody,
    pub annual_premium: MoneyBody,
    pub coverage_details: Vec<CoverageDetailBody>,
    /// RFC 3339, UTC.
    pub valid_until: String,
    pub status: String,
}

impl From<QuoteResponse> for QuoteResponseBody {
    fn from(response: QuoteResponse) -> Self {
        Self {
            quote_id: response.quote_id,
            monthly_premium: response.monthly_premium.into(),
            annual_premium: response.annual_premium.into(),
            coverage_details: response
                .coverage_details
                .into_iter()
                .map(CoverageDetailBody::from)
                .collect(),
            valid_until: response
                .valid_until
                .as_ref()
                .map(rfc3339)
                .unwrap_or_default(),
            status: response.status,
        }
    }
}

fn rfc3339(timestamp: &Timestamp) -> String {
    let nanos = u32::try_from(timestamp.nanos).unwrap_or(0);
    DateTime::<Utc>::from_timestamp(timestamp.seconds, nanos)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(coverage_type: i32) -> QuoteRequestBody {
        serde_json::from_value(json!({
            "request_id": "req-7",
            "customer": {
                "customer_id": "c-7",
                "name": "Ana",
                "email": "ana@example.com",
                "age": 30,
                "years_licensed": 5
            },
            "vehicle": { "brand": "Honda", "model": "Civic", "year": 2020, "value": 25000 },
            "coverages": [{ "type": coverage_type, "limit": 50000, "deductible": 500 }]
        }))
        .unwrap()
    }

    #[test]
    fn test_into_proto() {
        let request = body(2).into_proto().unwrap();

        assert_eq!(request.request_id, "req-7");
        let vehicle = request.vehicle.unwrap();
        assert_eq!(vehicle.license_plate, "");
        assert_eq!(vehicle.value, 25_000.0);
        assert_eq!(request.coverages[0].r#type(), CoverageType::Collision);
    }

    #[test]
    fn test_unknown_coverage_type_rejected() {
        assert!(matches!(body(0).into_proto(), Err(ApiError::BadRequest(_))));
        assert!(matches!(body(17).into_proto(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_missing_field_fails_to_deserialize() {
        let result = serde_json::from_value::<QuoteRequestBody>(json!({
            "request_id": "req-8",
            "vehicle": { "brand": "Honda", "model": "Civic", "year": 2020, "value": 1 },
            "coverages": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_body_formats_timestamp() {
        let response = QuoteResponse {
            quote_id: "q-1".to_string(),
            monthly_premium: Some(Money {
                amount: 10.5,
                currency: "USD".to_string(),
            }),
            annual_premium: None,
            coverage_details: vec![],
            valid_until: Some(Timestamp {
                seconds: 1_743_422_400,
                nanos: 0,
            }),
            status: "ACTIVE".to_string(),
        };

        let body = QuoteResponseBody::from(response);
        assert_eq!(body.valid_until, "2025-03-31T12:00:00Z");
        assert_eq!(body.monthly_premium.amount, 10.5);
        assert_eq!(body.annual_premium.currency, "");
    }
}
