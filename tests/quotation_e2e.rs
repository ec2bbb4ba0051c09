use sayhi_grpc::grpc::{self, QuotationServiceClient};
use sayhi_grpc::quotation::{PremiumCalculator, QuotationServiceImpl};
use sayhi_grpc::quotation_proto::{Coverage, CoverageType, Customer, QuoteRequest, Vehicle};
use tokio::net::TcpListener;

async fn client() -> QuotationServiceClient<tonic::transport::Channel> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let service = QuotationServiceImpl::with_calculator(PremiumCalculator::new(2025));
    tokio::spawn(grpc::serve_quotation(listener, service));

    QuotationServiceClient::connect(format!("http://{addr}"))
        .await
        .unwrap()
}

fn request() -> QuoteRequest {
    QuoteRequest {
        request_id: "req-e2e".to_string(),
        customer: Some(Customer {
            customer_id: "c-9".to_string(),
            name: "Bea".to_string(),
            email: "bea@example.com".to_string(),
            age: 40,
            years_licensed: 15,
        }),
        vehicle: Some(Vehicle {
            brand: "Ford".to_string(),
            model: "Focus".to_string(),
            year: 2020,
            license_plate: "XYZ-987".to_string(),
            value: 20_000.0,
        }),
        coverages: vec![
            Coverage {
                r#type: CoverageType::Liability as i32,
                limit: 100_000.0,
                deductible: 500.0,
            },
            Coverage {
                r#type: CoverageType::Collision as i32,
                limit: 50_000.0,
                deductible: 1000.0,
            },
            Coverage {
                r#type: CoverageType::Comprehensive as i32,
                limit: 50_000.0,
                deductible: 500.0,
            },
        ],
    }
}

#[tokio::test]
async fn test_create_quote_over_grpc() {
    let mut client = client().await;

    let response = client.create_quote(request()).await.unwrap().into_inner();

    assert_eq!(response.status, "ACTIVE");
    assert_eq!(response.monthly_premium.unwrap().amount, 158.99);
    assert_eq!(response.annual_premium.unwrap().amount, 1907.88);

    let premiums: Vec<f64> = response
        .coverage_details
        .iter()
        .map(|d| d.premium.as_ref().unwrap().amount)
        .collect();
    assert_eq!(premiums, vec![75.74, 46.8, 36.45]);
    assert!(response.valid_until.is_some());
}

#[tokio::test]
async fn test_missing_vehicle_is_invalid_argument() {
    let mut client = client().await;
    let mut req = request();
    req.vehicle = None;

    let status = client.create_quote(req).await.unwrap_err();
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
}
