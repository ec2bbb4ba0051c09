use chrono::Datelike;

use crate::quotation_proto::{Coverage, CoverageType, Customer, Vehicle};

/// Premiums for one quote, in input order for `per_coverage`.
#[derive(Debug, Clone, PartialEq)]
pub struct PremiumBreakdown {
    pub monthly: f64,
    pub annual: f64,
    pub per_coverage: Vec<f64>,
}

/// Monthly premium pricing from driver, vehicle and coverage factors.
///
/// The current year is injected so vehicle age, and with it every figure, is
/// reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremiumCalculator {
    current_year: i32,
}

impl PremiumCalculator {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn for_current_year() -> Self {
        Self::new(chrono::Utc::now().year())
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn calculate(
        &self,
        customer: &Customer,
        vehicle: &Vehicle,
        coverages: &[Coverage],
    ) -> PremiumBreakdown {
        let driver = driver_factor(customer.age, customer.years_licensed);
        let vehicle = vehicle_factor(vehicle.value, self.current_year - vehicle.year);

        let per_coverage: Vec<f64> = coverages
            .iter()
            .map(|coverage| {
                let kind = coverage.r#type();
                let premium = base_premium(kind) * driver * vehicle;
                let premium = premium * deductible_multiplier(coverage.deductible);
                let premium = premium * limit_multiplier(kind, coverage.limit);
                round2(premium)
            })
            .collect();

        let total = per_coverage.iter().fold(0.0, |acc, premium| acc + premium);

        PremiumBreakdown {
            monthly: round2(total),
            annual: round2(total * 12.0),
            per_coverage,
        }
    }
}

fn driver_factor(age: i32, years_licensed: i32) -> f64 {
    let age_factor = if age < 25 {
        1.5
    } else if age < 35 {
        1.2
    } else if age > 65 {
        1.1
    } else {
        1.0
    };

    let experience_factor = if years_licensed < 2 {
        1.3
    } else if years_licensed > 10 {
        0.9
    } else {
        1.0
    };

    age_factor * experience_factor
}

fn vehicle_factor(value: f64, vehicle_age: i32) -> f64 {
    let value_factor = if value > 50_000.0 {
        1.3
    } else if value > 30_000.0 {
        1.1
    } else if value < 10_000.0 {
        0.8
    } else {
        1.0
    };

    let age_factor = if vehicle_age > 10 {
        0.9
    } else if vehicle_age < 3 {
        1.1
    } else {
        1.0
    };

    value_factor * age_factor
}

fn base_premium(kind: CoverageType) -> f64 {
    match kind {
        CoverageType::Liability => 85.0,
        CoverageType::Collision => 65.0,
        CoverageType::Comprehensive => 45.0,
        _ => 50.0,
    }
}

fn deductible_multiplier(deductible: f64) -> f64 {
    if deductible >= 1000.0 {
        0.8
    } else if deductible >= 500.0 {
        0.9
    } else {
        1.0
    }
}

fn limit_multiplier(kind: CoverageType, limit: f64) -> f64 {
    match kind {
        CoverageType::Liability if limit >= 300_000.0 => 1.2,
        CoverageType::Liability if limit >= 100_000.0 => 1.1,
        _ => 1.0,
    }
}

/// Round half-up to cents on the shortest decimal representation of `value`,
/// so 1.005 rounds to 1.01 rather than to the binary neighbour's 1.00.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let repr = format!("{}", value.abs());
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let Ok(int_part) = int_part.parse::<i128>() else {
        return (value * 100.0).round() / 100.0;
    };

    let digit = |i: usize| -> i128 {
        frac_part
            .as_bytes()
            .get(i)
            .map_or(0, |b| i128::from(b - b'0'))
    };

    let mut cents = int_part * 100 + digit(0) * 10 + digit(1);
    if digit(2) >= 5 {
        cents += 1;
    }

    let rounded = cents as f64 / 100.0;
    if value.is_sign_negative() {
        -rounded
    } else {
        rounded
    }
}
