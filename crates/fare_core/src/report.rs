use std::fmt::Write as _;

use serde::Serialize;

use clipper_fare_model::{AgencyId, RiderCategory};

use crate::agency::AgencyRegistry;
use crate::{TripLeg, TripResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegReport {
    pub leg_number: usize,
    pub agency_id: AgencyId,
    pub agency_name: String,
    pub fare_product_id: String,
    pub fare_before_transfer: f64,
    pub clipper_1_discount: f64,
    pub clipper_1_fare: f64,
    pub clipper_2_discount: f64,
    pub clipper_2_fare: f64,
}

/// Presentation of a priced trip: per-leg figures under both policies,
/// totals and the projected savings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripReport {
    pub category: RiderCategory,
    pub legs: Vec<LegReport>,
    pub total_clipper_1: f64,
    pub total_clipper_2: f64,
    pub savings: f64,
    pub annual_trips: u32,
    pub annual_savings: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    Clipper1,
    Clipper2,
}

impl TripReport {
    pub fn new(result: &TripResult, registry: &AgencyRegistry, annual_trips: u32) -> Self {
        let legs = result
            .legs
            .iter()
            .enumerate()
            .map(|(index, leg)| leg_report(index, leg, registry))
            .collect();
        Self {
            category: result.category,
            legs,
            total_clipper_1: result.total_clipper_1,
            total_clipper_2: result.total_clipper_2,
            savings: result.savings(),
            annual_trips,
            annual_savings: result.annual_savings(annual_trips),
            share_hash: None,
        }
    }

    pub fn with_share_hash(mut self, hash: impl Into<String>) -> Self {
        self.share_hash = Some(hash.into());
        self
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Rider category: {}", self.category.label());

        for policy in [Policy::Clipper1, Policy::Clipper2] {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{}",
                match policy {
                    Policy::Clipper1 => "Clipper",
                    Policy::Clipper2 => "Clipper 2.0",
                }
            );
            for leg in &self.legs {
                self.render_leg(&mut out, leg, policy);
            }
            let _ = match policy {
                Policy::Clipper1 => writeln!(
                    out,
                    "Total fare: {}",
                    format_dollars(self.total_clipper_1)
                ),
                Policy::Clipper2 => writeln!(
                    out,
                    "Total fare with Clipper 2.0: {}",
                    format_dollars(self.total_clipper_2)
                ),
            };
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Savings per trip: {}", format_dollars(self.savings));
        let _ = writeln!(
            out,
            "Savings per year ({} trips): {}",
            self.annual_trips,
            format_dollars_grouped(self.annual_savings)
        );
        if let Some(hash) = &self.share_hash {
            let _ = writeln!(out, "Share: {}", hash);
        }
        out
    }

    fn render_leg(&self, out: &mut String, leg: &LegReport, policy: Policy) {
        let (discount, subtotal) = match policy {
            Policy::Clipper1 => (leg.clipper_1_discount, leg.clipper_1_fare),
            Policy::Clipper2 => (leg.clipper_2_discount, leg.clipper_2_fare),
        };
        let _ = writeln!(out, "Leg {}: {}", leg.leg_number, leg.agency_name);
        if discount != 0.0 {
            let _ = writeln!(
                out,
                "  Base fare: {}",
                format_dollars(leg.fare_before_transfer)
            );
            let _ = writeln!(out, "  Transfer discount: -{}", format_dollars(discount));
            let _ = writeln!(out, "  Subtotal fare: {}", format_dollars(subtotal));
        } else {
            let _ = writeln!(out, "  Fare: {}", format_dollars(leg.fare_before_transfer));
        }
    }
}

fn leg_report(index: usize, leg: &TripLeg, registry: &AgencyRegistry) -> LegReport {
    LegReport {
        leg_number: index + 1,
        agency_id: leg.agency_id.clone(),
        agency_name: registry.display_name(&leg.agency_id),
        fare_product_id: leg.fare_product_id.clone(),
        fare_before_transfer: leg.fare_before_transfer,
        clipper_1_discount: leg.clipper_1_discount,
        clipper_1_fare: leg.clipper_1_fare(),
        clipper_2_discount: leg.clipper_2_discount,
        clipper_2_fare: leg.clipper_2_fare(),
    }
}

/// `$2.50`, `$-1.00`.
pub fn format_dollars(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// `$1,375.00`, `$-12,500.50`.
pub fn format_dollars_grouped(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (position, digit) in whole.chars().enumerate() {
        if position > 0 && (whole.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipper_fare_model::Agency;

    fn result() -> TripResult {
        TripResult {
            category: RiderCategory::Adult,
            legs: vec![
                TripLeg {
                    agency_id: AgencyId::from("AC"),
                    fare_product_id: "AC:local:single".to_string(),
                    fare_before_transfer: 2.5,
                    clipper_1_discount: 0.0,
                    clipper_2_discount: 0.0,
                },
                TripLeg {
                    agency_id: AgencyId::from("BA"),
                    fare_product_id: "BA:matrix:12TH-MONT".to_string(),
                    fare_before_transfer: 3.9,
                    clipper_1_discount: 0.0,
                    clipper_2_discount: 2.85,
                },
            ],
            total_clipper_1: 6.4,
            total_clipper_2: 3.55,
        }
    }

    fn registry() -> AgencyRegistry {
        AgencyRegistry::new(vec![
            Agency::new("AC", "AC TRANSIT"),
            Agency::new("BA", "Bay Area Rapid Transit"),
        ])
    }

    #[test]
    fn formats_dollar_amounts() {
        assert_eq!(format_dollars(2.5), "$2.50");
        assert_eq!(format_dollars(-1.0), "$-1.00");
        assert_eq!(format_dollars_grouped(1425.0), "$1,425.00");
        assert_eq!(format_dollars_grouped(1234567.891), "$1,234,567.89");
        assert_eq!(format_dollars_grouped(999.999), "$1,000.00");
        assert_eq!(format_dollars_grouped(-12500.5), "$-12,500.50");
        assert_eq!(format_dollars_grouped(0.0), "$0.00");
    }

    #[test]
    fn renders_both_policies() {
        let report = TripReport::new(&result(), &registry(), 500)
            .with_share_hash("#adult#AC#BA;12TH;MONT");
        let text = report.render_text();

        assert!(text.contains("Leg 1: AC TRANSIT\n  Fare: $2.50\n"));
        assert!(text.contains("Leg 2: BART\n  Fare: $3.90\n"));
        assert!(text.contains(
            "Leg 2: BART\n  Base fare: $3.90\n  Transfer discount: -$2.85\n  Subtotal fare: $1.05\n"
        ));
        assert!(text.contains("Total fare: $6.40"));
        assert!(text.contains("Total fare with Clipper 2.0: $3.55"));
        assert!(text.contains("Savings per year (500 trips): $1,425.00"));
        assert!(text.ends_with("Share: #adult#AC#BA;12TH;MONT\n"));
    }

    #[test]
    fn serializes_camel_case_json() {
        let report = TripReport::new(&result(), &registry(), 500);
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json(false).unwrap()).unwrap();

        assert_eq!(json["category"], "adult");
        assert_eq!(json["legs"][1]["agencyName"], "BART");
        assert_eq!(json["legs"][1]["clipper2Discount"], 2.85);
        assert_eq!(json["annualTrips"], 500);
        assert!(json.get("shareHash").is_none());
    }
}
