use serde::Serialize;

use crate::classify::TokenUsage;
use crate::config::PricingConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub service: String,
    pub description: String,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub extraction_cost: f64,
    pub model_cost: f64,
    pub total_cost: f64,
    pub breakdown: Vec<CostLine>,
}

/// Extraction pages plus model tokens priced per 1000.
pub fn standard_cost(
    pricing: &PricingConfig,
    pages: u32,
    model_id: &str,
    usage: TokenUsage,
) -> CostEstimate {
    let extraction_cost = f64::from(pages) * pricing.standard_per_page;
    let mut breakdown = vec![CostLine {
        service: "Standard extraction".to_string(),
        description: format!("{} pages with page-level analysis", pages),
        cost: extraction_cost,
    }];

    let model_cost = match pricing.models.get(model_id) {
        Some(price) => {
            let cost = usage.input_tokens as f64 * price.input_per_1k / 1000.0
                + usage.output_tokens as f64 * price.output_per_1k / 1000.0;
            breakdown.push(CostLine {
                service: format!("Model {}", model_id),
                description: format!(
                    "{} input + {} output tokens",
                    usage.input_tokens, usage.output_tokens
                ),
                cost,
            });
            cost
        }
        None => 0.0,
    };

    CostEstimate {
        extraction_cost,
        model_cost,
        total_cost: extraction_cost + model_cost,
        breakdown,
    }
}

/// Custom extraction pages plus a surcharge for fields above the included count.
pub fn custom_cost(pricing: &PricingConfig, pages: u32, field_count: usize) -> CostEstimate {
    let base = f64::from(pages) * pricing.custom_per_page;
    let mut breakdown = vec![CostLine {
        service: "Custom extraction".to_string(),
        description: format!("{} pages processed", pages),
        cost: base,
    }];

    let mut extraction_cost = base;
    if field_count > pricing.custom_included_fields {
        let extra = field_count - pricing.custom_included_fields;
        let cost = pricing.custom_extra_field * extra as f64 * f64::from(pages);
        extraction_cost += cost;
        breakdown.push(CostLine {
            service: "Additional fields".to_string(),
            description: format!("{} extra fields x {} pages", extra, pages),
            cost,
        });
    }

    CostEstimate {
        extraction_cost,
        model_cost: 0.0,
        total_cost: extraction_cost,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_standard_cost() {
        let cost = standard_cost(
            &PricingConfig::default(),
            10,
            "nova-lite",
            TokenUsage {
                input_tokens: 1000,
                output_tokens: 500,
            },
        );
        assert!(close(cost.extraction_cost, 0.1));
        assert!(close(cost.model_cost, 0.00006 + 0.00012));
        assert!(close(cost.total_cost, cost.extraction_cost + cost.model_cost));
        assert_eq!(cost.breakdown.len(), 2);
    }

    #[test]
    fn test_standard_cost_unpriced_model() {
        let cost = standard_cost(&PricingConfig::default(), 2, "mystery", TokenUsage::default());
        assert_eq!(cost.model_cost, 0.0);
        assert_eq!(cost.breakdown.len(), 1);
    }

    #[test]
    fn test_custom_cost_with_extra_fields() {
        let cost = custom_cost(&PricingConfig::default(), 4, 40);
        assert!(close(cost.extraction_cost, 0.16 + 0.0005 * 10.0 * 4.0));
        assert_eq!(cost.breakdown.len(), 2);
    }

    #[test]
    fn test_custom_cost_within_included_fields() {
        let cost = custom_cost(&PricingConfig::default(), 3, 30);
        assert!(close(cost.total_cost, 0.12));
        assert_eq!(cost.breakdown.len(), 1);
    }
}
