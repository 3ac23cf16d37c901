use serde::Serialize;

use crate::models::Order;

// ============================================================================
// Order Validation - explicit, named rule sets
// ============================================================================
//
// Validation runs once per order, after decoding and timestamp defaulting.
// Rules are grouped into named sets selected by configuration:
//
// - Minimal: only the identity invariant (non-empty order_uid). This is
//   the default and keeps historically accepted documents flowing.
// - Strict: full structural field rules on the order, its delivery and
//   payment records, and every line item.
//
// All violated rules are collected into one aggregate error rather than
// failing on the first hit.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleSet {
    #[default]
    Minimal,
    Strict,
}

impl RuleSet {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "minimal" => Some(Self::Minimal),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// A single violated rule, addressable by field path.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Violation {
    pub field: String,
    pub rule: &'static str,
    pub message: String,
}

impl Violation {
    fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("{field} must not be empty");
        Self {
            field,
            rule: "required",
            message,
        }
    }

    fn non_negative(field: impl Into<String>, value: i64) -> Self {
        let field = field.into();
        let message = format!("{field} must not be negative, got {value}");
        Self {
            field,
            rule: "non_negative",
            message,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("order failed validation: {}", summary(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct Validator {
    rules: RuleSet,
}

impl Validator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Check an order against the configured rule set. Returns every
    /// violation at once.
    pub fn validate(&self, order: &Order) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        if order.order_uid.is_empty() {
            violations.push(Violation::required("order_uid"));
        }

        if self.rules == RuleSet::Strict {
            self.check_strict(order, &mut violations);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }

    fn check_strict(&self, order: &Order, violations: &mut Vec<Violation>) {
        if order.track_number.is_empty() {
            violations.push(Violation::required("track_number"));
        }
        if order.entry.is_empty() {
            violations.push(Violation::required("entry"));
        }
        if order.customer_id.is_empty() {
            violations.push(Violation::required("customer_id"));
        }

        if order.delivery.name.is_empty() {
            violations.push(Violation::required("delivery.name"));
        }
        if order.delivery.city.is_empty() {
            violations.push(Violation::required("delivery.city"));
        }
        if order.delivery.address.is_empty() {
            violations.push(Violation::required("delivery.address"));
        }
        if !order.delivery.email.is_empty() && !order.delivery.email.contains('@') {
            violations.push(Violation {
                field: "delivery.email".to_string(),
                rule: "email",
                message: format!("delivery.email is not an email address: {}", order.delivery.email),
            });
        }

        if order.payment.transaction.is_empty() {
            violations.push(Violation::required("payment.transaction"));
        }
        if order.payment.currency.is_empty() {
            violations.push(Violation::required("payment.currency"));
        }
        if order.payment.amount < 0 {
            violations.push(Violation::non_negative("payment.amount", order.payment.amount));
        }
        if order.payment.delivery_cost < 0 {
            violations.push(Violation::non_negative(
                "payment.delivery_cost",
                order.payment.delivery_cost,
            ));
        }
        if order.payment.goods_total < 0 {
            violations.push(Violation::non_negative(
                "payment.goods_total",
                order.payment.goods_total,
            ));
        }

        for (i, item) in order.items.iter().enumerate() {
            if item.rid.is_empty() {
                violations.push(Violation::required(format!("items[{i}].rid")));
            }
            if item.name.is_empty() {
                violations.push(Violation::required(format!("items[{i}].name")));
            }
            if item.price < 0 {
                violations.push(Violation::non_negative(format!("items[{i}].price"), item.price));
            }
            if item.total_price < 0 {
                violations.push(Violation::non_negative(
                    format!("items[{i}].total_price"),
                    item.total_price,
                ));
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_minimal_accepts_generated_order() {
        let validator = Validator::new(RuleSet::Minimal);
        assert!(validator.validate(&fixtures::random_order()).is_ok());
    }

    #[test]
    fn test_minimal_rejects_empty_order_uid() {
        let validator = Validator::new(RuleSet::Minimal);
        let mut order = fixtures::random_order();
        order.order_uid.clear();

        let err = validator.validate(&order).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].field, "order_uid");
        assert_eq!(err.violations[0].rule, "required");
    }

    #[test]
    fn test_minimal_ignores_strict_rules() {
        let validator = Validator::new(RuleSet::Minimal);
        let mut order = fixtures::random_order();
        order.payment.amount = -1;
        order.delivery.name.clear();

        assert!(validator.validate(&order).is_ok());
    }

    #[test]
    fn test_strict_aggregates_violations() {
        let validator = Validator::new(RuleSet::Strict);
        let mut order = fixtures::random_order();
        order.track_number.clear();
        order.payment.amount = -50;
        order.items[0].rid.clear();

        let err = validator.validate(&order).unwrap_err();
        let fields: Vec<&str> = err.violations.iter().map(|v| v.field.as_str()).collect();

        assert!(fields.contains(&"track_number"));
        assert!(fields.contains(&"payment.amount"));
        assert!(fields.contains(&"items[0].rid"));
        assert_eq!(err.violations.len(), 3);
    }

    #[test]
    fn test_strict_flags_malformed_email() {
        let validator = Validator::new(RuleSet::Strict);
        let mut order = fixtures::random_order();
        order.delivery.email = "not-an-address".to_string();

        let err = validator.validate(&order).unwrap_err();
        assert_eq!(err.violations[0].rule, "email");
    }

    #[test]
    fn test_strict_accepts_empty_items() {
        let validator = Validator::new(RuleSet::Strict);
        let mut order = fixtures::random_order();
        order.items.clear();

        assert!(validator.validate(&order).is_ok());
    }

    #[test]
    fn test_rule_set_from_name() {
        assert_eq!(RuleSet::from_name("minimal"), Some(RuleSet::Minimal));
        assert_eq!(RuleSet::from_name("strict"), Some(RuleSet::Strict));
        assert_eq!(RuleSet::from_name("lenient"), None);
    }
}
