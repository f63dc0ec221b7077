use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use staffmetrics_store::DepartmentRollup;

/// Headcount and averages for one department.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStat {
    pub department: String,
    pub employee_count: i64,
    /// Rounded to two fractional digits.
    pub average_salary: Decimal,
    /// Rounded to two fractional digits.
    pub average_performance: Decimal,
}

impl From<DepartmentRollup> for DepartmentStat {
    fn from(rollup: DepartmentRollup) -> Self {
        Self {
            department: rollup.department,
            employee_count: rollup.employee_count,
            average_salary: round_hundredths(rollup.average_salary),
            average_performance: round_hundredths(rollup.average_performance),
        }
    }
}

fn round_hundredths(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One labelled bucket of a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeCount {
    pub range: &'static str,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_stat_serializes_camel_case_with_two_decimals() {
        let stat = DepartmentStat::from(DepartmentRollup {
            department: "Engineering".to_string(),
            employee_count: 3,
            average_salary: Decimal::new(10_000_000, 0) / Decimal::from(3),
            average_performance: Decimal::new(3_455, 3),
        });
        let json = serde_json::to_value(&stat).expect("json");
        assert_eq!(json["department"], "Engineering");
        assert_eq!(json["employeeCount"], 3);
        let salary = json["averageSalary"].as_f64().expect("number");
        let performance = json["averagePerformance"].as_f64().expect("number");
        assert!((salary - 3_333_333.33).abs() < 1e-6);
        assert!((performance - 3.46).abs() < 1e-9);
        assert_eq!(stat.average_performance, Decimal::new(346, 2));
    }
}
