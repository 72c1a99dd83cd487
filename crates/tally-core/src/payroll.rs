//! # Payroll
//!
//! Commission and net salary for a monthly salary record.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commission = round(sales × rate)                                      │
//! │  net        = base + commission + allowance − deduction                │
//! │                                                                         │
//! │  Example: base 1000, commission 50, allowance 20, deduction 10         │
//! │           net = 1060                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are keyed by `{employee_id}_{year}_{month}`, so saving the same
//! period twice lands on the same record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Employee, Percent};
use crate::validation::{validate_month, validate_required};

/// `round(sales × rate)`.
pub fn commission(sales: Money, rate: Percent) -> Money {
    sales.apply_rate(rate)
}

/// `base + commission + allowance − deduction`.
pub fn net_salary(base: Money, commission: Money, allowance: Money, deduction: Money) -> Money {
    base + commission + allowance - deduction
}

// =============================================================================
// Period
// =============================================================================

/// One employee's pay month.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalaryPeriod {
    pub employee_id: String,
    pub month: u32,
    pub year: i32,
}

impl SalaryPeriod {
    pub fn new(employee_id: impl Into<String>, month: u32, year: i32) -> CoreResult<Self> {
        let employee_id = employee_id.into();
        validate_required("employee_id", &employee_id)?;
        validate_month(month)?;
        Ok(SalaryPeriod {
            employee_id,
            month,
            year,
        })
    }

    /// Stable record key, e.g. `emp1_2026_03`.
    pub fn key(&self) -> String {
        format!("{}_{}_{:02}", self.employee_id, self.year, self.month)
    }
}

// =============================================================================
// Input & Record
// =============================================================================

/// What the payroll form submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalaryInput {
    pub period: SalaryPeriod,
    pub base_salary: Money,
    pub commission_rate: Percent,
    pub sales_amount: Money,
    #[serde(default)]
    pub allowance: Money,
    #[serde(default)]
    pub deduction: Money,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SalaryInput {
    /// Prefills the form from the employee profile.
    pub fn from_employee(employee: &Employee, period: SalaryPeriod, sales_amount: Money) -> Self {
        SalaryInput {
            period,
            base_salary: employee.base_salary,
            commission_rate: employee.commission_rate,
            sales_amount,
            allowance: employee.allowance,
            deduction: Money::zero(),
            notes: None,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_required("employee_id", &self.period.employee_id)?;
        validate_month(self.period.month)?;
        for (field, amount) in [
            ("base_salary", self.base_salary),
            ("sales_amount", self.sales_amount),
            ("allowance", self.allowance),
            ("deduction", self.deduction),
        ] {
            if amount.is_negative() {
                return Err(ValidationError::negative(field).into());
            }
        }
        if self.commission_rate.bps() > 10_000 {
            return Err(ValidationError::OutOfRange {
                field: "commission_rate".to_string(),
                min: 0,
                max: 10_000,
            }
            .into());
        }
        Ok(())
    }
}

/// A computed monthly salary.
///
/// `commission` and `net_salary` are always derived from the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalaryRecord {
    pub employee_id: String,
    pub month: u32,
    pub year: i32,
    pub base_salary: Money,
    pub commission_rate: Percent,
    pub sales_amount: Money,
    pub commission: Money,
    pub allowance: Money,
    pub deduction: Money,
    pub net_salary: Money,
    #[serde(default)]
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SalaryRecord {
    pub fn compute(input: &SalaryInput, now: DateTime<Utc>) -> CoreResult<Self> {
        input.validate()?;
        let commission = commission(input.sales_amount, input.commission_rate);
        Ok(SalaryRecord {
            employee_id: input.period.employee_id.clone(),
            month: input.period.month,
            year: input.period.year,
            base_salary: input.base_salary,
            commission_rate: input.commission_rate,
            sales_amount: input.sales_amount,
            commission,
            allowance: input.allowance,
            deduction: input.deduction,
            net_salary: net_salary(input.base_salary, commission, input.allowance, input.deduction),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the figures of an existing record, keeping `created_at`.
    pub fn recompute(&self, input: &SalaryInput, now: DateTime<Utc>) -> CoreResult<Self> {
        let mut updated = SalaryRecord::compute(input, now)?;
        updated.created_at = self.created_at;
        Ok(updated)
    }

    pub fn period(&self) -> SalaryPeriod {
        SalaryPeriod {
            employee_id: self.employee_id.clone(),
            month: self.month,
            year: self.year,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
    }

    fn input() -> SalaryInput {
        SalaryInput {
            period: SalaryPeriod::new("emp1", 3, 2026).unwrap(),
            base_salary: Money::from_major(1000),
            commission_rate: Percent::from_bps(500),
            sales_amount: Money::from_major(1000),
            allowance: Money::from_major(20),
            deduction: Money::from_major(10),
            notes: None,
        }
    }

    #[test]
    fn test_formulas() {
        assert_eq!(
            net_salary(
                Money::from_minor(1000),
                Money::from_minor(50),
                Money::from_minor(20),
                Money::from_minor(10)
            ),
            Money::from_minor(1060)
        );
        assert_eq!(
            commission(Money::from_minor(10_000), Percent::from_bps(500)),
            Money::from_minor(500)
        );
    }

    #[test]
    fn test_period_key() {
        assert_eq!(SalaryPeriod::new("emp1", 3, 2026).unwrap().key(), "emp1_2026_03");
        assert_eq!(SalaryPeriod::new("emp1", 12, 2025).unwrap().key(), "emp1_2025_12");
        assert!(SalaryPeriod::new("emp1", 13, 2026).is_err());
        assert!(SalaryPeriod::new("", 1, 2026).is_err());
    }

    #[test]
    fn test_compute_record() {
        let record = SalaryRecord::compute(&input(), at(1)).unwrap();
        assert_eq!(record.commission, Money::from_major(50));
        assert_eq!(record.net_salary, Money::from_major(1060));
        assert_eq!(
            record.net_salary,
            record.base_salary + record.commission + record.allowance - record.deduction
        );
        assert_eq!(record.period().key(), "emp1_2026_03");
    }

    #[test]
    fn test_recompute_keeps_created_at() {
        let first = SalaryRecord::compute(&input(), at(1)).unwrap();
        let mut changed = input();
        changed.deduction = Money::zero();
        let second = first.recompute(&changed, at(1) + Duration::days(3)).unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.net_salary, Money::from_major(1070));
    }

    #[test]
    fn test_negative_components_rejected() {
        let mut bad = input();
        bad.deduction = Money::from_minor(-1);
        assert!(matches!(
            SalaryRecord::compute(&bad, at(1)),
            Err(CoreError::Validation(ValidationError::Negative { .. }))
        ));
    }

    #[test]
    fn test_from_employee_prefill() {
        let employee = Employee {
            id: "emp1".to_string(),
            name: "Sam".to_string(),
            base_salary: Money::from_major(800),
            commission_rate: Percent::from_bps(300),
            allowance: Money::from_major(40),
            status: Default::default(),
            branch_id: None,
        };
        let input = SalaryInput::from_employee(
            &employee,
            SalaryPeriod::new("emp1", 1, 2026).unwrap(),
            Money::from_major(2000),
        );
        let record = SalaryRecord::compute(&input, at(2)).unwrap();
        assert_eq!(record.commission, Money::from_major(60));
        assert_eq!(record.net_salary, Money::from_major(900));
    }
}
