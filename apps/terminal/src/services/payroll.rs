//! # Payroll Service
//!
//! Monthly salary records under `salaries/{employee}_{year}_{month}`.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_salary(input, overwrite)                                          │
//! │                                                                         │
//! │  input.validate() ── error ──► ApiError (nothing written)               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  record at salaries/{key}?                                              │
//! │        │                                                                │
//! │   none ├──────────────────────────────► write, Created                  │
//! │        │                                                                │
//! │  found ├── overwrite = false ─────────► NeedsConfirmation { existing }  │
//! │        │                                                                │
//! │        └── overwrite = true ──────────► recompute, keep created_at,     │
//! │                                          write, Updated                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The key is derived from the period, so repeated saves converge on a
//! single record.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tally_core::{Employee, Invoice, Money, SalaryInput, SalaryPeriod, SalaryRecord};
use tally_store::{get_typed, list_typed, paths, query_typed, set_typed, tree, DataStore};
use tracing::{debug, info};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum SalaryOutcome {
    Created(SalaryRecord),
    Updated(SalaryRecord),
    /// A record exists for the period; resubmit with `overwrite` to replace it.
    NeedsConfirmation(SalaryRecord),
}

impl SalaryOutcome {
    pub fn record(&self) -> &SalaryRecord {
        match self {
            SalaryOutcome::Created(r) | SalaryOutcome::Updated(r) | SalaryOutcome::NeedsConfirmation(r) => r,
        }
    }
}

#[derive(Clone)]
pub struct PayrollService {
    store: Arc<dyn DataStore>,
}

impl PayrollService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        PayrollService { store }
    }

    pub async fn employee(&self, employee_id: &str) -> Result<Employee, ApiError> {
        let mut employee: Employee = get_typed(self.store.as_ref(), &paths::employee(employee_id))
            .await?
            .ok_or_else(|| ApiError::not_found("Employee", employee_id))?;
        employee.id = employee_id.to_string();
        Ok(employee)
    }

    /// Total of the invoices the employee rang up in the month.
    ///
    /// Searches the employee's branch, or every branch when none is set.
    pub async fn sales_for_period(
        &self,
        employee: &Employee,
        month: u32,
        year: i32,
    ) -> Result<Money, ApiError> {
        let branches = match &employee.branch_id {
            Some(branch) => vec![branch.clone()],
            None => match self.store.get(paths::BRANCHES).await? {
                Some(value) => tree::children(&value).into_iter().map(|(id, _)| id).collect(),
                None => Vec::new(),
            },
        };

        let mut total = Money::zero();
        for branch in &branches {
            let invoices = query_typed::<Invoice>(
                self.store.as_ref(),
                &paths::invoices(branch),
                "cashier/id",
                &json!(employee.id),
            )
            .await?;
            total = invoices
                .iter()
                .filter(|(_, invoice)| invoice.is_in_period(year, month))
                .fold(total, |acc, (_, invoice)| acc + invoice.total());
        }

        debug!(employee = %employee.id, month, year, total = %total, "Sales for period");
        Ok(total)
    }

    /// Prefilled form values: profile figures plus the period's sales.
    pub async fn prepare_salary(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> Result<SalaryInput, ApiError> {
        let period = SalaryPeriod::new(employee_id, month, year)?;
        let employee = self.employee(employee_id).await?;
        let sales = self.sales_for_period(&employee, month, year).await?;
        Ok(SalaryInput::from_employee(&employee, period, sales))
    }

    pub async fn get_salary(&self, period: &SalaryPeriod) -> Result<Option<SalaryRecord>, ApiError> {
        Ok(get_typed(self.store.as_ref(), &paths::salary(&period.key())).await?)
    }

    pub async fn save_salary(
        &self,
        input: &SalaryInput,
        overwrite: bool,
    ) -> Result<SalaryOutcome, ApiError> {
        input.validate()?;
        let key = input.period.key();
        let path = paths::salary(&key);
        let now = Utc::now();

        let outcome = match self.get_salary(&input.period).await? {
            Some(existing) if !overwrite => {
                debug!(period = %key, "Salary exists, confirmation required");
                return Ok(SalaryOutcome::NeedsConfirmation(existing));
            }
            Some(existing) => SalaryOutcome::Updated(existing.recompute(input, now)?),
            None => SalaryOutcome::Created(SalaryRecord::compute(input, now)?),
        };

        set_typed(self.store.as_ref(), &path, outcome.record()).await?;
        info!(
            period = %key,
            net = %outcome.record().net_salary,
            updated = matches!(outcome, SalaryOutcome::Updated(_)),
            "Salary saved"
        );
        Ok(outcome)
    }

    /// Records for a month, by employee id.
    pub async fn list_salaries(&self, month: u32, year: i32) -> Result<Vec<SalaryRecord>, ApiError> {
        let mut records: Vec<SalaryRecord> =
            list_typed::<SalaryRecord>(self.store.as_ref(), paths::SALARIES)
                .await?
                .into_iter()
                .map(|(_, record)| record)
                .filter(|r| r.month == month && r.year == year)
                .collect();
        records.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::TimeZone;
    use tally_core::{
        BranchRef, CashierRef, DiscountSpec, EmployeeStatus, InvoicePayment, Percent, PaymentMethod,
    };
    use tally_store::{push_typed, MemoryStore};

    fn employee() -> Employee {
        Employee {
            id: String::new(),
            name: "Ana Cashier".to_string(),
            base_salary: Money::from_major(1000),
            commission_rate: Percent::from_bps(500),
            allowance: Money::from_major(20),
            status: EmployeeStatus::Active,
            branch_id: Some("main".to_string()),
        }
    }

    fn invoice(cashier: &str, total: i64, month: u32) -> Invoice {
        let total = Money::from_minor(total);
        Invoice {
            number: "INV-00001".to_string(),
            sequence: 1,
            created_at: Utc.with_ymd_and_hms(2026, month, 10, 12, 0, 0).unwrap(),
            cashier: CashierRef {
                id: cashier.to_string(),
                full_name: "Someone".to_string(),
            },
            branch: BranchRef {
                id: "main".to_string(),
                name: "Main".to_string(),
            },
            customer: None,
            lines: Vec::new(),
            payment: InvoicePayment {
                method: PaymentMethod::Card,
                total,
                paid: total,
                change: Money::zero(),
            },
            subtotal: total,
            tax: Money::zero(),
            discount: Money::zero(),
            discount_spec: DiscountSpec::None,
            tax_included: false,
            notes: None,
        }
    }

    async fn setup() -> (Arc<MemoryStore>, PayrollService) {
        let store = Arc::new(MemoryStore::new());
        set_typed(store.as_ref(), &paths::employee("emp1"), &employee())
            .await
            .unwrap();
        let sales = [
            ("emp1", 60_000, 3),
            ("emp1", 40_000, 3),
            ("emp1", 99_900, 2),
            ("emp2", 5_000, 3),
        ];
        for (cashier, total, month) in sales {
            push_typed(store.as_ref(), &paths::invoices("main"), &invoice(cashier, total, month))
                .await
                .unwrap();
        }
        (store.clone(), PayrollService::new(store))
    }

    #[tokio::test]
    async fn test_prepare_salary_sums_period_sales() {
        let (_, service) = setup().await;
        let input = service.prepare_salary("emp1", 3, 2026).await.unwrap();

        assert_eq!(input.sales_amount, Money::from_minor(100_000));
        assert_eq!(input.base_salary, Money::from_major(1000));
        assert_eq!(input.period.key(), "emp1_2026_03");
    }

    #[tokio::test]
    async fn test_save_then_confirm_then_overwrite() {
        let (store, service) = setup().await;
        let mut input = service.prepare_salary("emp1", 3, 2026).await.unwrap();

        // 1000 + 5% of 1000.00 + 20 − 0
        let created = service.save_salary(&input, false).await.unwrap();
        assert!(matches!(created, SalaryOutcome::Created(_)));
        assert_eq!(created.record().net_salary, Money::from_major(1070));

        input.deduction = Money::from_major(10);
        let pending = service.save_salary(&input, false).await.unwrap();
        assert!(matches!(pending, SalaryOutcome::NeedsConfirmation(_)));
        assert_eq!(pending.record().net_salary, Money::from_major(1070));

        let updated = service.save_salary(&input, true).await.unwrap();
        assert!(matches!(updated, SalaryOutcome::Updated(_)));
        assert_eq!(updated.record().net_salary, Money::from_major(1060));
        assert_eq!(updated.record().created_at, created.record().created_at);

        let all = list_typed::<SalaryRecord>(store.as_ref(), paths::SALARIES)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, "emp1_2026_03");
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_saves_converge() {
        let (store, service) = setup().await;
        let input = service.prepare_salary("emp1", 3, 2026).await.unwrap();

        let (a, b) = tokio::join!(service.save_salary(&input, true), service.save_salary(&input, true));
        a.unwrap();
        b.unwrap();

        let all = list_typed::<SalaryRecord>(store.as_ref(), paths::SALARIES)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(service.list_salaries(3, 2026).await.unwrap().len(), 1);
        assert!(service.list_salaries(4, 2026).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_input_writes_nothing() {
        let (store, service) = setup().await;
        let mut input = service.prepare_salary("emp1", 3, 2026).await.unwrap();
        input.deduction = Money::from_minor(-1);

        let err = service.save_salary(&input, false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(store.get(paths::SALARIES).await.unwrap().is_none());

        assert_eq!(
            service.prepare_salary("emp1", 13, 2026).await.unwrap_err().code,
            ErrorCode::ValidationError
        );
        assert_eq!(
            service.prepare_salary("ghost", 3, 2026).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
