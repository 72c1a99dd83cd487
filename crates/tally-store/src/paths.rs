//! Canonical document locations.
//!
//! ```text
//! settings                              application settings
//! branches/{branch}                     branch name and details
//! products/{branch}/{product}           product, per branch
//! invoices/{branch}/{invoice}           completed sales
//! counters/invoices/{branch}            last invoice sequence
//! customers/{customer}                  customers and points
//! employees/{employee}                  payroll profiles
//! salaries/{employee}_{year}_{month}    one record per pay period
//! held_orders/{branch}/{order}          parked carts
//! activity_logs/{entry}                 audit trail
//! ```

pub const SETTINGS: &str = "settings";
pub const BRANCHES: &str = "branches";
pub const CUSTOMERS: &str = "customers";
pub const EMPLOYEES: &str = "employees";
pub const SALARIES: &str = "salaries";
pub const ACTIVITY_LOGS: &str = "activity_logs";

pub fn branch(branch_id: &str) -> String {
    format!("{}/{}", BRANCHES, branch_id)
}

pub fn products(branch_id: &str) -> String {
    format!("products/{}", branch_id)
}

pub fn product(branch_id: &str, product_id: &str) -> String {
    format!("products/{}/{}", branch_id, product_id)
}

pub fn product_stock(branch_id: &str, product_id: &str) -> String {
    format!("products/{}/{}/stock", branch_id, product_id)
}

pub fn invoices(branch_id: &str) -> String {
    format!("invoices/{}", branch_id)
}

pub fn invoice(branch_id: &str, invoice_id: &str) -> String {
    format!("invoices/{}/{}", branch_id, invoice_id)
}

pub fn invoice_counter(branch_id: &str) -> String {
    format!("counters/invoices/{}", branch_id)
}

pub fn customer(customer_id: &str) -> String {
    format!("{}/{}", CUSTOMERS, customer_id)
}

pub fn customer_points(customer_id: &str) -> String {
    format!("{}/{}/points", CUSTOMERS, customer_id)
}

pub fn employee(employee_id: &str) -> String {
    format!("{}/{}", EMPLOYEES, employee_id)
}

/// `key` is a salary period key such as `emp1_2026_03`.
pub fn salary(key: &str) -> String {
    format!("{}/{}", SALARIES, key)
}

pub fn held_orders(branch_id: &str) -> String {
    format!("held_orders/{}", branch_id)
}

pub fn held_order(branch_id: &str, order_id: &str) -> String {
    format!("held_orders/{}/{}", branch_id, order_id)
}
