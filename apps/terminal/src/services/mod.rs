//! # Terminal Services
//!
//! Each service holds an `Arc<dyn DataStore>` and takes the [`Session`]
//! explicitly, so one store handle can serve any number of sessions.
//!
//! [`Session`]: crate::session::Session

pub mod checkout;
pub mod customers;
pub mod held;
pub mod payroll;

pub use checkout::{CheckoutReceipt, CheckoutService};
pub use customers::CustomerService;
pub use held::HeldOrderService;
pub use payroll::{PayrollService, SalaryOutcome};
