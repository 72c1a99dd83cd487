//! # Session Context
//!
//! Everything a cashier's shift needs, resolved once and passed explicitly
//! to every service call.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session::start(store, cashier, role, branch_id)                        │
//! │                                                                         │
//! │   settings ──────► Settings::validate()   missing/invalid ⇒ ApiError    │
//! │   branches/{b} ──► BranchRef              missing ⇒ id used as name     │
//! │   products/{b} ──► ProductIndex           bad prices skipped            │
//! │                                                                         │
//! │   CheckoutSession::new()  (Idle, empty cart)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;
use tally_core::{
    BranchRef, CashierRef, CheckoutSession, Product, ProductIndex, Role, Settings,
};
use tally_core::validation::validate_price;
use tally_store::{get_typed, list_typed, paths, DataStore};
use tracing::{info, warn};

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) cashier: CashierRef,
    pub(crate) role: Role,
    pub(crate) branch: BranchRef,
    pub(crate) settings: Settings,
    pub(crate) products: ProductIndex,
    pub(crate) checkout: CheckoutSession,
}

#[derive(Debug, Deserialize)]
struct BranchDoc {
    name: String,
}

impl Session {
    /// Builds a session from values already in hand.
    pub fn new(
        cashier: CashierRef,
        role: Role,
        branch: BranchRef,
        settings: Settings,
        products: ProductIndex,
    ) -> Result<Self, ApiError> {
        settings.validate()?;
        Ok(Session {
            cashier,
            role,
            branch,
            settings,
            products,
            checkout: CheckoutSession::new(),
        })
    }

    /// Loads settings, branch and products for `branch_id`.
    pub async fn start(
        store: &dyn DataStore,
        cashier: CashierRef,
        role: Role,
        branch_id: &str,
    ) -> Result<Self, ApiError> {
        let settings: Settings = get_typed(store, paths::SETTINGS)
            .await?
            .ok_or_else(|| ApiError::config("Store settings have not been configured"))?;

        let branch_name = match get_typed::<BranchDoc>(store, &paths::branch(branch_id)).await? {
            Some(doc) => doc.name,
            None => {
                warn!(branch = %branch_id, "Branch has no details, using its id as name");
                branch_id.to_string()
            }
        };
        let branch = BranchRef {
            id: branch_id.to_string(),
            name: branch_name,
        };

        let products = load_product_index(store, branch_id).await?;

        info!(
            cashier = %cashier.full_name,
            branch = %branch.name,
            products = products.len(),
            "Session started"
        );
        Session::new(cashier, role, branch, settings, products)
    }

    pub fn cashier(&self) -> &CashierRef {
        &self.cashier
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn branch(&self) -> &BranchRef {
        &self.branch
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn products(&self) -> &ProductIndex {
        &self.products
    }

    pub fn checkout(&self) -> &CheckoutSession {
        &self.checkout
    }
}

/// Reads `products/{branch}` into an index keyed by store id.
///
/// Products with an out-of-range price are left out, so they can never
/// reach a cart.
pub(crate) async fn load_product_index(
    store: &dyn DataStore,
    branch_id: &str,
) -> Result<ProductIndex, ApiError> {
    let products = list_typed::<Product>(store, &paths::products(branch_id)).await?;
    Ok(products
        .into_iter()
        .filter_map(|(id, mut product)| {
            if let Err(e) = validate_price(product.price) {
                warn!(product = %id, error = %e, "Skipping product with invalid price");
                return None;
            }
            product.id = id;
            product.branch_id = branch_id.to_string();
            Some(product)
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;
    use tally_core::Money;
    use tally_store::{set_typed, MemoryStore};

    pub(crate) fn cashier() -> CashierRef {
        CashierRef {
            id: "u1".to_string(),
            full_name: "Ana Cashier".to_string(),
        }
    }

    /// Settings, branch "main" and two products: cola (stock 3) and rice (stock 50).
    pub(crate) async fn seeded_store(settings: &Settings) -> MemoryStore {
        let store = MemoryStore::new();
        set_typed(&store, paths::SETTINGS, settings).await.unwrap();
        store
            .set(&paths::branch("main"), json!({ "name": "Main Street" }))
            .await
            .unwrap();
        store
            .set(
                &paths::product("main", "cola"),
                json!({ "name": "Cola", "price": 250, "stock": 3 }),
            )
            .await
            .unwrap();
        store
            .set(
                &paths::product("main", "rice"),
                json!({ "name": "Rice 1kg", "price": 1000, "stock": 50, "barcode": "8901" }),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_start_loads_branch_and_products() {
        let store = seeded_store(&Settings::default()).await;
        let session = Session::start(&store, cashier(), Role::Cashier, "main")
            .await
            .unwrap();

        assert_eq!(session.branch().name, "Main Street");
        assert_eq!(session.products().len(), 2);
        let cola = session.products().get("cola").unwrap();
        assert_eq!(cola.id, "cola");
        assert_eq!(cola.branch_id, "main");
        assert_eq!(cola.price, Money::from_minor(250));
        assert_eq!(
            session.products().find_by_barcode("8901").map(|p| p.id.as_str()),
            Some("rice")
        );
    }

    #[tokio::test]
    async fn test_products_with_bad_prices_are_skipped() {
        let store = seeded_store(&Settings::default()).await;
        store
            .set(
                &paths::product("main", "gold"),
                json!({ "name": "Gold Bar", "price": i64::MAX, "stock": 1 }),
            )
            .await
            .unwrap();
        store
            .set(
                &paths::product("main", "refund"),
                json!({ "name": "Refund", "price": -100, "stock": 1 }),
            )
            .await
            .unwrap();

        let session = Session::start(&store, cashier(), Role::Cashier, "main")
            .await
            .unwrap();
        assert_eq!(session.products().len(), 2);
        assert!(session.products().get("gold").is_none());
        assert!(session.products().get("refund").is_none());
    }

    #[tokio::test]
    async fn test_missing_settings_fail_fast() {
        let store = MemoryStore::new();
        let err = Session::start(&store, cashier(), Role::Cashier, "main")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let mut settings = Settings::default();
        settings.currency.decimal_places = 9;
        let store = seeded_store(&settings).await;

        let err = Session::start(&store, cashier(), Role::Cashier, "main")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_unknown_branch_uses_id() {
        let store = seeded_store(&Settings::default()).await;
        let session = Session::start(&store, cashier(), Role::Manager, "north")
            .await
            .unwrap();
        assert_eq!(session.branch().name, "north");
        assert!(session.products().is_empty());
    }
}
