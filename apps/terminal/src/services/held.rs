//! # Held Orders
//!
//! Parks the current sale under `held_orders/{branch}` so the till can
//! serve someone else, and brings it back later.
//!
//! ```text
//!   Building ──hold_order──► (stored) ──resume_held_order──► Building
//!      │                                   (cart must be empty;
//!      └─► Idle, cart cleared               the hold is deleted)
//! ```

use std::sync::Arc;

use chrono::Utc;
use tally_core::HeldOrder;
use tally_store::{get_typed, list_typed, paths, push_typed, DataStore};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::session::Session;

#[derive(Clone)]
pub struct HeldOrderService {
    store: Arc<dyn DataStore>,
}

impl HeldOrderService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        HeldOrderService { store }
    }

    /// Stores the current sale and clears the cart. Returns the hold id.
    pub async fn hold_order(
        &self,
        session: &mut Session,
        note: Option<String>,
    ) -> Result<String, ApiError> {
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let order = session
            .checkout
            .to_held_order(&session.branch.id, &session.cashier.id, note, Utc::now())?;

        let id = push_typed(
            self.store.as_ref(),
            &paths::held_orders(&session.branch.id),
            &order,
        )
        .await?;

        // Only cleared once the hold is safely stored.
        session.checkout.clear()?;
        info!(hold = %id, lines = order.lines.len(), "Order held");
        Ok(id)
    }

    /// This branch's held orders, oldest first.
    pub async fn list_held_orders(&self, session: &Session) -> Result<Vec<HeldOrder>, ApiError> {
        let mut orders: Vec<HeldOrder> =
            list_typed::<HeldOrder>(self.store.as_ref(), &paths::held_orders(&session.branch.id))
                .await?
                .into_iter()
                .map(|(id, mut order)| {
                    order.id = id;
                    order
                })
                .collect();
        orders.sort_by(|a, b| a.held_at.cmp(&b.held_at).then_with(|| a.id.cmp(&b.id)));
        Ok(orders)
    }

    /// Loads a hold back into the (empty) cart and deletes it.
    ///
    /// Lines keep the prices they were held with.
    pub async fn resume_held_order(
        &self,
        session: &mut Session,
        hold_id: &str,
    ) -> Result<HeldOrder, ApiError> {
        let path = paths::held_order(&session.branch.id, hold_id);
        let mut order: HeldOrder = get_typed(self.store.as_ref(), &path)
            .await?
            .ok_or_else(|| ApiError::not_found("Held order", hold_id))?;
        order.id = hold_id.to_string();

        session.checkout.load_held_order(&order)?;

        if let Err(e) = self.store.remove(&path).await {
            // The sale is back in the cart; a stale hold is the lesser problem.
            warn!(hold = %hold_id, error = %e, "Resumed hold could not be deleted");
        }
        info!(hold = %hold_id, "Held order resumed");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::CheckoutService;
    use crate::session::tests::{cashier, seeded_store};
    use tally_core::{CheckoutState, Money, Role, Settings};
    use tally_store::MemoryStore;

    async fn setup() -> (Arc<MemoryStore>, CheckoutService, HeldOrderService, Session) {
        let store = Arc::new(seeded_store(&Settings::default()).await);
        let session = Session::start(store.as_ref(), cashier(), Role::Cashier, "main")
            .await
            .unwrap();
        (
            store.clone(),
            CheckoutService::new(store.clone()),
            HeldOrderService::new(store),
            session,
        )
    }

    #[tokio::test]
    async fn test_hold_and_resume() {
        let (store, checkout, held, mut session) = setup().await;
        checkout.add_to_cart(&mut session, "rice").unwrap();
        checkout.add_to_cart(&mut session, "rice").unwrap();

        let id = held
            .hold_order(&mut session, Some("  table 4 ".to_string()))
            .await
            .unwrap();
        assert!(session.checkout().cart().is_empty());
        assert_eq!(session.checkout().state(), CheckoutState::Idle);

        let orders = held.list_held_orders(&session).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, id);
        assert_eq!(orders[0].note.as_deref(), Some("table 4"));
        assert_eq!(orders[0].subtotal(), Money::from_minor(2000));

        let resumed = held.resume_held_order(&mut session, &id).await.unwrap();
        assert_eq!(resumed.lines.len(), 1);
        assert_eq!(session.checkout().cart().line("rice").unwrap().quantity, 2);
        assert_eq!(session.checkout().state(), CheckoutState::Building);
        assert!(store
            .get(&paths::held_order("main", &id))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_resume_requires_empty_cart() {
        let (_, checkout, held, mut session) = setup().await;
        checkout.add_to_cart(&mut session, "rice").unwrap();
        let id = held.hold_order(&mut session, None).await.unwrap();

        checkout.add_to_cart(&mut session, "cola").unwrap();
        let err = held.resume_held_order(&mut session, &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert_eq!(held.list_held_orders(&session).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_hold_keeps_cart() {
        let (store, checkout, held, mut session) = setup().await;
        checkout.add_to_cart(&mut session, "rice").unwrap();
        store.fail_writes_under("held_orders").await.unwrap();

        assert!(held.hold_order(&mut session, None).await.is_err());
        assert_eq!(session.checkout().cart().item_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_be_held() {
        let (_, _, held, mut session) = setup().await;
        let err = held.hold_order(&mut session, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert_eq!(
            held.resume_held_order(&mut session, "nope").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
