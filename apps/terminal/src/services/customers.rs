//! # Customer Service
//!
//! Lookup at the till and loyalty points.

use std::sync::Arc;

use serde_json::json;
use tally_core::validation::validate_required;
use tally_core::{Customer, ValidationError};
use tally_store::{get_typed, paths, push_typed, query_typed, DataStore};
use tracing::{debug, info};

use crate::error::ApiError;

#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn DataStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        CustomerService { store }
    }

    /// First customer whose phone matches exactly (after trimming).
    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, ApiError> {
        let phone = phone.trim();
        validate_required("phone", phone)?;

        let matches =
            query_typed::<Customer>(self.store.as_ref(), paths::CUSTOMERS, "phone", &json!(phone))
                .await?;
        debug!(phone = %phone, matches = matches.len(), "Customer lookup");

        Ok(matches.into_iter().next().map(|(id, mut customer)| {
            customer.id = id;
            customer
        }))
    }

    pub async fn get(&self, customer_id: &str) -> Result<Customer, ApiError> {
        let mut customer: Customer = get_typed(self.store.as_ref(), &paths::customer(customer_id))
            .await?
            .ok_or_else(|| ApiError::not_found("Customer", customer_id))?;
        customer.id = customer_id.to_string();
        Ok(customer)
    }

    /// Registers a new customer with a zero balance.
    pub async fn create(
        &self,
        name: &str,
        phone: Option<String>,
        email: Option<String>,
    ) -> Result<Customer, ApiError> {
        let name = name.trim();
        validate_required("name", name)?;

        let phone = phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        if let Some(phone) = &phone {
            if self.find_by_phone(phone).await?.is_some() {
                return Err(ApiError::validation(format!(
                    "A customer with phone {} already exists",
                    phone
                )));
            }
        }

        let mut customer = Customer {
            id: String::new(),
            name: name.to_string(),
            phone,
            email: email.filter(|e| !e.trim().is_empty()),
            points: 0,
        };
        customer.id = push_typed(self.store.as_ref(), paths::CUSTOMERS, &customer).await?;

        info!(customer = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Credits points and returns the new balance.
    pub async fn add_points(&self, customer_id: &str, points: i64) -> Result<i64, ApiError> {
        if points <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "points".to_string(),
            }
            .into());
        }
        // Refuse to create a points leaf for a customer that does not exist.
        self.get(customer_id).await?;

        let balance = self
            .store
            .increment(&paths::customer_points(customer_id), points)
            .await?;
        info!(customer = %customer_id, points, balance, "Points added");
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_store::MemoryStore;

    fn service() -> CustomerService {
        CustomerService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_and_find_by_phone() {
        let service = service();
        let created = service
            .create(" Bo Lee ", Some(" 555-0100 ".to_string()), None)
            .await
            .unwrap();
        assert_eq!(created.name, "Bo Lee");

        let found = service.find_by_phone("555-0100").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(service.find_by_phone("555-9999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let service = service();
        service
            .create("Bo", Some("555-0100".to_string()), None)
            .await
            .unwrap();
        let err = service
            .create("Cy", Some("555-0100".to_string()), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_add_points() {
        let service = service();
        let customer = service.create("Bo", None, None).await.unwrap();

        assert_eq!(service.add_points(&customer.id, 5).await.unwrap(), 5);
        assert_eq!(service.add_points(&customer.id, 7).await.unwrap(), 12);
        assert_eq!(service.get(&customer.id).await.unwrap().points, 12);

        assert_eq!(
            service.add_points(&customer.id, 0).await.unwrap_err().code,
            ErrorCode::ValidationError
        );
        assert_eq!(
            service.add_points("ghost", 3).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
