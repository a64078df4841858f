//! Single data-access interface over customers, collectors, bills, payments and plans.

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::models::{
    AccountStatus, Bill, Collector, CollectorPayload, Customer, CustomerPayload, Payment, Plan,
    PlanPayload,
};

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_customers(&self) -> AppResult<Vec<Customer>>;
    async fn create_customer(&self, payload: &CustomerPayload) -> AppResult<Customer>;
    async fn update_customer_status(&self, id: &str, status: AccountStatus) -> AppResult<()>;
    /// `None` clears the assignment.
    async fn assign_collector(
        &self,
        customer_id: &str,
        collector: Option<&Collector>,
    ) -> AppResult<()>;

    async fn list_collectors(&self) -> AppResult<Vec<Collector>>;
    async fn create_collector(&self, payload: &CollectorPayload) -> AppResult<Collector>;
    async fn update_collector(&self, id: &str, payload: &CollectorPayload) -> AppResult<Collector>;
    async fn update_collector_status(&self, id: &str, status: AccountStatus) -> AppResult<()>;

    async fn list_plans(&self) -> AppResult<Vec<Plan>>;
    async fn create_plan(&self, payload: &PlanPayload) -> AppResult<Plan>;
    async fn update_plan(&self, id: &str, payload: &PlanPayload) -> AppResult<Plan>;

    async fn list_bills(&self) -> AppResult<Vec<Bill>>;
    async fn save_bill(&self, bill: &Bill) -> AppResult<Bill>;
    async fn insert_bills(&self, bills: &[Bill]) -> AppResult<Vec<Bill>>;

    async fn list_payments(&self) -> AppResult<Vec<Payment>>;
    async fn append_payment(&self, payment: &Payment) -> AppResult<Payment>;

    /// Looks up by id, then by customer code.
    async fn get_customer(&self, id: &str) -> AppResult<Customer> {
        let customers = self.list_customers().await?;
        find_by_id_or_code(customers, id, |c| &c.id, |c| c.code.as_deref())
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
    }

    /// Looks up by id, then by collector code.
    async fn get_collector(&self, id: &str) -> AppResult<Collector> {
        let collectors = self.list_collectors().await?;
        find_by_id_or_code(collectors, id, |c| &c.id, |c| c.collector_code.as_deref())
            .ok_or_else(|| AppError::NotFound("Collector not found".to_string()))
    }

    async fn get_bill(&self, id: &str) -> AppResult<Bill> {
        self.list_bills()
            .await?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound("Bill not found".to_string()))
    }

    /// Soft delete: the customer is switched off, never removed.
    async fn delete_customer(&self, id: &str) -> AppResult<()> {
        self.update_customer_status(id, AccountStatus::Disable).await
    }

    /// Soft delete: the collector is disabled, never removed.
    async fn delete_collector(&self, id: &str) -> AppResult<()> {
        self.update_collector_status(id, AccountStatus::Disable).await
    }
}

fn find_by_id_or_code<T>(
    items: Vec<T>,
    key: &str,
    id: impl Fn(&T) -> &String,
    code: impl Fn(&T) -> Option<&str>,
) -> Option<T> {
    let key = key.trim();
    let position = items
        .iter()
        .position(|item| id(item) == key)
        .or_else(|| items.iter().position(|item| code(item) == Some(key)))?;
    items.into_iter().nth(position)
}
