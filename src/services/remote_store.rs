use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::{
    AccountStatus, Bill, Collector, CollectorPayload, Customer, CustomerPayload, Payment, Plan,
    PlanPayload,
};
use crate::services::backend_client::BackendClient;
use crate::services::record_store::RecordStore;
use crate::utils::normalize::{
    bill_from_value, collector_from_value, customer_from_value, extract_list, payment_from_value,
    plan_from_value,
};
use crate::utils::today;

/// `RecordStore` backed by the remote billing API.
pub struct RemoteStore {
    backend: BackendClient,
}

/// Unwraps `{ key: {...} }` responses; bare objects pass through.
fn entity<'a>(body: &'a Value, key: &str) -> &'a Value {
    match body.get(key) {
        Some(inner) if inner.is_object() => inner,
        _ => body,
    }
}

fn plan_or_payload(body: &Value, id: Option<&str>, payload: &PlanPayload) -> Plan {
    let raw = entity(body, "plan");
    if raw.get("planCode").is_some() {
        let mut plan = plan_from_value(raw, 0);
        if let Some(id) = id {
            plan.id = id.to_string();
        }
        return plan;
    }
    Plan {
        id: id
            .map(str::to_string)
            .or_else(|| raw.get("id").and_then(crate::utils::normalize::value_to_string))
            .unwrap_or_default(),
        plan_code: payload.plan_code.clone(),
        plan_name: payload.plan_name.clone(),
        bandwidth_plan: payload.bandwidth_plan.clone(),
        monthly_fee: payload.monthly_fee,
        currency: payload.currency.clone(),
        is_active: payload.is_active,
    }
}

impl RemoteStore {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl RecordStore for RemoteStore {
    async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let (body, collectors) = tokio::try_join!(
            self.backend.get_json("/customers", "Failed to load customers"),
            self.list_collectors()
        )?;
        let as_of = today();
        Ok(extract_list(&body, &["data", "customers"])
            .iter()
            .enumerate()
            .map(|(index, item)| customer_from_value(item, index, &collectors, as_of))
            .collect())
    }

    async fn create_customer(&self, payload: &CustomerPayload) -> AppResult<Customer> {
        let body = self
            .backend
            .send_json(
                Method::POST,
                "/auth/customers",
                &json!({ "customer": payload }),
                "Failed to create customer",
            )
            .await?;
        let collectors = self.list_collectors().await?;
        let mut customer =
            customer_from_value(entity(&body, "customer"), 0, &collectors, today());
        if customer.name == "Unknown" {
            customer.name = payload.display_name();
        }
        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    async fn update_customer_status(&self, id: &str, status: AccountStatus) -> AppResult<()> {
        self.backend
            .send_json(
                Method::PATCH,
                &format!("/customers/{}", id),
                &json!({ "status": status.as_str() }),
                "Failed to update customer status",
            )
            .await?;
        Ok(())
    }

    async fn assign_collector(
        &self,
        customer_id: &str,
        collector: Option<&Collector>,
    ) -> AppResult<()> {
        let code = collector.map(|c| c.assignment_value().to_string());
        self.backend
            .send_json(
                Method::PATCH,
                &format!("/customers/{}", customer_id),
                &json!({ "collectorCode": code }),
                "Failed to update collector assignment",
            )
            .await?;
        Ok(())
    }

    async fn list_collectors(&self) -> AppResult<Vec<Collector>> {
        let body = self
            .backend
            .get_json("/collectors", "Failed to load collectors")
            .await?;
        Ok(extract_list(&body, &["data", "collectors"])
            .iter()
            .enumerate()
            .map(|(index, item)| collector_from_value(item, index))
            .collect())
    }

    async fn create_collector(&self, payload: &CollectorPayload) -> AppResult<Collector> {
        let body = self
            .backend
            .send_json(
                Method::POST,
                "/auth/collectors",
                &json!({ "collector": payload }),
                "Failed to create collector",
            )
            .await?;
        let mut collector = collector_from_value(entity(&body, "collector"), 0);
        if collector.name == "Unknown" {
            collector.name = payload.name.clone();
        }
        Ok(collector)
    }

    async fn update_collector(&self, id: &str, payload: &CollectorPayload) -> AppResult<Collector> {
        let body = self
            .backend
            .send_json(
                Method::PATCH,
                &format!("/collectors/{}", id),
                payload,
                "Failed to update collector",
            )
            .await?;
        let mut collector = collector_from_value(entity(&body, "collector"), 0);
        if body.get("id").is_none() && body.get("collector").is_none() {
            collector = Collector {
                id: id.to_string(),
                collector_code: None,
                name: payload.name.clone(),
                phone: payload.phone.clone(),
                email: payload.email.clone(),
                area: payload.area.clone(),
                status: payload.status,
                nrc: payload.nrc.clone(),
                address: payload.address.clone(),
            };
        }
        Ok(collector)
    }

    async fn update_collector_status(&self, id: &str, status: AccountStatus) -> AppResult<()> {
        self.backend
            .send_json(
                Method::PATCH,
                &format!("/collectors/{}", id),
                &json!({ "status": status.as_str() }),
                "Failed to update collector status",
            )
            .await?;
        Ok(())
    }

    async fn list_plans(&self) -> AppResult<Vec<Plan>> {
        let body = self.backend.get_json("/plans", "Failed to load plans").await?;
        Ok(extract_list(&body, &["data", "plans"])
            .iter()
            .enumerate()
            .map(|(index, item)| plan_from_value(item, index))
            .collect())
    }

    async fn create_plan(&self, payload: &PlanPayload) -> AppResult<Plan> {
        let body = self
            .backend
            .send_json(Method::POST, "/plans", payload, "Failed to create plan")
            .await?;
        Ok(plan_or_payload(&body, None, payload))
    }

    async fn update_plan(&self, id: &str, payload: &PlanPayload) -> AppResult<Plan> {
        let body = self
            .backend
            .send_json(
                Method::PATCH,
                &format!("/plans/{}", id),
                payload,
                "Failed to update plan",
            )
            .await?;
        Ok(plan_or_payload(&body, Some(id), payload))
    }

    async fn list_bills(&self) -> AppResult<Vec<Bill>> {
        let (body, collectors) = tokio::try_join!(
            self.backend.get_json("/bills", "Failed to load bills"),
            self.list_collectors()
        )?;
        Ok(extract_list(&body, &["data", "bills"])
            .iter()
            .enumerate()
            .filter_map(|(index, item)| bill_from_value(item, index, &collectors))
            .collect())
    }

    async fn save_bill(&self, bill: &Bill) -> AppResult<Bill> {
        self.backend
            .send_json(
                Method::PATCH,
                &format!("/bills/{}", bill.id),
                &json!({
                    "status": bill.status,
                    "paidDate": bill.paid_date,
                    "paymentMethod": bill.payment_method,
                    "collectorId": bill.collector_id,
                }),
                "Failed to update bill",
            )
            .await?;
        Ok(bill.clone())
    }

    async fn insert_bills(&self, bills: &[Bill]) -> AppResult<Vec<Bill>> {
        let body = self
            .backend
            .send_json(
                Method::POST,
                "/bills",
                &json!({ "bills": bills }),
                "Failed to create bills",
            )
            .await?;
        let collectors = self.list_collectors().await?;
        let created: Vec<Bill> = extract_list(&body, &["data", "bills"])
            .iter()
            .enumerate()
            .filter_map(|(index, item)| bill_from_value(item, index, &collectors))
            .collect();
        // Some deployments answer with a bare acknowledgement.
        if created.is_empty() {
            return Ok(bills.to_vec());
        }
        Ok(created)
    }

    async fn list_payments(&self) -> AppResult<Vec<Payment>> {
        let (body, collectors) = tokio::try_join!(
            self.backend.get_json("/payments", "Failed to load payments"),
            self.list_collectors()
        )?;
        Ok(extract_list(&body, &["data", "payments"])
            .iter()
            .enumerate()
            .filter_map(|(index, item)| payment_from_value(item, index, &collectors))
            .collect())
    }

    async fn append_payment(&self, payment: &Payment) -> AppResult<Payment> {
        let body = self
            .backend
            .send_json(Method::POST, "/payments", payment, "Failed to record payment")
            .await?;
        let stored = payment_from_value(entity(&body, "payment"), 0, &[]);
        Ok(stored
            .filter(|p| p.receipt_number == payment.receipt_number)
            .map(|p| Payment {
                collector_id: payment.collector_id.clone(),
                ..p
            })
            .unwrap_or_else(|| payment.clone()))
    }
}
