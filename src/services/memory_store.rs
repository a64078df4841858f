use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::{
    AccountStatus, Bill, BillStatus, Collector, CollectorPayload, Customer, CustomerPayload,
    CustomerStatus, CustomerType, Payment, PaymentMethod, Plan, PlanPayload,
};
use crate::services::record_store::RecordStore;
use crate::utils::today;

#[derive(Debug, Default)]
struct Records {
    customers: Vec<Customer>,
    collectors: Vec<Collector>,
    bills: Vec<Bill>,
    payments: Vec<Payment>,
    plans: Vec<Plan>,
}

/// Process-local store used for demos and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

fn next_id<'a>(ids: impl Iterator<Item = &'a String>) -> String {
    let max = ids.filter_map(|id| id.parse::<u64>().ok()).max().unwrap_or(0);
    (max + 1).to_string()
}

fn money(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_default()
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_default()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the demo customers, collectors, bills, payments and plans.
    pub fn seeded() -> Self {
        let customer = |id: &str, name: &str, phone: &str, address: &str, package: &str, fee: &str, status, collector: &str, joined: &str| Customer {
            id: id.to_string(),
            code: None,
            name: name.to_string(),
            phone: phone.to_string(),
            address: address.to_string(),
            package: package.to_string(),
            monthly_fee: money(fee),
            status,
            customer_type: CustomerType::Individual,
            collector_id: Some(collector.to_string()),
            join_date: joined.to_string(),
        };
        let customers = vec![
            customer("1", "John Smith", "+1-555-0101", "123 Main St, City, State 12345", "Premium", "49.99", CustomerStatus::Active, "1", "2023-01-15"),
            customer("2", "Sarah Johnson", "+1-555-0102", "456 Oak Ave, City, State 12345", "Basic", "29.99", CustomerStatus::Active, "1", "2023-02-20"),
            customer("3", "Michael Brown", "+1-555-0103", "789 Pine St, City, State 12345", "Premium", "49.99", CustomerStatus::Active, "2", "2023-01-10"),
            customer("4", "Emily Davis", "+1-555-0104", "321 Elm St, City, State 12345", "Standard", "39.99", CustomerStatus::Active, "2", "2023-03-05"),
            customer("5", "David Wilson", "+1-555-0105", "654 Maple Ave, City, State 12345", "Basic", "29.99", CustomerStatus::Inactive, "1", "2022-12-15"),
        ];

        let bill = |id: &str, customer: &str, amount: &str, due: &str, status, month: &str, paid: Option<(&str, PaymentMethod)>, collector: &str| Bill {
            id: id.to_string(),
            customer_id: customer.to_string(),
            amount: money(amount),
            due_date: date(due),
            status,
            bill_month: month.to_string(),
            paid_date: paid.map(|(d, _)| date(d)),
            payment_method: paid.map(|(_, m)| m),
            collector_id: Some(collector.to_string()),
        };
        let bills = vec![
            bill("1", "1", "49.99", "2024-01-15", BillStatus::Paid, "January 2024", Some(("2024-01-10", PaymentMethod::Cash)), "1"),
            bill("2", "2", "29.99", "2024-01-15", BillStatus::Unpaid, "January 2024", None, "1"),
            bill("3", "3", "49.99", "2024-01-15", BillStatus::Overdue, "January 2024", None, "2"),
            bill("4", "4", "39.99", "2024-01-15", BillStatus::Paid, "January 2024", Some(("2024-01-12", PaymentMethod::Transfer)), "2"),
            bill("5", "1", "49.99", "2024-02-15", BillStatus::Unpaid, "February 2024", None, "1"),
            bill("6", "2", "29.99", "2024-02-15", BillStatus::Unpaid, "February 2024", None, "1"),
        ];

        let collector = |id: &str, name: &str, phone: &str, email: &str, area: &str| Collector {
            id: id.to_string(),
            collector_code: None,
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            area: area.to_string(),
            status: AccountStatus::Enable,
            nrc: String::new(),
            address: String::new(),
        };
        let collectors = vec![
            collector("1", "John Collector", "+1-555-0201", "john.collector@billflow.com", "Downtown"),
            collector("2", "Mary Collector", "+1-555-0202", "mary.collector@billflow.com", "Uptown"),
        ];

        let payments = vec![
            Payment {
                id: "1".to_string(),
                bill_id: "1".to_string(),
                customer_id: "1".to_string(),
                amount: money("49.99"),
                payment_date: date("2024-01-10"),
                payment_method: PaymentMethod::Cash,
                collector_id: Some("1".to_string()),
                receipt_number: "RCP001".to_string(),
            },
            Payment {
                id: "2".to_string(),
                bill_id: "4".to_string(),
                customer_id: "4".to_string(),
                amount: money("39.99"),
                payment_date: date("2024-01-12"),
                payment_method: PaymentMethod::Transfer,
                collector_id: Some("2".to_string()),
                receipt_number: "RCP002".to_string(),
            },
        ];

        let plan = |id: &str, code: &str, name: &str, bandwidth: &str, fee: &str| Plan {
            id: id.to_string(),
            plan_code: code.to_string(),
            plan_name: name.to_string(),
            bandwidth_plan: Some(bandwidth.to_string()),
            monthly_fee: money(fee),
            currency: "USD".to_string(),
            is_active: true,
        };
        let plans = vec![
            plan("1", "Basic", "Basic", "25 Mbps", "29.99"),
            plan("2", "Standard", "Standard", "50 Mbps", "39.99"),
            plan("3", "Premium", "Premium", "100 Mbps", "49.99"),
        ];

        Self {
            records: RwLock::new(Records {
                customers,
                collectors,
                bills,
                payments,
                plans,
            }),
        }
    }
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{} not found", what))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        Ok(self.records.read().await.customers.clone())
    }

    async fn create_customer(&self, payload: &CustomerPayload) -> AppResult<Customer> {
        let mut records = self.records.write().await;
        let customer = Customer {
            id: next_id(records.customers.iter().map(|c| &c.id)),
            code: None,
            name: payload.display_name(),
            phone: payload.contact_information.primary_phone.clone(),
            address: payload.address_information.installation.clone(),
            package: payload.services.package_name.clone(),
            monthly_fee: payload.billing_information.monthly_subscription_fee,
            status: payload.user_status.to_customer_status(),
            customer_type: payload.customer_type,
            collector_id: None,
            join_date: today().to_string(),
        };
        records.customers.push(customer.clone());
        Ok(customer)
    }

    async fn update_customer_status(&self, id: &str, status: AccountStatus) -> AppResult<()> {
        let mut records = self.records.write().await;
        let customer = records
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Customer"))?;
        customer.status = status.to_customer_status();
        Ok(())
    }

    async fn assign_collector(
        &self,
        customer_id: &str,
        collector: Option<&Collector>,
    ) -> AppResult<()> {
        let mut records = self.records.write().await;
        let customer = records
            .customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| not_found("Customer"))?;
        customer.collector_id = collector.map(|c| c.id.clone());
        Ok(())
    }

    async fn list_collectors(&self) -> AppResult<Vec<Collector>> {
        Ok(self.records.read().await.collectors.clone())
    }

    async fn create_collector(&self, payload: &CollectorPayload) -> AppResult<Collector> {
        let mut records = self.records.write().await;
        let collector = Collector {
            id: next_id(records.collectors.iter().map(|c| &c.id)),
            collector_code: None,
            name: payload.name.clone(),
            phone: payload.phone.clone(),
            email: payload.email.clone(),
            area: payload.area.clone(),
            status: payload.status,
            nrc: payload.nrc.clone(),
            address: payload.address.clone(),
        };
        records.collectors.push(collector.clone());
        Ok(collector)
    }

    async fn update_collector(&self, id: &str, payload: &CollectorPayload) -> AppResult<Collector> {
        let mut records = self.records.write().await;
        let collector = records
            .collectors
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Collector"))?;
        collector.name = payload.name.clone();
        collector.phone = payload.phone.clone();
        collector.email = payload.email.clone();
        collector.area = payload.area.clone();
        collector.status = payload.status;
        collector.nrc = payload.nrc.clone();
        collector.address = payload.address.clone();
        Ok(collector.clone())
    }

    async fn update_collector_status(&self, id: &str, status: AccountStatus) -> AppResult<()> {
        let mut records = self.records.write().await;
        let collector = records
            .collectors
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Collector"))?;
        collector.status = status;
        Ok(())
    }

    async fn list_plans(&self) -> AppResult<Vec<Plan>> {
        Ok(self.records.read().await.plans.clone())
    }

    async fn create_plan(&self, payload: &PlanPayload) -> AppResult<Plan> {
        let mut records = self.records.write().await;
        if records.plans.iter().any(|p| p.plan_code == payload.plan_code) {
            return Err(AppError::Conflict("Plan code already exists.".to_string()));
        }
        let plan = Plan {
            id: next_id(records.plans.iter().map(|p| &p.id)),
            plan_code: payload.plan_code.clone(),
            plan_name: payload.plan_name.clone(),
            bandwidth_plan: payload.bandwidth_plan.clone(),
            monthly_fee: payload.monthly_fee,
            currency: payload.currency.clone(),
            is_active: payload.is_active,
        };
        records.plans.push(plan.clone());
        Ok(plan)
    }

    async fn update_plan(&self, id: &str, payload: &PlanPayload) -> AppResult<Plan> {
        let mut records = self.records.write().await;
        let plan = records
            .plans
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("Plan"))?;
        plan.plan_code = payload.plan_code.clone();
        plan.plan_name = payload.plan_name.clone();
        plan.bandwidth_plan = payload.bandwidth_plan.clone();
        plan.monthly_fee = payload.monthly_fee;
        plan.currency = payload.currency.clone();
        plan.is_active = payload.is_active;
        Ok(plan.clone())
    }

    async fn list_bills(&self) -> AppResult<Vec<Bill>> {
        Ok(self.records.read().await.bills.clone())
    }

    async fn save_bill(&self, bill: &Bill) -> AppResult<Bill> {
        let mut records = self.records.write().await;
        let stored = records
            .bills
            .iter_mut()
            .find(|b| b.id == bill.id)
            .ok_or_else(|| not_found("Bill"))?;
        *stored = bill.clone();
        Ok(bill.clone())
    }

    async fn insert_bills(&self, bills: &[Bill]) -> AppResult<Vec<Bill>> {
        let mut records = self.records.write().await;
        let mut created = Vec::with_capacity(bills.len());
        for bill in bills {
            let mut bill = bill.clone();
            bill.id = next_id(records.bills.iter().map(|b| &b.id));
            records.bills.push(bill.clone());
            created.push(bill);
        }
        Ok(created)
    }

    async fn list_payments(&self) -> AppResult<Vec<Payment>> {
        Ok(self.records.read().await.payments.clone())
    }

    async fn append_payment(&self, payment: &Payment) -> AppResult<Payment> {
        let mut records = self.records.write().await;
        let mut payment = payment.clone();
        payment.id = next_id(records.payments.iter().map(|p| &p.id));
        records.payments.push(payment.clone());
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_counts() {
        let store = MemoryStore::seeded();
        assert_eq!(store.list_customers().await.unwrap().len(), 5);
        assert_eq!(store.list_collectors().await.unwrap().len(), 2);
        assert_eq!(store.list_bills().await.unwrap().len(), 6);
        assert_eq!(store.list_payments().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_records() {
        let store = MemoryStore::seeded();
        store.delete_customer("2").await.unwrap();
        store.delete_collector("1").await.unwrap();

        let customer = store.get_customer("2").await.unwrap();
        assert_eq!(customer.status, CustomerStatus::Inactive);
        let collector = store.get_collector("1").await.unwrap();
        assert_eq!(collector.status, AccountStatus::Disable);
        assert_eq!(store.list_customers().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let store = MemoryStore::seeded();
        assert!(matches!(
            store.get_customer("99").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_inserted_bills_get_fresh_ids() {
        let store = MemoryStore::seeded();
        let mut bill = store.get_bill("2").await.unwrap();
        bill.bill_month = "March 2024".to_string();
        let created = store.insert_bills(&[bill.clone(), bill]).await.unwrap();
        assert_eq!(created[0].id, "7");
        assert_eq!(created[1].id, "8");
    }

    #[tokio::test]
    async fn test_duplicate_plan_code_conflicts() {
        let store = MemoryStore::seeded();
        let payload = PlanPayload {
            plan_code: "Basic".to_string(),
            plan_name: "Basic again".to_string(),
            bandwidth_plan: None,
            monthly_fee: Decimal::new(1000, 0),
            currency: "MMK".to_string(),
            is_active: true,
        };
        assert!(matches!(
            store.create_plan(&payload).await,
            Err(AppError::Conflict(_))
        ));
    }
}
