use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Bill, BillStatus, BillStatusChange, BillView, Customer, CustomerStatus, GenerateBillsRequest,
    Payment, PaymentMethod, UpdateBillStatusRequest,
};
use crate::services::record_store::RecordStore;
use crate::utils::validators::validate_bill_month;

const DEFAULT_DUE_DAYS: i64 = 15;

/// Applies an operator-chosen status to a bill. Pure: no payment is built here.
pub fn apply_transition(
    bill: &Bill,
    status: BillStatus,
    method: Option<PaymentMethod>,
    paid_date: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<Bill> {
    let mut next = bill.clone();
    match status {
        BillStatus::Paid => {
            if bill.status == BillStatus::Paid {
                return Err(AppError::Conflict("Bill is already paid.".to_string()));
            }
            next.paid_date = Some(paid_date.unwrap_or(today));
            next.payment_method = Some(method.unwrap_or_default());
        }
        BillStatus::Unpaid | BillStatus::Overdue => {
            next.paid_date = None;
            next.payment_method = None;
        }
    }
    next.status = status;
    Ok(next)
}

/// `RCP-` followed by 12 uppercase hex characters, unique among `existing`.
pub fn generate_receipt_number(existing: &HashSet<String>) -> String {
    loop {
        let raw = Uuid::new_v4().simple().to_string().to_uppercase();
        let candidate = format!("RCP-{}", &raw[..12]);
        if !existing.contains(&candidate) {
            return candidate;
        }
    }
}

/// "January 2024" style label for a `YYYY-MM` month.
pub fn bill_month_label(month: &str) -> AppResult<(NaiveDate, String)> {
    if !validate_bill_month(month) {
        return Err(AppError::validation("billMonth", "Use the YYYY-MM format."));
    }
    let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map_err(|_| AppError::validation("billMonth", "Use the YYYY-MM format."))?;
    Ok((first, first.format("%B %Y").to_string()))
}

pub fn attach_customers(bills: Vec<Bill>, customers: &[Customer]) -> Vec<BillView> {
    let by_id: HashMap<&str, &Customer> = customers.iter().map(|c| (c.id.as_str(), c)).collect();
    bills
        .into_iter()
        .map(|bill| {
            let customer = by_id.get(bill.customer_id.as_str());
            BillView {
                customer_name: customer.map(|c| c.name.clone()),
                customer_phone: customer.map(|c| c.phone.clone()),
                customer_address: customer.map(|c| c.address.clone()),
                bill,
            }
        })
        .collect()
}

pub struct BillingService {
    store: Arc<dyn RecordStore>,
}

impl BillingService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// `acting_collector` restricts the change to bills assigned to that collector.
    pub async fn update_bill_status(
        &self,
        bill_id: &str,
        request: &UpdateBillStatusRequest,
        acting_collector: Option<&str>,
        today: NaiveDate,
    ) -> AppResult<BillStatusChange> {
        let bill = self.store.get_bill(bill_id).await?;
        if let Some(collector_id) = acting_collector {
            if bill.collector_id.as_deref() != Some(collector_id) {
                tracing::warn!(bill_id, collector_id, "Collector tried to update a foreign bill");
                return Err(AppError::Forbidden);
            }
        }

        let next = apply_transition(
            &bill,
            request.status,
            request.payment_method,
            request.paid_date,
            today,
        )?;
        let saved = self.store.save_bill(&next).await?;

        let payment = if saved.status == BillStatus::Paid {
            match self.record_payment(&saved, acting_collector, today).await {
                Ok(payment) => Some(payment),
                Err(err) => {
                    // The bill must not stay paid without its payment.
                    tracing::error!(bill_id, error = %err, "Payment not recorded, restoring bill");
                    if let Err(restore) = self.store.save_bill(&bill).await {
                        tracing::error!(bill_id, error = %restore, "Bill restore failed");
                    }
                    return Err(err);
                }
            }
        } else {
            None
        };

        tracing::info!(
            bill_id,
            from = bill.status.as_str(),
            to = saved.status.as_str(),
            receipt = payment.as_ref().map(|p| p.receipt_number.as_str()),
            "Bill status updated"
        );

        Ok(BillStatusChange {
            bill: saved,
            payment,
        })
    }

    async fn record_payment(
        &self,
        bill: &Bill,
        acting_collector: Option<&str>,
        today: NaiveDate,
    ) -> AppResult<Payment> {
        let existing: HashSet<String> = self
            .store
            .list_payments()
            .await?
            .into_iter()
            .map(|p| p.receipt_number)
            .collect();
        let payment = Payment {
            id: String::new(),
            bill_id: bill.id.clone(),
            customer_id: bill.customer_id.clone(),
            amount: bill.amount,
            payment_date: bill.paid_date.unwrap_or(today),
            payment_method: bill.payment_method.unwrap_or_default(),
            collector_id: acting_collector
                .map(str::to_string)
                .or_else(|| bill.collector_id.clone()),
            receipt_number: generate_receipt_number(&existing),
        };
        self.store.append_payment(&payment).await
    }

    /// One unpaid bill per active customer that has none for the month yet.
    pub async fn generate_bills(
        &self,
        request: &GenerateBillsRequest,
        today: NaiveDate,
    ) -> AppResult<Vec<Bill>> {
        let month = request
            .bill_month
            .clone()
            .unwrap_or_else(|| format!("{:04}-{:02}", today.year(), today.month()));
        let (_, label) = bill_month_label(&month)?;
        let due_date = request
            .due_date
            .unwrap_or(today + Duration::days(DEFAULT_DUE_DAYS));

        let customers = self.store.list_customers().await?;
        let bills = self.store.list_bills().await?;
        let billed: HashSet<&str> = bills
            .iter()
            .filter(|b| b.bill_month == label)
            .map(|b| b.customer_id.as_str())
            .collect();

        let fresh: Vec<Bill> = customers
            .iter()
            .filter(|c| c.status == CustomerStatus::Active)
            .filter(|c| !billed.contains(c.id.as_str()))
            .map(|c| Bill {
                id: Uuid::new_v4().to_string(),
                customer_id: c.id.clone(),
                amount: c.monthly_fee,
                due_date,
                status: BillStatus::Unpaid,
                bill_month: label.clone(),
                paid_date: None,
                payment_method: None,
                collector_id: c.collector_id.clone(),
            })
            .collect();

        if fresh.is_empty() {
            tracing::info!(month = %label, "No bills to generate");
            return Ok(fresh);
        }

        let created = self.store.insert_bills(&fresh).await?;
        tracing::info!(month = %label, count = created.len(), "Bills generated");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::MemoryStore;
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()
    }

    fn service() -> (BillingService, Arc<dyn RecordStore>) {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::seeded());
        (BillingService::new(store.clone()), store)
    }

    fn pay(method: Option<PaymentMethod>) -> UpdateBillStatusRequest {
        UpdateBillStatusRequest {
            status: BillStatus::Paid,
            payment_method: method,
            paid_date: None,
        }
    }

    #[test]
    fn test_leaving_paid_clears_payment_fields() {
        let bill = Bill {
            id: "1".to_string(),
            customer_id: "1".to_string(),
            amount: Decimal::new(4999, 2),
            due_date: today(),
            status: BillStatus::Paid,
            bill_month: "February 2024".to_string(),
            paid_date: Some(today()),
            payment_method: Some(PaymentMethod::Cash),
            collector_id: None,
        };
        let next = apply_transition(&bill, BillStatus::Overdue, None, None, today()).unwrap();
        assert_eq!(next.status, BillStatus::Overdue);
        assert_eq!(next.paid_date, None);
        assert_eq!(next.payment_method, None);
    }

    #[test]
    fn test_receipt_numbers_avoid_existing() {
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let receipt = generate_receipt_number(&seen);
            assert!(receipt.starts_with("RCP-"));
            assert_eq!(receipt.len(), 16);
            assert!(seen.insert(receipt));
        }
    }

    #[test]
    fn test_bill_month_label() {
        assert_eq!(bill_month_label("2024-01").unwrap().1, "January 2024");
        assert!(bill_month_label("2024-1").is_err());
    }

    #[tokio::test]
    async fn test_mark_paid_appends_one_payment() {
        let (service, store) = service();
        let change = service
            .update_bill_status("2", &pay(None), None, today())
            .await
            .unwrap();

        assert_eq!(change.bill.status, BillStatus::Paid);
        assert_eq!(change.bill.paid_date, Some(today()));
        assert_eq!(change.bill.payment_method, Some(PaymentMethod::Cash));

        let payment = change.payment.unwrap();
        assert_eq!(payment.bill_id, "2");
        assert_eq!(payment.amount, Decimal::new(2999, 2));
        assert_eq!(payment.collector_id.as_deref(), Some("1"));
        assert_eq!(store.list_payments().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_collector_collects_cash_for_own_bill() {
        let (service, store) = service();
        let change = service
            .update_bill_status("5", &pay(Some(PaymentMethod::Cash)), Some("1"), today())
            .await
            .unwrap();

        assert_eq!(change.bill.status, BillStatus::Paid);
        let payment = change.payment.unwrap();
        assert_eq!(payment.bill_id, "5");
        assert_eq!(payment.customer_id, "1");
        assert_eq!(payment.amount, Decimal::new(4999, 2));
        assert_eq!(payment.payment_method, PaymentMethod::Cash);
        assert_eq!(payment.collector_id.as_deref(), Some("1"));

        let logged: Vec<Payment> = store
            .list_payments()
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.bill_id == "5")
            .collect();
        assert_eq!(logged.len(), 1);
        assert_eq!(store.get_bill("5").await.unwrap().status, BillStatus::Paid);
    }

    #[tokio::test]
    async fn test_failed_payment_restores_bill() {
        use crate::config::Config;
        use crate::services::{BackendClient, RemoteStore};
        use serde_json::json;
        use wiremock::matchers::{body_partial_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collectors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "John"}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bills"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 5, "customerId": 1, "amount": 49.99, "dueDate": "2024-02-15",
                "status": "unpaid", "billMonth": "February 2024", "collectorId": 1
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/payments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/bills/5"))
            .and(body_partial_json(json!({"status": "paid"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/bills/5"))
            .and(body_partial_json(json!({"status": "unpaid", "paidDate": null, "paymentMethod": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "down"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = BackendClient::new(&Config::for_tests(&server.uri())).unwrap();
        let service = BillingService::new(Arc::new(RemoteStore::new(backend)));
        let err = service
            .update_bill_status("5", &pay(Some(PaymentMethod::Cash)), Some("1"), today())
            .await
            .unwrap_err();
        match err {
            AppError::Upstream { message, .. } => assert_eq!(message, "down"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_paid_to_paid_rejected() {
        let (service, store) = service();
        let result = service
            .update_bill_status("1", &pay(Some(PaymentMethod::Online)), None, today())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(store.list_payments().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unpaid_keeps_payment_log() {
        let (service, store) = service();
        let request = UpdateBillStatusRequest {
            status: BillStatus::Unpaid,
            payment_method: None,
            paid_date: None,
        };
        let change = service
            .update_bill_status("1", &request, None, today())
            .await
            .unwrap();
        assert!(change.payment.is_none());
        assert_eq!(change.bill.paid_date, None);
        assert_eq!(store.list_payments().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_collector_cannot_touch_foreign_bill() {
        let (service, _) = service();
        let result = service
            .update_bill_status("3", &pay(None), Some("1"), today())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_generate_bills_skips_billed_and_inactive() {
        let (service, _) = service();
        let request = GenerateBillsRequest {
            bill_month: Some("2024-02".to_string()),
            due_date: None,
        };
        let created = service.generate_bills(&request, today()).await.unwrap();
        // Customers 1 and 2 already have February bills, 5 is inactive.
        let mut customers: Vec<&str> = created.iter().map(|b| b.customer_id.as_str()).collect();
        customers.sort();
        assert_eq!(customers, vec!["3", "4"]);
        assert!(created.iter().all(|b| b.bill_month == "February 2024"));
        assert!(created
            .iter()
            .all(|b| b.due_date == NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()));

        let again = service.generate_bills(&request, today()).await.unwrap();
        assert!(again.is_empty());
    }
}
