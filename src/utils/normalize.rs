//! Turns the loosely shaped JSON of the remote API into domain records.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{
    AccountStatus, Bill, BillStatus, Collector, Customer, CustomerStatus, CustomerType, Payment,
    PaymentMethod, Plan,
};

/// Lists arrive either bare or wrapped under one of `keys`.
pub fn extract_list(value: &Value, keys: &[&str]) -> Vec<Value> {
    if let Some(items) = value.as_array() {
        return items.clone();
    }
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

/// Follows a dotted path, treating `null` as absent.
pub fn at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// First path holding a value (`??` chain).
pub fn pick<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| at(value, path))
}

pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First path holding a non-empty text (`||` chain).
pub fn pick_text(value: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| at(value, path).and_then(value_to_string))
        .find(|s| !s.trim().is_empty())
}

/// First path holding any text, empty included.
fn pick_string(value: &Value, paths: &[&str]) -> Option<String> {
    pick(value, paths).and_then(value_to_string)
}

/// Numbers or numeric strings; anything else is zero.
pub fn value_to_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else {
                n.as_f64()
                    .and_then(|f| Decimal::try_from(f).ok())
                    .unwrap_or_default()
            }
        }
        Value::String(s) => parse_decimal(s),
        _ => Decimal::ZERO,
    }
}

pub fn parse_decimal(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or_default()
}

/// Dates and timestamps both start with `YYYY-MM-DD`.
pub fn parse_date_prefix(raw: &str) -> Option<NaiveDate> {
    let prefix: String = raw.trim().chars().take(10).collect();
    NaiveDate::parse_from_str(&prefix, "%Y-%m-%d").ok()
}

fn pick_date(value: &Value, paths: &[&str]) -> Option<NaiveDate> {
    pick_string(value, paths).and_then(|raw| parse_date_prefix(&raw))
}

fn record_id(value: &Value, paths: &[&str], index: usize) -> String {
    pick_text(value, paths).unwrap_or_else(|| (index + 1).to_string())
}

/// Maps the raw collector reference on a customer to the collector's id,
/// matching ids first and codes second. Unknown references are kept as-is.
pub fn resolve_collector_ref(raw: &str, collectors: &[Collector]) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    collectors
        .iter()
        .find(|c| c.id == raw)
        .or_else(|| {
            collectors
                .iter()
                .find(|c| c.collector_code.as_deref() == Some(raw))
        })
        .map(|c| c.id.clone())
        .or_else(|| Some(raw.to_string()))
}

fn customer_status(value: &Value) -> CustomerStatus {
    match pick_string(value, &["status", "userStatus"]) {
        None => CustomerStatus::Active,
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "enable" | "active" => CustomerStatus::Active,
            _ => CustomerStatus::Inactive,
        },
    }
}

pub fn customer_from_value(
    value: &Value,
    index: usize,
    collectors: &[Collector],
    today: NaiveDate,
) -> Customer {
    let collector_ref = pick_text(value, &["collectorCode", "collectorId", "collector.id"]);
    let customer_type = match pick_string(value, &["customerType"]).as_deref() {
        Some("business") => CustomerType::Business,
        _ => CustomerType::Individual,
    };
    let monthly_fee = pick(
        value,
        &[
            "subscription.plan.monthlyFee",
            "billingInformation.monthlySubscriptionFee",
            "monthlyFee",
        ],
    )
    .map(value_to_decimal)
    .unwrap_or_default();

    Customer {
        id: record_id(value, &["id", "_id"], index),
        code: pick_text(value, &["customerCode", "code"]),
        name: pick_text(value, &["personalName", "companyName", "name"])
            .unwrap_or_else(|| "Unknown".to_string()),
        phone: pick_string(
            value,
            &["primaryPhone", "contactInformation.primaryPhone", "phone"],
        )
        .unwrap_or_default(),
        address: pick_string(
            value,
            &[
                "installationAddress",
                "addressInformation.installation",
                "address",
            ],
        )
        .unwrap_or_default(),
        package: pick_string(
            value,
            &[
                "subscription.plan.planCode",
                "services.packageName",
                "package",
                "services.serviceId",
            ],
        )
        .unwrap_or_default(),
        monthly_fee,
        status: customer_status(value),
        customer_type,
        collector_id: collector_ref.and_then(|raw| resolve_collector_ref(&raw, collectors)),
        join_date: pick_date(value, &["createdAt", "joinDate"])
            .unwrap_or(today)
            .to_string(),
    }
}

pub fn collector_from_value(value: &Value, index: usize) -> Collector {
    let status = pick_string(value, &["status", "user.status"])
        .and_then(|raw| AccountStatus::parse(&raw))
        .unwrap_or_default();

    Collector {
        id: record_id(value, &["id", "user.id"], index),
        collector_code: pick_text(value, &["collectorCode", "user.username"]),
        name: pick_text(value, &["user.name", "name"]).unwrap_or_else(|| "Unknown".to_string()),
        phone: pick_string(value, &["user.phone", "phone"]).unwrap_or_default(),
        email: pick_string(value, &["user.email", "email"]).unwrap_or_default(),
        area: pick_text(value, &["area", "township"]).unwrap_or_default(),
        status,
        nrc: pick_string(value, &["nrc", "user.nrc"]).unwrap_or_default(),
        address: pick_string(value, &["address"]).unwrap_or_default(),
    }
}

pub fn plan_from_value(value: &Value, index: usize) -> Plan {
    Plan {
        id: record_id(value, &["id"], index),
        plan_code: pick_string(value, &["planCode"]).unwrap_or_default(),
        plan_name: pick_string(value, &["planName"]).unwrap_or_default(),
        bandwidth_plan: pick_text(value, &["bandwidthPlan"]),
        monthly_fee: pick(value, &["monthlyFee"])
            .map(value_to_decimal)
            .unwrap_or_default(),
        currency: pick_text(value, &["currency"]).unwrap_or_else(|| "MMK".to_string()),
        is_active: pick(value, &["isActive"])
            .and_then(Value::as_bool)
            .unwrap_or(true),
    }
}

fn bill_status(raw: Option<String>) -> BillStatus {
    match raw.as_deref().map(str::trim) {
        Some("paid") => BillStatus::Paid,
        Some("overdue") => BillStatus::Overdue,
        _ => BillStatus::Unpaid,
    }
}

fn payment_method(raw: Option<String>) -> Option<PaymentMethod> {
    match raw.as_deref().map(str::trim) {
        Some("cash") => Some(PaymentMethod::Cash),
        Some("transfer") => Some(PaymentMethod::Transfer),
        Some("online") => Some(PaymentMethod::Online),
        _ => None,
    }
}

/// `None` when the record has no usable due date. A paid record missing its
/// payment fields gets cash and its due date so the pair stays set.
pub fn bill_from_value(value: &Value, index: usize, collectors: &[Collector]) -> Option<Bill> {
    let id = record_id(value, &["id", "_id"], index);
    let due_date = pick_date(value, &["dueDate"])?;
    let status = bill_status(pick_string(value, &["status"]));
    let (paid_date, method) = if status == BillStatus::Paid {
        let paid_date = pick_date(value, &["paidDate"]);
        let method = payment_method(pick_string(value, &["paymentMethod"]));
        if paid_date.is_none() || method.is_none() {
            tracing::warn!(bill_id = %id, "Paid bill without payment details");
        }
        (
            Some(paid_date.unwrap_or(due_date)),
            Some(method.unwrap_or_default()),
        )
    } else {
        (None, None)
    };

    Some(Bill {
        id,
        customer_id: pick_text(value, &["customerId", "customer.id"])?,
        amount: pick(value, &["amount"])
            .map(value_to_decimal)
            .unwrap_or_default(),
        due_date,
        status,
        bill_month: pick_string(value, &["billMonth"]).unwrap_or_default(),
        paid_date,
        payment_method: method,
        collector_id: pick_text(value, &["collectorId", "collectorCode"])
            .and_then(|raw| resolve_collector_ref(&raw, collectors)),
    })
}

pub fn payment_from_value(value: &Value, index: usize, collectors: &[Collector]) -> Option<Payment> {
    Some(Payment {
        id: record_id(value, &["id", "_id"], index),
        bill_id: pick_text(value, &["billId"])?,
        customer_id: pick_text(value, &["customerId"])?,
        amount: pick(value, &["amount"])
            .map(value_to_decimal)
            .unwrap_or_default(),
        payment_date: pick_date(value, &["paymentDate", "paidDate"])?,
        payment_method: payment_method(pick_string(value, &["paymentMethod"])).unwrap_or_default(),
        collector_id: pick_text(value, &["collectorId", "collectorCode"])
            .and_then(|raw| resolve_collector_ref(&raw, collectors)),
        receipt_number: pick_string(value, &["receiptNumber"]).unwrap_or_default(),
    })
}

/// Accepts ids sent either as strings or numbers.
pub fn de_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_string(&value).ok_or_else(|| serde::de::Error::custom("expected string or number"))
}

pub fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn collectors() -> Vec<Collector> {
        vec![collector_from_value(
            &json!({"id": 7, "collectorCode": "COL-7", "user": {"name": "Aung Aung"}}),
            0,
        )]
    }

    #[test]
    fn test_extract_list_bare_and_wrapped() {
        assert_eq!(extract_list(&json!([1, 2]), &["data"]).len(), 2);
        assert_eq!(
            extract_list(&json!({"customers": [1, 2, 3]}), &["data", "customers"]).len(),
            3
        );
        assert!(extract_list(&json!({"other": []}), &["data"]).is_empty());
    }

    #[test]
    fn test_customer_from_nested_shape() {
        let raw = json!({
            "id": 12,
            "customerCode": "CUS-12",
            "personalName": "",
            "companyName": "Golden Net Co.",
            "contactInformation": {"primaryPhone": "0912345678"},
            "addressInformation": {"installation": "No. 1, Yangon"},
            "services": {"packageName": "FIBER-50"},
            "billingInformation": {"monthlySubscriptionFee": "35000"},
            "userStatus": "takeoff",
            "customerType": "business",
            "collectorCode": "COL-7",
            "createdAt": "2023-05-04T10:00:00.000Z"
        });
        let customer = customer_from_value(&raw, 0, &collectors(), today());
        assert_eq!(customer.id, "12");
        assert_eq!(customer.name, "Golden Net Co.");
        assert_eq!(customer.phone, "0912345678");
        assert_eq!(customer.address, "No. 1, Yangon");
        assert_eq!(customer.package, "FIBER-50");
        assert_eq!(customer.monthly_fee, dec("35000"));
        assert_eq!(customer.status, CustomerStatus::Inactive);
        assert_eq!(customer.customer_type, CustomerType::Business);
        assert_eq!(customer.collector_id.as_deref(), Some("7"));
        assert_eq!(customer.join_date, "2023-05-04");
    }

    #[test]
    fn test_customer_defaults() {
        let customer = customer_from_value(&json!({}), 4, &[], today());
        assert_eq!(customer.id, "5");
        assert_eq!(customer.name, "Unknown");
        assert_eq!(customer.monthly_fee, Decimal::ZERO);
        assert_eq!(customer.status, CustomerStatus::Active);
        assert_eq!(customer.collector_id, None);
        assert_eq!(customer.join_date, "2024-03-01");
    }

    #[test]
    fn test_unknown_collector_reference_kept_verbatim() {
        let raw = json!({"collectorId": "ghost"});
        let customer = customer_from_value(&raw, 0, &collectors(), today());
        assert_eq!(customer.collector_id.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_collector_from_user_shape() {
        let raw = json!({
            "user": {"id": 3, "name": "Mya", "phone": "0998877", "email": "mya@isp.mm", "username": "mya"},
            "township": "Hlaing",
            "status": "disable"
        });
        let collector = collector_from_value(&raw, 0);
        assert_eq!(collector.id, "3");
        assert_eq!(collector.collector_code.as_deref(), Some("mya"));
        assert_eq!(collector.area, "Hlaing");
        assert_eq!(collector.status, AccountStatus::Disable);
        assert_eq!(collector.assignment_value(), "mya");
    }

    #[test]
    fn test_plan_defaults() {
        let plan = plan_from_value(&json!({"planCode": "P1", "planName": "Home", "monthlyFee": 25000.5}), 0);
        assert_eq!(plan.currency, "MMK");
        assert!(plan.is_active);
        assert_eq!(plan.bandwidth_plan, None);
        assert_eq!(plan.monthly_fee, dec("25000.5"));
    }

    #[test]
    fn test_bill_requires_due_date() {
        assert!(bill_from_value(&json!({"customerId": "1"}), 0, &[]).is_none());
        let bill = bill_from_value(
            &json!({"id": "9", "customerId": 1, "amount": 49.99, "dueDate": "2024-01-15", "status": "unpaid", "paidDate": "2024-01-10"}),
            0,
            &[],
        )
        .unwrap();
        assert_eq!(bill.customer_id, "1");
        assert_eq!(bill.paid_date, None);
    }

    #[test]
    fn test_paid_bill_without_details_is_filled() {
        let bill = bill_from_value(
            &json!({"id": "4", "customerId": 2, "dueDate": "2024-01-15", "status": "paid"}),
            0,
            &[],
        )
        .unwrap();
        assert_eq!(bill.status, BillStatus::Paid);
        assert_eq!(bill.paid_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(bill.payment_method, Some(PaymentMethod::Cash));

        let bill = bill_from_value(
            &json!({"id": "4", "customerId": 2, "dueDate": "2024-01-15", "status": "paid",
                    "paidDate": "2024-01-12T08:00:00Z", "paymentMethod": "transfer"}),
            0,
            &[],
        )
        .unwrap();
        assert_eq!(bill.paid_date, NaiveDate::from_ymd_opt(2024, 1, 12));
        assert_eq!(bill.payment_method, Some(PaymentMethod::Transfer));
    }

    #[test]
    fn test_value_to_decimal() {
        assert_eq!(value_to_decimal(&json!("12.5")), dec("12.5"));
        assert_eq!(value_to_decimal(&json!("abc")), Decimal::ZERO);
        assert_eq!(value_to_decimal(&json!(null)), Decimal::ZERO);
    }
}
