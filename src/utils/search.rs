use crate::error::{AppError, AppResult};
use crate::models::{
    BillQuery, BillStatus, BillView, Collector, CollectorQuery, Customer, CustomerQuery,
    CustomerStatus, CustomerType,
};

/// Case-insensitive substring match over any of `fields`. Blank terms match everything.
pub fn matches_term(term: &str, fields: &[&str]) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// `None` for a missing, blank or `all` filter.
pub fn parse_filter<T>(
    raw: Option<&str>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> AppResult<Option<T>> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown {} filter: {}", name, value))),
    }
}

fn parse_customer_status(raw: &str) -> Option<CustomerStatus> {
    match raw {
        "active" => Some(CustomerStatus::Active),
        "inactive" => Some(CustomerStatus::Inactive),
        _ => None,
    }
}

fn parse_customer_type(raw: &str) -> Option<CustomerType> {
    match raw {
        "individual" => Some(CustomerType::Individual),
        "business" => Some(CustomerType::Business),
        _ => None,
    }
}

pub fn parse_bill_status(raw: &str) -> Option<BillStatus> {
    match raw {
        "paid" => Some(BillStatus::Paid),
        "unpaid" => Some(BillStatus::Unpaid),
        "overdue" => Some(BillStatus::Overdue),
        _ => None,
    }
}

pub fn filter_customers(customers: Vec<Customer>, query: &CustomerQuery) -> AppResult<Vec<Customer>> {
    let status = parse_filter(query.status.as_deref(), "status", parse_customer_status)?;
    let customer_type = parse_filter(query.customer_type.as_deref(), "type", parse_customer_type)?;
    let term = query.search.as_deref().unwrap_or_default();

    Ok(customers
        .into_iter()
        .filter(|c| matches_term(term, &[c.name.as_str(), c.phone.as_str(), c.id.as_str()]))
        .filter(|c| status.map_or(true, |s| c.status == s))
        .filter(|c| customer_type.map_or(true, |t| c.customer_type == t))
        .collect())
}

pub fn filter_collectors(collectors: Vec<Collector>, query: &CollectorQuery) -> Vec<Collector> {
    let term = query.search.as_deref().unwrap_or_default();
    collectors
        .into_iter()
        .filter(|c| {
            matches_term(
                term,
                &[
                    c.name.as_str(),
                    c.phone.as_str(),
                    c.email.as_str(),
                    c.area.as_str(),
                    c.id.as_str(),
                ],
            )
        })
        .collect()
}

pub fn filter_bills(bills: Vec<BillView>, query: &BillQuery) -> AppResult<Vec<BillView>> {
    let status = parse_filter(query.status.as_deref(), "status", parse_bill_status)?;
    let term = query.search.as_deref().unwrap_or_default();

    Ok(bills
        .into_iter()
        .filter(|view| {
            matches_term(
                term,
                &[
                    view.customer_name.as_deref().unwrap_or_default(),
                    view.customer_phone.as_deref().unwrap_or_default(),
                    view.bill.id.as_str(),
                ],
            )
        })
        .filter(|view| status.map_or(true, |s| view.bill.status == s))
        .collect())
}
