//! Dashboard and report aggregates, recomputed from the loaded collections on every request.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::AppResult;
use crate::models::{
    AdminDashboard, AssignedCustomer, Bill, BillStatus, BillSummary, Collector,
    CollectorDashboard, CollectorPerformance, Customer, CustomerDashboard, CustomerQuery,
    CustomerStatus, PackageBreakdown, Payment, Report,
};
use crate::services::billing_service::attach_customers;
use crate::utils::search::filter_customers;

const RECENT_BILLS: usize = 5;

/// Percentage of `paid` over `total`, two decimals; zero when there is nothing to collect.
pub fn collection_rate(paid: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(paid) * Decimal::ONE_HUNDRED / Decimal::from(total))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn sum_bills<'a>(bills: impl Iterator<Item = &'a Bill>) -> Decimal {
    bills.map(|b| b.amount).sum()
}

pub fn bill_summary(bills: &[Bill]) -> BillSummary {
    let count = |status: BillStatus| bills.iter().filter(|b| b.status == status).count();
    let paid_bills = count(BillStatus::Paid);

    BillSummary {
        total_bills: bills.len(),
        paid_bills,
        unpaid_bills: count(BillStatus::Unpaid),
        overdue_bills: count(BillStatus::Overdue),
        total_revenue: sum_bills(bills.iter().filter(|b| b.status == BillStatus::Paid)),
        outstanding_amount: sum_bills(bills.iter().filter(|b| b.status.is_due())),
        collection_rate: collection_rate(paid_bills, bills.len()),
    }
}

pub fn collector_performance(
    collector: &Collector,
    customers: &[Customer],
    bills: &[Bill],
) -> CollectorPerformance {
    let owns = |id: &Option<String>| id.as_deref() == Some(collector.id.as_str());
    let assigned: Vec<&Bill> = bills.iter().filter(|b| owns(&b.collector_id)).collect();
    let paid: Vec<&Bill> = assigned
        .iter()
        .copied()
        .filter(|b| b.status == BillStatus::Paid)
        .collect();

    CollectorPerformance {
        collector_id: collector.id.clone(),
        name: collector.name.clone(),
        assigned_customers: customers.iter().filter(|c| owns(&c.collector_id)).count(),
        total_bills: assigned.len(),
        paid_bills: paid.len(),
        total_collected: sum_bills(paid.iter().copied()),
        collection_rate: collection_rate(paid.len(), assigned.len()),
    }
}

/// Rounded to the nearest whole customer.
pub fn average_customers_per_collector(customers: usize, collectors: usize) -> u64 {
    if collectors == 0 {
        return 0;
    }
    (Decimal::from(customers) / Decimal::from(collectors))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .try_into()
        .unwrap_or(0)
}

fn collected_on(payments: &[Payment], day: NaiveDate) -> Decimal {
    payments
        .iter()
        .filter(|p| p.payment_date == day)
        .map(|p| p.amount)
        .sum()
}

pub fn admin_dashboard(
    customers: &[Customer],
    bills: &[Bill],
    payments: &[Payment],
    today: NaiveDate,
) -> AdminDashboard {
    let summary = bill_summary(bills);
    let mut status_breakdown = BTreeMap::new();
    status_breakdown.insert("paid".to_string(), summary.paid_bills);
    status_breakdown.insert("unpaid".to_string(), summary.unpaid_bills);
    status_breakdown.insert("overdue".to_string(), summary.overdue_bills);

    let mut recent: Vec<Bill> = bills.to_vec();
    recent.sort_by(|a, b| b.due_date.cmp(&a.due_date));
    recent.truncate(RECENT_BILLS);

    AdminDashboard {
        total_customers: customers.len(),
        active_customers: customers
            .iter()
            .filter(|c| c.status == CustomerStatus::Active)
            .count(),
        today_collection: collected_on(payments, today),
        pending_bills: summary.unpaid_bills,
        overdue_bills: summary.overdue_bills,
        status_breakdown,
        recent_bills: attach_customers(recent, customers),
        summary,
    }
}

pub fn package_breakdown(customers: &[Customer]) -> Vec<PackageBreakdown> {
    let mut packages: BTreeMap<&str, (usize, Decimal)> = BTreeMap::new();
    for customer in customers.iter().filter(|c| !c.package.is_empty()) {
        let entry = packages.entry(customer.package.as_str()).or_default();
        entry.0 += 1;
        entry.1 += customer.monthly_fee;
    }
    packages
        .into_iter()
        .map(|(package, (count, revenue))| PackageBreakdown {
            package: package.to_string(),
            customers: count,
            monthly_revenue: revenue,
        })
        .collect()
}

pub fn report(
    customers: &[Customer],
    collectors: &[Collector],
    bills: &[Bill],
    payments: &[Payment],
) -> Report {
    let summary = bill_summary(bills);
    Report {
        total_revenue: payments.iter().map(|p| p.amount).sum(),
        outstanding_amount: summary.outstanding_amount,
        collection_rate: summary.collection_rate,
        active_customers: customers
            .iter()
            .filter(|c| c.status == CustomerStatus::Active)
            .count(),
        collector_performance: collectors
            .iter()
            .map(|c| collector_performance(c, customers, bills))
            .collect(),
        package_breakdown: package_breakdown(customers),
        summary,
    }
}

pub fn collector_dashboard(
    collector: Collector,
    customers: Vec<Customer>,
    bills: &[Bill],
    payments: &[Payment],
    search: Option<String>,
    today: NaiveDate,
) -> AppResult<CollectorDashboard> {
    let mine: Vec<Customer> = customers
        .into_iter()
        .filter(|c| c.collector_id.as_deref() == Some(collector.id.as_str()))
        .collect();
    let my_bills: Vec<&Bill> = bills
        .iter()
        .filter(|b| b.collector_id.as_deref() == Some(collector.id.as_str()))
        .collect();

    let due: Vec<Bill> = my_bills
        .iter()
        .filter(|b| b.status.is_due())
        .map(|b| (*b).clone())
        .collect();
    let pending_count = due.iter().filter(|b| b.status == BillStatus::Unpaid).count();
    let overdue_count = due.iter().filter(|b| b.status == BillStatus::Overdue).count();
    let due_bills = attach_customers(due, &mine);

    let query = CustomerQuery {
        search,
        status: None,
        customer_type: None,
    };
    let assigned = filter_customers(mine, &query)?
        .into_iter()
        .map(|customer| {
            let theirs: Vec<&&Bill> = my_bills
                .iter()
                .filter(|b| b.customer_id == customer.id)
                .collect();
            AssignedCustomer {
                last_bill: theirs
                    .iter()
                    .max_by_key(|b| b.due_date)
                    .map(|b| (**b).clone()),
                last_paid_date: theirs.iter().filter_map(|b| b.paid_date).max(),
                due_bills: theirs.iter().filter(|b| b.status.is_due()).count(),
                customer,
            }
        })
        .collect();

    let today_collection = payments
        .iter()
        .filter(|p| p.collector_id.as_deref() == Some(collector.id.as_str()))
        .filter(|p| p.payment_date == today)
        .map(|p| p.amount)
        .sum();

    Ok(CollectorDashboard {
        collector,
        customers: assigned,
        due_bills,
        pending_count,
        overdue_count,
        today_collection,
    })
}

pub fn customer_dashboard(
    customer: Customer,
    bills: &[Bill],
    payments: &[Payment],
) -> CustomerDashboard {
    let mut own_bills: Vec<Bill> = bills
        .iter()
        .filter(|b| b.customer_id == customer.id)
        .cloned()
        .collect();
    own_bills.sort_by(|a, b| b.due_date.cmp(&a.due_date));
    let own_payments: Vec<Payment> = payments
        .iter()
        .filter(|p| p.customer_id == customer.id)
        .cloned()
        .collect();
    let summary = bill_summary(&own_bills);

    CustomerDashboard {
        paid_count: summary.paid_bills,
        unpaid_count: summary.unpaid_bills,
        overdue_count: summary.overdue_bills,
        total_paid: own_payments.iter().map(|p| p.amount).sum(),
        outstanding_amount: summary.outstanding_amount,
        customer,
        bills: own_bills,
        payments: own_payments,
    }
}
