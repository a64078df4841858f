use std::sync::Arc;

use chrono::Datelike;
use rust_decimal::Decimal;
use validator::Validate;

use crate::error::{field_errors, AppError, AppResult, FieldErrors};
use crate::models::{
    AddressInformation, AddressInput, BillingInformation, BusinessInformation, Collector,
    CollectorForm, CollectorPayload, ContactInformation, Customer, CustomerOnboardingForm,
    CustomerPayload, CustomerType, NetworkTechnical, NrcInput, PersonalInformation, Plan,
    ServiceInformation,
};
use crate::services::record_store::RecordStore;
use crate::services::reference_service::{ReferenceService, ReferenceSnapshot};
use crate::utils::address::format_address;
use crate::utils::normalize::{parse_date_prefix, parse_decimal};
use crate::utils::nrc::format_nrc;
use crate::utils::validators::{validate_nrc_number, validate_phone};

pub const BILLING_CYCLES: [&str; 5] = ["Monthly", "Quarterly", "Bi-yearly", "Yearly", "Custom"];
const SAME_AS_INSTALLATION: &str = "Same as installation";
const ONBOARDING_CURRENCY: &str = "MMK";

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_nrc(
    errors: &mut FieldErrors,
    prefix: &str,
    nrc: &NrcInput,
    snapshot: &ReferenceSnapshot,
) {
    let key = |part: &str| {
        if prefix.is_empty() {
            format!("nrc{}", part)
        } else {
            format!("{}Nrc{}", prefix, part)
        }
    };
    if blank(&nrc.state) || !snapshot.has_nrc_state(&nrc.state) {
        errors.insert(key("State"), "Select NRC state.".to_string());
    }
    if blank(&nrc.township) || !snapshot.has_nrc_township(&nrc.state, &nrc.township) {
        errors.insert(key("Township"), "Select NRC township.".to_string());
    }
    if blank(&nrc.nrc_type) || !snapshot.has_nrc_type(&nrc.nrc_type) {
        errors.insert(key("Type"), "Select NRC type.".to_string());
    }
    if !validate_nrc_number(&nrc.number) {
        errors.insert(key("Number"), "Enter 6-digit NRC number.".to_string());
    }
}

/// Region, district and township must form a path of the township tree.
fn check_address(
    errors: &mut FieldErrors,
    prefix: &str,
    address: &AddressInput,
    snapshot: &ReferenceSnapshot,
    require_ward: bool,
) {
    if blank(&address.region) || snapshot.districts(&address.region).is_empty() {
        errors.insert(format!("{}Region", prefix), "Select region.".to_string());
    }
    if blank(&address.district)
        || !snapshot
            .districts(&address.region)
            .iter()
            .any(|d| d == &address.district)
    {
        errors.insert(format!("{}District", prefix), "Select district.".to_string());
    }
    if blank(&address.township)
        || !snapshot.has_address(&address.region, &address.district, &address.township)
    {
        errors.insert(format!("{}Township", prefix), "Select township.".to_string());
    }
    if require_ward && blank(&address.ward) {
        errors.insert(format!("{}Ward", prefix), "Ward is required.".to_string());
    }
}

/// Day of month of the service start date, else the installation date.
/// Only derived once a billing cycle is chosen.
pub fn billing_day(form: &CustomerOnboardingForm) -> Option<u32> {
    if blank(&form.billing_cycle) {
        return None;
    }
    let base = if blank(&form.service_start_date) {
        &form.installation_date
    } else {
        &form.service_start_date
    };
    parse_date_prefix(base).map(|date| date.day())
}

fn find_plan<'a>(plans: &'a [Plan], code: &str) -> Option<&'a Plan> {
    plans
        .iter()
        .find(|plan| plan.is_active && plan.plan_code == code.trim())
}

/// Every problem of the form at once, keyed by form field.
pub fn validate_customer_form(
    form: &CustomerOnboardingForm,
    snapshot: &ReferenceSnapshot,
    plans: &[Plan],
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if form.customer_type.is_none() {
        errors.insert("customerType".into(), "Select customer type.".into());
    }
    if form.user_status.is_none() {
        errors.insert("userStatus".into(), "Select status.".into());
    }

    match form.customer_type {
        Some(CustomerType::Individual) => {
            if blank(&form.name) {
                errors.insert("individualName".into(), "Customer name is required.".into());
            }
            check_nrc(&mut errors, "", &form.nrc, snapshot);
        }
        Some(CustomerType::Business) => {
            if blank(&form.company_name) {
                errors.insert("companyName".into(), "Company name is required.".into());
            }
            if blank(&form.business_reg_no) {
                errors.insert(
                    "businessRegNo".into(),
                    "Registration number is required.".into(),
                );
            }
            if blank(&form.tax_id) {
                errors.insert("taxId".into(), "Tax ID is required.".into());
            }
            if blank(&form.contact_person) {
                errors.insert("contactPerson".into(), "Contact person is required.".into());
            }
            check_nrc(&mut errors, "contact", &form.contact_nrc, snapshot);
        }
        None => {}
    }

    if !validate_phone(&form.primary_phone) {
        errors.insert("primaryPhone".into(), "Enter 6-11 digits.".into());
    }
    let email = form.contact_email.as_deref().unwrap_or_default();
    if !blank(email) {
        if let Err(e) = form.validate() {
            errors.extend(field_errors(&e));
        }
    }

    check_address(&mut errors, "installation", &form.installation, snapshot, true);
    if !form.billing_same_as_installation {
        check_address(&mut errors, "billing", &form.billing, snapshot, true);
    }

    match find_plan(plans, &form.plan_code) {
        Some(plan) => {
            let bandwidth_missing = blank(&form.bandwidth_plan)
                && plan.bandwidth_plan.as_deref().map_or(true, blank);
            if bandwidth_missing {
                errors.insert("bandwidthPlan".into(), "Select bandwidth.".into());
            }
        }
        None => {
            errors.insert("packageName".into(), "Select package plan.".into());
            if blank(&form.bandwidth_plan) {
                errors.insert("bandwidthPlan".into(), "Select bandwidth.".into());
            }
        }
    }

    let dates = [
        ("serviceStartDate", &form.service_start_date, "Select service start date."),
        ("contractStartDate", &form.contract_start_date, "Select contract start date."),
        ("contractEndDate", &form.contract_end_date, "Select contract end date."),
        ("installationDate", &form.installation_date, "Select installation date."),
    ];
    for (field, value, message) in dates {
        if parse_date_prefix(value).is_none() {
            errors.insert(field.into(), message.into());
        }
    }

    if !BILLING_CYCLES.contains(&form.billing_cycle.as_str()) {
        errors.insert("billingCycle".into(), "Select billing cycle.".into());
    }
    if form.billing_cycle == "Custom" && blank(&form.custom_billing_months) {
        errors.insert("customBillingMonths".into(), "Enter custom cycle.".into());
    }
    if billing_day(form).is_none() {
        errors.insert("billingDay".into(), "Billing day is required.".into());
    }
    if blank(&form.installation_fee) {
        errors.insert("installationFee".into(), "Installation fee is required.".into());
    }
    if form.discount_applied {
        if blank(&form.discount_amount) {
            errors.insert("discountAmount".into(), "Enter discount amount.".into());
        }
        if blank(&form.discount_period) {
            errors.insert("discountPeriod".into(), "Enter discount period.".into());
        }
    }

    errors
}

/// Validates the form and assembles the remote create body.
pub fn build_customer_payload(
    form: &CustomerOnboardingForm,
    snapshot: &ReferenceSnapshot,
    plans: &[Plan],
) -> AppResult<CustomerPayload> {
    let errors = validate_customer_form(form, snapshot, plans);
    let (Some(customer_type), Some(user_status), Some(plan), Some(day), true) = (
        form.customer_type,
        form.user_status,
        find_plan(plans, &form.plan_code),
        billing_day(form),
        errors.is_empty(),
    ) else {
        return Err(AppError::Validation(errors));
    };

    let installation = format_address(&form.installation);
    let installation_map_link = form.installation.map_link.trim().to_string();
    let (billing, billing_map_link) = if form.billing_same_as_installation {
        (SAME_AS_INSTALLATION.to_string(), installation_map_link.clone())
    } else {
        (
            format_address(&form.billing),
            form.billing.map_link.trim().to_string(),
        )
    };

    let bandwidth_plan = if blank(&form.bandwidth_plan) {
        plan.bandwidth_plan.clone().unwrap_or_default()
    } else {
        form.bandwidth_plan.trim().to_string()
    };

    Ok(CustomerPayload {
        customer_type,
        user_status,
        personal_information: (customer_type == CustomerType::Individual).then(|| {
            PersonalInformation {
                name: form.name.trim().to_string(),
                nrc: format_nrc(&form.nrc),
            }
        }),
        business_information: (customer_type == CustomerType::Business).then(|| {
            BusinessInformation {
                company_name: form.company_name.trim().to_string(),
                business_registration_number: form.business_reg_no.trim().to_string(),
                tax_identification_number: form.tax_id.trim().to_string(),
                authorized_contact_person: form.contact_person.trim().to_string(),
                contact_nrc: format_nrc(&form.contact_nrc),
            }
        }),
        contact_information: ContactInformation {
            primary_phone: form.primary_phone.trim().to_string(),
            secondary_phone: form.secondary_phone.trim().to_string(),
            email: form
                .contact_email
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        },
        address_information: AddressInformation {
            installation,
            installation_map_link,
            billing,
            billing_map_link,
        },
        services: ServiceInformation {
            service_id: form.service_id.clone(),
            service_type: form.service_type.clone(),
            package_name: plan.plan_name.clone(),
            bandwidth_plan,
            service_start_date: form.service_start_date.clone(),
            contract_start_date: form.contract_start_date.clone(),
            contract_end_date: form.contract_end_date.clone(),
            installation_date: form.installation_date.clone(),
            ip_type: form.ip_type.clone(),
            static_ip_address: form.static_ip_address.clone(),
        },
        network_technical: NetworkTechnical {
            router_id: form.router_id.clone(),
            mac_address: form.mac_address.clone(),
            onu_serial: form.onu_serial.clone(),
            vlan_port: form.vlan_port.clone(),
            network_zone: form.network_zone.clone(),
        },
        billing_information: BillingInformation {
            billing_cycle: form.billing_cycle.clone(),
            custom_billing_months: if form.billing_cycle == "Custom" {
                form.custom_billing_months.clone()
            } else {
                String::new()
            },
            billing_day: day,
            currency: ONBOARDING_CURRENCY.to_string(),
            monthly_subscription_fee: plan.monthly_fee,
            installation_fee: parse_decimal(&form.installation_fee),
            additional_fees: parse_decimal(&form.additional_fees),
            discount_applied: if form.discount_applied { "yes" } else { "no" }.to_string(),
            discount_amount: if form.discount_applied {
                parse_decimal(&form.discount_amount)
            } else {
                Decimal::ZERO
            },
            discount_period: if form.discount_applied {
                form.discount_period.clone()
            } else {
                String::new()
            },
        },
    })
}

fn nrc_started(nrc: &NrcInput) -> bool {
    [&nrc.state, &nrc.township, &nrc.nrc_type, &nrc.number]
        .iter()
        .any(|part| !blank(part))
}

fn address_started(address: &AddressInput) -> bool {
    !blank(&address.region) || !blank(&address.district) || !blank(&address.township)
}

/// NRC and address are optional for collectors, but checked in full once started.
pub fn build_collector_payload(
    form: &CollectorForm,
    snapshot: &ReferenceSnapshot,
) -> AppResult<CollectorPayload> {
    let mut errors = FieldErrors::new();
    let email = form.email.as_deref().map(str::trim).unwrap_or_default();

    if let Err(e) = form.validate() {
        let mut found = field_errors(&e);
        if email.is_empty() {
            found.remove("email");
        }
        errors.extend(found);
    }
    if blank(&form.name) {
        errors.insert("name".into(), "Full name is required.".into());
    }
    if !validate_phone(&form.phone) {
        errors.insert("phone".into(), "Enter 6-11 digits.".into());
    }
    if nrc_started(&form.nrc) {
        check_nrc(&mut errors, "", &form.nrc, snapshot);
    }
    if address_started(&form.address) {
        check_address(&mut errors, "address", &form.address, snapshot, false);
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let area = [&form.address.township, &form.address.district, &form.area]
        .into_iter()
        .map(|part| part.trim())
        .find(|part| !part.is_empty())
        .unwrap_or_default()
        .to_string();

    Ok(CollectorPayload {
        name: form.name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        email: email.to_string(),
        area,
        status: form.status,
        nrc: format_nrc(&form.nrc),
        address: format_address(&form.address),
    })
}

pub struct OnboardingService {
    store: Arc<dyn RecordStore>,
    reference: Arc<ReferenceService>,
}

impl OnboardingService {
    pub fn new(store: Arc<dyn RecordStore>, reference: Arc<ReferenceService>) -> Self {
        Self { store, reference }
    }

    pub async fn create_customer(&self, form: &CustomerOnboardingForm) -> AppResult<Customer> {
        let (snapshot, plans) = tokio::try_join!(self.reference.snapshot(), self.store.list_plans())?;
        let payload = build_customer_payload(form, &snapshot, &plans)?;
        let customer = self.store.create_customer(&payload).await?;
        tracing::info!(
            customer_id = %customer.id,
            name = %payload.display_name(),
            "Customer onboarded"
        );
        Ok(customer)
    }

    pub async fn create_collector(&self, form: &CollectorForm) -> AppResult<Collector> {
        let snapshot = self.reference.snapshot().await?;
        let payload = build_collector_payload(form, &snapshot)?;
        let collector = self.store.create_collector(&payload).await?;
        tracing::info!(collector_id = %collector.id, name = %collector.name, "Collector created");
        Ok(collector)
    }

    pub async fn update_collector(&self, id: &str, form: &CollectorForm) -> AppResult<Collector> {
        let snapshot = self.reference.snapshot().await?;
        let payload = build_collector_payload(form, &snapshot)?;
        let existing = self.store.get_collector(id).await?;
        let collector = self.store.update_collector(&existing.id, &payload).await?;
        tracing::info!(collector_id = %collector.id, "Collector updated");
        Ok(collector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountStatus, NrcData, TownshipTree};
    use serde_json::json;

    fn snapshot() -> ReferenceSnapshot {
        let nrc: NrcData = serde_json::from_value(json!({
            "nrcStates": [{"number": {"en": "12"}, "name": {"en": "Yangon"}}],
            "nrcTownships": [{"stateCode": "12", "short": {"en": "KaMaYa"}, "name": {"en": "Kamayut"}}],
            "nrcTypes": [{"name": {"en": "N"}}]
        }))
        .unwrap();
        let townships: TownshipTree = serde_json::from_value(json!({
            "Yangon": {"Yangon West": ["Kamayut", "Sanchaung"]}
        }))
        .unwrap();
        ReferenceSnapshot { nrc, townships }
    }

    fn plans() -> Vec<Plan> {
        vec![
            Plan {
                id: "1".into(),
                plan_code: "FIBER-50".into(),
                plan_name: "Fiber 50".into(),
                bandwidth_plan: Some("50 Mbps".into()),
                monthly_fee: Decimal::new(35000, 0),
                currency: "MMK".into(),
                is_active: true,
            },
            Plan {
                id: "2".into(),
                plan_code: "LEGACY".into(),
                plan_name: "Legacy".into(),
                bandwidth_plan: None,
                monthly_fee: Decimal::new(10000, 0),
                currency: "MMK".into(),
                is_active: false,
            },
        ]
    }

    fn individual_form() -> CustomerOnboardingForm {
        serde_json::from_value(json!({
            "customerType": "individual",
            "userStatus": "enable",
            "name": "Aung Aung",
            "nrc": {"state": "12", "township": "KaMaYa", "type": "N", "number": "123456"},
            "primaryPhone": "09123456",
            "installation": {
                "region": "Yangon", "district": "Yangon West", "township": "Kamayut",
                "ward": "Ward 3", "street": "Hledan Road", "building": "No. 12",
                "mapLink": " https://maps.example/abc "
            },
            "planCode": "FIBER-50",
            "serviceStartDate": "2024-03-07",
            "contractStartDate": "2024-03-01",
            "contractEndDate": "2025-03-01",
            "installationDate": "2024-03-05",
            "billingCycle": "Monthly",
            "installationFee": "50000",
            "additionalFees": "abc"
        }))
        .unwrap()
    }

    #[test]
    fn test_billing_day_prefers_service_start() {
        let mut form = individual_form();
        assert_eq!(billing_day(&form), Some(7));
        form.service_start_date.clear();
        assert_eq!(billing_day(&form), Some(5));
        form.billing_cycle.clear();
        assert_eq!(billing_day(&form), None);
    }

    #[test]
    fn test_individual_payload() {
        let payload = build_customer_payload(&individual_form(), &snapshot(), &plans()).unwrap();
        let personal = payload.personal_information.clone().unwrap();
        assert_eq!(personal.nrc, "12/KaMaYa(N)123456");
        assert!(payload.business_information.is_none());
        assert_eq!(
            payload.address_information.installation,
            "No. 12, Hledan Road, Ward 3, Kamayut, Yangon West, Yangon"
        );
        assert_eq!(payload.address_information.billing, "Same as installation");
        assert_eq!(
            payload.address_information.billing_map_link,
            "https://maps.example/abc"
        );
        assert_eq!(payload.services.package_name, "Fiber 50");
        assert_eq!(payload.services.bandwidth_plan, "50 Mbps");

        let billing = &payload.billing_information;
        assert_eq!(billing.billing_day, 7);
        assert_eq!(billing.currency, "MMK");
        assert_eq!(billing.monthly_subscription_fee, Decimal::new(35000, 0));
        assert_eq!(billing.installation_fee, Decimal::new(50000, 0));
        assert_eq!(billing.additional_fees, Decimal::ZERO);
        assert_eq!(billing.discount_applied, "no");
        assert_eq!(billing.discount_amount, Decimal::ZERO);
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = build_customer_payload(&individual_form(), &snapshot(), &plans()).unwrap();
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body["customerType"], "individual");
        assert_eq!(body["userStatus"], "enable");
        assert_eq!(body["businessInformation"], serde_json::Value::Null);
        assert_eq!(body["billingInformation"]["monthlySubscriptionFee"], 35000.0);
    }

    #[test]
    fn test_discount_fields_zeroed_unless_applied() {
        let mut form = individual_form();
        form.discount_amount = "5000".into();
        form.discount_period = "3 months".into();
        let payload = build_customer_payload(&form, &snapshot(), &plans()).unwrap();
        assert_eq!(payload.billing_information.discount_amount, Decimal::ZERO);
        assert_eq!(payload.billing_information.discount_period, "");

        form.discount_applied = true;
        let payload = build_customer_payload(&form, &snapshot(), &plans()).unwrap();
        assert_eq!(payload.billing_information.discount_applied, "yes");
        assert_eq!(payload.billing_information.discount_amount, Decimal::new(5000, 0));
    }

    #[test]
    fn test_empty_form_collects_every_error() {
        let form: CustomerOnboardingForm = serde_json::from_value(json!({})).unwrap();
        let errors = validate_customer_form(&form, &snapshot(), &plans());
        for field in [
            "customerType",
            "userStatus",
            "primaryPhone",
            "installationRegion",
            "installationDistrict",
            "installationTownship",
            "installationWard",
            "packageName",
            "bandwidthPlan",
            "serviceStartDate",
            "contractStartDate",
            "contractEndDate",
            "installationDate",
            "billingCycle",
            "billingDay",
            "installationFee",
        ] {
            assert!(errors.contains_key(field), "missing {}", field);
        }
        assert!(!errors.contains_key("billingRegion"));
    }

    #[test]
    fn test_business_requires_contact_nrc() {
        let mut form = individual_form();
        form.customer_type = Some(CustomerType::Business);
        form.contact_nrc = NrcInput {
            state: "12".into(),
            township: "LaMaNa".into(),
            nrc_type: "N".into(),
            number: "12345".into(),
        };
        let errors = validate_customer_form(&form, &snapshot(), &plans());
        assert_eq!(errors["companyName"], "Company name is required.");
        assert_eq!(errors["contactNrcTownship"], "Select NRC township.");
        assert_eq!(errors["contactNrcNumber"], "Enter 6-digit NRC number.");
        assert!(!errors.contains_key("nrcState"));
    }

    #[test]
    fn test_inactive_plan_rejected() {
        let mut form = individual_form();
        form.plan_code = "LEGACY".into();
        let errors = validate_customer_form(&form, &snapshot(), &plans());
        assert_eq!(errors["packageName"], "Select package plan.");
    }

    #[test]
    fn test_unknown_township_and_custom_cycle() {
        let mut form = individual_form();
        form.installation.township = "Hlaing".into();
        form.billing_cycle = "Custom".into();
        form.contact_email = Some("not-an-email".into());
        let errors = validate_customer_form(&form, &snapshot(), &plans());
        assert_eq!(errors["installationTownship"], "Select township.");
        assert_eq!(errors["customBillingMonths"], "Enter custom cycle.");
        assert_eq!(errors["contactEmail"], "Enter a valid email address.");
    }

    #[test]
    fn test_billing_address_checked_when_separate() {
        let mut form = individual_form();
        form.billing_same_as_installation = false;
        let err = build_customer_payload(&form, &snapshot(), &plans()).unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields["billingRegion"], "Select region.");
                assert_eq!(fields["billingWard"], "Ward is required.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    fn collector_form() -> CollectorForm {
        serde_json::from_value(json!({
            "name": "Ko Min",
            "phone": "0977777777",
            "email": "",
            "area": "Downtown",
            "status": "enable",
            "address": {"region": "Yangon", "district": "Yangon West", "township": "Sanchaung", "ward": "5"}
        }))
        .unwrap()
    }

    #[test]
    fn test_collector_area_prefers_township() {
        let payload = build_collector_payload(&collector_form(), &snapshot()).unwrap();
        assert_eq!(payload.area, "Sanchaung");
        assert_eq!(payload.email, "");
        assert_eq!(payload.nrc, "");
        assert_eq!(payload.address, "5, Sanchaung, Yangon West, Yangon");
        assert_eq!(payload.status, AccountStatus::Enable);
    }

    #[test]
    fn test_collector_without_address_keeps_area() {
        let mut form = collector_form();
        form.address = AddressInput::default();
        let payload = build_collector_payload(&form, &snapshot()).unwrap();
        assert_eq!(payload.area, "Downtown");
    }

    #[test]
    fn test_collector_partial_nrc_rejected() {
        let mut form = collector_form();
        form.name = " ".into();
        form.nrc.state = "12".into();
        form.email = Some("bad".into());
        let err = build_collector_payload(&form, &snapshot()).unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields["name"], "Full name is required.");
                assert_eq!(fields["email"], "Enter a valid email address.");
                assert_eq!(fields["nrcNumber"], "Enter 6-digit NRC number.");
                assert!(!fields.contains_key("nrcState"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_collector_through_store() {
        use crate::services::memory_store::MemoryStore;

        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("nrc-data.json"),
            r#"{"nrcStates": [], "nrcTownships": [], "nrcTypes": []}"#,
        )
        .await
        .unwrap();
        tokio::fs::write(
            dir.path().join("township.json"),
            r#"{"Yangon": {"Yangon West": ["Sanchaung"]}}"#,
        )
        .await
        .unwrap();

        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::seeded());
        let service = OnboardingService::new(
            store.clone(),
            Arc::new(ReferenceService::new(dir.path())),
        );
        let created = service.create_collector(&collector_form()).await.unwrap();
        assert_eq!(created.area, "Sanchaung");
        assert_eq!(store.list_collectors().await.unwrap().len(), 3);
    }
}
