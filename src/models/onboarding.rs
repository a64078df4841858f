use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{AccountStatus, CustomerType};

/// The four NRC select/input values as the form holds them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NrcInput {
    pub state: String,
    pub township: String,
    #[serde(rename = "type")]
    pub nrc_type: String,
    pub number: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressInput {
    pub region: String,
    pub district: String,
    pub township: String,
    pub city: String,
    pub ward: String,
    pub postal_code: String,
    pub street: String,
    pub building: String,
    pub map_link: String,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOnboardingForm {
    pub customer_type: Option<CustomerType>,
    pub user_status: Option<AccountStatus>,

    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nrc: NrcInput,

    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub business_reg_no: String,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub contact_nrc: NrcInput,

    #[serde(default)]
    pub primary_phone: String,
    #[serde(default)]
    pub secondary_phone: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub contact_email: Option<String>,

    #[serde(default)]
    pub installation: AddressInput,
    #[serde(default = "yes")]
    pub billing_same_as_installation: bool,
    #[serde(default)]
    pub billing: AddressInput,

    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub service_type: String,
    /// Plan code chosen in the package select.
    #[serde(default)]
    pub plan_code: String,
    #[serde(default)]
    pub bandwidth_plan: String,
    #[serde(default)]
    pub service_start_date: String,
    #[serde(default)]
    pub contract_start_date: String,
    #[serde(default)]
    pub contract_end_date: String,
    #[serde(default)]
    pub installation_date: String,
    #[serde(default)]
    pub ip_type: String,
    #[serde(default)]
    pub static_ip_address: String,

    #[serde(default)]
    pub router_id: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub onu_serial: String,
    #[serde(default)]
    pub vlan_port: String,
    #[serde(default)]
    pub network_zone: String,

    #[serde(default)]
    pub billing_cycle: String,
    #[serde(default)]
    pub custom_billing_months: String,
    #[serde(default)]
    pub installation_fee: String,
    #[serde(default)]
    pub additional_fees: String,
    #[serde(default)]
    pub discount_applied: bool,
    #[serde(default)]
    pub discount_amount: String,
    #[serde(default)]
    pub discount_period: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectorForm {
    #[validate(length(min = 1, message = "Full name is required."))]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub nrc: NrcInput,
    #[serde(default)]
    pub address: AddressInput,
}

// Payloads sent to the remote API. Field names follow its JSON contract.

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInformation {
    pub name: String,
    pub nrc: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInformation {
    pub company_name: String,
    pub business_registration_number: String,
    pub tax_identification_number: String,
    pub authorized_contact_person: String,
    pub contact_nrc: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactInformation {
    pub primary_phone: String,
    pub secondary_phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressInformation {
    pub installation: String,
    pub installation_map_link: String,
    pub billing: String,
    pub billing_map_link: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInformation {
    pub service_id: String,
    pub service_type: String,
    pub package_name: String,
    pub bandwidth_plan: String,
    pub service_start_date: String,
    pub contract_start_date: String,
    pub contract_end_date: String,
    pub installation_date: String,
    pub ip_type: String,
    pub static_ip_address: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkTechnical {
    pub router_id: String,
    pub mac_address: String,
    pub onu_serial: String,
    pub vlan_port: String,
    pub network_zone: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillingInformation {
    pub billing_cycle: String,
    pub custom_billing_months: String,
    pub billing_day: u32,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_subscription_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub installation_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub additional_fees: Decimal,
    /// `yes` or `no`
    pub discount_applied: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    pub discount_period: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    pub customer_type: CustomerType,
    pub user_status: AccountStatus,
    pub personal_information: Option<PersonalInformation>,
    pub business_information: Option<BusinessInformation>,
    pub contact_information: ContactInformation,
    pub address_information: AddressInformation,
    pub services: ServiceInformation,
    pub network_technical: NetworkTechnical,
    pub billing_information: BillingInformation,
}

impl CustomerPayload {
    pub fn display_name(&self) -> String {
        match (&self.personal_information, &self.business_information) {
            (Some(personal), _) => personal.name.clone(),
            (None, Some(business)) => business.company_name.clone(),
            (None, None) => "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectorPayload {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub area: String,
    pub status: AccountStatus,
    pub nrc: String,
    pub address: String,
}
