use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BillFlow API",
        version = "0.1.0",
        description = "Backend API for BillFlow - billing, collection and onboarding for internet service providers",
        contact(
            name = "BillFlow Team",
            email = "support@billflow.com"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "auth", description = "Sessions, profile and password recovery"),
        (name = "super-admin", description = "Super-admin sign-in"),
        (name = "customers", description = "Customer onboarding and management"),
        (name = "collectors", description = "Collectors and customer assignment"),
        (name = "bills", description = "Bills and bill status changes"),
        (name = "payments", description = "Payment log"),
        (name = "plans", description = "Service plan catalog"),
        (name = "dashboard", description = "Role dashboards and reports"),
        (name = "reference-data", description = "NRC and township lookup data")
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::logout,
        crate::api::auth::me,
        crate::api::auth::update_profile,
        crate::api::auth::change_password,
        crate::api::auth::reset_password,
        crate::api::auth::security_questions,
        crate::api::auth::security_question_reset,
        crate::api::password_reset::send_reset_link,
        crate::api::super_admin::login,
        // Customers
        crate::api::customers::list_customers,
        crate::api::customers::create_customer,
        crate::api::customers::get_customer,
        crate::api::customers::update_status,
        crate::api::customers::assign_collector,
        crate::api::customers::delete_customer,
        // Collectors
        crate::api::collectors::list_collectors,
        crate::api::collectors::create_collector,
        crate::api::collectors::update_collector,
        crate::api::collectors::update_status,
        crate::api::collectors::save_assignments,
        crate::api::collectors::delete_collector,
        // Bills & payments
        crate::api::bills::list_bills,
        crate::api::bills::update_status,
        crate::api::bills::generate_bills,
        crate::api::payments::list_payments,
        // Plans
        crate::api::plans::list_plans,
        crate::api::plans::create_plan,
        crate::api::plans::update_plan,
        // Dashboards
        crate::api::dashboards::admin_dashboard,
        crate::api::dashboards::reports,
        crate::api::dashboards::collector_dashboard,
        crate::api::dashboards::customer_dashboard,
        // Reference data
        crate::api::reference_data::read_nrc,
        crate::api::reference_data::write_nrc,
        crate::api::reference_data::read_township,
        crate::api::reference_data::write_township,
        crate::api::reference_data::regions,
        crate::api::reference_data::districts,
        crate::api::reference_data::townships,
        crate::api::reference_data::nrc_states,
        crate::api::reference_data::nrc_townships,
        crate::api::reference_data::nrc_types,
    ),
    components(
        schemas(
            // Auth
            crate::models::UserRole,
            crate::models::User,
            crate::models::CollectorProfile,
            crate::models::CustomerProfile,
            crate::models::LoginRequest,
            crate::models::LoginResponse,
            crate::models::UpdateProfileRequest,
            crate::models::ChangePasswordRequest,
            crate::models::SuperAdminLoginRequest,
            crate::models::ForgotPasswordRequest,
            crate::models::ResetLinkSent,
            crate::models::ResetPasswordRequest,
            crate::models::SecurityQuestionsRequest,
            crate::models::SecurityQuestion,
            crate::models::SecurityAnswer,
            crate::models::SecurityQuestionResetRequest,
            crate::models::ResetToken,
            crate::models::MessageResponse,
            crate::api::auth::SecurityQuestionsResponse,
            // Customers
            crate::models::Customer,
            crate::models::CustomerStatus,
            crate::models::CustomerType,
            crate::models::AccountStatus,
            crate::models::UpdateStatusRequest,
            crate::models::AssignCollectorRequest,
            crate::models::CustomerOnboardingForm,
            crate::models::NrcInput,
            crate::models::AddressInput,
            // Collectors
            crate::models::Collector,
            crate::models::CollectorForm,
            crate::models::CollectorPerformance,
            crate::models::CollectorWithStats,
            crate::models::CollectorListResponse,
            crate::models::AssignCustomersRequest,
            crate::models::AssignmentOutcome,
            // Bills
            crate::models::Bill,
            crate::models::BillView,
            crate::models::BillStatus,
            crate::models::PaymentMethod,
            crate::models::Payment,
            crate::models::UpdateBillStatusRequest,
            crate::models::BillStatusChange,
            crate::models::GenerateBillsRequest,
            // Plans
            crate::models::Plan,
            crate::models::PlanRequest,
            crate::models::Currency,
            crate::models::PlanStatus,
            // Dashboards
            crate::models::BillSummary,
            crate::models::AdminDashboard,
            crate::models::Report,
            crate::models::PackageBreakdown,
            crate::models::AssignedCustomer,
            crate::models::CollectorDashboard,
            crate::models::CustomerDashboard,
            // Reference data
            crate::models::RawDocument,
            crate::models::WriteDocumentRequest,
            crate::models::SelectOption,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
