use chrono::NaiveDate;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub status: Option<String>,
    pub permissions: Vec<String>,
}

#[derive(ToSchema)]
pub struct PayerRequest {
    pub payer_name: Option<String>,
    pub payer_id: Option<String>,
    pub signin_url: Option<String>,
    pub iam_username: Option<String>,
    pub password: Option<String>,
    pub contact_email: Option<String>,
    pub remarks: Option<String>,
}

#[derive(ToSchema)]
pub struct AccountRequest {
    pub uid: Option<String>,
    pub account_name: Option<String>,
    pub vendor: Option<String>,
    pub account_type: Option<String>,
    pub mfa_status: Option<String>,
    pub account_source: Option<String>,
    pub account_attribution: Option<String>,
    pub monitor_email: Option<String>,
    pub monitor_url: Option<String>,
    pub is_monitored_sp: Option<bool>,
    pub monitor_bill_group: Option<String>,
    pub send_po: Option<bool>,
    pub bound_credit_card: Option<String>,
    pub bound_email: Option<String>,
    pub risk_discount: Option<f64>,
    pub cost_discount: Option<f64>,
    pub bd_name: Option<String>,
    pub remarks: Option<String>,
    pub is_submitted: Option<bool>,
    pub is_new: Option<bool>,
    pub labels: Option<Vec<String>>,
    pub payer_id: Option<String>,
    pub customer_id: Option<String>,
    pub email_id: Option<String>,
    pub email_address: Option<String>,
}

#[derive(ToSchema)]
pub struct UidRequest {
    pub uid: Option<String>,
    pub uid_type: Option<String>,
    pub is_primary: Option<bool>,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct CustomerRequest {
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub payer_id: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub original_billing_percentage: Option<f64>,
    pub products_used: Option<Vec<String>>,
    pub delivery_time: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub labels: Option<Vec<String>>,
    pub remarks: Option<String>,
    pub uids: Option<Vec<UidRequest>>,
}

#[derive(ToSchema)]
pub struct EmailRequest {
    pub email_address: Option<String>,
    pub password: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub parent_email_id: Option<Uuid>,
    pub parent_email_address: Option<String>,
    pub credit_card_last4: Option<String>,
    pub is_sp_account: Option<bool>,
    pub payer_id: Option<String>,
    pub enable_forwarding: Option<bool>,
    pub status: Option<String>,
    pub labels: Option<Vec<String>>,
    pub remarks: Option<String>,
}

#[derive(ToSchema)]
pub struct CloudProviderRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct PartnerBdRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct CreditCardRequest {
    pub bank_name: Option<String>,
    pub holder_name: Option<String>,
    pub first_four_digits: Option<String>,
    pub last_four_digits: Option<String>,
    pub expiration_date: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct BillUpdateRequest {
    pub total_bill: Option<f64>,
    pub undiscounted_bill: Option<f64>,
    pub customer_payable_bill: Option<f64>,
    pub supplier_payable_bill: Option<f64>,
    pub profit: Option<f64>,
    pub remarks: Option<String>,
}

#[derive(ToSchema)]
pub struct LineItemRequest {
    pub product_id: Option<String>,
    pub label: Option<String>,
    pub quantity: Option<i32>,
    pub price: Option<f64>,
    pub discount_pct: Option<f64>,
    pub tax_pct: Option<f64>,
}

#[derive(ToSchema)]
pub struct InvoiceRequest {
    pub customer_monthly_bill_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub tax_number: Option<String>,
    pub payment_reference: Option<String>,
    pub activities: Option<Vec<String>>,
    pub terms: Option<String>,
    pub status: Option<String>,
    pub items: Option<Vec<LineItemRequest>>,
}

#[derive(ToSchema)]
pub struct DeleteInvoicesRequest { pub ids: Vec<Uuid> }

#[derive(ToSchema)]
pub struct PaymentRecordRequest {
    pub month: String,
    pub customer_name: String,
    pub received_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub last_payment_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(ToSchema)]
pub struct ArticleRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    /// comma separated
    pub categories: Option<String>,
    pub tags: Option<String>,
    pub keywords: Option<String>,
}

#[derive(ToSchema)]
pub struct ScheduleRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::users::list,
        crate::routes::users::create,
        crate::routes::payers::list,
        crate::routes::payers::get,
        crate::routes::payers::create,
        crate::routes::payers::update,
        crate::routes::accounts::list,
        crate::routes::accounts::sp_list,
        crate::routes::accounts::detail,
        crate::routes::accounts::add,
        crate::routes::accounts::update,
        crate::routes::customers::list,
        crate::routes::customers::get,
        crate::routes::customers::create,
        crate::routes::customers::update,
        crate::routes::emails::list,
        crate::routes::emails::get,
        crate::routes::emails::create,
        crate::routes::emails::update,
        crate::routes::basic_data::list_cloud_providers,
        crate::routes::basic_data::create_cloud_provider,
        crate::routes::basic_data::update_cloud_provider,
        crate::routes::basic_data::delete_cloud_provider,
        crate::routes::basic_data::list_partner_bds,
        crate::routes::basic_data::create_partner_bd,
        crate::routes::basic_data::update_partner_bd,
        crate::routes::basic_data::delete_partner_bd,
        crate::routes::basic_data::list_credit_cards,
        crate::routes::basic_data::create_credit_card,
        crate::routes::basic_data::update_credit_card,
        crate::routes::basic_data::delete_credit_card,
        crate::routes::operation_logs::list,
        crate::routes::billing::list_bills,
        crate::routes::billing::update_bill,
        crate::routes::billing::list_customer_invoices,
        crate::routes::invoices::list,
        crate::routes::invoices::get,
        crate::routes::invoices::create,
        crate::routes::invoices::update,
        crate::routes::invoices::delete,
        crate::routes::invoices::post,
        crate::routes::analysis::monthly,
        crate::routes::analysis::yearly,
        crate::routes::payments::overview,
        crate::routes::payments::record,
        crate::routes::knowledge::list,
        crate::routes::knowledge::get,
        crate::routes::knowledge::create,
        crate::routes::knowledge::update,
        crate::routes::knowledge::delete,
        crate::routes::calendar::list,
        crate::routes::calendar::create,
        crate::routes::calendar::update,
        crate::routes::calendar::delete,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            CreateUserRequest,
            PayerRequest,
            AccountRequest,
            UidRequest,
            CustomerRequest,
            EmailRequest,
            CloudProviderRequest,
            PartnerBdRequest,
            CreditCardRequest,
            BillUpdateRequest,
            LineItemRequest,
            InvoiceRequest,
            DeleteInvoicesRequest,
            PaymentRecordRequest,
            ArticleRequest,
            ScheduleRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "payers"),
        (name = "accounts"),
        (name = "customers"),
        (name = "emails"),
        (name = "basic-data"),
        (name = "operation-logs"),
        (name = "billing"),
        (name = "invoices"),
        (name = "analysis"),
        (name = "finance"),
        (name = "knowledge"),
        (name = "calendar")
    )
)]
pub struct ApiDoc;
