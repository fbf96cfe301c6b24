use tradeerp_auth::Permission;
use tradeerp_validation::{DateRef, FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use crate::{AddressType, Customer, CustomerChanges, CustomerId, CustomerStatus, CustomerType, NewAddress, NewCustomer};

fn customer_messages() -> Messages {
    Messages::new()
        .with("email.unique", "A customer with this email address already exists.")
        .with("company_name.required_if", "The company name is required for business customers.")
        .with("date_of_birth.before_or_equal", "The date of birth cannot be in the future.")
}

pub struct CustomerStoreRequest;

impl FormRequest for CustomerStoreRequest {
    type Output = NewCustomer;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("customers.create"))
    }

    fn prepare(&self, input: &mut Input) {
        input.default("customer_type", CustomerType::Individual.as_str());
        input.default("status", CustomerStatus::Active.as_str());
        input.default("accepts_marketing", false);
        input.lowercase("customer_type");
        input.lowercase("email");
        input.coerce_bool("accepts_marketing");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("user_id", [Rule::Nullable, Rule::Integer, Rule::exists("users", "id")])
            .field("customer_type", [Rule::Required, Rule::In(CustomerType::VALUES)])
            .field("first_name", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("last_name", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field(
                "company_name",
                [Rule::RequiredIf("customer_type", &["business"]), Rule::Nullable, Rule::String, Rule::Max(255.0)],
            )
            .field(
                "email",
                [Rule::Required, Rule::Email, Rule::Max(255.0), Rule::unique("customers", "email")],
            )
            .field("phone", [Rule::Nullable, Rule::String, Rule::Max(30.0)])
            .field("date_of_birth", [Rule::Nullable, Rule::Date, Rule::BeforeOrEqual(DateRef::Today)])
            .field("tax_number", [Rule::Nullable, Rule::String, Rule::Max(50.0)])
            .field("status", [Rule::Required, Rule::In(CustomerStatus::VALUES)])
            .field("accepts_marketing", [Rule::Boolean])
            .field("notes", [Rule::Nullable, Rule::String, Rule::Max(2000.0)])
    }

    fn messages(&self) -> Messages {
        customer_messages()
    }
}

pub struct CustomerUpdateRequest {
    pub customer: Customer,
}

impl FormRequest for CustomerUpdateRequest {
    type Output = CustomerChanges;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("customers.update"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("customer_type");
        input.lowercase("email");
        input.coerce_bool("accepts_marketing");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("customer_type", [Rule::Sometimes, Rule::In(CustomerType::VALUES)])
            .field("first_name", [Rule::Sometimes, Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("last_name", [Rule::Sometimes, Rule::Required, Rule::String, Rule::Max(100.0)])
            .field(
                "company_name",
                [Rule::RequiredIf("customer_type", &["business"]), Rule::Nullable, Rule::String, Rule::Max(255.0)],
            )
            .field(
                "email",
                [
                    Rule::Sometimes,
                    Rule::Required,
                    Rule::Email,
                    Rule::Max(255.0),
                    Rule::unique_ignoring("customers", "email", self.customer.id.get()),
                ],
            )
            .field("phone", [Rule::Nullable, Rule::String, Rule::Max(30.0)])
            .field("date_of_birth", [Rule::Nullable, Rule::Date, Rule::BeforeOrEqual(DateRef::Today)])
            .field("tax_number", [Rule::Nullable, Rule::String, Rule::Max(50.0)])
            .field("status", [Rule::Sometimes, Rule::In(CustomerStatus::VALUES)])
            .field("accepts_marketing", [Rule::Sometimes, Rule::Boolean])
            .field("notes", [Rule::Nullable, Rule::String, Rule::Max(2000.0)])
    }

    fn messages(&self) -> Messages {
        customer_messages()
    }
}

pub struct StoreAddressRequest {
    pub customer_id: CustomerId,
}

impl FormRequest for StoreAddressRequest {
    type Output = NewAddress;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("customers.update"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("type");
        input.uppercase("country");
        input.default("is_default", false);
        input.coerce_bool("is_default");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("type", [Rule::Required, Rule::In(AddressType::VALUES)])
            .field("first_name", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("last_name", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("company", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("address_line_1", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field("address_line_2", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("city", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("state", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("postal_code", [Rule::Required, Rule::String, Rule::Max(20.0)])
            .field("country", [Rule::Required, Rule::String, Rule::Between(2.0, 2.0)])
            .field("phone", [Rule::Nullable, Rule::String, Rule::Max(30.0)])
            .field("is_default", [Rule::Boolean])
    }

    fn messages(&self) -> Messages {
        Messages::new().with("country.between", "The country must be a two-letter ISO code.")
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if errors.has("country") {
            return;
        }
        if let Some(country) = input.get_str("country") {
            if !country.bytes().all(|b| b.is_ascii_uppercase()) {
                errors.add("country", "The country must be a two-letter ISO code.");
            }
        }
    }
}
