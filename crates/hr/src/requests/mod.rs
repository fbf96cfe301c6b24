//! Form requests for employee records.

use chrono::NaiveDate;

use tradeerp_auth::Permission;
use tradeerp_core::{Lifecycle, SortDirection};
use tradeerp_validation::{DateRef, FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use crate::{
    Employee, EmployeeChanges, EmployeeSearch, EmployeeSortField, EmployeeStatus, EmploymentType,
    NewEmployee, SalaryChange, Termination, TerminationType,
};

fn employee_messages() -> Messages {
    Messages::new()
        .with("email.unique", "An employee with this email address already exists.")
        .with("employee_number.unique", "This employee number is already assigned.")
        .with("hire_date.before_or_equal", "The hire date cannot be in the future.")
}

pub struct StoreEmployeeRequest;

impl FormRequest for StoreEmployeeRequest {
    type Output = NewEmployee;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("employees.create"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("email");
        input.uppercase("employee_number");
        input.lowercase("employment_type");
        input.default("employment_type", EmploymentType::FullTime.as_str());
        input.default("status", EmployeeStatus::Active.as_str());
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("user_id", [Rule::Nullable, Rule::Integer, Rule::exists("users", "id")])
            .field(
                "employee_number",
                [Rule::Required, Rule::String, Rule::Max(50.0), Rule::unique("employees", "employee_number")],
            )
            .field("first_name", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("last_name", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("email", [Rule::Required, Rule::Email, Rule::Max(255.0), Rule::unique("employees", "email")])
            .field("phone", [Rule::Nullable, Rule::String, Rule::Max(30.0)])
            .field("date_of_birth", [Rule::Nullable, Rule::Date, Rule::BeforeOrEqual(DateRef::Today)])
            .field("department", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("position", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("manager_id", [Rule::Nullable, Rule::Integer, Rule::exists("employees", "id")])
            .field("employment_type", [Rule::Required, Rule::In(EmploymentType::VALUES)])
            .field("status", [Rule::Required, Rule::In(&["active", "on_leave"])])
            .field("hire_date", [Rule::Required, Rule::Date, Rule::BeforeOrEqual(DateRef::Today)])
            .field("salary", [Rule::Required, Rule::Numeric, Rule::Min(0.0)])
    }

    fn messages(&self) -> Messages {
        employee_messages()
    }
}

pub struct UpdateEmployeeRequest {
    pub employee: Employee,
}

impl FormRequest for UpdateEmployeeRequest {
    type Output = EmployeeChanges;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("employees.update"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("email");
        input.lowercase("status");
        input.lowercase("employment_type");
    }

    fn rules(&self) -> Rules {
        let id = self.employee.id.get();
        Rules::new()
            .field("first_name", [Rule::Sometimes, Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("last_name", [Rule::Sometimes, Rule::Required, Rule::String, Rule::Max(100.0)])
            .field(
                "email",
                [Rule::Sometimes, Rule::Required, Rule::Email, Rule::unique_ignoring("employees", "email", id)],
            )
            .field("phone", [Rule::Nullable, Rule::String, Rule::Max(30.0)])
            .field("department", [Rule::Sometimes, Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("position", [Rule::Sometimes, Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("manager_id", [Rule::Nullable, Rule::Integer, Rule::exists("employees", "id")])
            .field("employment_type", [Rule::Sometimes, Rule::In(EmploymentType::VALUES)])
            .field("status", [Rule::Sometimes, Rule::In(&["active", "on_leave", "suspended"])])
    }

    fn messages(&self) -> Messages {
        employee_messages().with(
            "status.in",
            "Use the termination endpoint to terminate an employee.",
        )
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if !errors.has("manager_id")
            && input.get_f64("manager_id").is_some_and(|m| m as i64 == self.employee.id.get())
        {
            errors.add("manager_id", "An employee cannot be their own manager.");
        }
        if errors.has("status") {
            return;
        }
        let Some(target) = input.get_str("status").and_then(|s| s.parse::<EmployeeStatus>().ok()) else {
            return;
        };
        let current = self.employee.status;
        if target != current && !current.can_transition_to(target) {
            errors.add(
                "status",
                format!(
                    "Cannot change employee status from {} to {}.",
                    current.as_str(),
                    target.as_str()
                ),
            );
        }
    }
}

pub struct UpdateEmployeeSalaryRequest {
    pub employee: Employee,
}

impl FormRequest for UpdateEmployeeSalaryRequest {
    type Output = SalaryChange;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("employees.update_salary"))
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("salary", [Rule::Required, Rule::Numeric, Rule::Min(0.0)])
            .field("effective_date", [Rule::Required, Rule::Date, Rule::AfterOrEqual(DateRef::Today)])
            .field("reason", [Rule::Required, Rule::String, Rule::Max(500.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("effective_date.after_or_equal", "Salary changes cannot be backdated.")
            .with("reason.required", "Please give a reason for the salary change.")
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if self.employee.status == EmployeeStatus::Terminated {
            errors.add("salary", "The salary of a terminated employee cannot be changed.");
            return;
        }
        if !errors.has("salary") && input.get_f64("salary") == Some(self.employee.salary) {
            errors.add("salary", "The new salary must differ from the current salary.");
        }
    }
}

pub struct TerminateEmployeeRequest {
    pub employee: Employee,
}

impl FormRequest for TerminateEmployeeRequest {
    type Output = Termination;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("employees.terminate"))
    }

    fn forbidden_message(&self) -> &'static str {
        "You are not authorized to terminate employees."
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("termination_type");
        input.default("eligible_for_rehire", false);
        input.coerce_bool("eligible_for_rehire");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("termination_date", [Rule::Required, Rule::Date])
            .field("termination_type", [Rule::Required, Rule::In(TerminationType::VALUES)])
            .field("reason", [Rule::Required, Rule::String, Rule::Max(1000.0)])
            .field("eligible_for_rehire", [Rule::Boolean])
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if self.employee.status == EmployeeStatus::Terminated {
            errors.add("employee", "This employee has already been terminated.");
            return;
        }
        if errors.has("termination_date") {
            return;
        }
        let date = input
            .get_str("termination_date")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        if date.is_some_and(|d| d < self.employee.hire_date) {
            errors.add(
                "termination_date",
                format!(
                    "The termination date cannot be before the hire date ({}).",
                    self.employee.hire_date
                ),
            );
        }
    }
}

pub struct SearchEmployeeRequest;

impl FormRequest for SearchEmployeeRequest {
    type Output = EmployeeSearch;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("employees.view"))
    }

    fn prepare(&self, input: &mut Input) {
        input.default("per_page", tradeerp_core::PageRequest::DEFAULT_PER_PAGE);
        input.default("page", 1);
        input.default("sort_by", EmployeeSortField::LastName.as_str());
        input.default("sort_direction", SortDirection::Asc.as_str());
        input.lowercase("sort_direction");
        input.lowercase("status");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("q", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("department", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("status", [Rule::Nullable, Rule::In(EmployeeStatus::VALUES)])
            .field("employment_type", [Rule::Nullable, Rule::In(EmploymentType::VALUES)])
            .field("manager_id", [Rule::Nullable, Rule::Integer])
            .field("hired_from", [Rule::Nullable, Rule::Date])
            .field("hired_to", [Rule::Nullable, Rule::Date, Rule::AfterOrEqual(DateRef::Field("hired_from"))])
            .field("sort_by", [Rule::In(EmployeeSortField::VALUES)])
            .field("sort_direction", [Rule::In(SortDirection::VALUES)])
            .field("per_page", [Rule::Integer, Rule::Between(1.0, 100.0)])
            .field("page", [Rule::Integer, Rule::Between(1.0, f64::from(u32::MAX))])
    }
}
