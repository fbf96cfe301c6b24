//! HR notifications addressed to employees.

use serde_json::{json, Value};

use tradeerp_core::SoftDeletes;
use tradeerp_hr::{Employee, EmployeeSalaryHistory, EmployeeStatus};

use crate::notification::amount;
use crate::{MailMessage, Notification, NotificationContext, Recipient};

fn employee_path(e: &Employee) -> String {
    format!("/employees/{}", e.id)
}

#[derive(Debug, Clone)]
pub struct SalaryChanged {
    pub employee: Employee,
    pub history: EmployeeSalaryHistory,
}

impl SalaryChanged {
    pub fn new(employee: Employee, history: EmployeeSalaryHistory) -> Self {
        Self { employee, history }
    }

    /// "increased by 5.00%", or the plain new figure when there was no
    /// previous salary to compare against.
    fn change_phrase(&self) -> String {
        match self.history.percent_change() {
            Some(p) if p >= 0.0 => format!("increased by {p:.2}%"),
            Some(p) => format!("decreased by {:.2}%", p.abs()),
            None => format!("set to {}", amount(self.history.new_salary)),
        }
    }

    fn message(&self) -> String {
        format!(
            "Your salary has been {}, effective {}.",
            self.change_phrase(),
            self.history.effective_date
        )
    }
}

impl Notification for SalaryChanged {
    fn notification_type(&self) -> &'static str {
        "salary_changed"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        MailMessage::new()
            .subject("Salary Update")
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line(format!("Previous salary: {}", amount(self.history.previous_salary)))
            .line(format!("New salary: {}", amount(self.history.new_salary)))
            .line(format!("Reason: {}", self.history.reason))
            .action("View Compensation", ctx.url(&format!("{}/salary", employee_path(&self.employee))))
            .line("Reach out to HR with any questions.")
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        json!({
            "type": self.notification_type(),
            "employee_id": self.employee.id,
            "employee_name": self.employee.full_name(),
            "previous_salary": self.history.previous_salary,
            "new_salary": self.history.new_salary,
            "percent_change": self.history.percent_change().map(|p| (p * 100.0).round() / 100.0),
            "effective_date": self.history.effective_date,
            "message": self.message(),
            "action_url": ctx.url(&format!("{}/salary", employee_path(&self.employee))),
            "created_at": ctx.now,
        })
    }

    fn tags(&self) -> &'static [&'static str] {
        &["employee", "salary", "hr"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        !self.employee.is_trashed()
            && self.employee.status != EmployeeStatus::Terminated
            && self.history.employee_id == self.employee.id
    }
}

#[derive(Debug, Clone)]
pub struct EmployeeTerminated {
    pub employee: Employee,
}

impl EmployeeTerminated {
    pub fn new(employee: Employee) -> Self {
        Self { employee }
    }

    fn message(&self) -> String {
        match self.employee.termination_date {
            Some(date) => format!(
                "{}'s employment ends on {date}.",
                self.employee.full_name()
            ),
            None => format!("{}'s employment has ended.", self.employee.full_name()),
        }
    }
}

impl Notification for EmployeeTerminated {
    fn notification_type(&self) -> &'static str {
        "employee_terminated"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        let e = &self.employee;
        MailMessage::new()
            .subject(format!("Employment Ended: {}", e.full_name()))
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line(format!("Employee number: {}", e.employee_number))
            .line(format!("Department: {}", e.department))
            .line_if(e.termination_type.is_some(), || {
                format!(
                    "Termination type: {}",
                    e.termination_type.map(|t| t.as_str()).unwrap_or_default()
                )
            })
            .line_if(e.eligible_for_rehire.is_some(), || {
                format!(
                    "Eligible for rehire: {}",
                    if e.eligible_for_rehire == Some(true) { "yes" } else { "no" }
                )
            })
            .action("View Employee", ctx.url(&employee_path(e)))
            .line("Please complete the offboarding checklist.")
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        let e = &self.employee;
        json!({
            "type": self.notification_type(),
            "employee_id": e.id,
            "employee_name": e.full_name(),
            "employee_number": e.employee_number,
            "department": e.department,
            "termination_date": e.termination_date,
            "termination_type": e.termination_type,
            "eligible_for_rehire": e.eligible_for_rehire,
            "message": self.message(),
            "action_url": ctx.url(&employee_path(e)),
            "created_at": ctx.now,
        })
    }

    fn tags(&self) -> &'static [&'static str] {
        &["employee", "termination", "hr"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        !self.employee.is_trashed() && self.employee.status == EmployeeStatus::Terminated
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::fixtures::{ctx, employee, salary_history, user};
    use tradeerp_hr::TerminationType;

    #[test]
    fn raise_is_reported_as_a_percentage() {
        let n = SalaryChanged::new(employee(EmployeeStatus::Active), salary_history(50_000.0, 52_500.0));
        assert_eq!(
            n.to_array(&ctx())["message"],
            "Your salary has been increased by 5.00%, effective 2025-07-01."
        );
        assert_eq!(n.to_array(&ctx())["percent_change"], 5.0);

        let mail = n.to_mail(&user(), &ctx());
        assert!(mail.lines().any(|l| l == "New salary: 52500.00"));
    }

    #[test]
    fn cut_and_first_salary_read_naturally() {
        let cut = SalaryChanged::new(employee(EmployeeStatus::Active), salary_history(50_000.0, 45_000.0));
        assert!(cut.to_mail(&user(), &ctx()).lines().any(|l| l.contains("decreased by 10.00%")));

        let first = SalaryChanged::new(employee(EmployeeStatus::Active), salary_history(0.0, 40_000.0));
        assert!(first.to_mail(&user(), &ctx()).lines().any(|l| l.contains("set to 40000.00")));
        assert_eq!(first.to_array(&ctx())["percent_change"], Value::Null);
    }

    #[test]
    fn terminated_employees_get_no_salary_mail() {
        let n = SalaryChanged::new(employee(EmployeeStatus::Terminated), salary_history(1.0, 2.0));
        assert!(!n.should_send(&user()));
    }

    #[test]
    fn termination_lists_its_details() {
        let mut e = employee(EmployeeStatus::Terminated);
        e.termination_date = NaiveDate::from_ymd_opt(2025, 6, 30);
        e.termination_type = Some(TerminationType::Retirement);
        e.eligible_for_rehire = Some(false);
        let n = EmployeeTerminated::new(e);

        let mail = n.to_mail(&user(), &ctx());
        assert!(mail.lines().any(|l| l == "Termination type: retirement"));
        assert!(mail.lines().any(|l| l == "Eligible for rehire: no"));
        assert_eq!(n.to_array(&ctx())["message"], "Dana Reyes's employment ends on 2025-06-30.");
        assert!(n.should_send(&user()));

        assert!(!EmployeeTerminated::new(employee(EmployeeStatus::Active)).should_send(&user()));
    }
}
