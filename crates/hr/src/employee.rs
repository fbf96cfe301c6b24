use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{
    record_id, string_enum, DomainError, DomainResult, Entity, Lifecycle, Page, PageRequest,
    SoftDeletes, SortDirection, StatusChange, Timestamps,
};

record_id!(
    /// Key of an `employees` row.
    EmployeeId
);
record_id!(EmployeeSalaryHistoryId);

string_enum! {
    pub enum EmploymentType {
        FullTime => "full_time",
        PartTime => "part_time",
        Contract => "contract",
        Intern => "intern",
    }
}

string_enum! {
    pub enum EmployeeStatus {
        Active => "active",
        OnLeave => "on_leave",
        Suspended => "suspended",
        Terminated => "terminated",
    }
}

impl Lifecycle for EmployeeStatus {
    fn allowed_transitions(&self) -> &'static [Self] {
        use EmployeeStatus::*;
        match self {
            Active => &[OnLeave, Suspended, Terminated],
            OnLeave => &[Active, Terminated],
            Suspended => &[Active, Terminated],
            Terminated => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        EmployeeStatus::as_str(self)
    }
}

string_enum! {
    pub enum TerminationType {
        Voluntary => "voluntary",
        Involuntary => "involuntary",
        Retirement => "retirement",
        EndOfContract => "end_of_contract",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub user_id: Option<i64>,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub department: String,
    pub position: String,
    pub manager_id: Option<EmployeeId>,
    pub employment_type: EmploymentType,
    pub status: EmployeeStatus,
    pub hire_date: NaiveDate,
    pub salary: f64,
    pub termination_date: Option<NaiveDate>,
    pub termination_type: Option<TerminationType>,
    pub termination_reason: Option<String>,
    pub eligible_for_rehire: Option<bool>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewEmployee {
    pub user_id: Option<i64>,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub department: String,
    pub position: String,
    pub manager_id: Option<EmployeeId>,
    pub employment_type: EmploymentType,
    pub status: EmployeeStatus,
    pub hire_date: NaiveDate,
    pub salary: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmployeeChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub manager_id: Option<EmployeeId>,
    pub employment_type: Option<EmploymentType>,
    pub status: Option<EmployeeStatus>,
}

/// Validated salary change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SalaryChange {
    pub salary: f64,
    pub effective_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Termination {
    pub termination_date: NaiveDate,
    pub termination_type: TerminationType,
    pub reason: String,
    #[serde(default)]
    pub eligible_for_rehire: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSalaryHistory {
    pub id: EmployeeSalaryHistoryId,
    pub employee_id: EmployeeId,
    pub previous_salary: f64,
    pub new_salary: f64,
    pub effective_date: NaiveDate,
    pub reason: String,
    pub changed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl EmployeeSalaryHistory {
    /// Signed change relative to the previous salary, in percent.
    /// `None` when there was no previous salary to compare against.
    pub fn percent_change(&self) -> Option<f64> {
        if self.previous_salary == 0.0 {
            return None;
        }
        Some((self.new_salary - self.previous_salary) / self.previous_salary * 100.0)
    }
}

impl Employee {
    pub fn create(id: EmployeeId, new: NewEmployee, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            employee_number: new.employee_number,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            date_of_birth: new.date_of_birth,
            department: new.department,
            position: new.position,
            manager_id: new.manager_id,
            employment_type: new.employment_type,
            status: new.status,
            hire_date: new.hire_date,
            salary: new.salary,
            termination_date: None,
            termination_type: None,
            termination_reason: None,
            eligible_for_rehire: None,
            timestamps: Timestamps::new(now),
            deleted_at: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn apply(
        &mut self,
        c: EmployeeChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<StatusChange<EmployeeStatus>>> {
        let mut change = None;
        if let Some(next) = c.status.filter(|s| *s != self.status) {
            if next == EmployeeStatus::Terminated {
                return Err(DomainError::invariant("terminations go through Employee::terminate"));
            }
            let moved = StatusChange::checked(self.status, next)?;
            self.status = moved.to;
            change = Some(moved);
        }
        if c.manager_id == Some(self.id) {
            return Err(DomainError::invariant("an employee cannot manage themselves"));
        }
        if let Some(v) = c.first_name {
            self.first_name = v;
        }
        if let Some(v) = c.last_name {
            self.last_name = v;
        }
        if let Some(v) = c.email {
            self.email = v;
        }
        if let Some(v) = c.department {
            self.department = v;
        }
        if let Some(v) = c.position {
            self.position = v;
        }
        if let Some(v) = c.employment_type {
            self.employment_type = v;
        }
        self.phone = c.phone.or(self.phone.take());
        self.manager_id = c.manager_id.or(self.manager_id);
        self.timestamps.touch(now);
        Ok(change)
    }

    /// Record a new salary and return the history row for it.
    pub fn change_salary(
        &mut self,
        history_id: EmployeeSalaryHistoryId,
        change: SalaryChange,
        changed_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> DomainResult<EmployeeSalaryHistory> {
        if self.status == EmployeeStatus::Terminated {
            return Err(DomainError::invariant("salary of a terminated employee cannot change"));
        }
        if change.salary < 0.0 || change.salary == self.salary {
            return Err(DomainError::validation("new salary must be non-negative and differ from the current one"));
        }
        let history = EmployeeSalaryHistory {
            id: history_id,
            employee_id: self.id,
            previous_salary: self.salary,
            new_salary: change.salary,
            effective_date: change.effective_date,
            reason: change.reason,
            changed_by,
            created_at: now,
        };
        self.salary = change.salary;
        self.timestamps.touch(now);
        Ok(history)
    }

    pub fn terminate(
        &mut self,
        t: Termination,
        now: DateTime<Utc>,
    ) -> DomainResult<StatusChange<EmployeeStatus>> {
        if t.termination_date < self.hire_date {
            return Err(DomainError::validation(format!(
                "termination date {} precedes hire date {}",
                t.termination_date, self.hire_date
            )));
        }
        let moved = StatusChange::checked(self.status, EmployeeStatus::Terminated)?;
        self.status = moved.to;
        self.termination_date = Some(t.termination_date);
        self.termination_type = Some(t.termination_type);
        self.termination_reason = Some(t.reason);
        self.eligible_for_rehire = Some(t.eligible_for_rehire);
        self.timestamps.touch(now);
        Ok(moved)
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &EmployeeId {
        &self.id
    }
}

impl SoftDeletes for Employee {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

string_enum! {
    pub enum EmployeeSortField {
        LastName => "last_name",
        HireDate => "hire_date",
        Salary => "salary",
        CreatedAt => "created_at",
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmployeeSearch {
    pub q: Option<String>,
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub employment_type: Option<EmploymentType>,
    pub manager_id: Option<EmployeeId>,
    pub hired_from: Option<NaiveDate>,
    pub hired_to: Option<NaiveDate>,
    pub sort_by: EmployeeSortField,
    pub sort_direction: SortDirection,
    pub per_page: u32,
    pub page: u32,
}

impl EmployeeSearch {
    pub fn matches(&self, e: &Employee) -> bool {
        if e.is_trashed() {
            return false;
        }
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            let hit = e.full_name().to_lowercase().contains(&q)
                || e.email.contains(&q)
                || e.employee_number.to_lowercase().contains(&q);
            if !hit {
                return false;
            }
        }
        self.department
            .as_deref()
            .is_none_or(|d| e.department.eq_ignore_ascii_case(d))
            && self.status.is_none_or(|s| e.status == s)
            && self.employment_type.is_none_or(|t| e.employment_type == t)
            && self.manager_id.is_none_or(|m| e.manager_id == Some(m))
            && self.hired_from.is_none_or(|d| e.hire_date >= d)
            && self.hired_to.is_none_or(|d| e.hire_date <= d)
    }

    pub fn run(&self, employees: Vec<Employee>) -> Page<Employee> {
        let mut hits: Vec<Employee> = employees.into_iter().filter(|e| self.matches(e)).collect();
        hits.sort_by(|a, b| {
            let ord = match self.sort_by {
                EmployeeSortField::LastName => a.last_name.to_lowercase().cmp(&b.last_name.to_lowercase()),
                EmployeeSortField::HireDate => a.hire_date.cmp(&b.hire_date),
                EmployeeSortField::Salary => a.salary.total_cmp(&b.salary),
                EmployeeSortField::CreatedAt => a.timestamps.created_at.cmp(&b.timestamps.created_at),
            };
            self.sort_direction.apply(ord)
        });
        Page::paginate(hits, PageRequest::new(self.page, self.per_page))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn employee(id: i64, status: EmployeeStatus) -> Employee {
        Employee::create(
            EmployeeId(id),
            NewEmployee {
                user_id: None,
                employee_number: format!("EMP-{id:04}"),
                first_name: "Katherine".into(),
                last_name: "Johnson".into(),
                email: format!("k{id}@example.com"),
                phone: None,
                date_of_birth: None,
                department: "Engineering".into(),
                position: "Analyst".into(),
                manager_id: None,
                employment_type: EmploymentType::FullTime,
                status,
                hire_date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
                salary: 50_000.0,
            },
            Utc::now(),
        )
    }

    #[test]
    fn salary_changes_are_recorded_with_percent() {
        let mut e = employee(1, EmployeeStatus::Active);
        let history = e
            .change_salary(
                EmployeeSalaryHistoryId(1),
                SalaryChange {
                    salary: 55_000.0,
                    effective_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                    reason: "Annual review".into(),
                },
                Some(9),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(history.previous_salary, 50_000.0);
        assert_eq!(e.salary, 55_000.0);
        let pct = history.percent_change().unwrap();
        assert!((pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unchanged_salary_is_rejected() {
        let mut e = employee(1, EmployeeStatus::Active);
        let same = SalaryChange {
            salary: 50_000.0,
            effective_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            reason: "noop".into(),
        };
        assert!(e.change_salary(EmployeeSalaryHistoryId(1), same, None, Utc::now()).is_err());
    }

    #[test]
    fn termination_is_final_and_dated_after_hire() {
        let mut e = employee(1, EmployeeStatus::OnLeave);
        let early = Termination {
            termination_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            termination_type: TerminationType::Voluntary,
            reason: "Moving".into(),
            eligible_for_rehire: true,
        };
        assert!(e.terminate(early.clone(), Utc::now()).is_err());

        let ok = Termination {
            termination_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            ..early
        };
        e.terminate(ok.clone(), Utc::now()).unwrap();
        assert_eq!(e.status, EmployeeStatus::Terminated);
        assert!(e.terminate(ok, Utc::now()).is_err());
    }

    #[test]
    fn plain_updates_cannot_terminate() {
        let mut e = employee(1, EmployeeStatus::Active);
        let changes = EmployeeChanges {
            status: Some(EmployeeStatus::Terminated),
            ..Default::default()
        };
        assert!(e.apply(changes, Utc::now()).is_err());
    }

    proptest::proptest! {
        #[test]
        fn percent_change_follows_the_direction_of_the_raise(
            previous in 1_000.0f64..500_000.0,
            new in 1_000.0f64..500_000.0,
        ) {
            let history = EmployeeSalaryHistory {
                id: EmployeeSalaryHistoryId(1),
                employee_id: EmployeeId(1),
                previous_salary: previous,
                new_salary: new,
                effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                reason: "review".into(),
                changed_by: None,
                created_at: Utc::now(),
            };
            let pct = history.percent_change().unwrap();
            proptest::prop_assert_eq!(pct > 0.0, new > previous);
            proptest::prop_assert!(pct > -100.0);
        }
    }
}
