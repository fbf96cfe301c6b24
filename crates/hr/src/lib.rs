//! `tradeerp-hr`: employee records, salary history and terminations.

pub mod employee;
pub mod requests;

pub use employee::{
    Employee, EmployeeChanges, EmployeeId, EmployeeSalaryHistory, EmployeeSalaryHistoryId,
    EmployeeSearch, EmployeeSortField, EmployeeStatus, EmploymentType, NewEmployee, SalaryChange,
    Termination, TerminationType,
};
pub use requests::*;
