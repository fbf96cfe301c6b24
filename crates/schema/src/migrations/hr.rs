use crate::create_table_migration;

create_table_migration!(
    CreateEmployeesTable,
    "2024_01_04_000100_create_employees_table",
    "employees",
    |t| {
        t.id();
        t.foreign_id("user_id").nullable().constrained("users").null_on_delete();
        t.string("employee_number", 50).unique();
        t.string("first_name", 100);
        t.string("last_name", 100);
        t.string("email", 255).unique();
        t.string("phone", 30).nullable();
        t.date("date_of_birth").nullable();
        t.string("department", 100);
        t.string("position", 100);
        t.foreign_id("manager_id").nullable().constrained("employees").null_on_delete();
        t.enum_("employment_type", &["full_time", "part_time", "contract", "intern"]).default("full_time");
        t.enum_("status", &["active", "on_leave", "suspended", "terminated"]).default("active");
        t.date("hire_date");
        t.decimal("salary", 12, 2).comment("Annual gross salary");
        t.date("termination_date").nullable();
        t.enum_("termination_type", &["voluntary", "involuntary", "retirement", "end_of_contract"]).nullable();
        t.text("termination_reason").nullable();
        t.boolean("eligible_for_rehire").nullable();
        t.timestamps();
        t.soft_deletes();
        t.index(&["department", "status"]);
        t.index(&["last_name", "first_name"]);
    }
);

create_table_migration!(
    CreateEmployeeSalaryHistoriesTable,
    "2024_01_04_000200_create_employee_salary_histories_table",
    "employee_salary_histories",
    |t| {
        t.id();
        t.foreign_id("employee_id").constrained("employees").cascade_on_delete();
        t.decimal("previous_salary", 12, 2);
        t.decimal("new_salary", 12, 2);
        t.date("effective_date");
        t.string("reason", 500);
        t.foreign_id("changed_by").nullable().constrained("users").null_on_delete();
        t.timestamp("created_at").nullable();
        t.index(&["employee_id", "effective_date"]);
    }
);
