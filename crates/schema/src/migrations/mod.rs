//! The TradeERP migration set, in the order it must run.

pub mod accounts;
pub mod alterations;
pub mod catalog;
pub mod customers;
pub mod hr;
pub mod orders;
pub mod providers;

use crate::Migration;

pub fn all() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(accounts::CreateUsersTable),
        Box::new(catalog::CreateBrandsTable),
        Box::new(catalog::CreateCategoriesTable),
        Box::new(catalog::CreateProductsTable),
        Box::new(catalog::CreateProductVariantsTable),
        Box::new(catalog::CreateProductAttributesTable),
        Box::new(catalog::CreateProductAttributeValuesTable),
        Box::new(catalog::CreateProductTagsTable),
        Box::new(catalog::CreateProductMetasTable),
        Box::new(catalog::CreateProductDiscountsTable),
        Box::new(catalog::CreateProductReviewsTable),
        Box::new(customers::CreateCustomersTable),
        Box::new(customers::CreateAddressesTable),
        Box::new(customers::CreateCustomerSegmentsTable),
        Box::new(customers::CreateCustomerCommunicationsTable),
        Box::new(customers::CreateLoyaltyTransactionsTable),
        Box::new(orders::CreateOrdersTable),
        Box::new(orders::CreateOrderItemsTable),
        Box::new(orders::CreateOrderStatusHistoriesTable),
        Box::new(orders::CreateShipmentsTable),
        Box::new(orders::CreateShipmentItemsTable),
        Box::new(orders::CreateTransactionsTable),
        Box::new(hr::CreateEmployeesTable),
        Box::new(hr::CreateEmployeeSalaryHistoriesTable),
        Box::new(providers::CreateProvidersTable),
        Box::new(providers::CreateProviderInsurancesTable),
        Box::new(providers::CreateProviderCertificationsTable),
        Box::new(providers::CreateProviderPerformancesTable),
        Box::new(providers::CreateProviderLocationsTable),
        Box::new(accounts::CreateUserSubscriptionsTable),
        Box::new(accounts::CreateNotificationsTable),
        Box::new(alterations::AddFulltextIndexToProductsTable),
        Box::new(alterations::AddLoyaltyColumnsToCustomersTable),
        Box::new(alterations::AddVerificationColumnsToProviderInsurancesTable),
    ]
}
