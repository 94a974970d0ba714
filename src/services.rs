pub mod auth;
pub mod crm_service;
pub mod finance_service;
pub mod inventory_service;
pub mod kit;
pub mod pricing;
pub mod report_builder;
pub mod report_service;
pub mod sales_service;
