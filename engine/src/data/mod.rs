// Order data loading and selection for the reporting dashboard.
pub mod csv_parser;
pub mod order_store;
