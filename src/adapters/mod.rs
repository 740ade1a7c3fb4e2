pub mod csv_source;
pub mod http_classifier;
pub mod local_storage;
