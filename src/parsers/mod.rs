pub mod site_csv;

pub use site_csv::{export_sites, load_sites, read_sites, write_sites, DatasetError};
