pub mod import_sites;
