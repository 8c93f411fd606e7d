pub mod db;
pub mod sites;
