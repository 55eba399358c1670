//! Infrastructure adapters.

pub mod db_errors;
