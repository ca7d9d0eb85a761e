use std::error::Error;

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod memory;
pub mod model;
pub mod routes;

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, StoreError};

    #[test]
    fn unpack_error_walks_sources() {
        let err = ApiError::Upsert(StoreError::Backend("connection reset".into()));
        assert_eq!(
            unpack_error(&err),
            "UpsertError: Backend error: connection reset"
        );
    }
}
