//! Key path rules shared by every transport.
//!
//! The store addresses keys through URL paths, so `.` and `..` segments
//! would be collapsed before reaching it and name a different key. Such
//! keys are refused outright. A leading `/` is dropped on reads and
//! deletes and refused on writes.

use kvgate_error::{TransportError, TransportResult};

/// Refuse keys containing a `.` or `..` path segment
pub(crate) fn check_segments(key: &str) -> TransportResult<()> {
    if key.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(TransportError::invalid_request(format!(
            "key must not contain '.' or '..' segments: {}",
            key
        )));
    }
    Ok(())
}

/// Key as addressed by reads and deletes
pub(crate) fn relative_key(key: &str) -> TransportResult<&str> {
    let key = key.trim_start_matches('/');
    check_segments(key)?;
    Ok(key)
}

/// Key as addressed by puts and compare-and-swaps
pub(crate) fn write_key(key: &str) -> TransportResult<&str> {
    // The store answers a leading '/' on writes with a confusing 405
    if key.starts_with('/') {
        return Err(TransportError::invalid_request(format!(
            "key must not begin with a '/': {}",
            key
        )));
    }
    check_segments(key)?;
    Ok(key)
}
