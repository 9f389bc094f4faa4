use std::fmt::Display;

/// Logs and discards a failed storage result. Read paths on the HTTP surface
/// degrade to "not found" rather than surfacing driver errors.
pub fn verbose_result_ok<T, E: Display>(context: String, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: {}", context, e);
            None
        }
    }
}
