//! Symbolic error codes and their conventional HTTP statuses.
//!
//! The table is consumed by downstream tools rendering the `errors` documented on an
//! endpoint; synchronization itself only carries the codes through.

/// Error code to HTTP status, in canonical code order
pub const HTTP_STATUS_BY_CODE: [(&str, u16); 17] = [
    ("OK", 200),
    ("Canceled", 499),
    ("Unknown", 500),
    ("InvalidArgument", 400),
    ("DeadlineExceeded", 504),
    ("NotFound", 404),
    ("AlreadyExists", 409),
    ("PermissionDenied", 403),
    ("ResourceExhausted", 429),
    ("FailedPrecondition", 400),
    ("Aborted", 409),
    ("OutOfRange", 400),
    ("Unimplemented", 501),
    ("Internal", 500),
    ("Unavailable", 503),
    ("DataLoss", 500),
    ("Unauthenticated", 401),
];

/// Look up the HTTP status for a symbolic error code. Codes are case-sensitive.
pub fn http_status(code: &str) -> Option<u16> {
    HTTP_STATUS_BY_CODE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, status)| *status)
}
