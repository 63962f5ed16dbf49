//! Media types produced by problemkit responses.

/// Content type for Problem Details serialized as JSON (RFC 7807 section 6.1).
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Content type for Problem Details serialized as XML (RFC 7807 section 6.2).
pub const APPLICATION_PROBLEM_XML: &str = "application/problem+xml";

pub const APPLICATION_JSON: &str = "application/json";

pub const APPLICATION_XML: &str = "application/xml";
