/// Identifiers shorter than this are never looked up.
pub const MIN_IDENTIFIER_LEN: usize = 4;

const IGSN_HANDLE_PREFIX: &str = "10273/";
const IGSN_SCHEME: &str = "IGSN:";

pub fn is_resolvable(identifier: &str) -> bool {
    identifier.chars().count() >= MIN_IDENTIFIER_LEN
}

/// Canonical form of an IGSN as typed by a user: upper case, without the
/// handle prefix or the `IGSN:` scheme.
pub fn clean_igsn(igsn: &str) -> String {
    let mut igsn = igsn.trim().to_uppercase();
    if let Some(rest) = igsn.strip_prefix(IGSN_HANDLE_PREFIX) {
        igsn = rest.to_string();
    }
    if let Some(rest) = igsn.strip_prefix(IGSN_SCHEME) {
        igsn = rest.trim().to_string();
    }
    igsn
}
