use shared::TtlSecs;

/// Memcached rejects keys longer than this; applied to both backends so a key
/// valid for one is valid for the other.
const MAX_KEY_BYTES: usize = 250;

/// Keys that collide with static route segments under `/cache`.
const RESERVED_KEYS: [&str; 2] = ["clear", "ttl"];

/// Largest accepted TTL. Redis refuses `SETEX` values anywhere near `i64::MAX`.
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    MissingCacheType,
    EmptyKey,
    KeyTooLong { len: usize },
    InvalidKeyCharacter,
    ReservedKey(String),
    NegativeTtl(i64),
    TtlTooLong(i64),
    MalformedTtl(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingCacheType => write!(f, "Cache type is missing"),
            ValidationError::EmptyKey => write!(f, "Key must not be empty"),
            ValidationError::KeyTooLong { len } => {
                write!(
                    f,
                    "Key is {} bytes long (max: {})",
                    len, MAX_KEY_BYTES
                )
            }
            ValidationError::InvalidKeyCharacter => {
                write!(f, "Key must not contain whitespace or control characters")
            }
            ValidationError::ReservedKey(key) => {
                write!(f, "Key '{}' is reserved by the cache routes", key)
            }
            ValidationError::NegativeTtl(ttl) => {
                write!(f, "TTL must be zero or a positive number of seconds, got {}", ttl)
            }
            ValidationError::TtlTooLong(ttl) => {
                write!(f, "TTL {} exceeds the maximum of {} seconds", ttl, MAX_TTL_SECS)
            }
            ValidationError::MalformedTtl(raw) => {
                write!(f, "TTL '{}' is not a whole number of seconds", raw)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub fn cache_type(cache: Option<&str>) -> Result<&str, ValidationError> {
    match cache {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ValidationError::MissingCacheType),
    }
}

pub fn key(key: &str) -> Result<&str, ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(ValidationError::KeyTooLong { len: key.len() });
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidKeyCharacter);
    }
    if RESERVED_KEYS.contains(&key) {
        return Err(ValidationError::ReservedKey(key.to_string()));
    }
    Ok(key)
}

pub fn ttl(ttl: i64) -> Result<TtlSecs, ValidationError> {
    if ttl > MAX_TTL_SECS {
        return Err(ValidationError::TtlTooLong(ttl));
    }
    u64::try_from(ttl)
        .map(TtlSecs)
        .map_err(|_| ValidationError::NegativeTtl(ttl))
}

/// TTL taken from a path segment
pub fn ttl_segment(raw: &str) -> Result<TtlSecs, ValidationError> {
    let parsed = raw
        .parse::<i64>()
        .map_err(|_| ValidationError::MalformedTtl(raw.to_string()))?;
    ttl(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_type_must_be_present() {
        assert_eq!(cache_type(Some("redis")), Ok("redis"));
        assert_eq!(cache_type(Some("")), Err(ValidationError::MissingCacheType));
        assert_eq!(cache_type(None), Err(ValidationError::MissingCacheType));
    }

    #[test]
    fn keys_follow_memcached_rules() {
        assert_eq!(key("user:1"), Ok("user:1"));
        assert_eq!(key(""), Err(ValidationError::EmptyKey));
        assert_eq!(key("with space"), Err(ValidationError::InvalidKeyCharacter));
        assert_eq!(key("tab\there"), Err(ValidationError::InvalidKeyCharacter));

        let long = "k".repeat(251);
        assert_eq!(key(&long), Err(ValidationError::KeyTooLong { len: 251 }));
        assert!(key(&"k".repeat(250)).is_ok());
    }

    #[test]
    fn route_segments_are_not_keys() {
        assert_eq!(key("clear"), Err(ValidationError::ReservedKey("clear".to_string())));
        assert_eq!(key("ttl"), Err(ValidationError::ReservedKey("ttl".to_string())));
        assert_eq!(key("clear:1"), Ok("clear:1"));
    }

    #[test]
    fn ttl_rejects_negative_values() {
        assert_eq!(ttl(0), Ok(TtlSecs(0)));
        assert_eq!(ttl(60), Ok(TtlSecs(60)));
        assert_eq!(ttl(-1), Err(ValidationError::NegativeTtl(-1)));
    }

    #[test]
    fn ttl_is_capped() {
        assert_eq!(ttl(MAX_TTL_SECS), Ok(TtlSecs(MAX_TTL_SECS as u64)));
        assert_eq!(
            ttl(MAX_TTL_SECS + 1),
            Err(ValidationError::TtlTooLong(MAX_TTL_SECS + 1))
        );
        assert_eq!(ttl(i64::MAX), Err(ValidationError::TtlTooLong(i64::MAX)));
        assert_eq!(
            ttl_segment("9223372036854775807"),
            Err(ValidationError::TtlTooLong(i64::MAX))
        );
    }

    #[test]
    fn ttl_segment_parses_whole_seconds() {
        assert_eq!(ttl_segment("15"), Ok(TtlSecs(15)));
        assert_eq!(
            ttl_segment("15s"),
            Err(ValidationError::MalformedTtl("15s".to_string()))
        );
        assert_eq!(ttl_segment("-5"), Err(ValidationError::NegativeTtl(-5)));
    }
}
