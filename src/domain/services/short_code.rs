use std::sync::Arc;
use rand::Rng;
use tracing::warn;
use crate::domain::ports::ShortCodeRegistry;
use crate::error::AppError;

pub const SHORT_CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const SHORT_CODE_LENGTH: usize = 8;
pub const MAX_SHORT_CODE_ATTEMPTS: usize = 5;

pub fn generate_short_code() -> String {
    let mut rng = rand::thread_rng();
    (0..SHORT_CODE_LENGTH)
        .map(|_| SHORT_CODE_ALPHABET[rng.gen_range(0..SHORT_CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_short_code(code: &str) -> bool {
    code.len() == SHORT_CODE_LENGTH && code.bytes().all(|b| SHORT_CODE_ALPHABET.contains(&b))
}

/// Codes are shared by humans; lookups tolerate case and surrounding whitespace.
pub fn normalize_short_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Picks codes not yet held by any event, soft-deleted ones included.
///
/// The pre-check is a fast path only. The unique index on `events.short_code`
/// is authoritative, and callers retry `allocate` when the insert loses a race.
#[derive(Clone)]
pub struct ShortCodeAllocator {
    registry: Arc<dyn ShortCodeRegistry>,
    generate: CodeSource,
}

/// Produces candidate codes. `generate_short_code` unless overridden.
pub type CodeSource = Arc<dyn Fn() -> String + Send + Sync>;

impl ShortCodeAllocator {
    pub fn new(registry: Arc<dyn ShortCodeRegistry>) -> Self {
        Self::with_source(registry, Arc::new(generate_short_code))
    }

    pub fn with_source(registry: Arc<dyn ShortCodeRegistry>, generate: CodeSource) -> Self {
        Self { registry, generate }
    }

    pub async fn allocate(&self) -> Result<String, AppError> {
        for attempt in 1..=MAX_SHORT_CODE_ATTEMPTS {
            let code = (self.generate)();
            if !self.registry.is_taken(&code).await? {
                return Ok(code);
            }
            warn!(attempt, "Short code collision on pre-check, regenerating");
        }
        Err(exhausted())
    }
}

pub fn exhausted() -> AppError {
    AppError::InternalWithMsg(format!(
        "Could not allocate a unique short code after {} attempts",
        MAX_SHORT_CODE_ATTEMPTS
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tokio::task::JoinSet;

    /// Claims a code atomically on lookup, standing in for the unique index.
    #[derive(Default)]
    struct ClaimingRegistry {
        codes: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl ShortCodeRegistry for ClaimingRegistry {
        async fn is_taken(&self, code: &str) -> Result<bool, AppError> {
            let mut codes = self.codes.lock().unwrap();
            Ok(!codes.insert(code.to_string()))
        }
    }

    struct FullRegistry;

    #[async_trait]
    impl ShortCodeRegistry for FullRegistry {
        async fn is_taken(&self, _code: &str) -> Result<bool, AppError> {
            Ok(true)
        }
    }

    #[test]
    fn test_generated_codes_use_alphabet_and_length() {
        for _ in 0..200 {
            let code = generate_short_code();
            assert!(is_valid_short_code(&code), "bad code {code}");
        }
        assert!(!is_valid_short_code("abcd1234"));
        assert!(!is_valid_short_code("ABC123"));
        assert_eq!(normalize_short_code("  ab12cd34 "), "AB12CD34");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_allocation_yields_distinct_codes() {
        let allocator = ShortCodeAllocator::new(Arc::new(ClaimingRegistry::default()));
        let mut set = JoinSet::new();
        for _ in 0..1000 {
            let allocator = allocator.clone();
            set.spawn(async move { allocator.allocate().await });
        }

        let mut seen = HashSet::new();
        while let Some(joined) = set.join_next().await {
            let code = joined.unwrap().unwrap();
            assert!(seen.insert(code), "duplicate code issued");
        }
        assert_eq!(seen.len(), 1000);
    }

    #[tokio::test]
    async fn test_custom_source_is_used() {
        let allocator = ShortCodeAllocator::with_source(
            Arc::new(ClaimingRegistry::default()),
            Arc::new(|| "FIXED123".to_string()),
        );
        assert_eq!(allocator.allocate().await.unwrap(), "FIXED123");
        // Second call sees the claimed code on every attempt.
        assert!(matches!(allocator.allocate().await, Err(AppError::InternalWithMsg(_))));
    }

    #[tokio::test]
    async fn test_allocation_gives_up_after_bounded_attempts() {
        let allocator = ShortCodeAllocator::new(Arc::new(FullRegistry));
        let err = allocator.allocate().await.unwrap_err();
        assert!(matches!(err, AppError::InternalWithMsg(_)));
    }
}
