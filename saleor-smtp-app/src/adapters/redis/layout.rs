//! How auth data maps onto Redis keys

/// Physical storage layout of the APL inside Redis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLayout {
    /// One string key per Saleor instance: `<prefix><saleor_api_url>`
    Prefixed { prefix: String },
    /// One hash holding every record, field = `saleor_api_url`.
    /// Same layout as the Saleor app SDK's Redis APL.
    Hash { collection_key: String },
}

impl KeyLayout {
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self::Prefixed {
            prefix: prefix.into(),
        }
    }

    pub fn hash(collection_key: impl Into<String>) -> Self {
        Self::Hash {
            collection_key: collection_key.into(),
        }
    }

    /// `KEYS` pattern matching every record key of a prefixed layout.
    ///
    /// Glob metacharacters in the prefix are escaped so `app:*` never
    /// enumerates keys belonging to `app:` siblings.
    pub(crate) fn scan_pattern(prefix: &str) -> String {
        let mut pattern = String::with_capacity(prefix.len() + 1);
        for c in prefix.chars() {
            if matches!(c, '*' | '?' | '[' | ']' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('*');
        pattern
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::prefixed(crate::config::DEFAULT_KEY_PREFIX)
    }
}
