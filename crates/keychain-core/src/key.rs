/// Canonicalize a caller-supplied key by dropping whitespace and non-ASCII characters.
///
/// Every client operation runs its key through this before touching a
/// backend, so two keys that differ only in such characters address the
/// same item: `"my key"` and `"mykey"` collide.
pub fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii() && !c.is_whitespace())
        .collect()
}
