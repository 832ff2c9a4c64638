use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

const VISIBLE_SUFFIX: usize = 4;

/// Wraps a requester identity (usually an email or student number) so that
/// `Debug`/`Display` only reveal the last few characters. Serialization is
/// untouched so API responses still carry the real value.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> Masked<T> {
    fn redacted(&self) -> String {
        let raw = self.0.to_string();
        let count = raw.chars().count();
        if count <= VISIBLE_SUFFIX {
            return "*".repeat(count.max(1));
        }
        let suffix: String = raw.chars().skip(count - VISIBLE_SUFFIX).collect();
        format!("****{}", suffix)
    }
}

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}
