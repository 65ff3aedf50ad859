use serde::Serialize;

/// Which configured model a handle was built from.
///
/// The pool always tries [`ModelRole::Primary`] first and only falls back
/// when the primary cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// The preferred model variant.
    Primary,
    /// The variant used when the primary failed to initialize.
    Fallback,
}

impl ModelRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelRole::Primary => "primary",
            ModelRole::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
