//! Code sandbox contract.
//!
//! A sandbox runs generated source text and returns the value of its final
//! evaluated expression. Implementations must refuse imports outside the
//! whitelist and expose no builtins beyond the action space.
//!
//! No timeout is implied by this contract; a program that never terminates
//! blocks the caller unless the implementation bounds it.

use async_trait::async_trait;

use crate::error::SandboxError;

/// Builtin capability names exposed to executed code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpace(Vec<String>);

impl ActionSpace {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

impl Default for ActionSpace {
    /// Only `print`.
    fn default() -> Self {
        Self::new(["print"])
    }
}

#[async_trait]
pub trait CodeSandbox: Send + Sync {
    /// Execute `code` and return the `str()` of its last expression.
    async fn execute(
        &self,
        code: &str,
        import_whitelist: &[String],
        action_space: &ActionSpace,
    ) -> std::result::Result<String, SandboxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_action_space_is_print_only() {
        let space = ActionSpace::default();
        assert_eq!(space.names(), ["print".to_string()]);
        assert!(space.contains("print"));
        assert!(!space.contains("open"));
    }
}
