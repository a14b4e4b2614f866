//! Lua syntax validation for catalog snippets.
//!
//! Snippets loaded from disk are compiled (never executed) in a fresh
//! Lua 5.4 VM. A chunk that fails to compile is rejected before it can be
//! served to a client or forwarded to the completion service.

use anyhow::Result;
use mlua::prelude::*;

/// Compile `code` as a Lua chunk named `name` without running it.
///
/// Returns the compiler's message (which includes the chunk name and line)
/// when the chunk does not parse.
pub fn check_syntax(name: &str, code: &str) -> Result<()> {
    let lua = Lua::new();
    lua.load(code)
        .set_name(format!("={}", name))
        .into_function()
        .map_err(|e| anyhow::anyhow!("Lua syntax error in '{}': {}", name, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_chunk() {
        let code = "local t = {}\nfunction t.f(x)\n    return x + 1\nend\nreturn t";
        assert!(check_syntax("ok", code).is_ok());
    }

    #[test]
    fn test_chunk_is_not_executed() {
        // Would raise at runtime, but compiles fine.
        assert!(check_syntax("runtime", "error('boom')").is_ok());
    }

    #[test]
    fn test_invalid_chunk_names_snippet() {
        let err = check_syntax("Broken Snippet", "function f(\n").unwrap_err();
        assert!(err.to_string().contains("Broken Snippet"));
    }
}
