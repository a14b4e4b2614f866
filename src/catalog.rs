//! Snippet catalog sources.
//!
//! The [`SnippetSource`] trait is the only way the rest of the crate reads
//! snippets, so alternate catalogs can be substituted in tests or loaded
//! from disk.
//!
//! | Source | Contents |
//! |--------|----------|
//! | [`BuiltinCatalog`] | Five compiled-in Lua utility snippets |
//! | [`StaticCatalog`] | Any fixed list of records (tests, file-backed catalogs) |
//!
//! # File Format
//!
//! ```toml
//! [[snippet]]
//! title = "Queue"
//! keywords = ["queue", "fifo"]
//! code = '''
//! local Queue = {}
//! return Queue
//! '''
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::config::CatalogConfig;
use crate::lua_check;
use crate::models::SnippetRecord;

/// Read-only provider of catalog records.
///
/// Implementations return records in a stable order; the scorer relies on
/// that order to break ties.
pub trait SnippetSource: Send + Sync {
    fn list(&self) -> Result<Vec<SnippetRecord>>;
}

/// The five compiled-in Lua snippets.
#[derive(Debug)]
pub struct BuiltinCatalog;

impl SnippetSource for BuiltinCatalog {
    fn list(&self) -> Result<Vec<SnippetRecord>> {
        Ok(builtin_snippets())
    }
}

/// A fixed, in-memory list of records.
#[derive(Debug)]
pub struct StaticCatalog {
    records: Vec<SnippetRecord>,
}

impl StaticCatalog {
    pub fn new(records: Vec<SnippetRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SnippetSource for StaticCatalog {
    fn list(&self) -> Result<Vec<SnippetRecord>> {
        Ok(self.records.clone())
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "snippet")]
    snippets: Vec<SnippetRecord>,
}

/// Check the record invariants: at least one keyword, non-blank code that
/// compiles as Lua.
pub fn validate_record(record: &SnippetRecord) -> Result<()> {
    if record.title.trim().is_empty() {
        bail!("snippet title must not be empty");
    }
    if record.keywords.is_empty() {
        bail!("snippet '{}' must have at least one keyword", record.title);
    }
    // A blank keyword is a substring of every query.
    if record.keywords.iter().any(|k| k.trim().is_empty()) {
        bail!("snippet '{}' has a blank keyword", record.title);
    }
    if record.code.trim().is_empty() {
        bail!("snippet '{}' must have non-empty code", record.title);
    }
    lua_check::check_syntax(&record.title, &record.code)
}

/// Load and validate a TOML catalog file.
pub fn load_catalog_file(path: &Path) -> Result<StaticCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    let file: CatalogFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;

    for record in &file.snippets {
        validate_record(record)
            .with_context(|| format!("Invalid snippet in {}", path.display()))?;
    }

    Ok(StaticCatalog::new(file.snippets))
}

/// Build the catalog described by `[catalog]`.
///
/// Without a `path` this is the builtin catalog. With a `path`, file
/// entries replace the builtin ones unless `include_builtin` is set, in
/// which case they are appended after them.
pub fn catalog_from_config(config: &CatalogConfig) -> Result<Box<dyn SnippetSource>> {
    let Some(path) = &config.path else {
        return Ok(Box::new(BuiltinCatalog));
    };

    let loaded = load_catalog_file(path)?;
    if loaded.is_empty() {
        tracing::warn!(path = %path.display(), "catalog file contains no snippets");
    }

    if config.include_builtin {
        let mut records = builtin_snippets();
        records.extend(loaded.list()?);
        Ok(Box::new(StaticCatalog::new(records)))
    } else {
        Ok(Box::new(loaded))
    }
}

/// The compiled-in records, in catalog order.
pub fn builtin_snippets() -> Vec<SnippetRecord> {
    vec![
        SnippetRecord::new(
            "Table Utilities",
            &["table", "array", "list", "utilities"],
            TABLE_UTILITIES,
        ),
        SnippetRecord::new(
            "String Functions",
            &["string", "text", "split", "trim"],
            STRING_FUNCTIONS,
        ),
        SnippetRecord::new(
            "File Operations",
            &["file", "io", "read", "write", "filesystem"],
            FILE_OPERATIONS,
        ),
        SnippetRecord::new(
            "Math Utilities",
            &["math", "numbers", "calculations", "round"],
            MATH_UTILITIES,
        ),
        SnippetRecord::new(
            "JSON Handler",
            &["json", "parse", "encode", "decode", "data"],
            JSON_HANDLER,
        ),
    ]
}

const TABLE_UTILITIES: &str = r#"-- Tabellen-Hilfsfunktionen
function table.clone(orig)
    local copy = {}
    for orig_key, orig_value in pairs(orig) do
        copy[orig_key] = orig_value
    end
    return copy
end

function table.length(t)
    local count = 0
    for _ in pairs(t) do
        count = count + 1
    end
    return count
end

function table.contains(t, value)
    for _, v in pairs(t) do
        if v == value then
            return true
        end
    end
    return false
end"#;

const STRING_FUNCTIONS: &str = r#"-- String-Hilfsfunktionen
function string.split(str, delimiter)
    local result = {}
    local pattern = string.format("([^%s]+)", delimiter or "%s")
    for match in str:gmatch(pattern) do
        table.insert(result, match)
    end
    return result
end

function string.trim(str)
    return str:match("^%s*(.-)%s*$")
end

function string.startswith(str, prefix)
    return str:sub(1, #prefix) == prefix
end"#;

const FILE_OPERATIONS: &str = r#"-- Datei-Operationen
function readFile(filename)
    local file = io.open(filename, "r")
    if not file then
        return nil, "Datei nicht gefunden"
    end
    local content = file:read("*all")
    file:close()
    return content
end

function writeFile(filename, content)
    local file = io.open(filename, "w")
    if not file then
        return false, "Kann Datei nicht erstellen"
    end
    file:write(content)
    file:close()
    return true
end

function fileExists(filename)
    local file = io.open(filename, "r")
    if file then
        file:close()
        return true
    end
    return false
end"#;

const MATH_UTILITIES: &str = r#"-- Mathematische Hilfsfunktionen
function math.round(num, decimals)
    local mult = 10^(decimals or 0)
    return math.floor(num * mult + 0.5) / mult
end

function math.clamp(value, min, max)
    return math.max(min, math.min(max, value))
end

function math.lerp(a, b, t)
    return a + (b - a) * t
end

function math.distance(x1, y1, x2, y2)
    return math.sqrt((x2-x1)^2 + (y2-y1)^2)
end"#;

const JSON_HANDLER: &str = r#"-- Einfacher JSON Handler
local json = {}

function json.encode(obj)
    if type(obj) == "table" then
        local result = "{"
        local first = true
        for k, v in pairs(obj) do
            if not first then result = result .. "," end
            result = result .. '"' .. k .. '":' .. json.encode(v)
            first = false
        end
        return result .. "}"
    elseif type(obj) == "string" then
        return '"' .. obj .. '"'
    elseif type(obj) == "number" then
        return tostring(obj)
    elseif type(obj) == "boolean" then
        return obj and "true" or "false"
    else
        return "null"
    end
end

return json"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_catalog_shape() {
        let records = BuiltinCatalog.list().unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Table Utilities",
                "String Functions",
                "File Operations",
                "Math Utilities",
                "JSON Handler"
            ]
        );
        for r in &records {
            assert!((3..=5).contains(&r.keywords.len()), "{}", r.title);
        }
    }

    #[test]
    fn test_builtin_snippets_are_valid_lua() {
        for r in builtin_snippets() {
            validate_record(&r).unwrap_or_else(|e| panic!("{}: {}", r.title, e));
        }
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let no_keywords = SnippetRecord::new("A", &[], "return 1");
        assert!(validate_record(&no_keywords).is_err());

        let no_code = SnippetRecord::new("B", &["b"], "   ");
        assert!(validate_record(&no_code).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_keyword_among_valid_ones() {
        let mixed = SnippetRecord::new("Queue", &["", "queue"], "return {}");
        let err = validate_record(&mixed).unwrap_err();
        assert!(err.to_string().contains("blank keyword"));
    }

    #[test]
    fn test_load_catalog_file_rejects_blank_keyword() {
        let tmp = TempDir::new().unwrap();
        let path = write_catalog(
            &tmp,
            r#"
[[snippet]]
title = "Queue"
keywords = ["", "queue"]
code = "return {}"
"#,
        );
        let err = load_catalog_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("blank keyword"));
    }

    fn write_catalog(tmp: &TempDir, body: &str) -> PathBuf {
        let path = tmp.path().join("snippets.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_catalog_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_catalog(
            &tmp,
            r#"
[[snippet]]
title = "Queue"
keywords = ["queue", "fifo"]
code = '''
local Queue = {}
function Queue.new() return { first = 1, last = 0 } end
return Queue
'''
"#,
        );
        let catalog = load_catalog_file(&path).unwrap();
        let records = catalog.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Queue");
    }

    #[test]
    fn test_load_catalog_file_rejects_bad_lua() {
        let tmp = TempDir::new().unwrap();
        let path = write_catalog(
            &tmp,
            r#"
[[snippet]]
title = "Broken"
keywords = ["broken"]
code = "function broken("
"#,
        );
        let err = load_catalog_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Broken"));
    }

    #[test]
    fn test_catalog_from_config_appends_to_builtin() {
        let tmp = TempDir::new().unwrap();
        let path = write_catalog(
            &tmp,
            r#"
[[snippet]]
title = "Queue"
keywords = ["queue"]
code = "return {}"
"#,
        );

        let replaced = catalog_from_config(&CatalogConfig {
            path: Some(path.clone()),
            include_builtin: false,
        })
        .unwrap();
        assert_eq!(replaced.list().unwrap().len(), 1);

        let appended = catalog_from_config(&CatalogConfig {
            path: Some(path),
            include_builtin: true,
        })
        .unwrap();
        let records = appended.list().unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[5].title, "Queue");
    }

    #[test]
    fn test_catalog_from_config_default_is_builtin() {
        let catalog = catalog_from_config(&CatalogConfig::default()).unwrap();
        assert_eq!(catalog.list().unwrap().len(), 5);
    }
}
