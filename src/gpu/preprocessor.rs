use std::collections::{HashMap, HashSet};

use crate::error::{BenchError, BenchResult};

/// Built-in WGSL sources, addressable by `#include`
const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("common.wgsl", include_str!("shaders/common.wgsl")),
    ("unary.wgsl", include_str!("shaders/unary.wgsl")),
    ("ternary.wgsl", include_str!("shaders/ternary.wgsl")),
];

/// Small WGSL preprocessor.
///
/// Resolves `#include "file.wgsl"` against in-memory sources and replaces
/// `{{NAME}}` placeholders with defined values. A placeholder left without a
/// definition is an error rather than being passed on to the compiler.
pub struct WgslPreprocessor {
    sources: HashMap<&'static str, &'static str>,
    defines: HashMap<String, String>,
    processed_files: HashSet<String>,
}

impl WgslPreprocessor {
    pub fn new() -> Self {
        Self {
            sources: BUILTIN_SOURCES.iter().copied().collect(),
            defines: HashMap::new(),
            processed_files: HashSet::new(),
        }
    }

    /// Register an additional include-able source
    pub fn add_source(&mut self, name: &'static str, source: &'static str) {
        self.sources.insert(name, source);
    }

    pub fn define(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.defines.insert(name.to_string(), value.into());
        self
    }

    /// Expand a registered source by name
    pub fn process(&mut self, name: &str) -> BenchResult<String> {
        let source = self.lookup(name)?;
        self.processed_files.clear();
        self.processed_files.insert(name.to_string());
        let expanded = self.process_content(source, name)?;
        self.substitute(&expanded, name)
    }

    fn lookup(&self, name: &str) -> BenchResult<&'static str> {
        self.sources
            .get(name)
            .copied()
            .ok_or_else(|| BenchError::ShaderCompilation {
                shader: name.to_string(),
                message: "could not find shader source".to_string(),
            })
    }

    fn process_content(&mut self, content: &str, current_file: &str) -> BenchResult<String> {
        let mut result = String::new();

        for line in content.lines() {
            if let Some(include) = Self::parse_include_directive(line) {
                if self.processed_files.insert(include.clone()) {
                    let included = self.lookup(&include).map_err(|_| BenchError::ShaderCompilation {
                        shader: current_file.to_string(),
                        message: format!("could not find include file: {}", include),
                    })?;
                    let processed = self.process_content(included, &include)?;
                    result.push_str(&processed);
                    result.push('\n');
                } else {
                    result.push_str("// Skipped repeated include: ");
                    result.push_str(&include);
                    result.push('\n');
                }
            } else {
                result.push_str(line);
                result.push('\n');
            }
        }

        Ok(result)
    }

    fn substitute(&self, content: &str, shader: &str) -> BenchResult<String> {
        let mut output = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| BenchError::ShaderCompilation {
                shader: shader.to_string(),
                message: "unterminated placeholder".to_string(),
            })?;
            let key = after[..end].trim();
            let value = self.defines.get(key).ok_or_else(|| BenchError::ShaderCompilation {
                shader: shader.to_string(),
                message: format!("no value defined for {{{{{}}}}}", key),
            })?;
            output.push_str(value);
            rest = &after[end + 2..];
        }
        output.push_str(rest);

        Ok(output)
    }

    /// Parse an #include directive from a line
    fn parse_include_directive(line: &str) -> Option<String> {
        let after_include = line.trim().strip_prefix("#include")?.trim();

        if after_include.starts_with('"') && after_include.ends_with('"') && after_include.len() > 1 {
            Some(after_include.trim_matches('"').to_string())
        } else if after_include.starts_with('<') && after_include.ends_with('>') {
            Some(after_include.trim_start_matches('<').trim_end_matches('>').to_string())
        } else {
            None
        }
    }
}

impl Default for WgslPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_and_defines() {
        let mut pre = WgslPreprocessor::new();
        pre.define("T", "f32")
            .define("EXPR", "sin(x)")
            .define("WORKGROUP_SIZE", "64");
        let source = pre.process("unary.wgsl").unwrap();

        assert!(source.contains("fn element_index"));
        assert!(source.contains("array<f32>"));
        assert!(source.contains("results[i] = sin(x);"));
        assert!(source.contains("@workgroup_size(64)"));
        assert!(!source.contains("{{"));
        assert!(!source.contains("#include"));
    }

    #[test]
    fn test_missing_define_is_error() {
        let mut pre = WgslPreprocessor::new();
        pre.define("T", "f32");
        let err = pre.process("ternary.wgsl").unwrap_err();
        assert!(matches!(err, BenchError::ShaderCompilation { .. }));
    }

    #[test]
    fn test_repeated_include_skipped() {
        let mut pre = WgslPreprocessor::new();
        pre.add_source("twice.wgsl", "#include \"common.wgsl\"\n#include <common.wgsl>\n");
        let source = pre.process("twice.wgsl").unwrap();
        assert_eq!(source.matches("fn element_index").count(), 1);
        assert!(source.contains("// Skipped repeated include: common.wgsl"));
    }

    #[test]
    fn test_unknown_include_is_error() {
        let mut pre = WgslPreprocessor::new();
        pre.add_source("broken.wgsl", "#include \"missing.wgsl\"\n");
        assert!(pre.process("broken.wgsl").is_err());
    }
}
