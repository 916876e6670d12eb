use std::sync::Arc;

use tracing::debug;

use crate::{DynamicDatasourceContextHolder, Result};

/// Routes calls to a datasource by method name.
///
/// Patterns use `*` as a wildcard (`select*`, `*ById`, `*find*`). An exact
/// name beats any pattern; among patterns the longest one wins, and the first
/// registered wins a tie.
#[derive(Debug)]
pub struct NamedDatasourceRouter {
    context: Arc<DynamicDatasourceContextHolder>,
    mappings: Vec<(String, String)>,
}

impl NamedDatasourceRouter {
    pub fn new(context: Arc<DynamicDatasourceContextHolder>) -> Self {
        Self {
            context,
            mappings: Vec::new(),
        }
    }

    /// Routes methods matching `pattern` to `datasource`.
    pub fn add_pattern(
        &mut self,
        pattern: impl Into<String>,
        datasource: impl Into<String>,
    ) -> &mut Self {
        self.mappings.push((pattern.into(), datasource.into()));
        self
    }

    /// Routes every pattern in `patterns` to `datasource`.
    pub fn add_patterns<I, S>(&mut self, datasource: &str, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            self.add_pattern(pattern, datasource);
        }
        self
    }

    /// Registered `(pattern, datasource)` pairs in registration order.
    pub fn patterns(&self) -> &[(String, String)] {
        &self.mappings
    }

    /// The datasource `method` is routed to, if any pattern covers it.
    pub fn resolve(&self, method: &str) -> Option<&str> {
        if let Some((_, datasource)) = self.mappings.iter().find(|(pattern, _)| pattern == method)
        {
            return Some(datasource.as_str());
        }
        let mut best: Option<&(String, String)> = None;
        for mapping in &self.mappings {
            let (pattern, _) = mapping;
            if !simple_match(pattern, method) {
                continue;
            }
            if best.is_none_or(|(current, _)| pattern.len() > current.len()) {
                best = Some(mapping);
            }
        }
        best.map(|(_, datasource)| datasource.as_str())
    }

    /// Runs `f` routed by `method`, switching back afterwards even if `f`
    /// panics. Unmatched methods run on whatever the caller is routed to.
    pub fn invoke<R>(&self, method: &str, f: impl FnOnce() -> R) -> Result<R> {
        let Some(datasource) = self.resolve(method) else {
            debug!(method, "no datasource mapped, keeping current");
            return Ok(f());
        };
        debug!(method, datasource, "routing method");
        self.context.with_datasource(datasource, f)
    }
}

/// Matches `text` against a pattern where `*` stands for any run of
/// characters.
pub(crate) fn simple_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let mut parts: Vec<&str> = pattern.split('*').collect();
    let tail = parts.pop().unwrap_or_default();
    let mut parts = parts.into_iter();
    let head = parts.next().unwrap_or_default();

    let Some(mut rest) = text.strip_prefix(head) else {
        return false;
    };
    for part in parts {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(tail)
}
