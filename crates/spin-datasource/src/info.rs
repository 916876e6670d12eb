use core::fmt;
use std::collections::HashMap;

/// Name used for the primary datasource unless configured otherwise.
pub const DEFAULT_PRIMARY: &str = "primary";

/// A routing target: a datasource and, optionally, a catalog within it.
///
/// Compared by value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrentDatasourceInfo {
    datasource: String,
    catalog: Option<String>,
}

impl CurrentDatasourceInfo {
    pub fn new(datasource: impl Into<String>) -> Self {
        Self {
            datasource: datasource.into(),
            catalog: None,
        }
    }

    pub fn with_catalog(datasource: impl Into<String>, catalog: impl Into<String>) -> Self {
        Self {
            datasource: datasource.into(),
            catalog: Some(catalog.into()),
        }
    }

    pub fn datasource(&self) -> &str {
        &self.datasource
    }

    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }
}

impl fmt::Display for CurrentDatasourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.catalog {
            Some(catalog) => write!(f, "{}[{catalog}]", self.datasource),
            None => f.write_str(&self.datasource),
        }
    }
}

impl From<&str> for CurrentDatasourceInfo {
    fn from(datasource: &str) -> Self {
        Self::new(datasource)
    }
}

/// The static shape of the datasource fleet: which one is primary and which
/// catalog each one defaults to.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasourceTopology {
    primary: String,
    default_catalogs: HashMap<String, String>,
}

impl Default for DatasourceTopology {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY)
    }
}

impl DatasourceTopology {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            default_catalogs: HashMap::new(),
        }
    }

    /// Records the catalog connections of `datasource` use when the routing
    /// target names none.
    pub fn with_default_catalog(
        mut self,
        datasource: impl Into<String>,
        catalog: impl Into<String>,
    ) -> Self {
        self.default_catalogs
            .insert(datasource.into(), catalog.into());
        self
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn default_catalog(&self, datasource: &str) -> Option<&str> {
        self.default_catalogs.get(datasource).map(String::as_str)
    }

    /// The routing target in effect when nothing has been pushed.
    pub fn primary_info(&self) -> CurrentDatasourceInfo {
        CurrentDatasourceInfo {
            datasource: self.primary.clone(),
            catalog: self.default_catalog(&self.primary).map(str::to_owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_catalog_when_present() {
        assert_eq!(CurrentDatasourceInfo::new("db1").to_string(), "db1");
        assert_eq!(
            CurrentDatasourceInfo::with_catalog("db1", "tenant_a").to_string(),
            "db1[tenant_a]"
        );
    }

    #[test]
    fn primary_info_carries_default_catalog() {
        let topology = DatasourceTopology::new("main").with_default_catalog("main", "app");
        assert_eq!(
            topology.primary_info(),
            CurrentDatasourceInfo::with_catalog("main", "app")
        );
        assert_eq!(
            DatasourceTopology::default().primary_info(),
            CurrentDatasourceInfo::new(DEFAULT_PRIMARY)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn info_serializes_by_field() {
        let info = CurrentDatasourceInfo::with_catalog("db1", "tenant_a");
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"datasource":"db1","catalog":"tenant_a"}"#);
        assert_eq!(
            serde_json::from_str::<CurrentDatasourceInfo>(&json).unwrap(),
            info
        );
    }
}
