use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use portable_atomic::{AtomicUsize, Ordering};
use rand::Rng;

/// Separates a group name from a member suffix: `slave_1` joins group `slave`.
pub const GROUP_SEPARATOR: char = '_';

/// The group a datasource name belongs to, if any.
pub fn group_of(datasource: &str) -> Option<&str> {
    datasource
        .split_once(GROUP_SEPARATOR)
        .map(|(group, _)| group)
        .filter(|group| !group.is_empty())
}

/// How a group picks one of its members for a connection.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LoadBalanceStrategy {
    #[default]
    RoundRobin,
    Random,
}

impl FromStr for LoadBalanceStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "round-robin" | "roundrobin" | "loadbalance" => Ok(Self::RoundRobin),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown load balance strategy `{other}`")),
        }
    }
}

/// Datasources sharing a name prefix, selected by a [`LoadBalanceStrategy`].
pub struct GroupDataSource<D> {
    name: String,
    strategy: LoadBalanceStrategy,
    members: RwLock<Vec<(String, Arc<D>)>>,
    cursor: AtomicUsize,
}

impl<D> GroupDataSource<D> {
    pub fn new(name: impl Into<String>, strategy: LoadBalanceStrategy) -> Self {
        Self {
            name: name.into(),
            strategy,
            members: RwLock::new(Vec::new()),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> LoadBalanceStrategy {
        self.strategy
    }

    /// Adds or replaces the member called `datasource`.
    pub fn add(&self, datasource: impl Into<String>, source: Arc<D>) {
        let datasource = datasource.into();
        let mut members = self.members.write();
        match members.iter_mut().find(|(name, _)| *name == datasource) {
            Some(member) => member.1 = source,
            None => members.push((datasource, source)),
        }
    }

    pub fn remove(&self, datasource: &str) -> Option<Arc<D>> {
        let mut members = self.members.write();
        let index = members.iter().position(|(name, _)| name == datasource)?;
        Some(members.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members
            .read()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Picks a member, or `None` for an empty group.
    pub fn select(&self) -> Option<(String, Arc<D>)> {
        let members = self.members.read();
        if members.is_empty() {
            return None;
        }
        let index = match self.strategy {
            LoadBalanceStrategy::RoundRobin => {
                self.cursor.fetch_add(1, Ordering::Relaxed) % members.len()
            }
            LoadBalanceStrategy::Random => rand::rng().random_range(0..members.len()),
        };
        let (name, source) = &members[index];
        Some((name.clone(), Arc::clone(source)))
    }
}

impl<D> fmt::Debug for GroupDataSource<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupDataSource")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("members", &self.member_names())
            .finish()
    }
}
