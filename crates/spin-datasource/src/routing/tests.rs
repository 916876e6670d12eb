use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::{
    BoxError, Connection, CurrentDatasourceInfo, DataSource, DatasourceTopology,
    DynamicDatasourceContextHolder, Error, LoadBalanceStrategy, NamedDatasourceRouter,
    RoutingDataSource, TransactionProbe,
};

#[derive(Debug)]
struct MockConnection {
    pool: String,
    user: Option<String>,
    catalog: Mutex<Option<String>>,
}

impl Connection for MockConnection {
    fn set_catalog(&self, catalog: &str) -> Result<(), BoxError> {
        if catalog == "forbidden" {
            return Err("access denied".into());
        }
        *self.catalog.lock() = Some(catalog.to_owned());
        Ok(())
    }
}

impl MockConnection {
    fn catalog(&self) -> Option<String> {
        self.catalog.lock().clone()
    }
}

struct MockPool {
    name: String,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    broken: bool,
}

impl MockPool {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            opened: Arc::default(),
            closed: Arc::default(),
            broken: false,
        }
    }

    fn broken(name: &str) -> Self {
        Self {
            broken: true,
            ..Self::new(name)
        }
    }

    fn open(&self, user: Option<&str>) -> Result<MockConnection, BoxError> {
        if self.broken {
            return Err("pool exhausted".into());
        }
        self.opened.fetch_add(1, Ordering::Relaxed);
        Ok(MockConnection {
            pool: self.name.clone(),
            user: user.map(str::to_owned),
            catalog: Mutex::new(None),
        })
    }
}

impl DataSource for MockPool {
    type Connection = MockConnection;

    fn connection(&self) -> Result<MockConnection, BoxError> {
        self.open(None)
    }

    fn connection_with_credentials(
        &self,
        username: &str,
        _password: &str,
    ) -> Result<MockConnection, BoxError> {
        self.open(Some(username))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

/// A transaction manager whose current xid the test sets by hand.
#[derive(Default)]
struct XaProbe {
    xid: Mutex<Option<String>>,
}

impl TransactionProbe for Arc<XaProbe> {
    fn is_actual_transaction_active(&self) -> bool {
        self.xid.lock().is_some()
    }

    fn current_xid(&self) -> Option<String> {
        self.xid.lock().clone()
    }
}

fn router(topology: DatasourceTopology) -> RoutingDataSource<MockPool> {
    let context = Arc::new(DynamicDatasourceContextHolder::new(topology));
    let routing = RoutingDataSource::new(context);
    routing.add_data_source("primary", MockPool::new("primary"));
    routing.add_data_source("db1", MockPool::new("db1"));
    routing.add_data_source("db2", MockPool::new("db2"));
    routing
}

fn xa_router() -> (RoutingDataSource<MockPool>, Arc<XaProbe>) {
    let probe = Arc::new(XaProbe::default());
    let context = Arc::new(
        DynamicDatasourceContextHolder::new(DatasourceTopology::default())
            .with_transaction_probe(Arc::clone(&probe)),
    );
    let routing = RoutingDataSource::new(context);
    routing.add_data_source("primary", MockPool::new("primary"));
    routing.add_data_source("db1", MockPool::new("db1"));
    (routing, probe)
}

#[test]
fn empty_context_routes_to_primary() {
    let routing = router(DatasourceTopology::default());
    let connection = routing.connection().unwrap();
    assert_eq!(connection.pool, "primary");
}

#[test]
fn connection_follows_the_context_stack() {
    let routing = router(DatasourceTopology::default());
    let context = routing.context();

    context.push("db1").unwrap();
    assert_eq!(routing.connection().unwrap().pool, "db1");
    context.push("db2").unwrap();
    assert_eq!(routing.connection().unwrap().pool, "db2");
    context.poll().unwrap();
    assert_eq!(routing.connection().unwrap().pool, "db1");
    context.poll().unwrap();
    assert_eq!(routing.connection().unwrap().pool, "primary");
}

#[test]
fn unknown_name_falls_back_to_primary_unless_strict() {
    let lenient = router(DatasourceTopology::default());
    lenient.context().push("missing").unwrap();
    assert_eq!(lenient.connection().unwrap().pool, "primary");
    lenient.context().poll().unwrap();

    let strict = router(DatasourceTopology::default()).with_strict(true);
    strict.context().push("missing").unwrap();
    assert!(matches!(
        strict.connection(),
        Err(Error::DatasourceNotFound(name)) if name == "missing"
    ));
    strict.context().poll().unwrap();
}

#[test]
fn missing_primary_is_reported() {
    let context = Arc::new(DynamicDatasourceContextHolder::default());
    let routing = RoutingDataSource::<MockPool>::new(context);
    assert!(matches!(
        routing.determine_data_source(),
        Err(Error::PrimaryNotFound(name)) if name == "primary"
    ));
}

#[test]
fn groups_balance_between_members() {
    let context = Arc::new(DynamicDatasourceContextHolder::default());
    let routing = RoutingDataSource::new(context).with_strategy(LoadBalanceStrategy::RoundRobin);
    routing.add_data_source("primary", MockPool::new("primary"));
    routing.add_data_source("slave_1", MockPool::new("slave_1"));
    routing.add_data_source("slave_2", MockPool::new("slave_2"));
    assert_eq!(routing.group_names(), ["slave"]);

    let scope = routing.context().enter("slave").unwrap();
    let pools: Vec<_> = (0..4)
        .map(|_| routing.connection().unwrap().pool.clone())
        .collect();
    scope.exit().unwrap();

    assert_eq!(pools, ["slave_1", "slave_2", "slave_1", "slave_2"]);
}

#[test]
fn member_name_routes_to_that_member() {
    let routing = router(DatasourceTopology::default());
    routing.add_data_source("slave_1", MockPool::new("slave_1"));
    routing.add_data_source("slave_2", MockPool::new("slave_2"));

    let _scope = routing.context().enter("slave_2").unwrap();
    for _ in 0..3 {
        assert_eq!(routing.connection().unwrap().pool, "slave_2");
    }
}

#[test]
fn primary_may_be_a_group() {
    let context = Arc::new(DynamicDatasourceContextHolder::new(DatasourceTopology::new(
        "master",
    )));
    let routing = RoutingDataSource::new(context);
    routing.add_data_source("master_1", MockPool::new("master_1"));

    assert_eq!(routing.connection().unwrap().pool, "master_1");
}

#[test]
fn replacing_a_datasource_closes_the_old_one() {
    let routing = router(DatasourceTopology::default());
    let old = MockPool::new("db1");
    let old_closed = Arc::clone(&old.closed);
    routing.add_data_source("db1", old);

    routing.add_data_source("db1", MockPool::new("db1-v2"));
    assert!(old_closed.load(Ordering::Relaxed));

    let _scope = routing.context().enter("db1").unwrap();
    assert_eq!(routing.connection().unwrap().pool, "db1-v2");
}

#[test]
fn remove_closes_and_forgets() {
    let routing = router(DatasourceTopology::default());
    let pool = MockPool::new("slave_1");
    let closed = Arc::clone(&pool.closed);
    routing.add_data_source("slave_1", pool);

    assert!(routing.remove_data_source("slave_1").unwrap());
    assert!(closed.load(Ordering::Relaxed));
    assert!(routing.group_names().is_empty());
    assert!(!routing.remove_data_source("slave_1").unwrap());
    assert_eq!(routing.data_source_names(), ["db1", "db2", "primary"]);
}

#[test]
fn primary_cannot_be_removed() {
    let routing = router(DatasourceTopology::default());
    assert!(matches!(
        routing.remove_data_source("primary"),
        Err(Error::RemovePrimary(_))
    ));
    assert_eq!(routing.data_source_names().len(), 3);
}

#[test]
fn close_all_closes_every_pool() {
    let context = Arc::new(DynamicDatasourceContextHolder::default());
    let routing = RoutingDataSource::new(context);
    let flags: Vec<_> = ["primary", "db1", "slave_1"]
        .into_iter()
        .map(|name| {
            let pool = MockPool::new(name);
            let closed = Arc::clone(&pool.closed);
            routing.add_data_source(name, pool);
            closed
        })
        .collect();

    routing.close_all();

    assert!(flags.iter().all(|closed| closed.load(Ordering::Relaxed)));
    assert!(routing.data_source_names().is_empty());
    assert!(routing.group_names().is_empty());
}

#[test]
fn catalog_from_context_wins_over_default() {
    let topology = DatasourceTopology::default().with_default_catalog("db1", "shared");
    let routing = router(topology);
    let context = routing.context();

    context.push("db1").unwrap();
    assert_eq!(
        routing.connection().unwrap().catalog().as_deref(),
        Some("shared")
    );

    context
        .push_info(CurrentDatasourceInfo::with_catalog("db1", "tenant_7"))
        .unwrap();
    assert_eq!(
        routing.connection().unwrap().catalog().as_deref(),
        Some("tenant_7")
    );
    context.clear();

    context.push("db2").unwrap();
    assert_eq!(routing.connection().unwrap().catalog(), None);
    context.poll().unwrap();
}

#[test]
fn catalog_failure_is_reported() {
    let routing = router(DatasourceTopology::default());
    let _scope = routing
        .context()
        .enter_info(CurrentDatasourceInfo::with_catalog("db1", "forbidden"))
        .unwrap();

    assert!(matches!(
        routing.connection(),
        Err(Error::Catalog { catalog, .. }) if catalog == "forbidden"
    ));
}

#[test]
fn pool_failure_names_the_datasource() {
    let routing = router(DatasourceTopology::default());
    routing.add_data_source("flaky", MockPool::broken("flaky"));
    let _scope = routing.context().enter("flaky").unwrap();

    let err = routing.connection().unwrap_err();
    assert!(matches!(&err, Error::Connection { datasource, .. } if datasource == "flaky"));
    assert_eq!(
        std::error::Error::source(&err).map(ToString::to_string),
        Some("pool exhausted".to_owned())
    );
}

#[test]
fn credentials_are_passed_to_the_pool() {
    let routing = router(DatasourceTopology::default());
    let connection = routing
        .connection_with_credentials("reporter", "secret")
        .unwrap();
    assert_eq!(connection.user.as_deref(), Some("reporter"));
}

#[test]
fn transaction_reuses_one_connection_per_datasource() {
    let (routing, probe) = xa_router();
    let context = routing.context();
    *probe.xid.lock() = Some("xid-1".to_owned());

    context.push("db1").unwrap();
    let first = routing.connection().unwrap();
    let second = routing.connection().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    context.push("primary").unwrap();
    let other = routing.connection().unwrap();
    assert!(!Arc::ptr_eq(&first, &other));
    context.poll().unwrap();

    assert!(Arc::ptr_eq(&first, &routing.connection().unwrap()));
    assert_eq!(routing.registry().len(), 2);
    context.poll().unwrap();

    assert_eq!(routing.release_transaction("xid-1"), 2);
    assert!(routing.registry().is_empty());
}

#[test]
fn completed_transaction_releases_only_its_connections() {
    let (routing, probe) = xa_router();
    let _scope = routing.context().enter("db1").unwrap();

    *probe.xid.lock() = Some("xid-done".to_owned());
    let finished = routing.connection().unwrap();
    *probe.xid.lock() = Some("xid-open".to_owned());
    let open = routing.connection().unwrap();
    assert_eq!(routing.registry().len(), 2);

    assert_eq!(routing.release_transaction("xid-done"), 1);
    assert_eq!(routing.registry().len(), 1);
    assert_eq!(routing.release_transaction("xid-done"), 0);
    assert!(Arc::ptr_eq(&open, &routing.connection().unwrap()));

    // A reused xid starts over with a fresh connection.
    *probe.xid.lock() = Some("xid-done".to_owned());
    assert!(!Arc::ptr_eq(&finished, &routing.connection().unwrap()));

    routing.release_transaction("xid-done");
    routing.release_transaction("xid-open");
    assert!(routing.registry().is_empty());
}

#[test]
fn transaction_without_context_entry_opens_fresh_connections() {
    let (routing, probe) = xa_router();
    *probe.xid.lock() = Some("xid-2".to_owned());

    let first = routing.connection().unwrap();
    let second = routing.connection().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(routing.registry().is_empty());
}

#[test]
fn separate_transactions_get_separate_connections() {
    let (routing, probe) = xa_router();
    let _scope = routing.context().enter("db1").unwrap();

    *probe.xid.lock() = Some("xid-a".to_owned());
    let a = routing.connection().unwrap();
    *probe.xid.lock() = Some("xid-b".to_owned());
    let b = routing.connection().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(routing.registry().release("xid-a"), 1);
    assert_eq!(routing.registry().len(), 1);
}

#[test]
fn named_router_prefers_exact_then_longest_pattern() {
    let context = Arc::new(DynamicDatasourceContextHolder::default());
    let mut named = NamedDatasourceRouter::new(context);
    named
        .add_patterns("slave", ["select*", "find*", "*ById"])
        .add_pattern("selectForUpdate", "master")
        .add_pattern("selectAudit*", "audit");

    assert_eq!(named.resolve("selectForUpdate"), Some("master"));
    assert_eq!(named.resolve("selectAuditLog"), Some("audit"));
    assert_eq!(named.resolve("selectUsers"), Some("slave"));
    assert_eq!(named.resolve("deleteById"), Some("slave"));
    assert_eq!(named.resolve("insert"), None);
    assert_eq!(named.patterns().len(), 5);
}

#[test]
fn named_router_first_pattern_wins_a_tie() {
    let context = Arc::new(DynamicDatasourceContextHolder::default());
    let mut named = NamedDatasourceRouter::new(context);
    named.add_pattern("get*", "db1").add_pattern("*Map", "db2");

    assert_eq!(named.resolve("getMap"), Some("db1"));
}

#[test]
fn named_router_switches_for_the_call_only() {
    let context = Arc::new(DynamicDatasourceContextHolder::default());
    let routing = RoutingDataSource::new(Arc::clone(&context));
    routing.add_data_source("primary", MockPool::new("primary"));
    routing.add_data_source("db1", MockPool::new("db1"));

    let mut named = NamedDatasourceRouter::new(Arc::clone(&context));
    named.add_pattern("query*", "db1");

    let pool = named
        .invoke("queryOrders", || routing.connection().unwrap().pool.clone())
        .unwrap();
    assert_eq!(pool, "db1");
    assert!(!context.has_thread_state());

    let pool = named
        .invoke("insertOrder", || routing.connection().unwrap().pool.clone())
        .unwrap();
    assert_eq!(pool, "primary");
}
