use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use elif_inject::{
    CycleGuard, InjectError, Initializer, Injector, InjectorConfig, Instance, Properties, Reflect,
    Tag, TagContext,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("elif_inject=debug")
        .try_init();
}

pub trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}
elif_inject::interface!(Greeter);

pub trait Mailer: Send + Sync {
    fn send(&self, to: &str) -> bool;
}
elif_inject::interface!(Mailer);

#[derive(Debug, Default, Reflect)]
#[reflect(provides(Greeter))]
struct HelloGreeter {
    #[reflect(tag = r#"value:"hello""#)]
    greeting: String,
}

impl Greeter for HelloGreeter {
    fn greet(&self) -> String {
        self.greeting.clone()
    }
}

#[derive(Debug, Default, Reflect)]
struct Settings {
    #[reflect(tag = r#"value:"${server.port:8080}""#)]
    port: u16,
    #[reflect(tag = r#"value:"${app.name}""#)]
    name: String,
}

#[derive(Default, Reflect)]
struct Inner {
    greeter: Option<Arc<dyn Greeter>>,
}

#[derive(Default, Reflect)]
struct App {
    settings: Option<Arc<Settings>>,
    greeter: Option<Arc<dyn Greeter>>,
    inner: Inner,
    #[reflect(tag = r#"inject:"settings""#)]
    config: Option<Arc<Settings>>,
}

#[test]
fn test_fields_resolve_by_name_and_interface() {
    init_tracing();
    let mut injector = Injector::new();
    injector.register(Settings {
        port: 9000,
        name: "demo".to_string(),
    });
    injector.register(HelloGreeter {
        greeting: "hi".to_string(),
    });
    injector.add_tag(elif_inject::InjectTag).unwrap();

    let mut app = App::default();
    injector.into_object(&mut app).unwrap();

    assert_eq!(app.settings.as_ref().unwrap().port, 9000);
    assert_eq!(app.greeter.as_ref().unwrap().greet(), "hi");
    assert_eq!(app.inner.greeter.as_ref().unwrap().greet(), "hi");
    assert!(Arc::ptr_eq(
        app.settings.as_ref().unwrap(),
        app.config.as_ref().unwrap()
    ));
}

#[test]
fn test_value_tag_reads_properties() {
    let mut properties = Properties::new();
    properties.set("app.name", "inventory");
    let mut injector = Injector::with_default_tags(properties).unwrap();

    let mut settings = Settings::default();
    injector.into_object(&mut settings).unwrap();

    assert_eq!(settings.port, 8080);
    assert_eq!(settings.name, "inventory");
}

#[test]
fn test_interface_mismatch_is_not_implemented() {
    let mut injector = Injector::new();
    injector.register_named("greeter", Settings::default());

    let mut app = App::default();
    let error = injector.into_object(&mut app).unwrap_err();
    assert!(matches!(error, InjectError::NotImplemented { .. }));
}

struct CounterTag {
    decoded: Arc<AtomicUsize>,
}

impl Tag for CounterTag {
    fn decode(&self, _ctx: &TagContext<'_>, literal: &str) -> Option<Instance> {
        let count = self.decoded.fetch_add(1, Ordering::SeqCst) + 1;
        Some(Arc::new(format!("{}-{}", literal, count)))
    }

    fn is_singleton(&self) -> bool {
        true
    }
}

#[derive(Default, Reflect)]
struct Tracked {
    #[reflect(tag = r#"counter:"id""#)]
    request_id: String,
}

#[test]
fn test_singleton_tags_are_cached_by_field_name() {
    let decoded = Arc::new(AtomicUsize::new(0));
    let mut injector = Injector::new();
    injector
        .add_tag(CounterTag {
            decoded: Arc::clone(&decoded),
        })
        .unwrap();
    assert!(injector.tags().contains("counter"));

    let mut first = Tracked::default();
    let mut second = Tracked::default();
    injector.into_object(&mut first).unwrap();
    injector.into_object(&mut second).unwrap();

    assert_eq!(first.request_id, "id-1");
    assert_eq!(second.request_id, "id-1");
    assert_eq!(decoded.load(Ordering::SeqCst), 1);
    assert!(injector.instances().contains("requestId"));
}

#[derive(Default, Reflect)]
struct Strict {
    #[reflect(tag = r#"value:"abc""#)]
    port: u32,
    #[reflect(tag = r#"value:"later""#)]
    name: String,
}

#[test]
fn test_errors_are_fail_fast() {
    let mut injector = Injector::with_default_tags(Properties::new()).unwrap();
    let mut strict = Strict::default();

    let error = injector.into_object(&mut strict).unwrap_err();
    assert!(error.is_unsupported());
    assert!(error.to_string().contains("Strict.port"));
    assert!(strict.name.is_empty());
}

#[derive(Debug, Default, Reflect)]
struct Repository {
    #[reflect(tag = r#"value:"users""#)]
    table: String,
}

#[derive(Default, Reflect)]
#[reflect(init)]
struct UserService {
    repository: Option<Arc<Repository>>,
    initialized: bool,
}

impl Initializer for UserService {
    type Params = (Arc<Repository>,);

    fn init(&mut self, (repository,): Self::Params) {
        self.repository = Some(repository);
        self.initialized = true;
    }
}

#[test]
fn test_init_constructs_and_caches_concrete_params() {
    init_tracing();
    let mut injector = Injector::with_default_tags(Properties::new()).unwrap();
    let mut service = UserService {
        repository: None,
        initialized: false,
    };

    injector.into_object(&mut service).unwrap();

    assert!(service.initialized);
    assert_eq!(service.repository.as_ref().unwrap().table, "users");
    let cached = injector.instances().get_as::<Repository>("repository").unwrap();
    assert!(Arc::ptr_eq(&cached, service.repository.as_ref().unwrap()));
}

#[derive(Default, Reflect)]
#[reflect(init)]
struct ReportService {
    table: String,
    ready: bool,
}

impl Initializer for ReportService {
    type Params = (Arc<Repository>,);

    fn init(&mut self, (repository,): Self::Params) {
        self.table = repository.table.clone();
        self.ready = true;
    }
}

#[test]
fn test_init_reinjects_uniquely_held_instances() {
    let mut injector = Injector::with_default_tags(Properties::new()).unwrap();
    injector.register(Repository::default());

    let mut report = ReportService::default();
    injector.into_object(&mut report).unwrap();

    assert!(report.ready);
    assert_eq!(report.table, "users");
}

#[test]
fn test_init_leaves_registered_instances_when_disabled() {
    let config = InjectorConfig {
        reinject_instances: false,
        ..InjectorConfig::default()
    };
    let mut injector = Injector::with_config(config);
    injector.add_default_tags(Properties::new()).unwrap();
    injector.register(Repository::default());

    let mut report = ReportService::default();
    injector.into_object(&mut report).unwrap();

    assert!(report.ready);
    assert_eq!(report.table, "");
}

#[test]
fn test_init_leaves_shared_instances_alone() {
    let mut injector = Injector::with_default_tags(Properties::new()).unwrap();
    let shared = Arc::new(Repository::default());
    injector.register_instance("repository", shared.clone());

    let mut report = ReportService::default();
    injector.into_object(&mut report).unwrap();

    assert!(report.ready);
    assert_eq!(report.table, "");
    assert_eq!(Arc::strong_count(&shared), 2);
}

#[derive(Default, Reflect)]
#[reflect(init)]
struct Notifier {
    sent: bool,
}

impl Initializer for Notifier {
    type Params = (Arc<dyn Mailer>,);

    fn init(&mut self, (mailer,): Self::Params) {
        self.sent = mailer.send("admin");
    }
}

#[test]
fn test_init_skipped_without_interface_instance() {
    let mut injector = Injector::new();
    let mut notifier = Notifier::default();

    injector.into_object(&mut notifier).unwrap();
    assert!(!notifier.sent);
}

#[derive(Default, Reflect)]
#[reflect(provides(Mailer))]
struct SmtpMailer;

impl Mailer for SmtpMailer {
    fn send(&self, to: &str) -> bool {
        !to.is_empty()
    }
}

#[test]
fn test_init_resolves_interface_by_provider() {
    let mut injector = Injector::new();
    injector.register(SmtpMailer);

    let mut notifier = Notifier::default();
    injector.into_object(&mut notifier).unwrap();
    assert!(notifier.sent);
}

mod fixtures {
    use elif_inject::Reflect;

    #[derive(Debug, Default, Reflect)]
    pub struct Widget {
        pub id: u32,
    }
}

#[derive(Default, Reflect)]
#[reflect(init)]
struct Dashboard {
    widget_id: u32,
}

impl Initializer for Dashboard {
    type Params = (Arc<fixtures::Widget>,);

    fn init(&mut self, (widget,): Self::Params) {
        self.widget_id = widget.id;
    }
}

#[test]
fn test_init_uses_package_qualified_name() {
    let mut injector = Injector::new();
    injector.register_named("fixturesWidget", fixtures::Widget { id: 7 });

    let mut dashboard = Dashboard::default();
    injector.into_object(&mut dashboard).unwrap();

    assert_eq!(dashboard.widget_id, 7);
    assert!(!injector.instances().contains("widget"));
}

#[derive(Default, Reflect)]
#[reflect(init)]
struct Recursive {
    depth: u32,
}

impl Initializer for Recursive {
    type Params = (Arc<Recursive>,);

    fn init(&mut self, (other,): Self::Params) {
        self.depth = other.depth + 1;
    }
}

#[test]
fn test_init_param_of_receiver_type_is_illegal() {
    let mut injector = Injector::new();
    let mut recursive = Recursive::default();

    let error = injector.into_object(&mut recursive).unwrap_err();
    assert_eq!(
        error,
        InjectError::IllegalArgument {
            type_name: "Recursive".to_string()
        }
    );
}

#[derive(Default, Reflect)]
#[reflect(init)]
struct Left {
    right: Option<Arc<Right>>,
}

impl Initializer for Left {
    type Params = (Arc<Right>,);

    fn init(&mut self, (right,): Self::Params) {
        self.right = Some(right);
    }
}

#[derive(Default, Reflect)]
#[reflect(init)]
struct Right {
    left: Option<Arc<Left>>,
}

impl Initializer for Right {
    type Params = (Arc<Left>,);

    fn init(&mut self, (left,): Self::Params) {
        self.left = Some(left);
    }
}

#[test]
fn test_mutual_initializers_terminate() {
    init_tracing();
    let mut injector = Injector::new();
    let mut left = Left::default();

    injector.into_object(&mut left).unwrap();

    let right = left.right.as_ref().unwrap();
    let zero_left = right.left.as_ref().unwrap();
    assert!(zero_left.right.is_none());

    let cached_left = injector.instances().get_as::<Left>("left").unwrap();
    assert!(Arc::ptr_eq(&cached_left, zero_left));
    let cached_right = injector.instances().get_as::<Right>("right").unwrap();
    assert!(Arc::ptr_eq(&cached_right, right));
}

#[test]
fn test_self_only_guard_is_bounded_by_depth() {
    let config = InjectorConfig {
        cycle_guard: CycleGuard::SelfOnly,
        max_depth: 6,
        ..InjectorConfig::default()
    };
    let mut injector = Injector::with_config(config);
    let mut left = Left::default();

    injector.into_object(&mut left).unwrap();

    let right = left.right.as_ref().unwrap();
    assert!(right.left.is_some());
    assert!(injector.instances().contains("left"));
}
