use elif_inject::{Reflect, Typed, TypeKind};

#[derive(Default, Reflect)]
struct Settings {
    #[reflect(tag = r#"value:"8080""#)]
    port: u16,
    host: String,
    #[reflect(skip)]
    cache: Vec<u8>,
}

#[derive(Reflect)]
struct Empty;

impl Default for Empty {
    fn default() -> Self {
        Empty
    }
}

fn main() {
    let info = <Settings as Typed>::type_info();
    assert_eq!(info.kind, TypeKind::Struct);
    assert_eq!(info.fields.len(), 2);
    assert!(<Empty as Typed>::type_info().fields.is_empty());

    let settings = Settings::default();
    let _ = (&settings.port, &settings.host, &settings.cache);
}
