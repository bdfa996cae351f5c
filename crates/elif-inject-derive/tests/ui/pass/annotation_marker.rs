use elif_inject::{at, Reflect, Typed};

#[derive(Debug, Clone, Default, Reflect)]
#[reflect(annotation, clone)]
struct AtCached {
    #[reflect(embed)]
    annotation: at::Annotation,
    ttl: u64,
}

#[derive(Default, Reflect)]
struct Handler {
    #[reflect(tag = r#"value:"users" ttl:"60""#)]
    cached: AtCached,
}

fn main() {
    assert!(<AtCached as Typed>::type_info().is_annotation());
    assert!(<AtCached as Typed>::type_info().assignable);

    let handler = Handler::default();
    let _ = (&handler.cached.annotation, handler.cached.ttl);
}
