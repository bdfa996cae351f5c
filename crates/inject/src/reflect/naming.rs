//! Name conventions shared by the registries.
//!
//! Instances are keyed by the lower camel case form of their type name
//! (`GreetingService` → `greetingService`), and fields are matched against
//! those keys after converting their snake case names (`greeting_service` →
//! `greetingService`).

/// Lower the first character: `Greeter` → `greeter`
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper the first character: `greeter` → `Greeter`
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert a snake case identifier to upper camel case
pub fn upper_camel(name: &str) -> String {
    name.split('_')
        .filter(|segment| !segment.is_empty())
        .map(upper_first)
        .collect()
}

/// Convert a field or type name to its registry key
pub fn instance_name(name: &str) -> String {
    if name.contains('_') {
        lower_first(&upper_camel(name))
    } else {
        lower_first(name)
    }
}

/// Strip the module path and generic arguments from a `std::any::type_name`
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Last segment of a module path: `app::services` → `services`
pub fn package_name(module_path: &str) -> &str {
    module_path.rsplit("::").next().unwrap_or(module_path)
}

/// Derive an object name from its type name by removing `eliminator`,
/// e.g. `ValueTag` with `Tag` → `value`
pub fn object_name(type_name: &str, eliminator: &str) -> String {
    let short = short_type_name(type_name);
    let stripped = if eliminator.is_empty() {
        short.to_string()
    } else {
        short.replace(eliminator, "")
    };
    lower_first(&stripped)
}

/// Normalize a tag key or field name for loose comparison
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
