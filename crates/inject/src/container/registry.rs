use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::reflect::naming::lower_first;
use crate::reflect::{Injectable, Instance, Reflect, TypeInfo};

/// Name keyed store of constructed instances (the singleton cache).
///
/// Keys are lower camel case type names. Entries live until the registry is
/// dropped; there is no eviction.
#[derive(Default)]
pub struct InstanceRegistry {
    instances: HashMap<String, Instance>,
    order: Vec<String>,
}

impl InstanceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance under its type name, returning the key used
    pub fn register<T: Reflect>(&mut self, instance: T) -> String {
        let name = instance.type_info().instance_name();
        self.save(&name, Arc::new(instance));
        name
    }

    /// Register an instance under an explicit name
    pub fn register_named<T: Reflect>(&mut self, name: &str, instance: T) -> String {
        let name = lower_first(name);
        self.save(&name, Arc::new(instance));
        name
    }

    /// Store an instance; the first letter of `name` is lowered
    pub fn save(&mut self, name: &str, instance: Instance) {
        let name = lower_first(name);
        // taken entries keep their slot in `order`
        if !self.order.contains(&name) {
            self.order.push(name.clone());
        }
        self.instances.insert(name, instance);
    }

    /// Look up an instance by exact name
    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.instances.get(&lower_first(name))
    }

    /// Look up and downcast an instance
    pub fn get_as<T: ?Sized + Injectable>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).and_then(T::from_instance)
    }

    /// Check if an instance is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(&lower_first(name))
    }

    /// Resolve by exact name, falling back to interface satisfaction.
    ///
    /// When `declared` is an interface and nothing is registered under
    /// `name`, the first instance (in registration order) whose type declares
    /// the interface is returned.
    pub fn resolve(&self, name: &str, declared: &TypeInfo) -> Option<Instance> {
        if let Some(instance) = self.get(name) {
            return Some(Arc::clone(instance));
        }

        if !declared.is_interface() {
            return None;
        }

        self.order
            .iter()
            .filter_map(|key| self.instances.get(key))
            .find(|instance| instance.type_info().provided(declared.name).is_some())
            .cloned()
    }

    /// Remove an instance so it can be mutated while uniquely held
    pub fn take(&mut self, name: &str) -> Option<Instance> {
        self.instances.remove(&lower_first(name))
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter(|name| self.instances.contains_key(*name))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in self.names() {
            if let Some(instance) = self.instances.get(name) {
                map.entry(&name, &instance.type_info().name);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflect;

    pub trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }
    crate::interface!(Greeter);

    #[derive(Debug, Default, Reflect)]
    #[reflect(provides(Greeter))]
    struct HelloGreeter {
        greeting: String,
    }

    impl Greeter for HelloGreeter {
        fn greet(&self) -> String {
            self.greeting.clone()
        }
    }

    #[derive(Debug, Default, Reflect)]
    struct Settings {
        port: u16,
    }

    #[test]
    fn test_register_uses_lower_camel_type_name() {
        let mut registry = InstanceRegistry::new();
        let name = registry.register(Settings { port: 8080 });

        assert_eq!(name, "settings");
        assert!(registry.contains("Settings"));
        assert_eq!(registry.get_as::<Settings>("settings").unwrap().port, 8080);
    }

    #[test]
    fn test_resolve_falls_back_to_provided_interface() {
        let mut registry = InstanceRegistry::new();
        registry.register(Settings::default());
        registry.register(HelloGreeter {
            greeting: "hello".to_string(),
        });

        let declared = <dyn Greeter as crate::Typed>::type_info();
        let instance = registry.resolve("greeter", declared).unwrap();
        let greeter = <dyn Greeter as Injectable>::from_instance(&instance).unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_resolve_does_not_fall_back_for_concrete_types() {
        let mut registry = InstanceRegistry::new();
        registry.register(HelloGreeter::default());

        let declared = <Settings as crate::Typed>::type_info();
        assert!(registry.resolve("settings", declared).is_none());
    }

    #[test]
    fn test_take_and_save_keep_registration_order() {
        let mut registry = InstanceRegistry::new();
        registry.register(Settings::default());
        registry.register(HelloGreeter::default());

        let taken = registry.take("settings").unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["helloGreeter"]);

        registry.save("settings", taken);
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["settings", "helloGreeter"]
        );
    }

    #[test]
    fn test_repeated_take_and_save_do_not_duplicate_names() {
        let mut registry = InstanceRegistry::new();
        registry.register(Settings::default());

        for _ in 0..3 {
            let taken = registry.take("settings").unwrap();
            registry.save("settings", taken);
        }

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["settings"]);
        assert_eq!(registry.order.len(), 1);
        assert_eq!(format!("{:?}", registry), r#"{"settings": "Settings"}"#);
    }
}
