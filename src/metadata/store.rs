use super::{ControllerId, ControllerMetadata};
use crate::controller::Controller;
use crate::decorators::{ClassDecorator, MethodDecorator};
use dashmap::mapref::one::RefMut;
use dashmap::{DashMap, DashSet};

/// Side table of controller metadata, keyed by controller type.
///
/// Decorators write into it while a controller is loaded, discovery reads it
/// back afterwards. Nothing is ever removed.
#[derive(Default)]
pub struct MetadataStore {
    controllers: DashMap<ControllerId, ControllerMetadata>,
    loaded: DashSet<ControllerId>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the metadata of `C` for decoration.
    ///
    /// The returned guard holds the entry's shard lock until dropped; do not
    /// read the store for the same controller while it is alive.
    pub fn decorate<C: ?Sized + 'static>(&self) -> Decorate<'_> {
        self.decorate_id(ControllerId::of::<C>())
    }

    pub fn decorate_id(&self, id: ControllerId) -> Decorate<'_> {
        Decorate {
            id,
            entry: self.controllers.entry(id).or_default(),
        }
    }

    /// Runs the decorators of `C` the first time it is loaded into this store.
    /// Later calls only return its id.
    pub fn load<C: Controller>(&self) -> ControllerId {
        let id = ControllerId::of::<C>();
        if self.loaded.insert(id) {
            let mut decorate = self.decorate_id(id);
            C::decorate(&mut decorate);
            tracing::trace!("Loaded controller metadata: {}", id.name());
        }
        id
    }

    pub fn is_loaded(&self, id: &ControllerId) -> bool {
        self.loaded.contains(id)
    }

    /// Snapshot of the metadata recorded for `id`.
    pub fn get(&self, id: &ControllerId) -> Option<ControllerMetadata> {
        self.controllers.get(id).map(|metadata| metadata.clone())
    }

    pub fn contains(&self, id: &ControllerId) -> bool {
        self.controllers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

/// Builder over one controller's metadata.
///
/// Call order is the application order: constraints and middleware
/// accumulate in the order the calls are made, and the first method
/// decorator applied to a key fixes its verb, pattern and name.
pub struct Decorate<'a> {
    id: ControllerId,
    entry: RefMut<'a, ControllerId, ControllerMetadata>,
}

impl Decorate<'_> {
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// Applies a method-level decorator to the method named `key`.
    pub fn method<D: MethodDecorator>(&mut self, key: &str, decorator: D) -> &mut Self {
        decorator.apply(self.entry.routes_mut().entry(key));
        self
    }

    /// Applies a class-level decorator.
    pub fn class<D: ClassDecorator>(&mut self, decorator: D) -> &mut Self {
        decorator.apply(self.entry.resource_mut());
        self
    }

    pub fn metadata(&self) -> &ControllerMetadata {
        &self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorators::{get, resource, where_param};

    struct UsersController;

    impl Controller for UsersController {
        fn decorate(controller: &mut Decorate<'_>) {
            controller
                .method("show", where_param("id", "^\\d+$"))
                .method("show", get("/users/:id"));
        }
    }

    #[test]
    fn test_load_runs_decorators_once() {
        let store = MetadataStore::new();
        let id = store.load::<UsersController>();
        assert_eq!(store.load::<UsersController>(), id);
        assert!(store.is_loaded(&id));

        let metadata = store.get(&id).unwrap();
        let show = metadata.routes().get("show").unwrap();
        assert_eq!(show.constraints().len(), 1);
        assert_eq!(show.pattern(), Some("/users/:id"));
    }

    #[test]
    fn test_decorate_accumulates_across_guards() {
        struct PostsController;
        let store = MetadataStore::new();

        store.decorate::<PostsController>().class(resource("/x"));
        store
            .decorate::<PostsController>()
            .class(resource("/y").name("n"));

        let metadata = store.get(&ControllerId::of::<PostsController>()).unwrap();
        assert_eq!(metadata.resource().pattern(), Some("/y"));
        assert_eq!(metadata.resource().name(), Some("n"));
        assert_eq!(store.len(), 1);
        assert!(!store.is_loaded(&ControllerId::of::<PostsController>()));
    }
}
