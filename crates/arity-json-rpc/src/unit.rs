use std::sync::Arc;

use serde_json::Value;

use crate::types::{CallArgs, Fault, ParamType};

/// Callable bound to its receiver, ready for dispatch.
pub(crate) type BoundHandler = Arc<dyn Fn(&CallArgs) -> Result<Value, Fault> + Send + Sync>;

type UnitCtor<S> = Arc<dyn Fn() -> Result<S, Fault> + Send + Sync>;
type InstanceFn<S> = Arc<dyn Fn(&S, &CallArgs) -> Result<Value, Fault> + Send + Sync>;

/// Declared shape of one method, as the registry and introspection see it.
#[derive(Debug, Clone)]
pub(crate) struct MethodSpec {
    pub name: String,
    pub params: Vec<ParamType>,
    pub returns: &'static str,
}

enum UnitHandler<S> {
    Static(BoundHandler),
    Instance(InstanceFn<S>),
}

struct UnitMethod<S> {
    spec: MethodSpec,
    handler: UnitHandler<S>,
}

/// Declarative method list for one unit.
///
/// A unit groups the methods exposed under one name and, when any of them is
/// instance-bound, owns the state type `S` they share. Registration is
/// explicit: every method is declared with its parameter types and return
/// type descriptor, nothing is discovered.
///
/// ```
/// use arity_json_rpc::{ParamType, UnitBuilder};
/// use serde_json::json;
///
/// let unit = UnitBuilder::new("calculator")
///     .static_method("add", &[ParamType::Float, ParamType::Float], "float", |args| {
///         Ok(json!(args.float(0)? + args.float(1)?))
///     })
///     .build();
/// assert_eq!(unit.name(), "calculator");
/// ```
pub struct UnitBuilder<S = ()> {
    name: String,
    ctor: UnitCtor<S>,
    methods: Vec<UnitMethod<S>>,
}

impl UnitBuilder<()> {
    /// A unit with no instance state. Instance-bound declarations still work
    /// (their receiver is the unit type `()`), but nothing is constructed
    /// unless one exists.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ctor: Arc::new(|| Ok(())),
            methods: Vec::new(),
        }
    }
}

impl<S: Send + Sync + 'static> UnitBuilder<S> {
    /// A unit whose instance-bound methods share state built by `ctor`.
    ///
    /// The constructor runs once at registration to validate the unit (a
    /// failure there skips the unit entirely) and again per call when
    /// persistence is disabled.
    pub fn with_constructor(
        name: impl Into<String>,
        ctor: impl Fn() -> Result<S, Fault> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            ctor: Arc::new(ctor),
            methods: Vec::new(),
        }
    }

    pub fn static_method(
        mut self,
        name: impl Into<String>,
        params: &[ParamType],
        returns: &'static str,
        handler: impl Fn(&CallArgs) -> Result<Value, Fault> + Send + Sync + 'static,
    ) -> Self {
        self.methods.push(UnitMethod {
            spec: MethodSpec {
                name: name.into(),
                params: params.to_vec(),
                returns,
            },
            handler: UnitHandler::Static(Arc::new(handler)),
        });
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        params: &[ParamType],
        returns: &'static str,
        handler: impl Fn(&S, &CallArgs) -> Result<Value, Fault> + Send + Sync + 'static,
    ) -> Self {
        self.methods.push(UnitMethod {
            spec: MethodSpec {
                name: name.into(),
                params: params.to_vec(),
                returns,
            },
            handler: UnitHandler::Instance(Arc::new(handler)),
        });
        self
    }

    pub fn build(self) -> UnitDef {
        let UnitBuilder {
            name,
            ctor,
            methods,
        } = self;
        let binder = Arc::new(move |persist: bool| -> Result<Vec<BoundMethod>, Fault> {
            let needs_instance = methods
                .iter()
                .any(|method| matches!(method.handler, UnitHandler::Instance(_)));
            // Probe-construct even when not persisting, so a broken unit is
            // caught at registration instead of on its first call.
            let shared: Option<Arc<S>> = if needs_instance {
                let instance = (ctor)()?;
                persist.then(|| Arc::new(instance))
            } else {
                None
            };

            let mut bound = Vec::with_capacity(methods.len());
            for method in &methods {
                let is_static = matches!(method.handler, UnitHandler::Static(_));
                let handler: BoundHandler = match &method.handler {
                    UnitHandler::Static(f) => f.clone(),
                    UnitHandler::Instance(f) => match &shared {
                        Some(instance) => {
                            let f = f.clone();
                            let instance = instance.clone();
                            Arc::new(move |args: &CallArgs| f(&instance, args))
                        }
                        None => {
                            let f = f.clone();
                            let ctor = ctor.clone();
                            Arc::new(move |args: &CallArgs| {
                                let fresh = (ctor)()?;
                                f(&fresh, args)
                            })
                        }
                    },
                };
                bound.push(BoundMethod {
                    spec: method.spec.clone(),
                    is_static,
                    handler,
                });
            }
            Ok(bound)
        });
        UnitDef { name, binder }
    }
}

/// One method after binding: its declared spec plus the erased callable.
pub(crate) struct BoundMethod {
    pub spec: MethodSpec,
    pub is_static: bool,
    pub handler: BoundHandler,
}

/// Type-erased unit definition the registry consumes.
pub struct UnitDef {
    name: String,
    binder: Arc<dyn Fn(bool) -> Result<Vec<BoundMethod>, Fault> + Send + Sync>,
}

impl UnitDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Materialize bound callables. With `persist` every instance-bound
    /// method shares one constructed instance; without it each call
    /// constructs its own.
    pub(crate) fn bind(&self, persist: bool) -> Result<Vec<BoundMethod>, Fault> {
        (self.binder)(persist)
    }
}
