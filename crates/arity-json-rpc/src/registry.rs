use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::config::RpcConfig;
use crate::error::RegistryError;
use crate::signature::SignatureKey;
use crate::types::{CallArgs, Fault, ParamType};
use crate::unit::{BoundHandler, MethodSpec, UnitDef};

/// Reserved name of the synthetic introspection method.
pub const INTROSPECTION_METHOD: &str = "listrpcmethods";

/// One resolvable callable with everything dispatch and introspection need.
pub struct RegisteredMethod {
    key: SignatureKey,
    unit: String,
    is_static: bool,
    params: Vec<ParamType>,
    returns: &'static str,
    handler: BoundHandler,
}

impl RegisteredMethod {
    pub fn key(&self) -> &SignatureKey {
        &self.key
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn returns(&self) -> &'static str {
        self.returns
    }

    pub(crate) fn invoke(&self, args: &CallArgs) -> Result<Value, Fault> {
        (self.handler)(args)
    }

    fn listing_entry(&self) -> Value {
        json!({
            "name": self.key.name(),
            "static": self.is_static,
            "class": self.unit,
            "returns": self.returns,
            "params": self.params.iter().map(|p| p.type_name()).collect::<Vec<_>>(),
        })
    }
}

/// Signature-keyed method table, built once at startup and read-only after.
///
/// Units are registered in configuration order; within the table the first
/// registration of a signature wins and later ones are dropped. Lookups are
/// plain shared reads, safe from any number of dispatching threads.
pub struct MethodRegistry {
    methods: HashMap<SignatureKey, RegisteredMethod>,
    listing: Value,
}

impl MethodRegistry {
    /// Build the registry from the unit catalog and configuration.
    ///
    /// Unknown unit names and units whose constructor fails are logged and
    /// skipped; an empty configured list or a registry with zero methods is
    /// fatal. The reserved introspection method is registered last, bound to
    /// the registry itself, and overrides any user method under its name.
    pub fn build(catalog: &[UnitDef], config: &RpcConfig) -> Result<Self, RegistryError> {
        if config.units.is_empty() {
            return Err(RegistryError::NoUnits);
        }

        let mut methods: HashMap<SignatureKey, RegisteredMethod> = HashMap::new();
        for unit_name in &config.units {
            let Some(unit) = catalog.iter().find(|unit| unit.name() == unit_name) else {
                warn!("unknown RPC unit [{}], skipping", unit_name);
                continue;
            };
            let bound = match unit.bind(config.persist_units) {
                Ok(bound) => bound,
                Err(fault) => {
                    error!("unit [{}] failed to construct: {}", unit_name, fault);
                    continue;
                }
            };
            for method in bound {
                let Some(key) = signature_key(&method.spec) else {
                    debug!(
                        "method [{}] on unit [{}] declares a non-remotable parameter, skipping",
                        method.spec.name, unit_name
                    );
                    continue;
                };
                if methods.contains_key(&key) {
                    error!("skipping duplicate method signature [{}]", key);
                    continue;
                }
                debug!("registered [{}] from unit [{}]", key, unit_name);
                methods.insert(
                    key.clone(),
                    RegisteredMethod {
                        key,
                        unit: unit_name.clone(),
                        is_static: method.is_static,
                        params: method.spec.params,
                        returns: method.spec.returns,
                        handler: method.handler,
                    },
                );
            }
        }

        if methods.is_empty() {
            return Err(RegistryError::NoMethods);
        }

        let introspection_key = SignatureKey::positional(INTROSPECTION_METHOD, 0);
        if methods.remove(&introspection_key).is_some() {
            warn!(
                "user method [{}] replaced by the reserved introspection method",
                introspection_key
            );
        }
        let listing = build_listing(&methods);
        let handler: BoundHandler = {
            let listing = listing.clone();
            Arc::new(move |_args| Ok(listing.clone()))
        };
        methods.insert(
            introspection_key.clone(),
            RegisteredMethod {
                key: introspection_key,
                unit: std::any::type_name::<MethodRegistry>().to_string(),
                is_static: false,
                params: Vec::new(),
                returns: "object",
                handler,
            },
        );

        info!("method registry built with {} signatures", methods.len());
        Ok(Self { methods, listing })
    }

    pub fn get(&self, key: &SignatureKey) -> Option<&RegisteredMethod> {
        self.methods.get(key)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// The precomputed introspection document, self-entry included.
    pub fn method_listing(&self) -> &Value {
        &self.listing
    }
}

/// Derive the signature key, or `None` when a parameter disqualifies the
/// method. Any structured-object parameter forces the structured key no
/// matter what else is declared.
fn signature_key(spec: &MethodSpec) -> Option<SignatureKey> {
    if spec.params.iter().any(|p| !p.is_remotable()) {
        return None;
    }
    if spec.params.iter().any(|p| matches!(p, ParamType::Object)) {
        Some(SignatureKey::structured(&spec.name))
    } else {
        Some(SignatureKey::positional(&spec.name, spec.params.len()))
    }
}

fn build_listing(methods: &HashMap<SignatureKey, RegisteredMethod>) -> Value {
    let mut entries: Vec<(SignatureKey, Value)> = methods
        .iter()
        .map(|(key, method)| (key.clone(), method.listing_entry()))
        .collect();
    entries.push((
        SignatureKey::positional(INTROSPECTION_METHOD, 0),
        json!({
            "name": INTROSPECTION_METHOD,
            "static": false,
            "class": std::any::type_name::<MethodRegistry>(),
            "returns": "object",
            "params": [],
        }),
    ));
    // sorted for stable listing output
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    json!({ "method": entries.into_iter().map(|(_, entry)| entry).collect::<Vec<_>>() })
}
