use std::collections::HashMap;

/// Immutable dispatch configuration, loaded once at startup.
///
/// Built either directly or from the host's string parameters via
/// [`RpcConfig::from_params`]; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Unit names to register, in registration order.
    pub units: Vec<String>,
    /// Serve the introspection listing when no method is supplied.
    pub expose_methods: bool,
    /// Leave fault messages and detail in error responses.
    pub detailed_errors: bool,
    /// Reuse one unit instance across calls instead of constructing per call.
    pub persist_units: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            units: Vec::new(),
            expose_methods: true,
            detailed_errors: true,
            persist_units: true,
        }
    }
}

impl RpcConfig {
    /// Build from string parameters.
    ///
    /// Recognized keys: `units` (comma-separated list), `expose_methods`,
    /// `detailed_errors`, `persist_class`. Flag values compare
    /// case-insensitively against `"true"`; any other value is false, an
    /// absent key keeps the default.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = params.get("units") {
            config.units = parse_unit_list(raw);
        }
        config.expose_methods = flag(params, "expose_methods", config.expose_methods);
        config.detailed_errors = flag(params, "detailed_errors", config.detailed_errors);
        config.persist_units = flag(params, "persist_class", config.persist_units);
        config
    }

    pub fn with_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.units = units.into_iter().map(Into::into).collect();
        self
    }
}

/// Split a comma-separated unit list, ignoring all whitespace.
pub fn parse_unit_list(raw: &str) -> Vec<String> {
    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    stripped
        .split(',')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn flag(params: &HashMap<String, String>, key: &str, default: bool) -> bool {
    match params.get(key) {
        Some(value) => value.eq_ignore_ascii_case("true"),
        None => default,
    }
}
