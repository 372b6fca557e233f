use std::fmt;

/// How a method binds its parameters.
///
/// A method taking a single JSON object is registered under [`Arity::Structured`]
/// no matter what else it declares; everything else is keyed by its positional
/// parameter count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arity {
    /// Fixed number of positional parameters.
    Positional(usize),
    /// Single structured-object parameter.
    Structured,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Positional(n) => write!(f, "{}", n),
            Arity::Structured => write!(f, "object"),
        }
    }
}

/// Registry key for a remotable method: name plus arity.
///
/// Two methods with the same name coexist as long as their arities differ;
/// return types play no part in identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureKey {
    name: String,
    arity: Arity,
}

impl SignatureKey {
    pub fn positional(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            arity: Arity::Positional(count),
        }
    }

    pub fn structured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arity: Arity::Structured,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.arity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_key_equality() {
        assert_eq!(
            SignatureKey::positional("add", 2),
            SignatureKey::positional("add", 2)
        );
        assert_ne!(
            SignatureKey::positional("add", 2),
            SignatureKey::positional("add", 3)
        );
        assert_ne!(
            SignatureKey::positional("add", 1),
            SignatureKey::structured("add")
        );
    }

    #[test]
    fn test_key_display() {
        assert_eq!(SignatureKey::positional("add", 2).to_string(), "add:2");
        assert_eq!(SignatureKey::structured("echo").to_string(), "echo:object");
    }

    #[test]
    fn test_key_as_map_key() {
        let mut map = HashMap::new();
        map.insert(SignatureKey::positional("add", 2), 1);
        map.insert(SignatureKey::structured("add"), 2);

        assert_eq!(map.get(&SignatureKey::positional("add", 2)), Some(&1));
        assert_eq!(map.get(&SignatureKey::structured("add")), Some(&2));
        assert_eq!(map.get(&SignatureKey::positional("add", 0)), None);
    }
}
