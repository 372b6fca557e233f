use std::borrow::Cow;
use tracing::warn;

/// Wrap rendered response text for JSONP consumption.
///
/// A callback of `?` parenthesizes the text, an identifier-like callback
/// becomes a function call around it, no callback passes the text through.
/// Anything else is refused and the text goes out unwrapped; reflecting
/// arbitrary caller text into an executable body is not supported.
/// Purely textual, applied after sanitization and rendering.
pub fn wrap_jsonp<'a>(text: &'a str, callback: Option<&str>) -> Cow<'a, str> {
    match callback {
        None => Cow::Borrowed(text),
        Some("?") => Cow::Owned(format!("({})", text)),
        Some(name) if is_identifier_like(name) => Cow::Owned(format!("{}({})", name, text)),
        Some(name) => {
            warn!("refusing non-identifier JSONP callback [{}]", name);
            Cow::Borrowed(text)
        }
    }
}

fn is_identifier_like(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_callback_is_identity() {
        assert_eq!(wrap_jsonp(r#"{"id":null}"#, None), r#"{"id":null}"#);
    }

    #[test]
    fn test_question_mark_parenthesizes() {
        assert_eq!(wrap_jsonp(r#"{"a":1}"#, Some("?")), r#"({"a":1})"#);
    }

    #[test]
    fn test_named_callback() {
        let wrapped = wrap_jsonp(r#"{"a":1}"#, Some("cb"));
        assert!(wrapped.starts_with("cb("));
        assert!(wrapped.ends_with(')'));
        assert_eq!(wrapped, r#"cb({"a":1})"#);
    }

    #[test]
    fn test_dotted_callback_allowed() {
        assert_eq!(
            wrap_jsonp("{}", Some("window.onReply")),
            "window.onReply({})"
        );
    }

    #[test]
    fn test_hostile_callback_refused() {
        assert_eq!(wrap_jsonp("{}", Some("alert(1);//")), "{}");
        assert_eq!(wrap_jsonp("{}", Some("")), "{}");
        assert_eq!(wrap_jsonp("{}", Some("1abc")), "{}");
    }
}
