//! Splitting of instancer list values.
//!
//! A `decorator` or `font-effect` value is a comma-separated list whose items
//! are either a name (`my-decorator`) or an inline shorthand
//! (`gradient(vertical #fff #000)`). Shorthand arguments bind positionally to
//! the property names the instancer type declares.

use std::collections::BTreeMap;

use crate::style::registry::InstanceError;

/// One item of an instancer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem<'a> {
    /// Reference to an `@decorator` (or other named specification).
    Name(&'a str),
    /// Inline `type(args)`.
    Shorthand { type_name: &'a str, args: Vec<&'a str> },
}

/// Split `value` at top-level commas (commas inside parentheses or quotes
/// stay with their item). Empty items are dropped.
pub fn split_list(value: &str) -> Vec<&str> {
    split_top_level(value, |c| c == ',')
}

/// Split shorthand arguments at top-level whitespace.
pub fn split_arguments(args: &str) -> Vec<&str> {
    split_top_level(args, char::is_whitespace)
}

fn split_top_level(value: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if depth == 0 && is_separator(c) => {
                items.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    items.push(&value[start..]);

    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Classify one list item.
pub fn parse_item(item: &str) -> Result<ListItem<'_>, InstanceError> {
    let item = item.trim();
    let Some(open) = item.find('(') else {
        return if item.contains(char::is_whitespace) {
            Err(InstanceError::Malformed(item.to_string()))
        } else {
            Ok(ListItem::Name(item))
        };
    };

    let Some(inner) = item[open + 1..].strip_suffix(')') else {
        return Err(InstanceError::Malformed(item.to_string()));
    };
    let type_name = item[..open].trim();
    if type_name.is_empty() {
        return Err(InstanceError::Malformed(item.to_string()));
    }

    Ok(ListItem::Shorthand {
        type_name,
        args: split_arguments(inner),
    })
}

/// Bind positional shorthand arguments to the type's declared property names.
///
/// Fewer arguments than names is allowed; the factory decides which
/// properties are required.
pub fn bind_arguments(
    type_name: &str,
    names: &[&str],
    args: &[&str],
) -> Result<BTreeMap<String, String>, InstanceError> {
    if args.len() > names.len() {
        return Err(InstanceError::TooManyArguments {
            type_name: type_name.to_string(),
            expected: names.len(),
            got: args.len(),
        });
    }
    Ok(names
        .iter()
        .zip(args)
        .map(|(name, arg)| (name.to_string(), arg.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_list_respects_parentheses() {
        assert_eq!(
            split_list("gradient(vertical rgb(1, 2, 3) #000), icon ,, other"),
            vec!["gradient(vertical rgb(1, 2, 3) #000)", "icon", "other"]
        );
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn split_list_respects_quotes() {
        assert_eq!(split_list("image(\"a,b.png\"), x"), vec!["image(\"a,b.png\")", "x"]);
    }

    #[test]
    fn split_arguments_respects_parentheses() {
        assert_eq!(
            split_arguments(" 1px  rgba(0, 0, 0, 128)\t2px "),
            vec!["1px", "rgba(0, 0, 0, 128)", "2px"]
        );
    }

    #[test]
    fn parse_items() {
        assert_eq!(parse_item(" icon "), Ok(ListItem::Name("icon")));
        assert_eq!(
            parse_item("shadow(2px 2px #000)"),
            Ok(ListItem::Shorthand {
                type_name: "shadow",
                args: vec!["2px", "2px", "#000"],
            })
        );
        assert!(parse_item("shadow(2px").is_err());
        assert!(parse_item("(2px)").is_err());
        assert!(parse_item("two words").is_err());
    }

    #[test]
    fn bind_arguments_positionally() {
        let bound = bind_arguments("outline", &["width", "color"], &["1px"]).unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound["width"], "1px");

        let err = bind_arguments("outline", &["width", "color"], &["1px", "red", "x"]).unwrap_err();
        assert_eq!(
            err,
            InstanceError::TooManyArguments {
                type_name: "outline".into(),
                expected: 2,
                got: 3
            }
        );
    }
}
