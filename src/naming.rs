//! Name transforms between component identifiers, tags and attributes.
//!
//! The camel → kebab rule is bit-exact: a hyphen goes in front of every
//! ASCII uppercase letter, which is then lowercased. Nothing else changes, so
//! a leading capital yields a leading hyphen (`CounterView` → `-counter-view`)
//! and the tag prefix is concatenated without a separator.

/// Convert `camelCase` to `kebab-case`.
pub fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert `kebab-case` to `camelCase`.
///
/// Every hyphen followed by a character is replaced by that character
/// uppercased. A trailing hyphen is kept.
pub fn kebab_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(ch) = chars.next() {
        if ch != '-' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next) => out.extend(next.to_uppercase()),
            None => out.push('-'),
        }
    }
    out
}

/// Tag name for a component: `prefix` followed by the kebab-cased name.
pub fn tag_name(prefix: &str, name: &str) -> String {
    let mut tag = String::from(prefix);
    tag.push_str(&camel_to_kebab(name));
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_to_kebab() {
        assert_eq!(camel_to_kebab("count"), "count");
        assert_eq!(camel_to_kebab("maxCount"), "max-count");
        assert_eq!(camel_to_kebab("CounterView"), "-counter-view");
        assert_eq!(camel_to_kebab("parseURL"), "parse-u-r-l");
    }

    #[test]
    fn test_kebab_to_camel() {
        assert_eq!(kebab_to_camel("count"), "count");
        assert_eq!(kebab_to_camel("max-count"), "maxCount");
        assert_eq!(kebab_to_camel("a--b"), "a-b");
        assert_eq!(kebab_to_camel("trailing-"), "trailing-");
    }

    #[test]
    fn test_tag_name() {
        assert_eq!(tag_name("inc", "CounterView"), "inc-counter-view");
        assert_eq!(tag_name("inc", "counterView"), "inccounter-view");
    }

    #[test]
    fn test_attribute_round_trip() {
        for name in ["value", "maxCount", "isOpenNow"] {
            assert_eq!(kebab_to_camel(&camel_to_kebab(name)), name);
        }
    }
}
