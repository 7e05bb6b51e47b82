//! Name conversions shared by form inputs, labels and virtual properties.

fn words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in name.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub fn ucfirst(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn lcfirst(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `user_meta` -> `UserMeta`
pub fn camelize(name: &str) -> String {
    words(name)
        .iter()
        .map(|word| ucfirst(&word.to_lowercase()))
        .collect()
}

/// `site-option_name` -> `siteOptionName`
pub fn variablize(name: &str) -> String {
    lcfirst(&camelize(name))
}

/// `user_id` -> `User Id`, `favoriteColor` -> `Favorite Color`
pub fn humanize(name: &str) -> String {
    words(name)
        .iter()
        .map(|word| ucfirst(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tabular input name for one attribute key, e.g. `[favoriteColor]value`.
///
/// Several attribute records share a page, so each value input is indexed by
/// its variablized key.
pub fn form_input_name(key: &str) -> String {
    format!("[{}]value", variablize(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variablize_handles_mixed_separators() {
        assert_eq!(variablize("site_option-name"), "siteOptionName");
        assert_eq!(variablize("favoriteColor"), "favoriteColor");
        assert_eq!(variablize("bio"), "bio");
    }

    #[test]
    fn camelize_builds_class_like_names() {
        assert_eq!(camelize("user_meta"), "UserMeta");
        assert_eq!(camelize("post"), "Post");
    }

    #[test]
    fn humanize_splits_words() {
        assert_eq!(humanize("user_id"), "User Id");
        assert_eq!(humanize("favoriteColor"), "Favorite Color");
        assert_eq!(humanize("key"), "Key");
    }

    #[test]
    fn form_input_name_is_indexed_by_key() {
        assert_eq!(form_input_name("favorite_color"), "[favoriteColor]value");
    }

    #[test]
    fn first_letter_case_helpers() {
        assert_eq!(lcfirst("TestData"), "testData");
        assert_eq!(ucfirst("testData"), "TestData");
        assert_eq!(lcfirst(""), "");
    }
}
