use super::subject::SubjectType;

/// Slug for a user model: lowercase, whitespace runs become `-`, anything other than
/// alphanumerics, `-` and `_` is dropped, and leading/trailing `-` are trimmed.
pub fn derive_url_id(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.trim().chars() {
        if ch.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if !(ch.is_alphanumeric() || ch == '-' || ch == '_') {
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.extend(ch.to_lowercase());
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "model".to_string()
    } else {
        slug.to_string()
    }
}

/// Style models are invoked by their whole name; everything else by the first word.
pub fn derive_trigger_word(name: &str, subject_type: SubjectType) -> String {
    let name = name.trim();
    if subject_type.is_style() {
        return name.to_lowercase();
    }
    name.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Prepends the trigger word unless the prompt already mentions it (case-insensitive).
pub fn ensure_trigger_word(prompt: &str, trigger_word: Option<&str>) -> String {
    match trigger_word.map(str::trim).filter(|w| !w.is_empty()) {
        Some(word) if !prompt.to_lowercase().contains(&word.to_lowercase()) => {
            format!("{word} {prompt}")
        }
        _ => prompt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_id_collapses_whitespace_and_drops_punctuation() {
        assert_eq!(derive_url_id("My Cat"), "my-cat");
        assert_eq!(derive_url_id("  Jan   Kowalski  "), "jan-kowalski");
        assert_eq!(derive_url_id("Portret (v2)!"), "portret-v2");
        assert_eq!(derive_url_id("snake_case-name"), "snake_case-name");
        assert_eq!(derive_url_id("Żółw Łódź"), "żółw-łódź");
    }

    #[test]
    fn url_id_never_empty() {
        assert_eq!(derive_url_id("!!!"), "model");
        assert_eq!(derive_url_id("   "), "model");
        assert_eq!(derive_url_id("- -"), "model");
    }

    #[test]
    fn trigger_word_depends_on_subject() {
        assert_eq!(derive_trigger_word("Jan Kowalski", SubjectType::Man), "jan");
        assert_eq!(
            derive_trigger_word("Watercolor Dream", SubjectType::Style),
            "watercolor dream"
        );
        assert_eq!(derive_trigger_word("", SubjectType::Food), "");
    }

    #[test]
    fn trigger_word_is_prepended_once() {
        assert_eq!(
            ensure_trigger_word("portrait in the snow", Some("jan")),
            "jan portrait in the snow"
        );
        assert_eq!(
            ensure_trigger_word("Jan in the snow", Some("jan")),
            "Jan in the snow"
        );
        assert_eq!(ensure_trigger_word("a cat", None), "a cat");
        assert_eq!(ensure_trigger_word("a cat", Some("  ")), "a cat");
    }
}
