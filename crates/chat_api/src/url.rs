/// Default base URL for chat transport requests.
pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.zhizengzeng.com/v1";

/// Normalize a base URL to a chat-completions endpoint.
///
/// Normalization rules:
/// 1) keep `/chat/completions` unchanged
/// 2) append `/completions` when path ends in `/chat`
/// 3) append `/chat/completions` otherwise
pub fn normalize_chat_url(input: &str) -> String {
    let trimmed = normalized_base(input);
    if trimmed.ends_with("/chat/completions") {
        return trimmed.to_string();
    }
    if trimmed.ends_with("/chat") {
        return format!("{trimmed}/completions");
    }
    format!("{trimmed}/chat/completions")
}

/// Normalize a base URL to an image-generations endpoint.
pub fn normalize_images_url(input: &str) -> String {
    let trimmed = normalized_base(input);
    if trimmed.ends_with("/images/generations") {
        return trimmed.to_string();
    }
    if trimmed.ends_with("/images") {
        return format!("{trimmed}/generations");
    }
    format!("{trimmed}/images/generations")
}

fn normalized_base(input: &str) -> &str {
    let base = if input.trim().is_empty() {
        DEFAULT_CHAT_BASE_URL
    } else {
        input.trim()
    };
    base.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::{normalize_chat_url, normalize_images_url, DEFAULT_CHAT_BASE_URL};

    #[test]
    fn empty_input_uses_default_base() {
        assert_eq!(
            normalize_chat_url(""),
            format!("{DEFAULT_CHAT_BASE_URL}/chat/completions")
        );
    }

    #[test]
    fn complete_endpoints_pass_through() {
        assert_eq!(
            normalize_chat_url("https://example.com/v1/chat/completions/"),
            "https://example.com/v1/chat/completions"
        );
        assert_eq!(
            normalize_images_url("https://example.com/v1/images/generations"),
            "https://example.com/v1/images/generations"
        );
    }

    #[test]
    fn partial_paths_are_completed() {
        assert_eq!(
            normalize_chat_url("https://example.com/v1/chat"),
            "https://example.com/v1/chat/completions"
        );
        assert_eq!(
            normalize_images_url("https://example.com/v1"),
            "https://example.com/v1/images/generations"
        );
    }
}
