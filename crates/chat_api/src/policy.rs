/// Model families that accept inline image attachments.
///
/// Checked before any network traffic; a bad pairing never leaves the
/// process.
const VISION_MODEL_PREFIXES: &[&str] = &[
    "gpt-4o",
    "gpt-4.1",
    "gpt-4.5",
    "o1-preview",
    "claude-",
    "grok-",
];

pub fn supports_image_input(model: &str) -> bool {
    let model = model.trim().to_ascii_lowercase();
    VISION_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}
