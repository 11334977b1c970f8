//! Default analysis prompt.

/// Prompt sent with every image unless one is configured.
pub const DEFAULT_PROMPT: &str = "Please analyze this image and provide a detailed description \
including: 1) Main subjects and objects, 2) Text content if any, 3) Scene/setting, \
4) Colors and composition, 5) Any notable details. Format the response as structured text.";
