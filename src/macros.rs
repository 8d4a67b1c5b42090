//! Utility macros for the compiler.
//!
//! - `MK_TOKEN!` - Creates a Token instance

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$text` - The raw source slice
/// * `$value` - The cooked value (defaults to the raw text)
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Integer, "1_000".to_string(), "1000".to_string(), span);
/// let token = MK_TOKEN!(TokenKind::Plus, "+".to_string(), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $text:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            text: $text,
            value: $value,
            span: $span,
        }
    };
    ($kind:expr, $text:expr, $span:expr) => {{
        let text: String = $text;
        Token {
            kind: $kind,
            value: text.clone(),
            text,
            span: $span,
        }
    }};
}
