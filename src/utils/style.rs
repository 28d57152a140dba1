use std::io::IsTerminal;

pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

pub fn cyan(text: &str) -> String {
    if color_enabled() {
        format!("\u{1b}[36m{text}\u{1b}[0m")
    } else {
        text.to_string()
    }
}

/// Prefix an informative message with the `sbx` tag.
pub fn sbx_style(msg: &str) -> String {
    format!("{}: {}", cyan("sbx"), msg)
}

/// `Label: value` with the label highlighted.
pub fn field(label: &str, value: &str) -> String {
    format!("{}: {}", cyan(label), value)
}
