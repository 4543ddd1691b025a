use std::fs;
use std::path::Path;

/// OSC8 hyperlink to a fetched page
pub fn osc8_link(url: &str, text: &str) -> String {
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
}

/// OSC8 file:// hyperlink to a written artifact, labelled with its file name
pub fn osc8_file_link(path: &Path) -> String {
    let text = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let abs_path = fs::canonicalize(path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.display().to_string());
    osc8_link(&format!("file://{}", abs_path), &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_link_labels_with_file_name() {
        let link = osc8_file_link(Path::new("no/such/dir/Footy.db"));
        assert!(link.ends_with("\x1b\\Footy.db\x1b]8;;\x1b\\"));
        assert!(link.contains("file://no/such/dir/Footy.db"));
    }
}
