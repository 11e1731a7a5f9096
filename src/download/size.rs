/// Human-readable size: divides by 1024 through B..TB, two decimals, PB beyond.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(size: u64) -> String {
    let mut value = size as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} PB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(5_000_000), "4.77 MB");
        assert_eq!(format_bytes(1024u64.pow(5)), "1.00 PB");
    }
}
