use logshelf_security::Stats;

/// Human-readable byte count: `512 B`, `1.5 KB`, `2.0 MB`, `1.1 GB`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}

/// ` → 1.2 KB (3.4% redacted, 5 matches)`, or nothing when no match.
pub fn file_stats_suffix(stats: &Stats) -> String {
    if stats.total_matches == 0 {
        return String::new();
    }
    format!(
        " → {} ({:.1}% redacted, {} matches)",
        format_size(stats.redacted_bytes),
        stats.percent_reduction(),
        stats.total_matches
    )
}

/// Multi-line summary with a per-pattern breakdown. Empty when no match.
pub fn redaction_summary(stats: &Stats) -> String {
    if stats.total_matches == 0 {
        return String::new();
    }

    let mut out = String::from("Redaction summary:\n");
    out.push_str(&format!(
        "  Total: {} → {} ({:.1}% reduction)\n",
        format_size(stats.original_bytes),
        format_size(stats.redacted_bytes),
        stats.percent_reduction()
    ));
    out.push_str(&format!("  Matches: {} total\n", stats.total_matches));
    for pc in stats.pattern_summary() {
        out.push_str(&format!("    {}: {}\n", pc.pattern, pc.count));
    }
    out
}
