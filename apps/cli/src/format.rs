use std::time::Duration;

use console::style;
use sermondl_core::{
    BatchSummary, SearchResult, SermonRecord, TaskOutcome, download::size_in_mb,
};

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// One status line per finished sermon.
pub fn format_outcome(index: usize, total: usize, outcome: &TaskOutcome) -> String {
    let counter = style(format!("[{}/{}]", index, total)).dim();
    match outcome {
        TaskOutcome::Downloaded { title, report } => format!(
            "{} {} {} {}",
            style("✓").green().bold(),
            counter,
            title,
            style(format!("({:.2} MB)", size_in_mb(report.bytes_written))).dim()
        ),
        TaskOutcome::Duplicate { title } => format!(
            "{} {} {} {}",
            style("↷").cyan(),
            counter,
            title,
            style("(already downloaded)").dim()
        ),
        TaskOutcome::NotASermon { url } => format!(
            "{} {} {} {}",
            style("⚠").yellow().bold(),
            counter,
            url,
            style("(not a sermon page)").dim()
        ),
        TaskOutcome::NoAudio { title } => format!(
            "{} {} {} {}",
            style("⚠").yellow().bold(),
            counter,
            title,
            style("(MP3 URL not found)").dim()
        ),
        TaskOutcome::Failed { url, reason } => format!(
            "{} {} {} {}",
            style("✗").red().bold(),
            counter,
            url,
            style(reason).red()
        ),
    }
}

/// Metadata block printed before a sermon's audio is requested.
pub fn format_metadata(index: usize, total: usize, record: &SermonRecord) -> String {
    format!(
        "{} {}\n    {} {}\n    {} {}\n    {} {}",
        style(format!("[{}/{}]", index, total)).dim(),
        style(&record.title).bold(),
        style("Speaker:").dim(),
        record.speaker,
        style("Date:").dim(),
        record.date,
        style("MP3:").dim(),
        record.mp3_url.as_deref().unwrap_or("-")
    )
}

pub fn format_size(title: &str, total_bytes: Option<u64>) -> String {
    match total_bytes {
        Some(bytes) => format!(
            "    {} {:.2} MB {}",
            style("Size:").dim(),
            size_in_mb(bytes),
            style(format!("({})", title)).dim()
        ),
        None => format!(
            "    {} unknown {}",
            style("Size:").dim(),
            style(format!("({})", title)).dim()
        ),
    }
}

pub fn format_summary(summary: &BatchSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} {}\n",
        style("Sermons found:").dim(),
        summary.discovered
    ));
    output.push_str(&format!(
        "{} {}\n",
        style("Downloaded:").dim(),
        style(summary.downloaded).green().bold()
    ));
    if summary.duplicates > 0 {
        output.push_str(&format!("{} {}\n", style("Duplicates skipped:").dim(), summary.duplicates));
    }
    if summary.not_sermons + summary.no_audio > 0 {
        output.push_str(&format!(
            "{} {}\n",
            style("Skipped (dead link or no audio):").dim(),
            summary.not_sermons + summary.no_audio
        ));
    }
    if summary.failed > 0 {
        output.push_str(&format!(
            "{} {}\n",
            style("Failed:").dim(),
            style(summary.failed).red().bold()
        ));
    }
    output
}

pub fn format_search_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n   {}", i + 1, r.title, style(&r.url).cyan()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(4_300)), "4.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn metadata_and_size_lines() {
        console::set_colors_enabled(false);
        let record = SermonRecord {
            title: "The Good Shepherd".into(),
            speaker: "J. Smith".into(),
            date: "1/2/2024".into(),
            mp3_url: None,
        };
        assert_eq!(
            format_metadata(2, 7, &record),
            "[2/7] The Good Shepherd\n    Speaker: J. Smith\n    Date: 1/2/2024\n    MP3: -"
        );
        assert_eq!(
            format_size("Psalm 23", Some(3 * 1024 * 1024 + 256 * 1024)),
            "    Size: 3.25 MB (Psalm 23)"
        );
        assert_eq!(format_size("Psalm 23", None), "    Size: unknown (Psalm 23)");
    }

    #[test]
    fn search_results_are_numbered() {
        console::set_colors_enabled(false);
        let results = vec![
            SearchResult {
                title: "A".into(),
                url: "https://www.sermonaudio.com/a".into(),
            },
            SearchResult {
                title: "B".into(),
                url: "https://www.sermonaudio.com/b".into(),
            },
        ];
        assert_eq!(
            format_search_results(&results),
            "1. A\n   https://www.sermonaudio.com/a\n2. B\n   https://www.sermonaudio.com/b"
        );
    }
}
