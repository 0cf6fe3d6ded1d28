use std::io::IsTerminal;
use owo_colors::OwoColorize;
use serde::Serialize;
use terminal_size::{Width, terminal_size};

use crate::scoring::ScoredEntity;
use crate::table::{HeatPoint, Level, LevelScore};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with four decimals ("0.4321")
pub fn format_score(score: f64) -> String {
    format!("{:.4}", score)
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a label to fit available width, accounting for Unicode
fn truncate_label(label: &str, max_width: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= max_width {
        label.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format scored rows as a table with columns: Index, Score, City, Province, Region
/// No headers. The city column absorbs whatever width the terminal leaves.
pub fn format_scored_table(rows: &[&ScoredEntity], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No entities match the current filters.".to_string();
    }

    let term_width = get_terminal_width();
    let index_width = 4;
    let score_width = 6;
    let separator = "  ";

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let index_str = format!("{:>3}.", idx + 1);
            let score_str = format_score(row.opportunity_score());
            let score_padded = format!("{:>width$}", score_str, width = score_width);
            let location = format!("{}, {}", row.entity.province, row.entity.region);

            let fixed_width = index_width + 1 + score_width + separator.len() * 2 + location.chars().count();
            let city = if let Some(width) = term_width {
                if width > fixed_width + 10 {
                    truncate_label(&row.entity.city_municipality, width - fixed_width)
                } else {
                    truncate_label(&row.entity.city_municipality, 20)
                }
            } else {
                row.entity.city_municipality.clone()
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    score_padded.bold(),
                    separator,
                    city,
                    separator,
                    location.cyan()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, score_padded, separator, city, separator, location
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format scored rows as tab-separated values for scripting, with a header line
/// Columns: region, province, city_municipality, lat, long, opportunity_score
pub fn format_tsv(rows: &[&ScoredEntity]) -> String {
    let mut lines = vec!["region\tprovince\tcity_municipality\tlat\tlong\topportunity_score".to_string()];
    lines.extend(rows.iter().map(|row| {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.entity.region,
            row.entity.province,
            row.entity.city_municipality,
            row.entity.lat,
            row.entity.long,
            row.opportunity_score()
        )
    }));
    lines.join("\n")
}

#[derive(Serialize)]
struct JsonRow<'a> {
    region: &'a str,
    province: &'a str,
    city_municipality: &'a str,
    lat: f64,
    long: f64,
    opportunity_score: f64,
}

/// Format scored rows as a pretty-printed JSON array
pub fn format_json(rows: &[&ScoredEntity]) -> serde_json::Result<String> {
    let json_rows: Vec<JsonRow> = rows
        .iter()
        .map(|row| JsonRow {
            region: &row.entity.region,
            province: &row.entity.province,
            city_municipality: &row.entity.city_municipality,
            lat: row.entity.lat,
            long: row.entity.long,
            opportunity_score: row.opportunity_score(),
        })
        .collect();
    serde_json::to_string_pretty(&json_rows)
}

/// Render one horizontal bar, `width` cells at `max`
fn bar(value: f64, max: f64, width: usize) -> String {
    let ratio = if max > 0.0 { (value / max).min(1.0) } else { 0.0 };
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width.saturating_sub(filled)))
}

/// Format a ranking as a text bar chart, best first
///
/// ```text
/// Top 2 Regions
///  1. NCR           0.6120  ████████████████████
///  2. Region III    0.4410  ██████████████░░░░░░
/// ```
pub fn format_ranking(level: Level, ranking: &[LevelScore], use_colors: bool) -> String {
    let title = format!("Top {} {}s", ranking.len(), level);
    if ranking.is_empty() {
        return format!("{}\n  (no data)", title);
    }

    let name_width = ranking
        .iter()
        .map(|g| display_name(g).chars().count())
        .max()
        .unwrap_or(0)
        .min(40);
    let max = ranking.iter().map(|g| g.mean).fold(0.0_f64, f64::max);

    let mut lines = vec![if use_colors {
        title.bold().to_string()
    } else {
        title
    }];

    for (idx, group) in ranking.iter().enumerate() {
        let name = truncate_label(&display_name(group), name_width);
        let bar = bar(group.mean, max, 20);
        let line = if use_colors {
            format!(
                "{:>2}. {:<width$}  {}  {}",
                idx + 1,
                name,
                format_score(group.mean).bold(),
                bar.red(),
                width = name_width
            )
        } else {
            format!(
                "{:>2}. {:<width$}  {}  {}",
                idx + 1,
                name,
                format_score(group.mean),
                bar,
                width = name_width
            )
        };
        lines.push(line);
    }
    lines.join("\n")
}

/// Group name with its parents, "San Fernando (Pampanga, Region III)"
fn display_name(group: &LevelScore) -> String {
    match (&group.province, &group.region) {
        (Some(province), Some(region)) => format!("{} ({}, {})", group.name, province, region),
        (None, Some(region)) => format!("{} ({})", group.name, region),
        _ => group.name.clone(),
    }
}

/// Format heat points as `lat<TAB>long<TAB>score` lines
pub fn format_heat_tsv(points: &[HeatPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{}\t{}\t{}", p.lat, p.long, p.weight))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Entity;
    use crate::scoring::ScoreTable;
    use crate::table::top_n;

    fn sample_table() -> ScoreTable {
        let entities = vec![
            Entity::new("NCR", "Metro Manila", "Pasig", 14.57, 121.08),
            Entity::new("Region III", "Pampanga", "San Fernando", 15.03, 120.69),
        ];
        ScoreTable::from_precomputed(&entities, &[0.61234, 0.4]).unwrap()
    }

    fn refs(table: &ScoreTable) -> Vec<&ScoredEntity> {
        table.rows().iter().collect()
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.4), "0.4000");
        assert_eq!(format_score(0.61234), "0.6123");
        assert_eq!(format_score(0.0), "0.0000");
    }

    #[test]
    fn test_format_scored_table_empty() {
        assert_eq!(format_scored_table(&[], false), "No entities match the current filters.");
    }

    #[test]
    fn test_format_scored_table_rows() {
        let table = sample_table();
        let result = format_scored_table(&refs(&table), false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1."));
        assert!(lines[0].contains("0.6123"));
        assert!(lines[0].contains("Pasig"));
        assert!(lines[0].contains("Metro Manila, NCR"));
        assert!(lines[1].contains("San Fernando"));
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Short", 20), "Short");
        assert_eq!(truncate_label("Las Piñas City Proper", 10), "Las Piñ...");
        assert_eq!(truncate_label("Hello world", 3), "Hel");
    }

    #[test]
    fn test_format_tsv() {
        let table = sample_table();
        let result = format_tsv(&refs(&table));
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("region\t"));
        assert_eq!(lines[2], "Region III\tPampanga\tSan Fernando\t15.03\t120.69\t0.4");
    }

    #[test]
    fn test_format_tsv_empty_has_header() {
        assert_eq!(format_tsv(&[]).lines().count(), 1);
    }

    #[test]
    fn test_format_json() {
        let table = sample_table();
        let json = format_json(&refs(&table)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[1]["city_municipality"], "San Fernando");
        assert_eq!(parsed[1]["opportunity_score"], 0.4);
    }

    #[test]
    fn test_format_ranking() {
        let table = sample_table();
        let ranking = top_n(&table, Level::Province, 10);
        let result = format_ranking(Level::Province, &ranking, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines[0], "Top 2 Provinces");
        assert!(lines[1].contains("Metro Manila (NCR)"));
        assert!(lines[1].ends_with(&"█".repeat(20)));
        assert!(lines[2].contains("0.4000"));
    }

    #[test]
    fn test_format_ranking_empty() {
        let result = format_ranking(Level::Region, &[], false);
        assert!(result.contains("(no data)"));
    }

    #[test]
    fn test_format_heat_tsv() {
        let points = vec![HeatPoint { lat: 14.5, long: 121.0, weight: 0.25 }];
        assert_eq!(format_heat_tsv(&points), "14.5\t121\t0.25");
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(0.5, 1.0, 4), "██░░");
        assert_eq!(bar(0.0, 0.0, 2), "░░");
    }
}
