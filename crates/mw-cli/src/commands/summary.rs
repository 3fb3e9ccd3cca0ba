use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use mw_transcript::ParsedMap;

/// Print the parse summary table.
pub fn print(map: &ParsedMap) {
    let graph = &map.graph;
    let stats = &map.stats;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Metric", "Count"]);

    let rows: [(&str, u64); 9] = [
        ("Rooms", graph.room_count() as u64),
        ("Exits", graph.exit_count() as u64),
        ("Fingerprinted rooms", graph.portal_room_count() as u64),
        ("Blocked exits", graph.blocked_exit_count() as u64),
        ("Zone-boundary rooms", graph.zone_exit_room_count() as u64),
        ("Ambiguities", stats.ambiguities),
        ("Merges", stats.merges),
        ("Promotions", stats.promotions),
        ("Misidentifications", stats.misidentifications),
    ];
    for (label, count) in rows {
        table.add_row(vec![label.to_string(), count.to_string()]);
    }

    println!("{table}");

    if let Some(zone) = &map.zones.default_zone.name {
        println!("  Default zone: {}", zone.bold());
    }
    for unknown in &map.zones.unknown_zones {
        println!("  {} zone {unknown:?} not in directory", "warning:".yellow());
    }
    for ambiguity in &map.ambiguities {
        println!(
            "  {} line {}: {:?} matched {} rooms, recorded as {}",
            "ambiguous:".yellow(),
            ambiguity.line,
            ambiguity.name,
            ambiguity.candidates.len(),
            ambiguity.placeholder
        );
    }
}
