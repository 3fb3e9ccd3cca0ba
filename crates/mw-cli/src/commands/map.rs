use std::path::{Path, PathBuf};

use colored::Colorize;
use mw_core::ZoneInfo;
use mw_store::{HttpStore, MapStore, StoreConfig, StoreLookup, save_graph};
use mw_transcript::{Engine, EngineConfig, ParsedMap};

/// Everything one `mapwright` run needs.
pub struct Options {
    pub log: PathBuf,
    pub zone_id: Option<i64>,
    pub export: Option<PathBuf>,
    pub save: bool,
    pub api_url: String,
    pub timeout: u64,
    pub engine: EngineConfig,
}

pub fn run(options: &Options) -> Result<(), String> {
    let store = if options.save {
        let config = StoreConfig::default()
            .with_base_url(options.api_url.as_str())
            .with_timeout(options.timeout);
        Some(HttpStore::new(config).map_err(|e| format!("cannot create HTTP client: {e}"))?)
    } else {
        None
    };

    let directory = store.as_ref().map(zone_directory).unwrap_or_default();
    let lookup = store.as_ref().map(|s| StoreLookup(s));

    let mut engine = Engine::new(options.engine.clone());
    if let Some(lookup) = &lookup {
        engine = engine.with_lookup(lookup);
    }
    engine.parse_file(&options.log).map_err(|e| e.to_string())?;
    let map = engine.finish(&directory, options.zone_id);

    super::summary::print(&map);

    if let Some(path) = &options.export {
        export(&map, path)?;
    }

    match &store {
        Some(store) => {
            let report = save_graph(store, &map.graph);
            let failed = report.failed();
            let failed = if failed > 0 {
                failed.to_string().red().bold()
            } else {
                failed.to_string().normal()
            };
            println!(
                "  Saved {} items ({} reused), {} failed",
                report.saved().to_string().green(),
                report.rooms_reused,
                failed
            );
        }
        None => println!("  {}", "Not saved (--no-save)".dimmed()),
    }

    Ok(())
}

fn zone_directory(store: &HttpStore) -> Vec<ZoneInfo> {
    store.zones().unwrap_or_else(|err| {
        tracing::warn!(%err, "zone directory unavailable; zones resolved by name");
        Vec::new()
    })
}

fn export(map: &ParsedMap, path: &Path) -> Result<(), String> {
    let json = map
        .snapshot()
        .to_json()
        .map_err(|e| format!("JSON serialization error: {e}"))?;
    std::fs::write(path, json).map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
    println!("  Exported to {}", path.display());
    Ok(())
}
