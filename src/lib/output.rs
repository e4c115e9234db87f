use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::ASCII_FULL};
use log::{debug, info};

use crate::Result;
use crate::lib::cli::OutputFormat;
use crate::lib::config::Config;
use crate::lib::normalizer::{NormalizedRecommendation, RecommendationRow};
use crate::lib::tui::display_recommendations_table;

pub const NO_RECOMMENDATIONS_TO_SAVE: &str = "No recommendations to save";
pub const NO_RECOMMENDATIONS_AVAILABLE: &str = "No recommendations available";

/// `ri-recommendations-<YYYY-MM-DD>.<ext>` inside `output_dir`
///
/// Returns `None` for formats that do not write a file.
pub fn report_path(output_dir: &Path, format: OutputFormat, date: NaiveDate) -> Option<PathBuf> {
    format.extension().map(|ext| {
        output_dir.join(format!(
            "ri-recommendations-{}.{}",
            date.format("%Y-%m-%d"),
            ext
        ))
    })
}

/// Write the rows as a pretty-printed JSON array
pub fn write_json(rows: &[RecommendationRow], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write the rows as CSV with a header row
///
/// Nothing is written for an empty set; returns whether a file was created.
pub fn write_csv(rows: &[RecommendationRow], path: &Path) -> Result<bool> {
    if rows.is_empty() {
        return Ok(false);
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(true)
}

/// Render the rows as a grid table
pub fn render_table(rows: &[RecommendationRow]) -> String {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(
            RecommendationRow::HEADERS
                .iter()
                .map(|h| Cell::new(h).fg(Color::Yellow)),
        );

    for row in rows {
        table.add_row(row.cells());
    }

    table.to_string()
}

/// Emit the ranked recommendations in the configured format
///
/// User-facing messages go to `out`; report files go to the output directory.
pub fn emit<W: Write>(
    config: &Config,
    recommendations: &[NormalizedRecommendation],
    out: &mut W,
) -> Result<()> {
    let rows: Vec<RecommendationRow> = recommendations.iter().map(|r| r.to_row()).collect();
    debug!("Emitting {} rows as {:?}", rows.len(), config.format);

    let Some(path) = report_path(&config.output_dir, config.format, config.report_date) else {
        if rows.is_empty() {
            writeln!(out, "{}", NO_RECOMMENDATIONS_AVAILABLE)?;
        } else if config.interactive {
            display_recommendations_table(&rows)?;
        } else {
            writeln!(out, "{}", render_table(&rows))?;
        }
        return Ok(());
    };

    fs::create_dir_all(&config.output_dir)?;

    let written = match config.format {
        OutputFormat::Csv => write_csv(&rows, &path)?,
        _ => {
            write_json(&rows, &path)?;
            true
        }
    };

    if written {
        info!("Wrote {} recommendations to {}", rows.len(), path.display());
        writeln!(out, "Recommendations saved to {}", path.display())?;
    } else {
        writeln!(out, "{}", NO_RECOMMENDATIONS_TO_SAVE)?;
    }

    Ok(())
}
