use super::mapping::{column_for_normalized, RosterColumn};
use super::normalizer::{normalize_header, normalize_id, parse_number};
use crate::workflows::dkp::PlayerSnapshotRow;
use csv::StringRecord;
use std::io::Read;
use tracing::debug;

/// Rows parsed from one export, plus how many were dropped for a blank ID.
#[derive(Debug, Default)]
pub(crate) struct ParsedRoster {
    pub(crate) rows: Vec<PlayerSnapshotRow>,
    pub(crate) dropped: usize,
    pub(crate) has_id_column: bool,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<ParsedRoster, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let layout: Vec<Option<RosterColumn>> = csv_reader
        .headers()?
        .iter()
        .map(|header| column_for_normalized(&normalize_header(header)))
        .collect();
    let mut parsed = ParsedRoster {
        has_id_column: layout.contains(&Some(RosterColumn::Id)),
        ..ParsedRoster::default()
    };

    for record in csv_reader.records() {
        match row_from_record(&layout, &record?) {
            Some(row) => parsed.rows.push(row),
            None => parsed.dropped += 1,
        }
    }

    if parsed.dropped > 0 {
        debug!(dropped = parsed.dropped, "roster rows without an id skipped");
    }
    Ok(parsed)
}

/// Later columns mapping onto the same field overwrite earlier ones.
fn row_from_record(layout: &[Option<RosterColumn>], record: &StringRecord) -> Option<PlayerSnapshotRow> {
    let mut row = PlayerSnapshotRow::default();
    let mut id = None;

    for (column, cell) in layout.iter().zip(record.iter()) {
        let Some(column) = column else {
            continue;
        };
        match column {
            RosterColumn::Id => id = normalize_id(cell),
            RosterColumn::Name => {
                row.name = Some(cell.to_string()).filter(|name| !name.is_empty());
            }
            RosterColumn::Power => row.power = parse_number(cell),
            RosterColumn::Killpoints => row.killpoints = parse_number(cell).unwrap_or(0.0),
            RosterColumn::Deads => row.deads = parse_number(cell),
            RosterColumn::T4Kills => row.t4_kills = parse_number(cell).unwrap_or(0.0),
            RosterColumn::T5Kills => row.t5_kills = parse_number(cell).unwrap_or(0.0),
            RosterColumn::TierDeaths(tier) => {
                row.tier_deaths[*tier] = parse_number(cell).unwrap_or(0.0);
            }
            RosterColumn::CityHall => row.city_hall = parse_number(cell),
            RosterColumn::Acclaim => row.acclaim = parse_number(cell).unwrap_or(0.0),
        }
    }

    row.id = id?;
    Some(row)
}
