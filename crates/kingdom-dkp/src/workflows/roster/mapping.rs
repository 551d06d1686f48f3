use super::normalizer::normalize_header;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Canonical snapshot column a roster header maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RosterColumn {
    Id,
    Name,
    Power,
    Killpoints,
    Deads,
    T4Kills,
    T5Kills,
    TierDeaths(usize),
    CityHall,
    Acclaim,
}

static HEADER_ALIASES: OnceLock<HashMap<String, RosterColumn>> = OnceLock::new();

pub(crate) fn column_for_normalized(normalized_header: &str) -> Option<RosterColumn> {
    header_aliases().get(normalized_header).copied()
}

fn header_aliases() -> &'static HashMap<String, RosterColumn> {
    HEADER_ALIASES.get_or_init(|| {
        const ALIASES: &[(&str, RosterColumn)] = &[
            ("Character ID", RosterColumn::Id),
            ("ID", RosterColumn::Id),
            ("Governor ID", RosterColumn::Id),
            ("Username", RosterColumn::Name),
            ("Name", RosterColumn::Name),
            ("Governor Name", RosterColumn::Name),
            ("Current Power", RosterColumn::Power),
            ("Power", RosterColumn::Power),
            ("Total Kill Points", RosterColumn::Killpoints),
            ("Killpoints", RosterColumn::Killpoints),
            ("Kill Points", RosterColumn::Killpoints),
            ("Kills", RosterColumn::Killpoints),
            ("Deaths", RosterColumn::Deads),
            ("Deads", RosterColumn::Deads),
            ("Dead", RosterColumn::Deads),
            ("T4", RosterColumn::T4Kills),
            ("T4 Kills", RosterColumn::T4Kills),
            ("Tier 4 Kills", RosterColumn::T4Kills),
            ("T5", RosterColumn::T5Kills),
            ("T5 Kills", RosterColumn::T5Kills),
            ("Tier 5 Kills", RosterColumn::T5Kills),
            ("T1 Deaths", RosterColumn::TierDeaths(0)),
            ("T2 Deaths", RosterColumn::TierDeaths(1)),
            ("T3 Deaths", RosterColumn::TierDeaths(2)),
            ("T4 Deaths", RosterColumn::TierDeaths(3)),
            ("T5 Deaths", RosterColumn::TierDeaths(4)),
            ("CH", RosterColumn::CityHall),
            ("City Hall", RosterColumn::CityHall),
            ("CityHall", RosterColumn::CityHall),
            ("City Hall Level", RosterColumn::CityHall),
            ("Acclaim", RosterColumn::Acclaim),
        ];

        let mut map = HashMap::with_capacity(ALIASES.len());
        for (header, column) in ALIASES {
            map.insert(normalize_header(header), *column);
        }
        map
    })
}

#[cfg(test)]
pub(crate) fn lookup_for_tests(header: &str) -> Option<RosterColumn> {
    column_for_normalized(&normalize_header(header))
}
