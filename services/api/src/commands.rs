use crate::cli::{
    MultipliersCommand, PenaltyAddArgs, PenaltyCommand, RangesCommand, RunArgs, ScanArgs,
    SettingsCommand, VacationCommand,
};
use kingdom_dkp::config::AppConfig;
use kingdom_dkp::error::AppError;
use kingdom_dkp::workflows::dkp::{
    DkpService, JsonFileSettingsStore, Multipliers, PenaltyBook, PenaltyRequest, PenaltyRule,
    PowerRange, PowerRanges, ResultRow, RunOptions, RunReport, SettingsBundle, VacationList,
};
use kingdom_dkp::workflows::roster::RosterImporter;
use std::path::PathBuf;
use std::sync::Arc;

type FileService = DkpService<JsonFileSettingsStore>;

fn open_service(settings: Option<PathBuf>) -> Result<FileService, AppError> {
    let path = match settings {
        Some(path) => path,
        None => AppConfig::load()?.storage.settings_path,
    };
    let service = DkpService::load(Arc::new(JsonFileSettingsStore::new(path)))?;
    Ok(service)
}

fn score(service: &FileService, scans: &ScanArgs) -> Result<RunReport, AppError> {
    let start = RosterImporter::from_path(&scans.start)?;
    let end = RosterImporter::from_path(&scans.end)?;
    let options = RunOptions {
        mode: scans.mode,
        ignore_city_hall: scans.ignore_city_hall,
    };
    Ok(service.run(&start, &end, options)?)
}

pub(crate) fn run_dkp(args: RunArgs, settings: Option<PathBuf>) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let report = score(&service, &args.scans)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    render_report(&report, args.limit);
    Ok(())
}

pub(crate) fn settings(command: SettingsCommand, settings: Option<PathBuf>) -> Result<(), AppError> {
    let service = open_service(settings)?;
    match command {
        SettingsCommand::Export { output } => {
            let document = serde_json::to_string_pretty(&service.export_settings()?)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, document)?;
                    println!("Settings exported to {}", path.display());
                }
                None => println!("{document}"),
            }
        }
        SettingsCommand::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let bundle: SettingsBundle = serde_json::from_str(&raw)?;
            let changed = service.import_settings(bundle)?;
            if changed.is_empty() {
                println!("No settings sections found in {}", file.display());
            } else {
                let names: Vec<&str> = changed.iter().map(|key| key.as_str()).collect();
                println!("Imported: {}", names.join(", "));
            }
        }
        SettingsCommand::ClearMinDkp => {
            let cleared = service.clear_min_dkp()?;
            println!("Cleared {cleared} min DKP baselines; they are recomputed on the next run.");
        }
    }
    Ok(())
}

pub(crate) fn multipliers(
    command: MultipliersCommand,
    settings: Option<PathBuf>,
) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let multipliers = match command {
        MultipliersCommand::Show => service.settings()?.multipliers,
        MultipliersCommand::Set { t4, t5, deads } => {
            service.set_multipliers(Multipliers { t4, t5, deads })?
        }
    };
    println!(
        "Multipliers: T4 {} / T5 {} / Deads {}",
        multipliers.t4, multipliers.t5, multipliers.deads
    );
    Ok(())
}

pub(crate) fn ranges(command: RangesCommand, settings: Option<PathBuf>) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let table = match command {
        RangesCommand::List => service.settings()?.power_ranges,
        RangesCommand::Add {
            min,
            max,
            percentage,
        } => service.add_power_range(PowerRange::new(min, max, percentage))?,
        RangesCommand::Remove { index } => {
            let removed = service.remove_power_range(index)?;
            println!("Removed {}", describe_range(&removed));
            service.settings()?.power_ranges
        }
    };
    render_ranges(&table);
    Ok(())
}

pub(crate) fn vacation(command: VacationCommand, settings: Option<PathBuf>) -> Result<(), AppError> {
    let service = open_service(settings)?;
    let list = match command {
        VacationCommand::Show => service.settings()?.vacation,
        VacationCommand::Set { ids } => service.set_vacation_list(VacationList::parse(&ids))?,
    };
    if list.is_empty() {
        println!("Vacation list: empty");
    } else {
        println!("Vacation list: {}", list.to_display());
    }
    Ok(())
}

pub(crate) fn penalty(command: PenaltyCommand, settings: Option<PathBuf>) -> Result<(), AppError> {
    let service = open_service(settings)?;
    match command {
        PenaltyCommand::List => render_penalties(&service.penalties()?),
        PenaltyCommand::Add(args) => add_penalty(&service, args)?,
        PenaltyCommand::Remove { player, index } => {
            let removed = service.remove_penalty(&player, index)?;
            println!("Removed penalty for {player}: {}", describe_rule(&removed));
        }
    }
    Ok(())
}

fn add_penalty(service: &FileService, args: PenaltyAddArgs) -> Result<(), AppError> {
    if args.column.is_checkpoint() {
        let (Some(start), Some(end)) = (args.start, args.end) else {
            return Err(AppError::Usage(format!(
                "{} penalties capture the latest results; pass --start and --end",
                args.column
            )));
        };
        let scans = ScanArgs {
            start,
            end,
            mode: args.mode,
            ignore_city_hall: args.ignore_city_hall,
        };
        score(service, &scans)?;
    }

    let rule = service.add_penalty(PenaltyRequest {
        player_id: args.player.clone(),
        column: args.column,
        kind: args.kind,
        value: args.value,
    })?;
    println!("Added penalty for {}: {}", args.player.trim(), describe_rule(&rule));
    Ok(())
}

fn render_report(report: &RunReport, limit: Option<usize>) {
    let run = &report.run;
    println!(
        "DKP run ({} mode, city hall gate {})",
        report.options.mode.label(),
        if report.options.ignore_city_hall {
            "ignored"
        } else {
            "applied"
        }
    );
    println!("{}", run.summary());

    println!(
        "\n{:>4}  {:<12} {:<20} {:>14} {:>10} {:>10} {:>10} {:>12} {:>12} {:>8}  {:<16} {}",
        "#", "ID", "Name", "Power", "T4", "T5", "Deads", "DKP", "Min DKP", "DKP%", "Status", "Vac"
    );
    let shown = limit.unwrap_or(run.rows.len());
    for (rank, row) in run.rows.iter().take(shown).enumerate() {
        println!("{}", format_row(rank + 1, row));
    }
    if shown < run.rows.len() {
        println!("... {} more rows", run.rows.len() - shown);
    }

    if !run.missing_power.is_empty() {
        println!(
            "\nNo power found for {} player(s): {}",
            run.missing_power.len(),
            run.missing_power.join(", ")
        );
    }
}

fn format_row(rank: usize, row: &ResultRow) -> String {
    format!(
        "{:>4}  {:<12} {:<20} {:>14.0} {:>10} {:>10} {:>10} {:>12} {:>12} {:>7.2}%  {:<16} {}",
        rank,
        row.id,
        truncate(&row.name, 20),
        row.power,
        row.t4_gained,
        row.t5_gained,
        row.deads_gained,
        row.dkp,
        row.min_dkp,
        row.dkp_percent * 100.0,
        row.status.label(),
        if row.vacation { "YES" } else { "NO" }
    )
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

fn render_ranges(table: &PowerRanges) {
    if table.is_empty() {
        println!("No power ranges configured; every player uses the fallback tier.");
        return;
    }
    println!("Power ranges");
    for (index, range) in table.iter().enumerate() {
        println!("[{index}] {}", describe_range(range));
    }
}

fn describe_range(range: &PowerRange) -> String {
    let upper = range
        .max_power
        .map(|max| max.to_string())
        .unwrap_or_else(|| "and above".to_string());
    format!(
        "{} - {}: {}%",
        range.min_power,
        upper,
        range.percentage * 100.0
    )
}

fn render_penalties(book: &PenaltyBook) {
    if book.is_empty() {
        println!("No penalties recorded");
        return;
    }
    for (player_id, rules) in book.iter() {
        println!("Player {player_id}");
        for (index, rule) in rules.iter().enumerate() {
            println!("  [{index}] {}", describe_rule(rule));
        }
    }
}

fn describe_rule(rule: &PenaltyRule) -> String {
    let adjustment = rule.adjustment();
    let base = format!(
        "{} {} {}",
        rule.column(),
        adjustment.kind.label(),
        adjustment.value
    );
    match rule {
        PenaltyRule::Delta(_) => base,
        PenaltyRule::Checkpoint(rule) => format!(
            "{base} (checkpoint {}, floor {})",
            rule.checkpoint, rule.applied_value
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kingdom_dkp::workflows::dkp::{Adjustment, CheckpointColumn, CheckpointPenalty};

    #[test]
    fn long_names_are_truncated_to_column_width() {
        assert_eq!(truncate("Aria", 20), "Aria");
        assert_eq!(truncate("abcdefghij", 5), "abcd~");
    }

    #[test]
    fn open_ended_ranges_read_naturally() {
        assert_eq!(
            describe_range(&PowerRange::new(50_000_000, None, 0.7)),
            "50000000 - and above: 70%"
        );
    }

    #[test]
    fn checkpoint_rules_show_their_floor() {
        let rule = PenaltyRule::Checkpoint(CheckpointPenalty {
            column: CheckpointColumn::Dkp,
            adjustment: Adjustment::percent(-0.5),
            checkpoint: 1000,
            applied_value: 500,
        });
        assert_eq!(
            describe_rule(&rule),
            "DKP percent -0.5 (checkpoint 1000, floor 500)"
        );
    }
}
