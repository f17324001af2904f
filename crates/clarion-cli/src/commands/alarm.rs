//! Alarm management commands.

use clap::Subcommand;

use clarion_core::{AlarmDraft, AlarmManager, Config, WeekdaySet};

use super::Handles;

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Create a new alarm
    Add {
        /// Wall-clock time of day, `HH:MM`
        time: String,
        /// Active weekdays: names (`mon,wed,fri`), indices (`1,3,5`,
        /// 0=Sun), or `daily`
        #[arg(long, default_value = "daily")]
        days: String,
        /// Announcement label
        #[arg(long, default_value = "")]
        label: String,
        /// Announcement language code (default from config)
        #[arg(long)]
        language: Option<String>,
        /// Announcement volume 0.0-1.0 (default from config)
        #[arg(long)]
        volume: Option<f32>,
        /// Disable vibration
        #[arg(long)]
        no_vibrate: bool,
        /// Create the alarm disabled
        #[arg(long)]
        disabled: bool,
    },
    /// List all alarms
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one alarm with its next fire instant
    Show { id: i64 },
    /// Enable an alarm (registers its next firing)
    Enable { id: i64 },
    /// Disable an alarm (cancels its registration)
    Disable { id: i64 },
    /// Delete an alarm
    Remove { id: i64 },
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let handles = Handles::open()?;
    let manager = AlarmManager::new(handles.store.clone(), handles.registrar());

    match action {
        AlarmAction::Add {
            time,
            days,
            label,
            language,
            volume,
            no_vibrate,
            disabled,
        } => {
            let (hour, minute) = parse_time(&time)?;
            let defaults = Config::load_or_default().announcer;
            let draft = AlarmDraft {
                hour,
                minute,
                weekdays: parse_days(&days)?,
                enabled: !disabled,
                language_code: language.unwrap_or(defaults.language_code),
                volume: volume.unwrap_or(defaults.volume),
                vibrate: !no_vibrate && defaults.vibrate,
                label,
            };
            let alarm = manager.create(draft)?;
            println!("{}", serde_json::to_string_pretty(&alarm)?);
        }
        AlarmAction::List { json } => {
            let alarms = manager.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&alarms)?);
            } else {
                for a in &alarms {
                    println!(
                        "{:>4}  {:02}:{:02}  {:<21}  {}  {}",
                        a.id,
                        a.hour,
                        a.minute,
                        a.weekdays.to_string(),
                        if a.enabled { "on " } else { "off" },
                        a.label
                    );
                }
            }
        }
        AlarmAction::Show { id } => {
            let Some(alarm) = manager.get(id)? else {
                return Err(format!("no alarm with id {id}").into());
            };
            let next = clarion_core::next_fire_instant(alarm.hour, alarm.minute, alarm.weekdays);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "alarm": alarm,
                    "next_fire_at": next,
                    "registered": handles.registrar().exists(id)?,
                }))?
            );
        }
        AlarmAction::Enable { id } => {
            let alarm = manager.set_enabled(id, true)?;
            println!("{}", serde_json::to_string_pretty(&alarm)?);
        }
        AlarmAction::Disable { id } => {
            let alarm = manager.set_enabled(id, false)?;
            println!("{}", serde_json::to_string_pretty(&alarm)?);
        }
        AlarmAction::Remove { id } => {
            if manager.delete(id)? {
                println!("{{\"deleted\": {id}}}");
            } else {
                return Err(format!("no alarm with id {id}").into());
            }
        }
    }
    Ok(())
}

fn parse_time(s: &str) -> Result<(u32, u32), String> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid time '{s}', expected HH:MM"))?;
    let hour: u32 = h.parse().map_err(|_| format!("invalid hour '{h}'"))?;
    let minute: u32 = m.parse().map_err(|_| format!("invalid minute '{m}'"))?;
    if hour > 23 || minute > 59 {
        return Err(format!("time '{s}' out of range"));
    }
    Ok((hour, minute))
}

fn parse_days(s: &str) -> Result<WeekdaySet, String> {
    if s.eq_ignore_ascii_case("daily") || s.eq_ignore_ascii_case("all") {
        return Ok(WeekdaySet::EVERY_DAY);
    }
    if s.eq_ignore_ascii_case("none") || s.is_empty() {
        return Ok(WeekdaySet::empty());
    }
    let mut set = WeekdaySet::empty();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let day = match part.to_ascii_lowercase().as_str() {
            "sun" | "sunday" => 0,
            "mon" | "monday" => 1,
            "tue" | "tuesday" => 2,
            "wed" | "wednesday" => 3,
            "thu" | "thursday" => 4,
            "fri" | "friday" => 5,
            "sat" | "saturday" => 6,
            other => other
                .parse::<u8>()
                .ok()
                .filter(|&d| d < 7)
                .ok_or_else(|| format!("unknown weekday '{part}'"))?,
        };
        set.insert(day);
    }
    Ok(set)
}
