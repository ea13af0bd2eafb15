use crate::models::HighscoreEntry;

/// Divide `numerator` by `denominator`, rounded to `decimal_places`.
///
/// Returns `None` when `denominator` is zero instead of producing `inf`/`NaN`.
///
/// # Examples
///
/// ```
/// use uhc_core::formatting::ratio;
///
/// assert_eq!(ratio(3, 2, 3), Some(1.5));
/// assert_eq!(ratio(2, 3, 3), Some(0.667));
/// assert_eq!(ratio(5, 0, 3), None);
/// ```
pub fn ratio(numerator: u32, denominator: u32, decimal_places: u32) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    let raw = f64::from(numerator) / f64::from(denominator);
    let factor = 10_f64.powi(decimal_places as i32);
    Some((raw * factor).round() / factor)
}

/// Format a duration in minutes as a human-readable string.
///
/// # Examples
///
/// ```
/// use uhc_core::formatting::format_time;
///
/// assert_eq!(format_time(45),  "45m");
/// assert_eq!(format_time(60),  "1h");
/// assert_eq!(format_time(225), "3h 45m");
/// ```
pub fn format_time(minutes: i64) -> String {
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        let hours = minutes / 60;
        let mins = minutes % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// `kd` column text: three decimals, or `-` for players who never died.
pub fn format_kd(kd: Option<f64>) -> String {
    match kd {
        Some(value) => format!("{:.3}", value),
        None => "-".to_string(),
    }
}

const TABLE_HEADERS: [&str; 9] = [
    "#", "Player", "Score", "Wins", "Dead wins", "Games", "Kills", "Deaths", "K/D",
];

/// Render the ranked highscore as an aligned plain-text table.
///
/// Alternate nicknames are listed in parentheses after the canonical one.
pub fn format_highscore_table(entries: &[HighscoreEntry]) -> String {
    let rows: Vec<[String; 9]> = entries
        .iter()
        .map(|e| {
            let player = if e.alt_nicks.is_empty() {
                e.nickname.clone()
            } else {
                format!("{} ({})", e.nickname, e.alt_nicks.join(", "))
            };
            [
                e.place.to_string(),
                player,
                e.score.to_string(),
                e.wins.to_string(),
                e.dead_wins.to_string(),
                e.games.to_string(),
                e.kills.to_string(),
                e.deaths.to_string(),
                format_kd(e.kd),
            ]
        })
        .collect();

    let mut widths: [usize; 9] = TABLE_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &TABLE_HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(rule.join("  ").trim_end());
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Player name is left-aligned, every numeric column right-aligned.
fn push_row(out: &mut String, cells: &[String; 9], widths: &[usize; 9]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .enumerate()
        .map(|(i, (cell, width))| {
            if i == 1 {
                format!("{:<width$}", cell, width = width)
            } else {
                format!("{:>width$}", cell, width = width)
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

// ── Tests ──────────────────────────────────────────────────────────────────────
