use crate::param::Param;
use crate::population::EpochStats;

/// Logs at info level, stripping ANSI colour codes when colours are disabled
#[macro_export]
macro_rules! cinfo {
    ($colorful:expr, $($arg:tt)*) => {
        if $colorful {
            log::info!($($arg)*);
        } else {
            log::info!("{}", $crate::utils::strip_ansi(&format!($($arg)*)));
        }
    };
}

/// Removes `ESC [ ... m` colour sequences from a string
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

pub fn display_epoch_legend(param: &Param) -> String {
    format!(
        "Evolving {} timetables over at most {} generations (mutation rate {:.2}, elite {:.0}%)\n\
        \x1b[2;97m#epoch | best | mean | worst | distinct\x1b[0m",
        param.ga.population_size,
        param.ga.max_epochs,
        param.ga.mutation_rate,
        param.ga.select_elite_pct
    )
}

pub fn display_epoch(stats: &EpochStats, best_seen: u64) -> String {
    let best = if stats.best == 0 {
        format!("\x1b[1;92m{}\x1b[0m", stats.best)
    } else if stats.best <= best_seen {
        format!("\x1b[1;93m{}\x1b[0m", stats.best)
    } else {
        format!("{}", stats.best)
    };
    format!(
        "#{:<5} | {} | {:.1} | {} | {}",
        stats.epoch, best, stats.mean, stats.worst, stats.unique
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;93m42\x1b[0m points"), "42 points");
        assert_eq!(strip_ansi("plain"), "plain");
        assert_eq!(strip_ansi("bare \x1b escape"), "bare \x1b escape");
    }

    #[test]
    fn test_display_epoch() {
        let stats = EpochStats {
            epoch: 7,
            best: 1500,
            mean: 2250.0,
            worst: 3000,
            unique: 12,
        };
        let line = strip_ansi(&display_epoch(&stats, 2000));
        assert_eq!(line, "#7     | 1500 | 2250.0 | 3000 | 12");
    }
}
