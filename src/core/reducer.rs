use crate::domain::model::{MonthDays, RouteCache, RouteResult, ScanWindow};

/// Two-pass reduction for one route direction.
///
/// Pass 1 scans every cached month for prices at or under the threshold and
/// finds the absolute minimum across the whole window. Pass 2 re-scans the
/// cache and keeps only days priced at exactly that minimum, so every date in
/// the result is bookable at the same price. A month whose cheapest day is
/// above the minimum contributes no days even when it is under the threshold.
///
/// No eligible price anywhere is a normal outcome: empty day lists, no
/// minimum, no tax.
pub fn reduce_route(cache: &RouteCache, window: &ScanWindow, max_points: u32) -> RouteResult {
    let mut abs_min: Option<u32> = None;
    let mut tax_tally: Vec<(String, usize)> = Vec::new();

    for month in &cache.months {
        for price in month {
            if price.points > max_points {
                continue;
            }
            abs_min = Some(match abs_min {
                Some(current) => current.min(price.points),
                None => price.points,
            });
            if let Some(tax) = &price.tax {
                match tax_tally.iter_mut().find(|(seen, _)| seen == tax) {
                    Some((_, count)) => *count += 1,
                    None => tax_tally.push((tax.clone(), 1)),
                }
            }
        }
    }

    let labels = window.slots().iter().map(|slot| slot.label());

    let Some(abs_min) = abs_min else {
        return RouteResult {
            month_days: labels
                .map(|label| MonthDays {
                    label,
                    days: Vec::new(),
                })
                .collect(),
            absolute_minimum: None,
            typical_tax: None,
        };
    };

    RouteResult {
        month_days: labels
            .zip(&cache.months)
            .map(|(label, month)| MonthDays {
                label,
                days: month
                    .iter()
                    .filter(|price| price.points == abs_min)
                    .map(|price| price.day)
                    .collect(),
            })
            .collect(),
        absolute_minimum: Some(abs_min),
        typical_tax: most_common_tax(&tax_tally),
    }
}

// The tally preserves first-seen order, so equally frequent taxes resolve to
// the one encountered first in the scan.
fn most_common_tax(tally: &[(String, usize)]) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for (tax, count) in tally {
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((tax.as_str(), *count)),
        }
    }
    best.map(|(tax, _)| tax.to_string())
}

/// Run-length encodes a set of day numbers: `{1,2,3,7,9,10}` -> `"1-3,7,9-10"`.
pub fn compress_days(days: &[u32]) -> String {
    let mut days = days.to_vec();
    days.sort_unstable();
    days.dedup();

    let mut iter = days.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };

    let mut parts = Vec::new();
    let (mut start, mut prev) = (first, first);
    for day in iter {
        if day == prev + 1 {
            prev = day;
            continue;
        }
        parts.push(render_run(start, prev));
        start = day;
        prev = day;
    }
    parts.push(render_run(start, prev));
    parts.join(",")
}

fn render_run(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

/// `5000` -> `"5k"`, `4500` -> `"4.5k"`.
pub fn format_points(points: u32) -> String {
    if points % 1000 == 0 {
        format!("{}k", points / 1000)
    } else {
        format!("{:.1}k", points as f64 / 1000.0)
    }
}
