//! Human-readable descriptions of cron expressions.

/// Describe a cron expression in plain words.
///
/// Recognises the common five-field shapes (and six-field with a zero
/// seconds column). Anything else is echoed back unchanged.
pub fn humanize_cron(expression: &str) -> String {
    describe(expression.trim()).unwrap_or_else(|| expression.to_string())
}

fn describe(expression: &str) -> Option<String> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    let fields = match fields.len() {
        5 => &fields[..],
        6 if fields[0] == "0" => &fields[1..],
        _ => return None,
    };
    let (minute, hour, dom, month, dow) = (fields[0], fields[1], fields[2], fields[3], fields[4]);

    if month != "*" {
        return None;
    }

    let every_day = dom == "*" && dow == "*";

    if minute == "*" && hour == "*" && every_day {
        return Some("Every minute".to_string());
    }

    if let Some(n) = step(minute)
        && hour == "*"
        && every_day
    {
        return Some(match n {
            1 => "Every minute".to_string(),
            n => format!("Every {} minutes", n),
        });
    }

    let m = number(minute, 0, 59)?;

    if hour == "*" && every_day {
        return Some(format!("Every hour at :{:02}", m));
    }

    if let Some(n) = step(hour)
        && every_day
    {
        let base = match n {
            1 => "Every hour".to_string(),
            n => format!("Every {} hours", n),
        };
        return Some(if m == 0 { base } else { format!("{} at :{:02}", base, m) });
    }

    let h = number(hour, 0, 23)?;
    let time = clock(h, m);

    match (dom, dow) {
        ("*", "*") => Some(format!("Daily at {}", time)),
        ("*", "1-5") => Some(format!("Weekdays at {}", time)),
        ("*", "0,6") | ("*", "6,0") | ("*", "6,7") => Some(format!("Weekends at {}", time)),
        ("*", day) => Some(format!("Every {} at {}", weekday(number(day, 0, 7)?), time)),
        (day, "*") => Some(format!("Monthly on day {} at {}", number(day, 1, 31)?, time)),
        _ => None,
    }
}

fn step(field: &str) -> Option<u32> {
    field.strip_prefix("*/")?.parse().ok().filter(|n| *n > 0)
}

fn number(field: &str, min: u32, max: u32) -> Option<u32> {
    field.parse().ok().filter(|n| (min..=max).contains(n))
}

fn clock(hour: u32, minute: u32) -> String {
    let (display_hour, suffix) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{}:{:02} {}", display_hour, minute, suffix)
}

fn weekday(day: u32) -> &'static str {
    match day {
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Sunday",
    }
}
