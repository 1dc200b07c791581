use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(minute) = args.update_minute {
        if minute > 59 {
            return Err("invalid update-minute, expected 0-59".to_string());
        }
    }
    if let Some(day) = args.first_day {
        if !(1..=31).contains(&day) {
            return Err("invalid first-day, expected 1-31".to_string());
        }
    }
    if let Some(raw) = args.backend_url.as_deref() {
        crate::utils::validate_backend_url(raw)
            .map_err(|e| format!("invalid --backend-url '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json, or html"
            ));
        }
    }
    for raw in args.view.iter() {
        crate::utils::parse_views_csv(raw).map_err(|e| format!("invalid --view '{raw}': {e}"))?;
    }
    for raw in args.sort.iter() {
        crate::utils::parse_sort_click(raw).map_err(|e| format!("invalid --sort '{raw}': {e}"))?;
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err("invalid workers, expected positive integer".to_string());
        }
    }
    Ok(())
}
