//! Table and JSON rendering for command results

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use yard_office::flows::{DownloadReport, SaveSummary};
use yard_office::models::{
    DashboardStats, GateStats, Pagination, Shipment, SignedDownload, StorageBand, User, Vessel,
};

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn pagination_line(p: &Pagination) {
    println!(
        "\nPage {} of {} ({} total){}{}",
        p.current_page,
        p.total_pages,
        p.total_items,
        if p.has_prev { "  [prev]" } else { "" },
        if p.has_next { "  [next]" } else { "" },
    );
}

fn date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn shipments(
    format: OutputFormat,
    rows: &[Shipment],
    pagination: &Pagination,
    today: NaiveDate,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&json!({"data": rows, "pagination": pagination}));
    }
    println!(
        "{:<26} {:<20} {:<20} {:<11} {:<11} {:>5} {:<10} {:>6}",
        "ID", "CHASSIS", "CUSTOMER", "GATE IN", "GATE OUT", "YARD", "STATUS", "DAYS"
    );
    for s in rows {
        let days = s.storage_days_on(today);
        let days = match days {
            Some(d) => match StorageBand::for_days(d) {
                StorageBand::Normal => d.to_string(),
                band => format!("{} ({})", d, band.label()),
            },
            None => "-".to_string(),
        };
        println!(
            "{:<26} {:<20} {:<20} {:<11} {:<11} {:>5} {:<10} {:>6}",
            s.id,
            s.chassis_number().unwrap_or("-"),
            s.customer_name().unwrap_or("-"),
            date(s.gate_in_date),
            date(s.gate_out_date),
            s.yard.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
            s.export_status.as_str(),
            days
        );
    }
    pagination_line(pagination);
    Ok(())
}

pub fn shipment(format: OutputFormat, s: &Shipment, today: NaiveDate) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(s);
    }
    println!("Shipment {}", s.id);
    println!("==========================");
    println!("Chassis:      {}", s.chassis_number().unwrap_or("-"));
    if let Some(model) = s.car.as_ref().and_then(|c| c.make_model.as_deref()) {
        println!("Make/model:   {}", model);
    }
    println!("Customer:     {}", s.customer_name().unwrap_or("-"));
    println!("Vessel:       {}", s.vessel_name().unwrap_or("-"));
    println!("Gate in:      {}", date(s.gate_in_date));
    println!("Gate out:     {}", date(s.gate_out_date));
    println!("Status:       {}", s.export_status);
    if let Some(days) = s.storage_days_on(today) {
        println!(
            "Storage days: {} ({})",
            days,
            StorageBand::for_days(days).label()
        );
    }
    if let Some(car) = &s.car {
        println!(
            "Photos:       {}{}",
            car.photo_count(),
            if car.has_zip() { " + ZIP bundle" } else { "" }
        );
    }
    if let Some(remarks) = s.remarks.as_deref().filter(|r| !r.is_empty()) {
        println!("Remarks:      {}", remarks);
    }
    Ok(())
}

pub fn vessels(
    format: OutputFormat,
    rows: &[Vessel],
    pagination: &Pagination,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&json!({"data": rows, "pagination": pagination}));
    }
    println!(
        "{:<26} {:<24} {:<12} {:<11} {:<18} {:<12}",
        "ID", "VESSEL", "JOB", "ETD", "LINE", "POD"
    );
    for v in rows {
        println!(
            "{:<26} {:<24} {:<12} {:<11} {:<18} {:<12}",
            v.id,
            v.vessel_name,
            v.job_number.as_deref().unwrap_or("-"),
            date(v.etd),
            v.shipping_line.as_deref().unwrap_or("-"),
            v.pod.as_deref().unwrap_or("-"),
        );
    }
    pagination_line(pagination);
    Ok(())
}

pub fn users(format: OutputFormat, rows: &[User], pagination: &Pagination) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&json!({"data": rows, "pagination": pagination}));
    }
    println!(
        "{:<26} {:<24} {:<16} {:<9} {:<8}",
        "ID", "NAME", "USER ID", "ROLE", "BULK DL"
    );
    for u in rows {
        println!(
            "{:<26} {:<24} {:<16} {:<9} {:<8}",
            u.id,
            u.name,
            u.login_id(),
            u.role.as_str(),
            if u.can_mass_download_photos { "yes" } else { "no" }
        );
    }
    pagination_line(pagination);
    Ok(())
}

pub fn dashboard(format: OutputFormat, stats: &DashboardStats) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(stats);
    }
    println!("Dashboard");
    println!("=========");
    println!("Shipments: {}", stats.total_shipments);
    println!("In yard:   {}", stats.in_yard);
    println!("Pending:   {}", stats.pending);
    println!("Shipped:   {}", stats.shipped);
    println!("Unshipped: {}", stats.unshipped);
    println!("Cancelled: {}", stats.cancelled);
    println!("Customers: {}", stats.total_customers);
    println!("Vessels:   {}", stats.total_vessels);
    for (key, value) in &stats.extra {
        println!("{}: {}", key, value);
    }
    Ok(())
}

pub fn gates(format: OutputFormat, stats: &GateStats) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(stats);
    }
    println!("{:<12} {:>8} {:>8}", "PERIOD", "IN", "OUT");
    let mut periods: Vec<&str> = stats
        .gate_in
        .iter()
        .chain(stats.gate_out.iter())
        .map(|g| g.period.as_str())
        .collect();
    periods.sort_unstable();
    periods.dedup();
    let count = |series: &[yard_office::models::GateCount], period: &str| {
        series
            .iter()
            .filter(|g| g.period == period)
            .map(|g| g.count)
            .sum::<u64>()
    };
    for period in periods {
        println!(
            "{:<12} {:>8} {:>8}",
            period,
            count(&stats.gate_in, period),
            count(&stats.gate_out, period)
        );
    }
    println!("{:<12} {:>8} {:>8}", "TOTAL", stats.total_in(), stats.total_out());
    Ok(())
}

pub fn download_links(format: OutputFormat, links: &[SignedDownload]) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        let urls: Vec<_> = links
            .iter()
            .map(|l| json!({"fileName": l.file_name, "key": l.key, "url": l.url}))
            .collect();
        return print_json(&urls);
    }
    for link in links {
        println!(
            "{}\t{}",
            link.file_name.as_deref().unwrap_or("-"),
            link.url
        );
    }
    Ok(())
}

pub fn save_summary(format: OutputFormat, summary: &SaveSummary) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&json!({
            "uploaded": summary.uploaded,
            "deleted": summary.deleted,
            "failedUploads": summary.failed_uploads,
            "skippedUploads": summary.skipped_uploads,
            "errors": summary.errors,
        }));
    }
    println!("Uploaded: {}", summary.uploaded);
    println!("Deleted:  {}", summary.deleted);
    for name in &summary.failed_uploads {
        println!("Failed:   {}", name);
    }
    for name in &summary.skipped_uploads {
        println!("Skipped:  {}", name);
    }
    for error in &summary.errors {
        println!("Error:    {}", error);
    }
    Ok(())
}

pub fn download_report(
    format: OutputFormat,
    report: &DownloadReport,
    path: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&json!({
            "successCount": report.success_count,
            "failCount": report.fail_count,
            "failed": report.failed,
            "archive": path.map(|p| p.display().to_string()),
        }));
    }
    println!("Succeeded: {}", report.success_count);
    println!("Failed:    {}", report.fail_count);
    for id in &report.failed {
        println!("  - {}", id);
    }
    if let Some(path) = path {
        println!("Archive:   {}", path.display());
    }
    Ok(())
}
