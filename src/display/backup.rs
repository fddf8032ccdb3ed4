//! Backup display formatting
//!
//! Formats backup records for terminal output in table and detail views.

use chrono::{DateTime, Local};

use crate::backup::{ArchiveInfo, BackupRecord};

/// Format a list of backups as a table
pub fn format_backup_list(backups: &[BackupRecord], verbose: bool, now: DateTime<Local>) -> String {
    if backups.is_empty() {
        return "No backups found.".to_string();
    }

    let name_width = backups
        .iter()
        .map(|b| b.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<19}  {:>10}  {:>6}  {}\n",
        "Name",
        "Created",
        "Size",
        "Age",
        if verbose { "SHA-256" } else { "Checksum" },
        name_width = name_width,
    ));

    output.push_str(&format!(
        "{:-<name_width$}  {:-<19}  {:->10}  {:->6}  {:-<16}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for backup in backups {
        let checksum = if verbose {
            backup.checksum.as_str()
        } else {
            backup.checksum.get(..12).unwrap_or(&backup.checksum)
        };

        output.push_str(&format!(
            "{:<name_width$}  {:<19}  {:>10}  {:>6}  {}\n",
            backup.name,
            backup.timestamp.format("%Y-%m-%d %H:%M:%S"),
            format_size(backup.size),
            format_age(now.signed_duration_since(backup.timestamp)),
            checksum,
            name_width = name_width,
        ));
    }

    output.push_str(&format!("\nTotal: {} backup(s)\n", backups.len()));
    output
}

/// Format a freshly created backup
pub fn format_backup_created(record: &BackupRecord) -> String {
    let mut output = String::new();
    output.push_str(&format!("Backup created: {}\n", record.name));
    output.push_str(&format!("  ID:        {}\n", record.id));
    output.push_str(&format!("  Size:      {}\n", format_size(record.size)));
    output.push_str(&format!("  SHA-256:   {}\n", record.checksum));
    output.push_str(&format!(
        "  Encrypted: {}\n",
        if record.encrypted { "Yes" } else { "No" }
    ));
    output
}

/// Format an inspected archive
pub fn format_archive_details(info: &ArchiveInfo) -> String {
    let mut output = String::new();

    output.push_str(&format!("Backup: {}\n", info.name));
    match info.timestamp {
        Some(ts) => output.push_str(&format!("  Created:    {}\n", ts.format("%Y-%m-%d %H:%M:%S %:z"))),
        None => output.push_str("  Created:    unknown\n"),
    }
    output.push_str(&format!("  Size:       {}\n", format_size(info.size)));
    output.push_str(&format!("  Entry size: {}\n", format_size(info.entry_size)));
    output.push_str(&format!("  SHA-256:    {}\n", info.checksum));

    let key_status = match info.decrypts {
        Some(true) => "decrypts with the configured key",
        Some(false) => "does not decrypt with the configured key (plaintext or different key)",
        None => "no key configured",
    };
    output.push_str(&format!("  Encryption: {}\n", key_status));

    output
}

/// Format a file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a duration in human-readable form
pub fn format_age(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}
