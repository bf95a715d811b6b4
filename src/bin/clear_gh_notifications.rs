//! Clear all GitHub notifications
//!
//! Fetches every notification thread with `gh` and deletes it.
//! Usage: clear-gh-notifications [--dry-run]

use clap::Parser;

use continuity_lib::github::GhError;
use continuity_lib::{delete_notification, fetch_notifications, ClearReport, Notification, TokioCommandRunner};

#[derive(Parser)]
#[command(name = "clear-gh-notifications")]
#[command(about = "Delete all GitHub notifications via the gh CLI", long_about = None)]
struct Args {
    /// List what would be deleted without deleting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args.dry_run).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn print_listing(notifications: &[Notification]) {
    println!("Found {} notification(s):\n", notifications.len());
    for n in notifications {
        println!("  📌 {}", n.subject.title);
        println!("     Repository: {}", n.repository.full_name);
        println!("     ID: {}\n", n.id);
    }
}

async fn run(dry_run: bool) -> Result<(), GhError> {
    let runner = TokioCommandRunner;

    if dry_run {
        println!("🔍 Running in DRY RUN mode - no notifications will be deleted\n");
    }
    println!("📥 Fetching GitHub notifications...\n");

    let notifications = fetch_notifications(&runner).await?;
    if notifications.is_empty() {
        println!("✅ No notifications found");
        return Ok(());
    }
    print_listing(&notifications);

    if !dry_run {
        println!("🗑️  Deleting all notifications...\n");
    }

    let mut report = ClearReport::default();
    for n in &notifications {
        let ok = delete_notification(&runner, &n.id, dry_run).await;
        report.record(ok);
        match (ok, dry_run) {
            (true, true) => println!("[DRY RUN] Would delete notification: {}", n.id),
            (true, false) => println!("  ✓ Deleted: {}", n.subject.title),
            (false, _) => eprintln!("  ✗ Failed to delete: {}", n.subject.title),
        }
    }

    println!("\n{} Summary:", if dry_run { "📊" } else { "✅" });
    println!("  {}: {}", if dry_run { "Would delete" } else { "Deleted" }, report.deleted);
    if report.failed > 0 {
        println!("  Failed: {}", report.failed);
    }
    if dry_run {
        println!("\n💡 Run without --dry-run to actually delete these notifications");
    }
    Ok(())
}
