//! Build a joined SELECT from JSON filters and fold the rows into nested records.
//!
//! Run with:
//!   cargo run --example nested_posts

use serde_json::json;
use sqlfold::monitor::{LoggingMonitor, MonitorConfig};
use sqlfold::testing::RecordingDriver;
use sqlfold::{Column, Database, Order, RecordSet, SqlResult, Value};

fn main() -> SqlResult<()> {
    let mut driver = RecordingDriver::new();
    driver.push_rows(
        RecordSet::new(vec![
            Column::from_table("post", "id"),
            Column::from_table("post", "title"),
            Column::new("name", "c", "comment"),
        ])
        .with_row([Value::Int(1), "Hello".into(), "first!".into()])
        .with_row([Value::Int(1), "Hello".into(), "nice".into()])
        .with_row([Value::Int(2), "Draft".into(), Value::Null]),
    );

    let mut db = Database::from_driver(driver)
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor(LoggingMonitor::new());

    // Filters usually come straight from a request body.
    let filter = json!([[["post.published", "=", true]], [["post.author", "IN", [3, 4]]]]);

    let result = db
        .select("post")
        .fields(["post.id", "post.title", "c.name"])
        .left_join("comment", "c", "c.post_id", "=", "post.id")
        .conditions(&filter)
        .order("post.id", Order::Asc)
        .run(&mut db)?;

    println!("sql: {}", result.sql());

    let posts = result.formatted_fetch_all("post", "id")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&posts).unwrap_or_default()
    );
    Ok(())
}
